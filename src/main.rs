//! `showcase` command-line entry point.
//!
//! `run` is meant to be driven by a scheduler (cron, systemd timer). Its exit
//! status tells the caller whether the display has to reload.

use anyhow::{bail, Context};
use bridge_traits::time::{Clock, LogLevel, SystemClock};
use clap::{Parser, Subcommand};
use core_metadata::{MetadataCodec, MetadataMap};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::AppConfig;
use core_schedule::{StartOnlyPolicy, WindowEvaluator};
use core_service::ShowcaseService;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Debug, Parser)]
#[command(name = "showcase", version, about = "Mirror dated display content and publish what is active")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "app_config.json")]
    config: PathBuf,

    /// Overrides the configured log level
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Overrides the configured log format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sync the mirror and rebuild the catalog once
    Run,

    /// Print the window state of files as of now
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Inspect or edit embedded metadata
    Metadata {
        #[command(subcommand)]
        action: MetadataCommand,
    },
}

#[derive(Debug, Subcommand)]
enum MetadataCommand {
    /// Print the metadata map of a file as JSON
    Read { path: PathBuf },

    /// Copy SRC to OUT with the given entries embedded
    Write {
        src: PathBuf,
        out: PathBuf,

        /// KEY=VALUE entry, repeatable
        #[arg(long = "set", value_parser = parse_key_value, required = true)]
        entries: Vec<(String, String)>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("showcase: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<u8> {
    let config = match &cli.command {
        Command::Run => Some(AppConfig::load(&cli.config)?),
        _ if cli.config.exists() => Some(AppConfig::load(&cli.config)?),
        _ => None,
    };

    init_logging(logging_config(&cli, config.as_ref()))?;

    match cli.command {
        Command::Run => {
            let Some(config) = config else {
                bail!("no configuration loaded");
            };
            run(config)
        }
        Command::Check { paths } => {
            let policy = config
                .as_ref()
                .map(|c| c.start_only_policy)
                .unwrap_or_default();
            check(&paths, policy);
            Ok(0)
        }
        Command::Metadata { action } => {
            metadata(action)?;
            Ok(0)
        }
    }
}

fn logging_config(cli: &Cli, config: Option<&AppConfig>) -> LoggingConfig {
    let mut logging = config
        .map(|c| c.logging.to_logging_config())
        .unwrap_or_default();
    if let Some(level) = cli.log_level {
        logging = logging.with_level(level);
    }
    if let Some(format) = cli.log_format {
        logging = logging.with_format(format);
    }
    logging
}

fn run(config: AppConfig) -> anyhow::Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let service = match ShowcaseService::from_config(config) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Service setup failed");
            return Ok(exit_status(e.exit_code()));
        }
    };

    match runtime.block_on(service.run_once()) {
        Ok(outcome) => Ok(exit_status(outcome.exit_code())),
        Err(e) => {
            error!(error = %e, "Run failed");
            Ok(exit_status(e.exit_code()))
        }
    }
}

fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(2)
}

fn check(paths: &[PathBuf], policy: StartOnlyPolicy) {
    let evaluator =
        WindowEvaluator::new(Arc::new(MetadataCodec::new())).with_start_only_policy(policy);
    let now = SystemClock.local_now();
    debug!(%now, "Evaluating windows");

    for path in paths {
        println!("{}\t{}", evaluator.evaluate(path, now), path.display());
    }
}

fn metadata(action: MetadataCommand) -> anyhow::Result<()> {
    let codec = MetadataCodec::new();
    match action {
        MetadataCommand::Read { path } => {
            let map = codec.read(&path)?;
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        MetadataCommand::Write { src, out, entries } => {
            let map: MetadataMap = entries.into_iter().collect();
            codec
                .write(&src, &out, &map)
                .with_context(|| format!("Writing metadata to {}", out.display()))?;
        }
    }
    Ok(())
}
