//! # Configuration
//!
//! `AppConfig` describes one mirror installation: where content lives
//! locally, which remote folder feeds it, and the policies applied while
//! syncing and evaluating date windows.
//!
//! ## Sources
//!
//! Configuration is read from a JSON file. Both snake_case keys and the
//! upper-case keys used by older deployments are accepted:
//!
//! ```json
//! {
//!     "TARGET_DIR": "./content",
//!     "USE_GDRIVE": true,
//!     "DRIVE_DIR_ID": "1bCGQehPOsDEJiI7RzEAyVbSzngfQMpdf",
//!     "GOOGLE_API_ACCESS": "./credentials/token.json",
//!     "expiry_policy": "local_and_remote"
//! }
//! ```
//!
//! Unknown keys are ignored, so the display front end can share the file.
//! Relative paths are resolved against the directory holding the file.
//!
//! ## Building in code
//!
//! ```ignore
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .target_dir("/srv/showcase/content")
//!     .data_dir("/srv/showcase/app_data")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::{LogFormat, LoggingConfig};
use bridge_traits::time::LogLevel;
use core_schedule::StartOnlyPolicy;
use core_sync::{DiffPolicy, ExpiryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the credentials file.
pub const ACCESS_TOKEN_ENV: &str = "SHOWCASE_ACCESS_TOKEN";

const SNAPSHOT_FILE: &str = "changes_state.json";
const CATALOG_FILE: &str = "current_files.json";
const LOCK_FILE: &str = "showcase.lock";

fn default_data_dir() -> PathBuf {
    PathBuf::from("app_data")
}

fn default_lock_stale_after_secs() -> u64 {
    3600
}

/// Logging section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: Option<LogLevel>,
    #[serde(default)]
    pub format: Option<LogFormat>,
    #[serde(default)]
    pub filter: Option<String>,
}

impl LoggingSettings {
    /// Turn the file settings into a subscriber configuration.
    pub fn to_logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default();
        if let Some(level) = self.level {
            config = config.with_level(level);
        }
        if let Some(format) = self.format {
            config = config.with_format(format);
        }
        if let Some(filter) = &self.filter {
            config = config.with_filter(filter.clone());
        }
        config
    }
}

/// Mirror installation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local mirror directory, also the root the catalog is built from
    #[serde(alias = "TARGET_DIR")]
    pub target_dir: PathBuf,

    /// Whether the remote folder is mirrored at all
    #[serde(alias = "USE_GDRIVE", default)]
    pub use_remote: bool,

    /// Remote folder identifier
    #[serde(alias = "DRIVE_DIR_ID", default)]
    pub remote_folder_id: Option<String>,

    /// File holding the remote access token
    #[serde(alias = "GOOGLE_API_ACCESS", default)]
    pub credentials: Option<PathBuf>,

    /// Directory for the snapshot, catalog and lock files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub diff_policy: DiffPolicy,

    #[serde(default)]
    pub start_only_policy: StartOnlyPolicy,

    #[serde(default)]
    pub expiry_policy: ExpiryPolicy,

    /// Age after which a leftover lock file is treated as abandoned
    #[serde(default = "default_lock_stale_after_secs")]
    pub lock_stale_after_secs: u64,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Creates a new builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load, resolve and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config {}: {}", path.display(), e))
        })?;

        let mut config: AppConfig = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_relative_to(base);
        config.validate()?;

        Ok(config)
    }

    /// Anchor relative paths at `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        anchor(&mut self.target_dir);
        anchor(&mut self.data_dir);
        if let Some(credentials) = self.credentials.as_mut() {
            anchor(credentials);
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.target_dir.as_os_str().is_empty() {
            return Err(Error::Config("Target directory cannot be empty".to_string()));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("Data directory cannot be empty".to_string()));
        }

        if self.use_remote && self.folder_id().is_none() {
            return Err(Error::Config(
                "Remote sync enabled but no remote folder id configured. \
                 Set DRIVE_DIR_ID or disable USE_GDRIVE."
                    .to_string(),
            ));
        }

        if self.lock_stale_after_secs == 0 {
            return Err(Error::Config(
                "lock_stale_after_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Remote folder id, treating a blank value as unset.
    pub fn folder_id(&self) -> Option<&str> {
        self.remote_folder_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }

    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_secs(self.lock_stale_after_secs)
    }

    /// Resolve the remote access token.
    ///
    /// `SHOWCASE_ACCESS_TOKEN` wins over the credentials file. The file may
    /// hold the bare token or a JSON object with an `access_token` field.
    pub fn access_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }

        let path = self.credentials.as_ref().ok_or_else(|| Error::CapabilityMissing {
            capability: "access token".to_string(),
            message: format!(
                "Set {} or point GOOGLE_API_ACCESS at a token file.",
                ACCESS_TOKEN_ENV
            ),
        })?;

        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read credentials {}: {}", path.display(), e))
        })?;

        parse_token(&raw).ok_or_else(|| {
            Error::Config(format!("No access token found in {}", path.display()))
        })
    }
}

fn parse_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
        return value
            .get("access_token")
            .or_else(|| value.get("token"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
    }
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Builder for [`AppConfig`].
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    target_dir: Option<PathBuf>,
    use_remote: bool,
    remote_folder_id: Option<String>,
    credentials: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    diff_policy: DiffPolicy,
    start_only_policy: StartOnlyPolicy,
    expiry_policy: ExpiryPolicy,
    lock_stale_after_secs: Option<u64>,
    logging: LoggingSettings,
}

impl AppConfigBuilder {
    pub fn target_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.target_dir = Some(path.into());
        self
    }

    /// Enables remote sync against the given folder.
    pub fn remote_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.use_remote = true;
        self.remote_folder_id = Some(folder_id.into());
        self
    }

    pub fn credentials<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.credentials = Some(path.into());
        self
    }

    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn diff_policy(mut self, policy: DiffPolicy) -> Self {
        self.diff_policy = policy;
        self
    }

    pub fn start_only_policy(mut self, policy: StartOnlyPolicy) -> Self {
        self.start_only_policy = policy;
        self
    }

    pub fn expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    pub fn lock_stale_after_secs(mut self, secs: u64) -> Self {
        self.lock_stale_after_secs = Some(secs);
        self
    }

    pub fn logging(mut self, logging: LoggingSettings) -> Self {
        self.logging = logging;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<AppConfig> {
        let target_dir = self.target_dir.ok_or_else(|| {
            Error::Config("Target directory is required. Use .target_dir() to set it.".to_string())
        })?;

        let config = AppConfig {
            target_dir,
            use_remote: self.use_remote,
            remote_folder_id: self.remote_folder_id,
            credentials: self.credentials,
            data_dir: self.data_dir.unwrap_or_else(default_data_dir),
            diff_policy: self.diff_policy,
            start_only_policy: self.start_only_policy,
            expiry_policy: self.expiry_policy,
            lock_stale_after_secs: self
                .lock_stale_after_secs
                .unwrap_or_else(default_lock_stale_after_secs),
            logging: self.logging,
        };

        config.validate()?;

        Ok(config)
    }
}
