//! # Showcase Service
//!
//! Wires configuration, the remote provider, the mirror synchronizer and the
//! catalog builder into one scheduled run.
//!
//! ## Run
//!
//! 1. Take the run lock in the data directory
//! 2. Sync the mirror when remote sync is enabled
//! 3. Rebuild the catalog from the mirror, always
//!
//! A failed sync cycle is logged and treated as "nothing synced"; the catalog
//! is still rebuilt because date windows move with the clock even when the
//! remote does not.
//!
//! ## Exit status
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Ran, nothing changed |
//! | 1 | Ran, mirror or catalog changed (the display should reload) |
//! | 2 | Could not run: configuration, credentials, lock or catalog write |
//!
//! ```ignore
//! use core_runtime::AppConfig;
//! use core_service::ShowcaseService;
//!
//! let service = ShowcaseService::from_config(AppConfig::load(path)?)?;
//! let outcome = service.run_once().await?;
//! std::process::exit(outcome.exit_code());
//! ```

pub mod error;

pub use error::{Result, ServiceError};

use bridge_desktop::ReqwestHttpClient;
use bridge_traits::storage::StorageProvider;
use bridge_traits::time::{Clock, SystemClock};
use core_catalog::{CatalogBuilder, CatalogOutcome};
use core_metadata::{MetadataCodec, MetadataSource};
use core_runtime::logging::{redact_if_sensitive, strip_path};
use core_runtime::{AppConfig, RunLock};
use core_schedule::WindowEvaluator;
use core_sync::{JsonSnapshotStore, MirrorSynchronizer, SyncConfig, SyncReport};
use provider_google_drive::GoogleDriveConnector;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Result of one completed run.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// `None` when sync is disabled or the cycle failed
    pub sync: Option<SyncReport>,
    pub catalog: CatalogOutcome,
}

impl CycleOutcome {
    pub fn has_changes(&self) -> bool {
        self.catalog.changed || self.sync.as_ref().is_some_and(SyncReport::has_changes)
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_changes() {
            1
        } else {
            0
        }
    }
}

/// One mirror installation, ready to run.
pub struct ShowcaseService {
    config: AppConfig,
    synchronizer: Option<MirrorSynchronizer>,
    catalog: CatalogBuilder,
    clock: Arc<dyn Clock>,
}

impl ShowcaseService {
    /// Build the service with the desktop HTTP stack and the Google Drive
    /// connector.
    ///
    /// The access token is only resolved when remote sync is enabled.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let provider: Option<Arc<dyn StorageProvider>> = if config.use_remote {
            let token = config.access_token()?;
            debug!(
                access_token = %redact_if_sensitive("access_token", &token),
                "Access token resolved"
            );
            let http = Arc::new(ReqwestHttpClient::new()?);
            Some(Arc::new(GoogleDriveConnector::new(http, token)))
        } else {
            None
        };

        Self::new(
            config,
            provider,
            Arc::new(MetadataCodec::new()),
            Arc::new(SystemClock),
        )
    }

    /// Assemble the service from explicit collaborators.
    ///
    /// # Errors
    ///
    /// `ServiceError::Runtime` if the configuration is invalid or remote sync
    /// is enabled without a provider.
    pub fn new(
        config: AppConfig,
        provider: Option<Arc<dyn StorageProvider>>,
        metadata: Arc<dyn MetadataSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let evaluator =
            WindowEvaluator::new(metadata).with_start_only_policy(config.start_only_policy);

        let synchronizer = match (config.use_remote, config.folder_id(), provider) {
            (false, _, _) => None,
            (true, Some(folder_id), Some(provider)) => {
                let sync_config = SyncConfig::new(folder_id, &config.target_dir)
                    .with_diff_policy(config.diff_policy)
                    .with_expiry_policy(config.expiry_policy);
                Some(MirrorSynchronizer::new(
                    sync_config,
                    provider,
                    Arc::new(JsonSnapshotStore::new(config.snapshot_path())),
                    evaluator.clone(),
                    clock.clone(),
                ))
            }
            (true, _, _) => {
                return Err(core_runtime::Error::CapabilityMissing {
                    capability: "remote provider".to_string(),
                    message: "Remote sync is enabled but no provider was supplied".to_string(),
                }
                .into());
            }
        };

        let catalog = CatalogBuilder::new(&config.target_dir, evaluator);

        Ok(Self {
            config,
            synchronizer,
            catalog,
            clock,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one scheduled cycle.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Runtime` if another run holds the lock
    /// - `ServiceError::Catalog` if the catalog cannot be written
    #[instrument(skip(self), fields(remote = self.synchronizer.is_some()))]
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        let _lock = RunLock::acquire(&self.config.lock_path(), self.config.lock_stale_after())?;

        let sync = match &self.synchronizer {
            Some(synchronizer) => match synchronizer.run_cycle().await {
                Ok(report) => Some(report),
                Err(e) => {
                    error!(error = %e, "Sync cycle aborted, rebuilding catalog from local content");
                    None
                }
            },
            None => {
                debug!("Remote sync disabled");
                None
            }
        };

        let catalog_path = self.config.catalog_path();
        let catalog = self.catalog.rebuild(&catalog_path, self.clock.local_now())?;

        let outcome = CycleOutcome { sync, catalog };
        info!(
            catalog = %strip_path(&catalog_path.to_string_lossy()),
            changed = outcome.has_changes(),
            "Run complete"
        );
        Ok(outcome)
    }
}
