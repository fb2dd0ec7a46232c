//! # Mirror Synchronizer
//!
//! Runs one synchronization cycle between a remote folder and the local
//! mirror directory.
//!
//! ## Workflow
//!
//! 1. List the remote folder (failure aborts the cycle, nothing is touched)
//! 2. Diff the listing against the stored snapshot
//! 3. Download added records; folders are expanded with a worklist
//! 4. Delete local copies of removed records
//! 5. Persist the listing as the new snapshot, even when nothing changed;
//!    records whose download failed are left out so the next cycle retries them
//! 6. Reconcile: delete top-level local entries absent from the listing
//! 7. Expire: delete local files whose display window has passed, and
//!    optionally their remote originals
//!
//! Every step is awaited in order; there is no internal parallelism.
//! Downloads write to a `.part` sibling and rename into place, so a cycle
//! interrupted at any point is repaired by the next one.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{JsonSnapshotStore, MirrorSynchronizer, SyncConfig};
//!
//! let synchronizer = MirrorSynchronizer::new(
//!     SyncConfig::new("1bCGQ...", "/srv/showcase/content"),
//!     provider,
//!     Arc::new(JsonSnapshotStore::new("app_data/changes_state.json")),
//!     evaluator,
//!     Arc::new(SystemClock),
//! );
//! let report = synchronizer.run_cycle().await?;
//! if report.has_changes() { /* restart the display */ }
//! ```

use crate::diff::{diff, DiffPolicy};
use crate::snapshot::{SnapshotStore, SyncSnapshot};
use crate::{Result, SyncError};
use bridge_traits::storage::{RemoteFileRecord, StorageProvider};
use bridge_traits::time::Clock;
use core_schedule::{WindowEvaluator, WindowState};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Whether expiring local content also deletes it remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    #[default]
    LocalOnly,
    LocalAndRemote,
}

/// Synchronizer configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote folder to mirror
    pub folder_id: String,
    /// Local mirror directory
    pub target_dir: PathBuf,
    pub diff_policy: DiffPolicy,
    pub expiry_policy: ExpiryPolicy,
}

impl SyncConfig {
    pub fn new(folder_id: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            folder_id: folder_id.into(),
            target_dir: target_dir.into(),
            diff_policy: DiffPolicy::default(),
            expiry_policy: ExpiryPolicy::default(),
        }
    }

    pub fn with_diff_policy(mut self, policy: DiffPolicy) -> Self {
        self.diff_policy = policy;
        self
    }

    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }
}

/// Outcome of one cycle. Entries are remote names or mirror-relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<String>,
    pub strays_removed: Vec<String>,
    pub expired: Vec<String>,
    pub remote_deleted: Vec<String>,
}

impl SyncReport {
    /// Whether the mirror content changed in a way the display has to pick up.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
            || !self.removed.is_empty()
            || !self.strays_removed.is_empty()
            || !self.expired.is_empty()
    }
}

pub struct MirrorSynchronizer {
    config: SyncConfig,
    provider: Arc<dyn StorageProvider>,
    store: Arc<dyn SnapshotStore>,
    evaluator: WindowEvaluator,
    clock: Arc<dyn Clock>,
}

impl MirrorSynchronizer {
    pub fn new(
        config: SyncConfig,
        provider: Arc<dyn StorageProvider>,
        store: Arc<dyn SnapshotStore>,
        evaluator: WindowEvaluator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            provider,
            store,
            evaluator,
            clock,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one full cycle.
    ///
    /// # Errors
    ///
    /// - `SyncError::Provider` if the remote listing fails; the mirror and the
    ///   snapshot are left untouched
    /// - `SyncError::Io` / `SyncError::Snapshot` if the mirror directory or
    ///   the snapshot cannot be written
    #[instrument(skip(self), fields(folder = %self.config.folder_id))]
    pub async fn run_cycle(&self) -> Result<SyncReport> {
        info!("Phase 1: Listing remote folder");
        let listing = self
            .provider
            .list_folder(&self.config.folder_id)
            .await
            .map_err(|e| SyncError::Provider(format!("Failed to list folder: {}", e)))?;
        let curr = SyncSnapshot::from_records(listing);

        let prev = self.store.load();
        let changes = diff(&prev, &curr, self.config.diff_policy);
        info!(
            listed = curr.len(),
            added = changes.added.len(),
            removed = changes.removed.len(),
            cold_start = prev.is_empty(),
            "Phase 2: Listing compared with snapshot"
        );

        fs::create_dir_all(&self.config.target_dir)?;
        let mut report = SyncReport::default();
        let mut failed_ids = HashSet::new();

        if !changes.added.is_empty() {
            info!("Phase 3: Downloading {} records", changes.added.len());
        }
        for record in &changes.added {
            match self.download_record(record).await {
                Ok(()) => {
                    info!(name = %record.name, "Downloaded");
                    report.added.push(record.name.clone());
                }
                Err(e) => {
                    warn!(name = %record.name, error = %e, "Download failed, skipping");
                    report.failed.push(record.name.clone());
                    failed_ids.insert(record.id.as_str());
                }
            }
        }

        let current_names = curr.names();
        for record in &changes.removed {
            // A same-named replacement was just downloaded.
            if current_names.contains(record.name.as_str()) {
                debug!(name = %record.name, "Removed record still listed under a new id");
                continue;
            }
            match self.remove_local(&record.name) {
                Ok(true) => {
                    info!(name = %record.name, "Removed local copy");
                    report.removed.push(record.name.clone());
                }
                Ok(false) => debug!(name = %record.name, "Removed record had no local copy"),
                Err(e) => warn!(name = %record.name, error = %e, "Failed to remove local copy"),
            }
        }

        self.store.save(&curr.without_ids(&failed_ids))?;
        debug!(retry = failed_ids.len(), "Phase 5: Snapshot persisted");

        report.strays_removed = self.reconcile(&current_names)?;
        self.expire(&curr, &mut report).await;

        info!(
            added = report.added.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            strays = report.strays_removed.len(),
            expired = report.expired.len(),
            "Cycle complete"
        );
        Ok(report)
    }

    /// Download one added record. Folders are expanded breadth-first; a
    /// folder id seen twice is not expanded again. Every reachable file is
    /// attempted even if a sibling fails; the first failure is returned.
    async fn download_record(&self, record: &RemoteFileRecord) -> Result<()> {
        let mut worklist = VecDeque::from([(record.clone(), self.config.target_dir.clone())]);
        let mut expanded = HashSet::new();
        let mut first_error = None;

        while let Some((item, parent)) = worklist.pop_front() {
            let outcome = if item.is_folder() {
                if !expanded.insert(item.id.clone()) {
                    warn!(folder = %item.name, "Folder reached twice, not expanding again");
                    continue;
                }
                self.expand_folder(&item, &parent).await.map(|children| {
                    worklist.extend(children);
                })
            } else {
                self.download_file(&item, &parent).await
            };

            if let Err(e) = outcome {
                warn!(name = %item.name, error = %e, "Item failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn expand_folder(
        &self,
        folder: &RemoteFileRecord,
        parent: &Path,
    ) -> Result<Vec<(RemoteFileRecord, PathBuf)>> {
        let dir = parent.join(validate_name(&folder.name)?);
        fs::create_dir_all(&dir)?;

        let children = self
            .provider
            .list_folder(&folder.id)
            .await
            .map_err(|e| SyncError::Download {
                name: folder.name.clone(),
                reason: e.to_string(),
            })?;
        debug!(folder = %folder.name, children = children.len(), "Folder expanded");

        Ok(children.into_iter().map(|child| (child, dir.clone())).collect())
    }

    async fn download_file(&self, file: &RemoteFileRecord, parent: &Path) -> Result<()> {
        let name = validate_name(&file.name)?;
        let bytes = self
            .provider
            .download(&file.id)
            .await
            .map_err(|e| SyncError::Download {
                name: file.name.clone(),
                reason: e.to_string(),
            })?;

        let dest = parent.join(name);
        let part = parent.join(format!(".{}.part", name));
        fs::write(&part, &bytes)?;
        if let Err(e) = fs::rename(&part, &dest) {
            let _ = fs::remove_file(&part);
            return Err(e.into());
        }

        debug!(name = %file.name, bytes = bytes.len(), "File written");
        Ok(())
    }

    /// Returns `false` when there was nothing to delete.
    fn remove_local(&self, name: &str) -> Result<bool> {
        let path = self.config.target_dir.join(validate_name(name)?);
        match remove_path(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete top-level mirror entries that the remote no longer lists.
    fn reconcile(&self, current_names: &HashSet<&str>) -> Result<Vec<String>> {
        let mut strays = Vec::new();

        for entry in fs::read_dir(&self.config.target_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if current_names.contains(name.as_str()) {
                continue;
            }

            match remove_path(&entry.path()) {
                Ok(()) => {
                    info!(name = %name, "Removed stray local entry");
                    strays.push(name);
                }
                Err(e) => warn!(name = %name, error = %e, "Failed to remove stray entry"),
            }
        }

        strays.sort();
        Ok(strays)
    }

    /// Delete mirrored files whose window has passed.
    async fn expire(&self, curr: &SyncSnapshot, report: &mut SyncReport) {
        let now = self.clock.local_now();
        let root = &self.config.target_dir;

        let expired: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable mirror entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.evaluator.evaluate(path, now) == WindowState::Expired)
            .collect();

        for path in expired {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(path.as_path())
                .to_string_lossy()
                .into_owned();

            if let Err(e) = fs::remove_file(&path) {
                warn!(file = %relative, error = %e, "Failed to delete expired file");
                continue;
            }
            info!(file = %relative, "Expired file deleted");
            report.expired.push(relative.clone());

            if self.config.expiry_policy != ExpiryPolicy::LocalAndRemote
                || path.parent() != Some(root.as_path())
            {
                continue;
            }
            let Some(record) = curr.find_by_name(&relative) else {
                continue;
            };
            match self.provider.delete(&record.id).await {
                Ok(()) => {
                    info!(name = %record.name, "Expired file deleted remotely");
                    report.remote_deleted.push(record.name.clone());
                }
                Err(e) => warn!(name = %record.name, error = %e, "Remote delete failed"),
            }
        }
    }
}

/// Accept a remote name only if it is a single, plain path component.
fn validate_name(name: &str) -> Result<&str> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0']);
    if plain {
        Ok(name)
    } else {
        Err(SyncError::InvalidName(name.to_string()))
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("poster_01_01_2022.png").is_ok());
        assert!(validate_name(".hidden").is_ok());
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b", "nul\0"] {
            assert!(matches!(validate_name(bad), Err(SyncError::InvalidName(_))), "{bad:?}");
        }
    }

    #[test]
    fn test_report_changes() {
        let mut report = SyncReport::default();
        assert!(!report.has_changes());

        report.failed.push("broken.png".to_string());
        report.remote_deleted.push("old.png".to_string());
        assert!(!report.has_changes());

        report.strays_removed.push("leftover.png".to_string());
        assert!(report.has_changes());
    }
}
