//! Persisted remote listing.
//!
//! The snapshot is replaced wholesale at the end of every successful
//! listing, never merged. Loading follows a load-or-default-empty contract:
//! a missing or unreadable file is a cold start, not an error.

use crate::error::{Result, SyncError};
use bridge_traits::storage::RemoteFileRecord;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Ordered set of remote records, unique by `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    records: Vec<RemoteFileRecord>,
}

impl SyncSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot, keeping the first record seen for each `id`.
    pub fn from_records(records: impl IntoIterator<Item = RemoteFileRecord>) -> Self {
        let mut seen = HashSet::new();
        let records = records
            .into_iter()
            .filter(|record| {
                let fresh = seen.insert(record.id.clone());
                if !fresh {
                    debug!(id = %record.id, name = %record.name, "Dropping duplicate remote record");
                }
                fresh
            })
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[RemoteFileRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteFileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RemoteFileRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RemoteFileRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    /// Copy of this snapshot minus the given ids, order preserved.
    pub fn without_ids(&self, ids: &HashSet<&str>) -> Self {
        let records = self
            .records
            .iter()
            .filter(|record| !ids.contains(record.id.as_str()))
            .cloned()
            .collect();
        Self { records }
    }

    /// Local names the mirror is expected to hold.
    pub fn names(&self) -> HashSet<&str> {
        self.records.iter().map(|record| record.name.as_str()).collect()
    }
}

/// Persistence for the last observed listing.
pub trait SnapshotStore: Send + Sync {
    /// Load the previous snapshot; empty on first run or unreadable state.
    fn load(&self) -> SyncSnapshot;

    /// Replace the stored snapshot atomically.
    fn save(&self, snapshot: &SyncSnapshot) -> Result<()>;
}

/// Snapshot kept in a single JSON file.
///
/// Accepts an array of records, an object whose values are records, or
/// `{"files": [...]}`. Always writes an array.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8]) -> Option<SyncSnapshot> {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Snapshot is not valid JSON");
                return None;
            }
        };

        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("files") {
                Some(Value::Array(items)) if map.is_empty() => items,
                Some(files) => {
                    map.insert("files".to_string(), files);
                    map.into_iter().map(|(_, v)| v).collect()
                }
                None => map.into_iter().map(|(_, v)| v).collect(),
            },
            _ => {
                warn!(path = %self.path.display(), "Snapshot has unexpected shape");
                return None;
            }
        };

        match items
            .into_iter()
            .map(serde_json::from_value::<RemoteFileRecord>)
            .collect::<std::result::Result<Vec<_>, _>>()
        {
            Ok(records) => Some(SyncSnapshot::from_records(records)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Snapshot entries are not remote records");
                None
            }
        }
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> SyncSnapshot {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No snapshot yet, cold start");
                return SyncSnapshot::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Snapshot unreadable, cold start");
                return SyncSnapshot::new();
            }
        };

        self.parse(&bytes).unwrap_or_default()
    }

    fn save(&self, snapshot: &SyncSnapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(snapshot.records())
            .map_err(|e| SyncError::Snapshot(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| SyncError::Snapshot(format!("{}: {}", self.path.display(), e.error)))?;

        debug!(path = %self.path.display(), records = snapshot.len(), "Snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(id: &str, name: &str) -> RemoteFileRecord {
        let ts = Utc.with_ymd_and_hms(2022, 1, 10, 8, 0, 0).unwrap();
        RemoteFileRecord::new(id, name, "image/png", ts, ts)
    }

    #[test]
    fn test_from_records_first_occurrence_wins() {
        let snapshot = SyncSnapshot::from_records(vec![
            record("a", "first.png"),
            record("b", "other.png"),
            record("a", "second.png"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("a").unwrap().name, "first.png");
        assert!(snapshot.names().contains("other.png"));
    }

    #[test]
    fn test_without_ids_keeps_order() {
        let snapshot = SyncSnapshot::from_records(vec![
            record("a", "a.png"),
            record("b", "b.png"),
            record("c", "c.png"),
        ]);
        let kept = snapshot.without_ids(&HashSet::from(["b"]));
        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(snapshot.without_ids(&HashSet::new()), snapshot);
    }

    #[test]
    fn test_missing_file_is_cold_start() {
        let dir = TempDir::new().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("changes_state.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("app_data/changes_state.json"));
        let snapshot = SyncSnapshot::from_records(vec![record("a", "x.png"), record("b", "y.png")]);

        store.save(&snapshot).unwrap();
        assert_eq!(store.load(), snapshot);

        let raw: Value = serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert!(raw.is_array());
        assert_eq!(raw[0]["mimeType"], "image/png");
    }

    #[test]
    fn test_accepts_object_shapes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonSnapshotStore::new(&path);
        let entry = serde_json::to_value(record("a", "x.png")).unwrap();

        fs::write(&path, serde_json::json!({ "files": [entry.clone()] }).to_string()).unwrap();
        assert_eq!(store.load().len(), 1);

        fs::write(&path, serde_json::json!({ "a": entry }).to_string()).unwrap();
        assert_eq!(store.load().get("a").unwrap().name, "x.png");
    }

    #[test]
    fn test_corrupt_state_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonSnapshotStore::new(&path);

        fs::write(&path, "{ not json").unwrap();
        assert!(store.load().is_empty());

        fs::write(&path, r#"{"poster.png": "2022-01-01T00:00:00Z"}"#).unwrap();
        assert!(store.load().is_empty());

        fs::write(&path, "42").unwrap();
        assert!(store.load().is_empty());
    }
}
