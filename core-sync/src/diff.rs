//! Remote listing diff.

use crate::snapshot::SyncSnapshot;
use bridge_traits::storage::RemoteFileRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How records from two listings are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffPolicy {
    /// Match by `id`; a changed `name` counts as removed plus added since the
    /// mirror is keyed by name. Timestamp-only changes are ignored.
    #[default]
    ById,
    /// Match by full record equality
    ByRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// In current-listing order
    pub added: Vec<RemoteFileRecord>,
    /// In previous-snapshot order
    pub removed: Vec<RemoteFileRecord>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Classify `curr` against `prev`.
///
/// An empty `prev` is a cold start: all of `curr` is added, nothing removed.
pub fn diff(prev: &SyncSnapshot, curr: &SyncSnapshot, policy: DiffPolicy) -> DiffResult {
    if prev.is_empty() {
        return DiffResult {
            added: curr.records().to_vec(),
            removed: Vec::new(),
        };
    }

    match policy {
        DiffPolicy::ById => {
            let prev_names: HashMap<&str, &str> =
                prev.iter().map(|r| (r.id.as_str(), r.name.as_str())).collect();
            let curr_names: HashMap<&str, &str> =
                curr.iter().map(|r| (r.id.as_str(), r.name.as_str())).collect();

            DiffResult {
                added: unmatched(curr, |r| prev_names.get(r.id.as_str()) == Some(&r.name.as_str())),
                removed: unmatched(prev, |r| curr_names.get(r.id.as_str()) == Some(&r.name.as_str())),
            }
        }
        DiffPolicy::ByRecord => {
            let prev_set: HashSet<&RemoteFileRecord> = prev.iter().collect();
            let curr_set: HashSet<&RemoteFileRecord> = curr.iter().collect();

            DiffResult {
                added: unmatched(curr, |r| prev_set.contains(r)),
                removed: unmatched(prev, |r| curr_set.contains(r)),
            }
        }
    }
}

fn unmatched(
    snapshot: &SyncSnapshot,
    matched: impl Fn(&RemoteFileRecord) -> bool,
) -> Vec<RemoteFileRecord> {
    snapshot.iter().filter(|r| !matched(r)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, day, 9, 0, 0).unwrap()
    }

    fn record(id: &str, name: &str, modified_day: u32) -> RemoteFileRecord {
        RemoteFileRecord::new(id, name, "image/jpeg", ts(1), ts(modified_day))
    }

    fn snapshot(records: &[RemoteFileRecord]) -> SyncSnapshot {
        SyncSnapshot::from_records(records.to_vec())
    }

    #[test]
    fn test_identical_snapshots_are_idempotent() {
        let s = snapshot(&[record("a", "a.jpg", 1), record("b", "b.jpg", 1)]);
        for policy in [DiffPolicy::ById, DiffPolicy::ByRecord] {
            assert!(diff(&s, &s, policy).is_empty());
        }
    }

    #[test]
    fn test_cold_start_adds_everything() {
        let curr = snapshot(&[record("a", "a.jpg", 1), record("b", "b.jpg", 1)]);
        let result = diff(&SyncSnapshot::new(), &curr, DiffPolicy::ById);

        assert_eq!(result.added, curr.records());
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_additions_and_removals_keep_order() {
        let prev = snapshot(&[record("a", "a.jpg", 1), record("b", "b.jpg", 1), record("c", "c.jpg", 1)]);
        let curr = snapshot(&[record("d", "d.jpg", 2), record("b", "b.jpg", 1), record("e", "e.jpg", 2)]);

        let result = diff(&prev, &curr, DiffPolicy::ById);
        let names = |records: &[RemoteFileRecord]| {
            records.iter().map(|r| r.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&result.added), ["d.jpg", "e.jpg"]);
        assert_eq!(names(&result.removed), ["a.jpg", "c.jpg"]);
    }

    #[test]
    fn test_modified_time_only_change() {
        let prev = snapshot(&[record("a", "a.jpg", 1)]);
        let curr = snapshot(&[record("a", "a.jpg", 5)]);

        assert!(diff(&prev, &curr, DiffPolicy::ById).is_empty());

        let by_record = diff(&prev, &curr, DiffPolicy::ByRecord);
        assert_eq!(by_record.added, curr.records());
        assert_eq!(by_record.removed, prev.records());
    }

    #[test]
    fn test_rename_by_id() {
        let prev = snapshot(&[record("a", "old.jpg", 1)]);
        let curr = snapshot(&[record("a", "new.jpg", 1)]);

        let result = diff(&prev, &curr, DiffPolicy::ById);
        assert_eq!(result.added[0].name, "new.jpg");
        assert_eq!(result.removed[0].name, "old.jpg");
    }

    #[test]
    fn test_everything_removed() {
        let prev = snapshot(&[record("a", "a.jpg", 1)]);
        let result = diff(&prev, &SyncSnapshot::new(), DiffPolicy::ById);
        assert!(result.added.is_empty());
        assert_eq!(result.removed, prev.records());
    }
}
