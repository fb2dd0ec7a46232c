//! # Mirror Synchronization
//!
//! Keeps a local directory in step with one remote folder.
//!
//! ## Components
//!
//! - **Snapshot** (`snapshot`): the last successfully observed remote listing
//!   and its JSON file store
//! - **Diff Engine** (`diff`): classifies a fresh listing against the
//!   snapshot into added and removed records
//! - **Mirror Synchronizer** (`coordinator`): runs one cycle of list, diff,
//!   download, delete, persist, reconcile and expire
//!
//! A cycle is strictly sequential. Only a failed listing aborts it; per-item
//! failures are logged and reported in the [`SyncReport`].

pub mod coordinator;
pub mod diff;
pub mod error;
pub mod snapshot;

pub use coordinator::{ExpiryPolicy, MirrorSynchronizer, SyncConfig, SyncReport};
pub use diff::{diff, DiffPolicy, DiffResult};
pub use error::{Result, SyncError};
pub use snapshot::{JsonSnapshotStore, SnapshotStore, SyncSnapshot};
