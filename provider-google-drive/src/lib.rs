//! # Google Drive Provider
//!
//! [`StorageProvider`](bridge_traits::storage::StorageProvider) over Google
//! Drive API v3. Requests go through the host's
//! [`HttpClient`](bridge_traits::http::HttpClient), so the connector is
//! tested against a mocked transport.
//!
//! Non-success statuses map onto [`GoogleDriveError`] and from there onto
//! [`BridgeError`](bridge_traits::error::BridgeError). There is no retry:
//! a failed listing aborts the sync cycle and the next run tries again.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
