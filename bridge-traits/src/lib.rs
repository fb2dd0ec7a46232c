//! # Host Bridge Traits
//!
//! Seams between the content engine and the outside world.
//!
//! ## Overview
//!
//! The engine never talks to a remote API, a clock or an HTTP stack directly.
//! Each of those is expressed here as a trait so that desktop adapters
//! (`bridge-desktop`), remote providers (`provider-google-drive`) and test
//! doubles can be swapped without touching the sync or catalog logic.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP request execution
//! - [`StorageProvider`](storage::StorageProvider) - Remote folder listing, download and delete
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert their transport-specific errors into it and keep the message
//! actionable (status code, file id) without leaking credentials.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single adapter can be shared
//! behind an `Arc` across the service.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{RemoteFileRecord, StorageProvider, FOLDER_MIME_TYPE};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
