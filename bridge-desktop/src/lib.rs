//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and kiosk hosts
//! (Linux, Raspberry Pi OS, macOS, Windows).
//!
//! - `HttpClient` using `reqwest` with rustls
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let connector = GoogleDriveConnector::new(http_client, token);
//! ```

mod http;

pub use http::ReqwestHttpClient;
