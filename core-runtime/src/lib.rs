//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the service and the CLI:
//! - Logging and tracing setup
//! - Configuration loading and validation
//! - Single-run locking of the mirror state
//!
//! ## Overview
//!
//! Nothing in here knows about media files. It decides where state lives,
//! how events are rendered and makes sure two scheduled runs never share the
//! snapshot file and mirror directory at the same time.

pub mod config;
pub mod error;
pub mod lock;
pub mod logging;

pub use config::{AppConfig, AppConfigBuilder, LoggingSettings};
pub use error::{Error, Result};
pub use lock::RunLock;
