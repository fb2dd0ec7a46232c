//! # Content Catalog
//!
//! Builds the list of currently displayable files from the local mirror.
//!
//! The catalog is a derived cache: it is rebuilt from scratch on every run,
//! written in one atomic replace, and compared with the previous catalog so
//! the caller can tell the display process to reload.
//!
//! ```json
//! {"IMAGES": ["/srv/content/menu_03_03_2022.png"], "VIDEOS": []}
//! ```

pub mod builder;
pub mod catalog;
pub mod error;

pub use builder::{CatalogBuilder, CatalogOutcome};
pub use catalog::{ContentCatalog, MediaKind};
pub use error::{CatalogError, Result};
