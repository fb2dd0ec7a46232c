//! Catalog construction from the mirror directory.

use crate::catalog::{ContentCatalog, MediaKind};
use crate::error::Result;
use chrono::NaiveDateTime;
use core_schedule::WindowEvaluator;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogOutcome {
    pub catalog: ContentCatalog,
    /// Whether the catalog differs from the previously written one
    pub changed: bool,
}

/// Walks the mirror and keeps files whose window is active.
#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    mirror_dir: PathBuf,
    evaluator: WindowEvaluator,
}

impl CatalogBuilder {
    pub fn new(mirror_dir: impl Into<PathBuf>, evaluator: WindowEvaluator) -> Self {
        Self {
            mirror_dir: mirror_dir.into(),
            evaluator,
        }
    }

    /// Build the catalog of content active at `now`.
    ///
    /// Paths are absolute and sorted. A missing mirror directory yields an
    /// empty catalog; unreadable entries and non UTF-8 paths are skipped.
    pub fn build(&self, now: NaiveDateTime) -> Result<ContentCatalog> {
        let root = match fs::canonicalize(&self.mirror_dir) {
            Ok(root) => root,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(dir = %self.mirror_dir.display(), "Mirror directory missing, catalog is empty");
                return Ok(ContentCatalog::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut catalog = ContentCatalog::default();
        for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable mirror entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            // The catalog file stores paths as JSON strings.
            if path.to_str().is_none() {
                warn!(file = %path.display(), "Skipping file with a non UTF-8 path");
                continue;
            }
            let Some(kind) = MediaKind::from_path(path) else {
                debug!(file = %path.display(), "Not a displayable file");
                continue;
            };
            if !self.evaluator.is_active(path, now) {
                continue;
            }

            match kind {
                MediaKind::Image => catalog.images.push(path.to_path_buf()),
                MediaKind::Video => catalog.videos.push(path.to_path_buf()),
            }
        }

        catalog.images.sort();
        catalog.videos.sort();
        Ok(catalog)
    }

    /// Build the catalog, compare it with the one at `catalog_path`, and
    /// write the new one.
    #[instrument(skip(self), fields(mirror = %self.mirror_dir.display()))]
    pub fn rebuild(&self, catalog_path: &Path, now: NaiveDateTime) -> Result<CatalogOutcome> {
        let previous = ContentCatalog::load_or_default(catalog_path);
        let catalog = self.build(now)?;
        let changed = catalog != previous;

        catalog.save(catalog_path)?;
        info!(
            images = catalog.images.len(),
            videos = catalog.videos.len(),
            changed,
            "Catalog rebuilt"
        );

        Ok(CatalogOutcome { catalog, changed })
    }
}
