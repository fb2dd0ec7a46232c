//! Single-run lock
//!
//! A lock file in the data directory keeps overlapping scheduled runs from
//! racing on the snapshot file and the mirror directory. The file is created
//! exclusively and removed when the guard drops. A lock older than the
//! configured threshold is assumed to belong to a crashed run and is taken
//! over.

use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Guard for an exclusively created lock file.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock at `path`.
    ///
    /// # Errors
    ///
    /// `Error::Lock` if a fresh lock held by another run exists.
    pub fn acquire(path: &Path, stale_after: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match Self::create(path) {
            Ok(lock) => Ok(lock),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !Self::is_stale(path, stale_after) {
                    return Err(Error::Lock(format!(
                        "{} is held by another run",
                        path.display()
                    )));
                }

                warn!(lock = %path.display(), "Replacing abandoned run lock");
                match fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }

                Self::create(path).map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => Error::Lock(format!(
                        "{} was taken by another run",
                        path.display()
                    )),
                    _ => Error::Io(e),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(file, "{}", std::process::id())?;
        debug!(lock = %path.display(), "Run lock acquired");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn is_stale(path: &Path, stale_after: Duration) -> bool {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .map(|age| age > stale_after)
            .unwrap_or(false)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "Failed to release run lock");
        }
    }
}
