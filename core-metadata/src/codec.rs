//! File-level codec: format detection, channel dispatch and atomic output.

use crate::channel::channel_for;
use crate::error::{CodecError, Result};
use crate::format::ContainerFormat;
use crate::MetadataMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Source of per-file metadata for the window evaluator.
///
/// Implemented by [`MetadataCodec`]; tests substitute their own.
pub trait MetadataSource: Send + Sync {
    fn read_metadata(&self, path: &Path) -> Result<MetadataMap>;
}

/// Reads and writes metadata embedded in JPEG, PNG and GIF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataCodec;

impl MetadataCodec {
    pub fn new() -> Self {
        Self
    }

    /// Detect the container of `path` from its magic bytes.
    pub fn detect(&self, path: &Path) -> Result<ContainerFormat> {
        ContainerFormat::detect(path).map_err(|e| CodecError::unreadable(path, e.to_string()))
    }

    /// Read the embedded map.
    ///
    /// Unsupported containers yield an empty map. A supported file whose
    /// structure cannot be parsed fails with [`CodecError::Unreadable`].
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn read(&self, path: &Path) -> Result<MetadataMap> {
        let format = self.detect(path)?;
        let Some(channel) = channel_for(&format) else {
            warn!(format = %format, "No metadata channel for container, treating as empty");
            return Ok(MetadataMap::new());
        };

        let data = fs::read(path).map_err(|e| CodecError::unreadable(path, e.to_string()))?;
        let map = channel
            .read(&data)
            .map_err(|e| e.into_codec_error(path))?;

        debug!(format = %format, keys = map.len(), "Metadata read");
        Ok(map)
    }

    /// Write a copy of `path` to `out_path` carrying exactly `map`.
    ///
    /// Existing embedded metadata in the written channel is replaced. The
    /// output appears atomically; `out_path` may equal `path`.
    ///
    /// # Errors
    ///
    /// - [`CodecError::Unsupported`] for containers without a channel
    /// - [`CodecError::InvalidKey`] if a key cannot be stored (PNG keyword rules)
    /// - [`CodecError::Encode`] if the encoded metadata exceeds format limits
    #[instrument(skip(self, map), fields(path = %path.display(), out = %out_path.display(), keys = map.len()))]
    pub fn write(&self, path: &Path, out_path: &Path, map: &MetadataMap) -> Result<()> {
        let format = self.detect(path)?;
        let Some(channel) = channel_for(&format) else {
            warn!(format = %format, "Metadata write skipped: unsupported container");
            return Err(CodecError::Unsupported {
                format: format.name().to_string(),
            });
        };

        let data = fs::read(path).map_err(|e| CodecError::unreadable(path, e.to_string()))?;
        let encoded = channel
            .write(&data, map)
            .map_err(|e| e.into_codec_error(path))?;

        persist_atomically(path, out_path, &encoded)?;
        info!(format = %format, bytes = encoded.len(), "Metadata written");
        Ok(())
    }
}

impl MetadataSource for MetadataCodec {
    fn read_metadata(&self, path: &Path) -> Result<MetadataMap> {
        self.read(path)
    }
}

/// Write `bytes` next to `out_path` and rename into place, carrying over the
/// source file's permissions.
fn persist_atomically(source: &Path, out_path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match out_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(source) {
        if let Err(e) = fs::set_permissions(tmp.path(), metadata.permissions()) {
            debug!(error = %e, "Could not copy source permissions");
        }
    }

    tmp.persist(out_path).map_err(|e| CodecError::Io(e.error))?;
    Ok(())
}
