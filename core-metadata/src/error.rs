use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unreadable media file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Unsupported container format: {format}")]
    Unsupported { format: String },

    #[error("Invalid metadata key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Failed to encode metadata: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub(crate) fn unreadable(path: &Path, reason: impl Into<String>) -> Self {
        CodecError::Unreadable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Errors a caller should log and move past rather than abort on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodecError::Unsupported { .. })
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Failure inside a container channel, before a path is attached.
#[derive(Debug)]
pub(crate) enum FormatError {
    Malformed(String),
    Encode(String),
    InvalidKey { key: String, reason: String },
}

impl FormatError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        FormatError::Malformed(reason.into())
    }

    pub(crate) fn into_codec_error(self, path: &Path) -> CodecError {
        match self {
            FormatError::Malformed(reason) => CodecError::unreadable(path, reason),
            FormatError::Encode(reason) => CodecError::Encode(reason),
            FormatError::InvalidKey { key, reason } => CodecError::InvalidKey { key, reason },
        }
    }
}
