use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Listing or transport failure; aborts the cycle before any local change.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Failed to download {name}: {reason}")]
    Download { name: String, reason: String },

    #[error("Invalid remote name: {0:?}")]
    InvalidName(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
