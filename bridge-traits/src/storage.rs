//! Remote Storage Abstractions
//!
//! The remote listing record and the provider trait the mirror synchronizer
//! drives. Providers own transport and authentication; the engine only sees
//! records and byte payloads.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// MIME type the remote uses to mark a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// One entry of a remote folder listing.
///
/// Serialized with the remote's camelCase field names so the persisted
/// snapshot file stays readable by older tooling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFileRecord {
    /// Stable identifier, unique per remote object
    pub id: String,

    /// Display name, used as the local file or directory name
    pub name: String,

    /// MIME type reported by the remote
    pub mime_type: String,

    /// Creation time
    pub created_time: DateTime<Utc>,

    /// Last modification time
    pub modified_time: DateTime<Utc>,
}

impl RemoteFileRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        created_time: DateTime<Utc>,
        modified_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            created_time,
            modified_time,
        }
    }

    /// Whether this record is a folder that has to be expanded on download.
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Remote storage provider
///
/// Implemented by cloud connectors. Every call is a blocking step of the
/// sync cycle from the caller's point of view; the synchronizer never issues
/// two requests at once.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageProvider;
///
/// async fn count(provider: &dyn StorageProvider, folder: &str) -> Result<usize> {
///     Ok(provider.list_folder(folder).await?.len())
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List the direct children of a remote folder.
    ///
    /// Implementations follow pagination internally and return the complete
    /// listing. Trashed objects are excluded.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteFileRecord>>;

    /// Download the full content of a remote file.
    async fn download(&self, file_id: &str) -> Result<Bytes>;

    /// Delete a remote object.
    async fn delete(&self, file_id: &str) -> Result<()>;
}
