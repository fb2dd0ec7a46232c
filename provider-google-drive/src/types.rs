//! Google Drive API response types
//!
//! Data structures for deserializing Google Drive API v3 responses.

use bridge_traits::storage::RemoteFileRecord;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{GoogleDriveError, Result};

/// Google Drive API file resource, limited to the requested fields
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,

    pub name: String,

    pub mime_type: String,

    /// Creation time (RFC 3339)
    pub created_time: String,

    /// Modification time (RFC 3339)
    pub modified_time: String,
}

impl DriveFile {
    /// Convert into the engine's listing record.
    pub fn into_record(self) -> Result<RemoteFileRecord> {
        let created_time = parse_timestamp(&self.id, &self.created_time)?;
        let modified_time = parse_timestamp(&self.id, &self.modified_time)?;
        Ok(RemoteFileRecord::new(
            self.id,
            self.name,
            self.mime_type,
            created_time,
            modified_time,
        ))
    }
}

fn parse_timestamp(file_id: &str, rfc3339: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            GoogleDriveError::ParseError(format!(
                "Invalid timestamp '{}' on file {}: {}",
                rfc3339, file_id, e
            ))
        })
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesListResponse {
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// Token for next page
    pub next_page_token: Option<String>,
}
