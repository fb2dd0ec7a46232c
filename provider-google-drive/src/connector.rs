//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::storage::{RemoteFileRecord, StorageProvider};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::GoogleDriveError;
use crate::types::FilesListResponse;

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Fields requested for each listed file
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,createdTime,modifiedTime)";

const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Google Drive API connector
///
/// Lists, downloads and deletes objects of a shared folder. The access token
/// is used as-is; acquiring and refreshing it is the caller's business.
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::StorageProvider;
///
/// let connector = GoogleDriveConnector::new(http_client, access_token);
/// let records = connector.list_folder("1AbCdEf").await?;
/// ```
pub struct GoogleDriveConnector {
    http_client: Arc<dyn HttpClient>,

    /// OAuth 2.0 access token
    access_token: String,
}

impl std::fmt::Debug for GoogleDriveConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveConnector")
            .field("access_token", &"***")
            .finish_non_exhaustive()
    }
}

impl GoogleDriveConnector {
    /// Create a new Google Drive connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `access_token` - OAuth 2.0 access token with a `drive` scope
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: impl Into<String>) -> Self {
        Self {
            http_client,
            access_token: access_token.into(),
        }
    }

    fn list_url(folder_id: &str, page_token: Option<&str>) -> String {
        let query = format!("'{}' in parents and trashed=false", escape_query(folder_id));
        let mut url = format!(
            "{}/files?q={}&pageSize={}&fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(&query),
            MAX_PAGE_SIZE,
            urlencoding::encode(LIST_FIELDS)
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        url
    }

    fn file_url(file_id: &str) -> String {
        format!("{}/files/{}", DRIVE_API_BASE, urlencoding::encode(file_id))
    }

    /// Send a request and turn non-success statuses into provider errors.
    async fn send(
        &self,
        request: HttpRequest,
        file_id: Option<&str>,
    ) -> std::result::Result<HttpResponse, GoogleDriveError> {
        let request = request.bearer_token(self.access_token.as_str());
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| GoogleDriveError::NetworkError(e.to_string()))?;

        if response.is_success() {
            debug!("API request succeeded: status={}", response.status);
            return Ok(response);
        }

        warn!("API request failed: status={}", response.status);
        let retry_after = response
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("retry-after"))
            .map(|(_, value)| value.as_str());
        Err(GoogleDriveError::from_status(
            response.status,
            file_id,
            retry_after,
            &response.body,
        ))
    }
}

/// Escape a value for use inside a single-quoted Drive query literal.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip(self))]
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteFileRecord>> {
        info!("Listing folder from Google Drive");

        let mut records = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut page_token: Option<String> = None;

        loop {
            let request = HttpRequest::get(Self::list_url(folder_id, page_token.as_deref()))
                .header("Accept", "application/json")
                .timeout(LIST_TIMEOUT);
            let response = self.send(request, None).await?;

            let page: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
                GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
            })?;

            for file in page.files {
                records.push(file.into_record()?);
            }

            match page.next_page_token {
                Some(token) if seen_tokens.insert(token.clone()) => page_token = Some(token),
                Some(token) => {
                    return Err(GoogleDriveError::ParseError(format!(
                        "Pagination token repeated: {}",
                        token
                    ))
                    .into());
                }
                None => break,
            }
        }

        info!("Listed {} files from Google Drive", records.len());
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn download(&self, file_id: &str) -> Result<Bytes> {
        let url = format!("{}?alt=media", Self::file_url(file_id));
        let request = HttpRequest::get(url).timeout(DOWNLOAD_TIMEOUT);
        let response = self.send(request, Some(file_id)).await?;

        info!("Downloaded {} bytes", response.body.len());
        Ok(response.body)
    }

    #[instrument(skip(self))]
    async fn delete(&self, file_id: &str) -> Result<()> {
        let request = HttpRequest::delete(Self::file_url(file_id)).timeout(LIST_TIMEOUT);
        self.send(request, Some(file_id)).await?;

        info!("Deleted remote file");
        Ok(())
    }
}
