use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::DriveConfig;
use crate::error::{IngestionError, IngestionResult};
use crate::types::FileHandle;

use super::{ByteStream, FileStreamer, FolderLister};

const FILES_PATH: &str = "/drive/v3/files";
const LIST_FIELDS: &str = "nextPageToken, files(id, name)";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<FileHandle>,
    next_page_token: Option<String>,
}

/// Google Drive v3 client implementing [`FolderLister`] and [`FileStreamer`].
///
/// Built once at startup from [`DriveConfig`] and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct GoogleDriveClient {
    http: reqwest::Client,
    api_base: String,
    access_token: Option<String>,
}

impl GoogleDriveClient {
    /// Create a client with a default `reqwest` connection pool.
    pub fn new(config: &DriveConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, config: &DriveConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    fn token(&self) -> IngestionResult<&str> {
        self.access_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| IngestionError::Auth {
                message: "no access token configured (GOOGLE_DRIVE_ACCESS_TOKEN)".to_string(),
            })
    }

    async fn list_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> IngestionResult<FileListPage> {
        let listing_err = |message: String| IngestionError::Listing {
            folder_id: folder_id.to_string(),
            message,
        };

        let query = format!("'{}' in parents", folder_id.replace('\'', "\\'"));
        let mut req = self
            .http
            .get(format!("{}{FILES_PATH}", self.api_base))
            .bearer_auth(self.token()?)
            .query(&[("q", query.as_str()), ("fields", LIST_FIELDS)]);
        if let Some(token) = page_token {
            req = req.query(&[("pageToken", token)]);
        }

        let resp = req.send().await.map_err(|e| listing_err(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(IngestionError::Auth {
                message: format!("folder listing rejected with HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(listing_err(format!("HTTP {status}: {body}")));
        }

        resp.json::<FileListPage>()
            .await
            .map_err(|e| listing_err(format!("invalid listing payload: {e}")))
    }
}

#[async_trait]
impl FolderLister for GoogleDriveClient {
    async fn list(&self, folder_id: &str) -> IngestionResult<Vec<FileHandle>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(folder_id, page_token.as_deref()).await?;
            files.extend(page.files);
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        log::debug!("listed {} file(s) in folder {}", files.len(), folder_id);
        Ok(files)
    }
}

#[async_trait]
impl FileStreamer for GoogleDriveClient {
    async fn open(&self, handle: &FileHandle) -> IngestionResult<ByteStream> {
        let file = handle.to_string();
        let stream_err = |message: String| IngestionError::Stream {
            file: file.clone(),
            message,
        };

        if handle.id.trim().is_empty() {
            return Err(stream_err("invalid file id".to_string()));
        }
        let token = self.token().map_err(|e| stream_err(e.to_string()))?;

        let resp = self
            .http
            .get(format!("{}{FILES_PATH}/{}", self.api_base, handle.id))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| stream_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(stream_err(format!("HTTP {status}")));
        }

        let stream = resp.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| IngestionError::Stream {
                file: file.clone(),
                message: e.to_string(),
            })
        });
        Ok(stream.boxed())
    }
}
