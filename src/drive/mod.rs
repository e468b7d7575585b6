//! Remote folder service ports.
//!
//! - [`FolderLister`] enumerates the files of a folder
//! - [`FileStreamer`] retrieves one file as an ordered stream of byte chunks
//!
//! [`GoogleDriveClient`] implements both against the Drive v3 REST API.

mod google;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::error::{IngestionError, IngestionResult};
use crate::types::FileHandle;

pub use google::GoogleDriveClient;

/// Ordered chunks of one file's content.
pub type ByteStream = BoxStream<'static, IngestionResult<Bytes>>;

/// Enumerates file handles in a remote folder.
#[async_trait]
pub trait FolderLister: Send + Sync {
    /// List files in `folder_id`, in the order the service returns them.
    async fn list(&self, folder_id: &str) -> IngestionResult<Vec<FileHandle>>;
}

/// Retrieves file content as a chunked stream.
#[async_trait]
pub trait FileStreamer: Send + Sync {
    /// Open a content stream for `handle`.
    async fn open(&self, handle: &FileHandle) -> IngestionResult<ByteStream>;

    /// Read the whole file, concatenating chunks in arrival order.
    async fn fetch(&self, handle: &FileHandle) -> IngestionResult<Vec<u8>> {
        let mut stream = self.open(handle).await?;
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

/// List a folder, enforcing the run-level preconditions.
///
/// Fails with [`IngestionError::Config`] if no folder id is configured and with
/// [`IngestionError::EmptyFolder`] if the listing is empty.
pub async fn list_folder(
    lister: &dyn FolderLister,
    folder_id: Option<&str>,
) -> IngestionResult<Vec<FileHandle>> {
    let folder_id = folder_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| IngestionError::config("folder id is required (GOOGLE_DRIVE_FOLDER_ID)"))?;

    let files = lister.list(folder_id).await?;
    if files.is_empty() {
        return Err(IngestionError::EmptyFolder {
            folder_id: folder_id.to_string(),
        });
    }
    Ok(files)
}
