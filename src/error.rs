use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned across the ingestion pipeline, its ports and the HTTP layer.
///
/// Variants fall in two classes (see [`IngestionError::is_fatal`]):
///
/// - **fatal**: abort the whole run (configuration, credentials, listing, persistence)
/// - **per-file**: caught by the orchestrator, logged, and the offending file is skipped
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Required configuration is missing or malformed (e.g. no folder id).
    #[error("config error: {message}")]
    Config { message: String },

    /// Credentials are missing, invalid or expired.
    #[error("auth error: {message}")]
    Auth { message: String },

    /// The folder listing succeeded but returned zero files.
    #[error("folder '{folder_id}' contains no files")]
    EmptyFolder { folder_id: String },

    /// The folder listing failed for a reason other than credentials.
    #[error("failed to list folder '{folder_id}': {message}")]
    Listing { folder_id: String, message: String },

    /// Transport or corruption failure while streaming a single file.
    #[error("stream error for file '{file}': {message}")]
    Stream { file: String, message: String },

    /// The byte buffer is not a readable workbook.
    #[error("workbook parse error: {message}")]
    Parse { message: String },

    /// The storage collaborator rejected a read/write.
    #[error("persist error: {message}")]
    Persist { message: String },
}

impl IngestionError {
    /// Returns `true` if this error aborts the entire ingestion run.
    ///
    /// `Stream` and `Parse` are per-file errors; the orchestrator skips the file and continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Stream { .. } | Self::Parse { .. })
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<calamine::Error> for IngestionError {
    fn from(err: calamine::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for IngestionError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persist {
            message: err.to_string(),
        }
    }
}
