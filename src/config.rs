//! Process configuration.
//!
//! [`AppConfig`] is read once at startup (environment variables, optionally seeded from a `.env`
//! file) and then handed by reference to the clients that need it.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{IngestionError, IngestionResult};
use crate::execution::ExecutionOptions;

pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://timesheet.db?mode=rwc";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Remote folder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    /// Folder to ingest. Checked per run, not at startup.
    pub folder_id: Option<String>,
    /// OAuth bearer token for the Drive API.
    pub access_token: Option<String>,
    pub api_base: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            folder_id: None,
            access_token: None,
            api_base: DEFAULT_DRIVE_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub database_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit for `/upload`.
    pub max_upload_bytes: usize,
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub drive: DriveConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub execution: ExecutionOptions,
    /// If set, ingestion events are also appended to this file.
    pub ingest_log_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load from the process environment, after applying a `.env` file if one exists.
    pub fn from_env() -> IngestionResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(IngestionError::config(format!("failed to read .env: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> IngestionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let drive = DriveConfig {
            folder_id: get("GOOGLE_DRIVE_FOLDER_ID"),
            access_token: get("GOOGLE_DRIVE_ACCESS_TOKEN"),
            api_base: get("GOOGLE_DRIVE_API_BASE")
                .unwrap_or_else(|| DEFAULT_DRIVE_API_BASE.to_string()),
        };

        let storage = StorageConfig {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
        };

        let server = ServerConfig {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            max_upload_bytes: parse_or(
                "MAX_UPLOAD_BYTES",
                get("MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
        };

        let max_in_flight: usize =
            parse_or("INGEST_MAX_IN_FLIGHT", get("INGEST_MAX_IN_FLIGHT"), 1)?;
        if max_in_flight == 0 {
            return Err(IngestionError::config("INGEST_MAX_IN_FLIGHT must be > 0"));
        }

        Ok(Self {
            drive,
            storage,
            server,
            execution: ExecutionOptions::bounded(max_in_flight),
            ingest_log_file: get("INGEST_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> IngestionResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse::<T>()
            .map_err(|e| IngestionError::config(format!("invalid {key}='{v}': {e}"))),
    }
}
