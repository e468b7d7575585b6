//! HTTP surface for the ingestion service.
//!
//! | Route | Behavior |
//! |---|---|
//! | `POST /api/timesheet/upload` | one ingestion run (+ optional multipart `file`), then persist |
//! | `GET /api/timesheet/getAll` | stored records, `DueDate` descending |
//! | `DELETE /api/timesheet/deleteAll` | remove every stored record |
//!
//! Fatal errors map to `500 {"error": "Internal Server Error"}`; the cause is only logged.

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::ingestion::IngestionOrchestrator;
use crate::storage::TimesheetStore;

/// Multipart field carrying the optional workbook.
pub const UPLOAD_FIELD: &str = "file";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<IngestionOrchestrator>,
    pub store: Arc<dyn TimesheetStore>,
    /// Folder ingested by every `/upload` call.
    pub folder_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    message: &'static str,
    total_records: usize,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let timesheet = Router::new()
        .route("/upload", post(upload))
        .route("/getAll", get(get_all))
        .route("/deleteAll", delete(delete_all));

    Router::new()
        .nest("/api/timesheet", timesheet)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let file = match multipart {
        Ok(multipart) => match read_upload(multipart).await {
            Ok(file) => file,
            Err(e) => {
                log::error!("failed to read multipart body: {e}");
                return error_response(e.status());
            }
        },
        Err(rejection) => {
            log::debug!("no multipart body ({rejection}); running without upload");
            None
        }
    };

    match state
        .orchestrator
        .ingest_and_persist(state.store.as_ref(), state.folder_id.as_deref(), file)
        .await
    {
        Ok(summary) => (
            StatusCode::OK,
            Json(UploadResponse {
                message: "Upload processed successfully",
                total_records: summary.total_records,
            }),
        )
            .into_response(),
        Err(e) => {
            log::error!("error processing upload: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// First non-empty `file` part, if any.
///
/// A part without a filename (a form submitted with no file chosen) or with an empty body
/// counts as no upload.
async fn read_upload(mut multipart: Multipart) -> Result<Option<Bytes>, MultipartError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if file.is_some() || field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.file_name().is_none_or(str::is_empty) {
            log::debug!("ignoring `{UPLOAD_FIELD}` part without a filename");
            continue;
        }
        let bytes = field.bytes().await?;
        if !bytes.is_empty() {
            file = Some(bytes);
        }
    }
    Ok(file)
}

async fn get_all(State(state): State<AppState>) -> Response {
    match state.store.fetch_all().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            log::error!("error fetching records: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn delete_all(State(state): State<AppState>) -> Response {
    match state.store.delete_all().await {
        Ok(removed) => {
            log::info!("deleted {removed} record(s)");
            (
                StatusCode::OK,
                Json(MessageResponse {
                    message: "All records deleted successfully",
                }),
            )
                .into_response()
        }
        Err(e) => {
            log::error!("error deleting records: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn error_response(status: StatusCode) -> Response {
    let error = if status.is_server_error() {
        "Internal Server Error"
    } else {
        status.canonical_reason().unwrap_or("Bad Request")
    };
    (status, Json(ErrorResponse { error })).into_response()
}
