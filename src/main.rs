use std::sync::Arc;

use anyhow::Context;
use timesheet_ingest::config::AppConfig;
use timesheet_ingest::drive::GoogleDriveClient;
use timesheet_ingest::http::{self, AppState};
use timesheet_ingest::ingestion::{
    CompositeObserver, FileObserver, IngestionObserver, IngestionOptions, IngestionOrchestrator,
    IngestionSeverity, LogObserver,
};
use timesheet_ingest::storage::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    if config.drive.folder_id.is_none() {
        log::warn!("GOOGLE_DRIVE_FOLDER_ID is not set; /upload will fail until it is configured");
    }

    let drive = Arc::new(GoogleDriveClient::new(&config.drive));
    let store = Arc::new(
        SqliteStore::connect(&config.storage.database_url)
            .await
            .with_context(|| format!("failed to open database {}", config.storage.database_url))?,
    );

    let mut observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(LogObserver)];
    if let Some(path) = &config.ingest_log_file {
        log::info!("appending ingestion events to {}", path.display());
        observers.push(Arc::new(FileObserver::new(path)));
    }

    let orchestrator = IngestionOrchestrator::new(
        drive.clone(),
        drive,
        IngestionOptions {
            execution: config.execution.clone(),
            observer: Some(Arc::new(CompositeObserver::new(observers))),
            alert_at_or_above: IngestionSeverity::Critical,
        },
    );

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        store,
        folder_id: config.drive.folder_id.clone(),
    };
    let app = http::router(state, config.server.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?;
    log::info!("server running on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
