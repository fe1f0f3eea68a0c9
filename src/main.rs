use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use arsip::{
    config::Config,
    db::Database,
    extraction::ExtractionPipeline,
    ingestion::document_ingestion::DocumentIngestionService,
    services::file_service::FileService,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Using database {}", config.database_url);

    let db = Database::connect_and_migrate(&config.database_url).await?;
    info!("Database ready with {} documents", db.count_documents().await?);

    let file_service = FileService::new(config.upload_path.clone());
    file_service.initialize_directory_structure().await?;

    let pipeline = ExtractionPipeline::new(&config.extraction_config());
    info!(
        "Extraction: OCR language '{}', PDF rasterized at {} dpi via '{}'",
        config.ocr_language, config.pdf_dpi, config.pdftoppm_path
    );

    let ingestion = DocumentIngestionService::new(
        db.clone(),
        file_service,
        pipeline,
        config.allowed_file_types.clone(),
    );

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        ingestion,
    });
    let app = arsip::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_address).await?;
    info!("Server starting on {}", config.server_address);

    axum::serve(listener, app).await?;

    Ok(())
}
