pub mod config;
pub mod db;
pub mod errors;
pub mod extraction;
pub mod ingestion;
pub mod models;
pub mod routes;
pub mod services;
pub mod swagger;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

use axum::{http::StatusCode, routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use config::Config;
use db::Database;
use ingestion::document_ingestion::DocumentIngestionService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub ingestion: DocumentIngestionService,
}

/// Health check endpoint for monitoring
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(serde_json::json!({"status": "ok"})))
}

/// Full application router: JSON API, OpenAPI UI and the content
/// directory served under `/uploads`.
pub fn create_router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.upload_path);

    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/documents", routes::documents::router())
        .merge(swagger::create_swagger_router())
        .nest_service("/uploads", uploads)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
