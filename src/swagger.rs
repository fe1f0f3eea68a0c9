use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use axum::Router;
use std::sync::Arc;

use crate::{
    models::{
        BatchUploadResponse, DeleteDocumentResponse, DocumentDetailResponse, DocumentListQuery,
        DocumentListResponse, DocumentMetadata, DocumentResponse, SortDirection, SortField,
        UploadPreviewResponse,
    },
    AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        crate::health_check,
        // Document endpoints
        crate::routes::documents::upload_document,
        crate::routes::documents::save_document,
        crate::routes::documents::list_documents,
        crate::routes::documents::get_document,
        crate::routes::documents::update_document,
        crate::routes::documents::delete_document,
        crate::routes::documents::download_document,
        crate::routes::documents::batch_upload,
    ),
    components(
        schemas(
            DocumentResponse, DocumentMetadata, UploadPreviewResponse, DocumentDetailResponse,
            DocumentListQuery, DocumentListResponse, BatchUploadResponse, DeleteDocumentResponse,
            SortField, SortDirection
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "documents", description = "Document archive endpoints"),
    ),
    info(
        title = "Arsip API",
        version = "0.3.0",
        description = "Document archive with first-page text extraction"
    )
)]
pub struct ApiDoc;

pub fn create_swagger_router() -> Router<Arc<AppState>> {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
