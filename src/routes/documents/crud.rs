use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Json, Response},
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    db::is_unique_violation,
    errors::ApiError,
    models::{
        DeleteDocumentResponse, DocumentDetailResponse, DocumentFilter, DocumentListQuery,
        DocumentListResponse, DocumentMetadata, DocumentRecord, DocumentResponse, COMPANY_TYPES,
    },
    AppState,
};

fn company_types() -> Vec<String> {
    COMPANY_TYPES.iter().map(|t| t.to_string()).collect()
}

fn already_archived(filename: &str) -> ApiError {
    ApiError::bad_request(format!("File '{}' is already archived", filename))
}

async fn find_document(state: &AppState, id: i64) -> Result<DocumentRecord, ApiError> {
    state
        .db
        .get_document_by_id(id)
        .await?
        .ok_or(ApiError::NotFound { id })
}

/// Save the metadata of a previously uploaded file
#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "documents",
    request_body = DocumentMetadata,
    responses(
        (status = 201, description = "Document record created", body = DocumentResponse),
        (status = 400, description = "Missing or unknown file, or invalid metadata"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn save_document(
    State(state): State<Arc<AppState>>,
    Json(metadata): Json<DocumentMetadata>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    let filename = metadata
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("filename is required"))?
        .to_string();

    if !state.ingestion.file_service().file_exists(&filename).await {
        return Err(ApiError::bad_request(format!(
            "Uploaded file '{}' does not exist",
            filename
        )));
    }
    // The unique index on filename is authoritative; this only gives the
    // common case a clear message before validation runs.
    if state.db.filename_in_use(&filename).await? {
        return Err(already_archived(&filename));
    }

    let new_document = metadata.into_new_document(filename.clone())?;
    let record = match state.db.create_document(&new_document).await {
        Ok(record) => record,
        Err(e) if is_unique_violation(&e) => return Err(already_archived(&filename)),
        Err(e) => return Err(e.into()),
    };
    info!("Archived '{}' as document {}", record.filename, record.id);

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// List archived documents
#[utoipa::path(
    get,
    path = "/api/documents",
    tag = "documents",
    params(DocumentListQuery),
    responses(
        (
            status = 200,
            description = "Filtered and sorted documents with filter options",
            body = DocumentListResponse
        ),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let filter = DocumentFilter::from(&query);

    let documents = state.db.list_documents(&filter).await?;
    let categories = state.db.distinct_categories().await?;
    let company_types = state.db.distinct_company_types().await?;
    let companies = state.db.distinct_company_names().await?;

    debug!("Listing {} documents with {:?}", documents.len(), filter);

    Ok(Json(DocumentListResponse {
        documents: documents.into_iter().map(DocumentResponse::from).collect(),
        categories,
        company_types,
        companies,
        selected_category: filter.category.unwrap_or_default(),
        selected_company_type: filter.company_type.unwrap_or_default(),
        selected_company: filter.company_name.unwrap_or_default(),
        date_from: filter.date_from.unwrap_or_default(),
        date_to: filter.date_to.unwrap_or_default(),
        sort_by: filter.sort_by,
        sort_dir: filter.sort_dir,
    }))
}

/// Get a document with freshly extracted text
#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document details", body = DocumentDetailResponse),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DocumentDetailResponse>, ApiError> {
    let document = find_document(&state, id).await?;
    let extracted = state.ingestion.extract_stored(&document.filename).await?;

    Ok(Json(DocumentDetailResponse {
        document: document.into(),
        extracted_text: extracted.text,
        extraction_status: extracted.status.to_string(),
        company_types: company_types(),
    }))
}

/// Update the metadata of a document
#[utoipa::path(
    put,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    request_body = DocumentMetadata,
    responses(
        (status = 200, description = "Document updated", body = DocumentResponse),
        (status = 400, description = "Invalid metadata"),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(metadata): Json<DocumentMetadata>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let existing = find_document(&state, id).await?;

    // The stored file never changes on edit; omitted notes keep their value.
    let metadata = DocumentMetadata {
        notes: metadata.notes.clone().or(Some(existing.notes)),
        ..metadata
    };
    let update = metadata.into_new_document(existing.filename)?;

    let record = state
        .db
        .update_document_metadata(id, &update)
        .await?
        .ok_or(ApiError::NotFound { id })?;
    info!("Updated metadata of document {}", id);

    Ok(Json(record.into()))
}

/// Delete a document and its stored file
#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted", body = DeleteDocumentResponse),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteDocumentResponse>, ApiError> {
    let document = find_document(&state, id).await?;

    let file_deleted = state.ingestion.file_service().delete_file(&document.filename).await?;
    state
        .db
        .delete_document(id)
        .await?
        .ok_or(ApiError::NotFound { id })?;

    info!("Deleted document {} ('{}')", id, document.filename);
    Ok(Json(DeleteDocumentResponse {
        id,
        filename: document.filename,
        file_deleted,
    }))
}

/// Download the stored file of a document
#[utoipa::path(
    get,
    path = "/api/documents/{id}/file",
    tag = "documents",
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Raw file content", content_type = "application/octet-stream"),
        (status = 404, description = "Document or stored file not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response<Body>, ApiError> {
    let document = find_document(&state, id).await?;
    let file_service = state.ingestion.file_service();

    if !file_service.file_exists(&document.filename).await {
        return Err(ApiError::FileNotFound { filename: document.filename });
    }
    let file_data = file_service.read_file(&document.filename).await?;

    let mime_type = mime_guess::from_path(&document.filename).first_or_octet_stream();
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime_type.as_ref())
        .header(
            "Content-Disposition",
            format!("inline; filename=\"{}\"", document.filename),
        )
        .header("Content-Length", file_data.len().to_string())
        .body(Body::from(file_data))
        .map_err(|e| {
            error!("Failed to build response: {}", e);
            ApiError::Internal(e.into())
        })?;

    debug!("Document downloaded: {}", id);
    Ok(response)
}
