use axum::{
    extract::{Multipart, State},
    response::Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    errors::ApiError,
    models::{BatchUploadResponse, DocumentMetadata, DocumentResponse},
    services::file_service::StoredFile,
    AppState,
};
use super::upload::{multipart_error, read_field_limited};

/// Upload several files at once with shared metadata
///
/// Every accepted file gets its own record; its notes hold the extracted
/// text and company name and issue date are left empty.
#[utoipa::path(
    post,
    path = "/api/documents/batch",
    tag = "documents",
    request_body(
        content = String,
        description = "Multipart form data with repeated `files` fields and optional `category`, `custom_category`, `doc_type`, `company_type` text fields",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "Batch processed", body = BatchUploadResponse),
        (status = 400, description = "Malformed request or invalid metadata"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn batch_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<BatchUploadResponse>, ApiError> {
    let limit = state.config.max_file_size_bytes();
    let mut defaults = DocumentMetadata::default();
    let mut stored_files: Vec<(String, StoredFile)> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();

    // Text fields may arrive after the files. Each file goes to disk as soon
    // as it is read so at most one upload is held in memory; extraction and
    // the records wait until the shared metadata is known.
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "files" | "files[]" => {
                let filename = field.file_name().unwrap_or("").trim().to_string();
                if filename.is_empty() {
                    continue;
                }
                if !state.ingestion.is_allowed(&filename) {
                    warn!("Skipping '{}' in batch: file type not allowed", filename);
                    skipped.push(filename);
                    continue;
                }
                match read_field_limited(&mut field, limit).await.map_err(multipart_error)? {
                    Some(data) => match state.ingestion.store(&filename, &data).await {
                        Ok(stored) => stored_files.push((filename, stored)),
                        Err(e) => {
                            error!("Failed to store '{}' in batch: {}", filename, e);
                            skipped.push(filename);
                        }
                    },
                    None => {
                        warn!(
                        "Skipping '{}' in batch: larger than {} bytes",
                        filename, limit
                    );
                        skipped.push(filename);
                    }
                }
            }
            "category" | "custom_category" | "doc_type" | "company_type" => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match name.as_str() {
                    "category" => defaults.category = value,
                    "custom_category" => defaults.custom_category = value,
                    "doc_type" => defaults.doc_type = value,
                    _ => defaults.company_type = value,
                }
            }
            _ => {}
        }
    }

    if let Err(e) = defaults.validate() {
        for (_, stored) in &stored_files {
            state.ingestion.discard(stored).await;
        }
        return Err(e.into());
    }

    let mut documents = Vec::with_capacity(stored_files.len());
    for (filename, stored) in stored_files {
        match state.ingestion.ingest_stored(&stored, &defaults).await {
            Ok(record) => documents.push(DocumentResponse::from(record)),
            Err(e) => {
                error!("Failed to import '{}' in batch: {}", filename, e);
                skipped.push(filename);
            }
        }
    }

    info!(
        "Batch upload stored {} documents, skipped {}",
        documents.len(),
        skipped.len()
    );
    let message = if skipped.is_empty() {
        format!("{} documents uploaded", documents.len())
    } else {
        format!("{} documents uploaded, {} skipped", documents.len(), skipped.len())
    };

    Ok(Json(BatchUploadResponse {
        uploaded: documents.len(),
        skipped,
        documents,
        message,
    }))
}
