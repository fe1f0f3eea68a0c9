use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    response::Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    errors::ApiError,
    models::{UploadPreviewResponse, COMPANY_TYPES},
    AppState,
};

/// Reads one multipart field into memory, stopping early once it grows past
/// `limit`. Returns `None` for oversized fields.
pub(crate) async fn read_field_limited(
    field: &mut Field<'_>,
    limit: usize,
) -> Result<Option<Vec<u8>>, MultipartError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if data.len() + chunk.len() > limit {
            return Ok(None);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(Some(data))
}

pub(crate) fn multipart_error(e: MultipartError) -> ApiError {
    error!("Failed to read multipart body: {}", e);
    ApiError::bad_request(format!("Malformed multipart body: {}", e.body_text()))
}

pub(crate) fn allowed_types_label(state: &AppState) -> String {
    state.ingestion.allowed_file_types().join(", ")
}

/// Upload a file and preview its extracted text
///
/// The file is stored under a collision-free name but no record is created;
/// the client confirms the metadata through `POST /api/documents`.
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    tag = "documents",
    request_body(
        content = String,
        description = "Multipart form data with a single `file` field. Supported formats: PDF, DOCX, JPG, JPEG, PNG.",
        content_type = "multipart/form-data"
    ),
    responses(
        (
            status = 200,
            description = "File stored and text extracted",
            body = UploadPreviewResponse
        ),
        (status = 400, description = "Missing file or file type not allowed"),
        (status = 413, description = "File exceeds the upload size limit"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadPreviewResponse>, ApiError> {
    let limit = state.config.max_file_size_bytes();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").trim().to_string();
        if filename.is_empty() {
            return Err(ApiError::bad_request("No file selected"));
        }

        if !state.ingestion.is_allowed(&filename) {
            warn!("Rejected upload of '{}': file type not allowed", filename);
            return Err(ApiError::UnsupportedFileType {
                extension: crate::services::file_service::extension_of(&filename),
                allowed: allowed_types_label(&state),
            });
        }

        let data = read_field_limited(&mut field, limit)
            .await
            .map_err(multipart_error)?
            .ok_or_else(|| ApiError::PayloadTooLarge { filename: filename.clone(), limit })?;

        let (stored, extracted) = state.ingestion.store_and_extract(&filename, &data).await?;
        info!(
            "Upload '{}' stored as '{}', extraction status {}",
            filename, stored.filename, extracted.status
        );

        return Ok(Json(UploadPreviewResponse {
            filename: stored.filename,
            extracted_text: extracted.text,
            extraction_status: extracted.status.to_string(),
            company_types: COMPANY_TYPES.iter().map(|t| t.to_string()).collect(),
        }));
    }

    Err(ApiError::bad_request("No file part in the request"))
}
