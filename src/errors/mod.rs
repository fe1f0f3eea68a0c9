use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::models::MetadataError;

/// Common behaviour of errors that end up as HTTP responses
pub trait AppError: std::error::Error + Send + Sync + 'static {
    fn status_code(&self) -> StatusCode;

    /// Message safe to show to the user
    fn user_message(&self) -> String;

    /// Stable code for frontend handling
    fn error_code(&self) -> &'static str;
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Document {id} not found")]
    NotFound { id: i64 },

    #[error("Stored file '{filename}' not found")]
    FileNotFound { filename: String },

    #[error("Unsupported file type '{extension}'. Allowed: {allowed}")]
    UnsupportedFileType { extension: String, allowed: String },

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(#[from] MetadataError),

    #[error("File '{filename}' exceeds the {limit} byte upload limit")]
    PayloadTooLarge { filename: String, limit: usize },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into() }
    }
}

impl AppError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } | ApiError::FileNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::UnsupportedFileType { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::NotFound { .. } => "DOCUMENT_NOT_FOUND",
            ApiError::FileNotFound { .. } => "FILE_NOT_FOUND",
            ApiError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            ApiError::InvalidMetadata(MetadataError::CompanyNamePrefixed(_)) => {
                "COMPANY_NAME_PREFIXED"
            }
            ApiError::InvalidMetadata(MetadataError::InvalidIssuedDate(_)) => "INVALID_ISSUED_DATE",
            ApiError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!("Request failed: {:#}", e);
        }

        let status = self.status_code();
        let body = Json(json!({
            "error": self.user_message(),
            "code": self.error_code(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotFound { id: 3 }.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidMetadata(MetadataError::CompanyNamePrefixed("PT. A".into()))
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge { filename: "a.pdf".into(), limit: 5 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::Internal(anyhow::anyhow!("database is locked"));
        assert_eq!(err.user_message(), "Internal server error");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
