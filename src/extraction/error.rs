use thiserror::Error;

/// Failure of a single extraction strategy attempt.
///
/// These never cross the pipeline boundary as errors. They are carried in an
/// [`ExtractionOutcome`](super::ExtractionOutcome) and flattened into a
/// bracketed diagnostic string by the caller-facing `extract` entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The structured parser (PDF text layer, DOCX package) could not read the document.
    #[error("{details}")]
    StructuredExtraction { details: String },

    /// Converting a page into a raster image failed.
    #[error("{details}")]
    Rasterization { details: String },

    /// The OCR engine failed, or the image it was given could not be decoded.
    #[error("{details}")]
    Recognition { details: String },
}

impl ExtractionError {
    pub fn structured(details: impl Into<String>) -> Self {
        Self::StructuredExtraction {
            details: non_empty(details.into(), "structured text extraction failed"),
        }
    }

    pub fn rasterization(details: impl Into<String>) -> Self {
        Self::Rasterization {
            details: non_empty(details.into(), "page rasterization failed"),
        }
    }

    pub fn recognition(details: impl Into<String>) -> Self {
        Self::Recognition {
            details: non_empty(details.into(), "text recognition failed"),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractionError::StructuredExtraction { .. } => "EXTRACT_STRUCTURED_FAILED",
            ExtractionError::Rasterization { .. } => "EXTRACT_RASTERIZE_FAILED",
            ExtractionError::Recognition { .. } => "EXTRACT_OCR_FAILED",
        }
    }

    pub fn details(&self) -> &str {
        match self {
            ExtractionError::StructuredExtraction { details }
            | ExtractionError::Rasterization { details }
            | ExtractionError::Recognition { details } => details,
        }
    }
}

// Diagnostics must always carry a readable cause, even when a library
// returns an error whose Display is blank.
fn non_empty(details: String, fallback: &str) -> String {
    let trimmed = details.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Turns a panic payload caught with `catch_unwind` into a readable message.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("parser panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("parser panicked: {}", message)
    } else {
        "parser panicked".to_string()
    }
}
