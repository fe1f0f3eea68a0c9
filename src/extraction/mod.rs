//! First-page text extraction with an OCR fallback.
//!
//! Every call resolves to a string: extracted text, or a bracketed
//! diagnostic such as `[ocr error: ...]` that the caller can store as notes.

pub mod docx;
pub mod error;
pub mod ocr;
pub mod pdf;


use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use error::ExtractionError;
pub use ocr::{OcrEngine, TesseractEngine};
pub use pdf::{LopdfTextLayer, PageRasterizer, PdftoppmRasterizer, TextLayerReader};

pub const DEFAULT_PDF_DPI: u32 = 300;
pub const UNSUPPORTED_MARKER: &str = "[unsupported file type]";

/// Explicit settings for building the default pipeline collaborators.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub pdf_dpi: u32,
    pub ocr_language: String,
    pub tessdata_path: Option<String>,
    pub pdftoppm_path: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdf_dpi: DEFAULT_PDF_DPI,
            ocr_language: "eng".to_string(),
            tessdata_path: None,
            pdftoppm_path: "pdftoppm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Image,
    Unsupported,
}

impl FileKind {
    /// Classifies an extension such as `"pdf"`, `".PDF"` or `"jpeg"`.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "docx" => FileKind::Docx,
            "jpg" | "jpeg" | "png" => FileKind::Image,
            _ => FileKind::Unsupported,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileKind::Unsupported)
    }
}

/// Which strategy produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    PdfTextLayer,
    PdfOcr,
    Docx,
    ImageOcr,
}

impl ExtractionMethod {
    pub fn label(self) -> &'static str {
        match self {
            ExtractionMethod::PdfTextLayer => "pdf_text_layer",
            ExtractionMethod::PdfOcr => "pdf_ocr",
            ExtractionMethod::Docx => "docx",
            ExtractionMethod::ImageOcr => "image_ocr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Extracted { text: String, method: ExtractionMethod },
    Failed { kind: FileKind, error: ExtractionError },
    Unsupported,
}

impl ExtractionOutcome {
    pub fn method(&self) -> Option<ExtractionMethod> {
        match self {
            ExtractionOutcome::Extracted { method, .. } => Some(*method),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            ExtractionOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, ExtractionOutcome::Extracted { .. })
    }

    /// Short machine-readable label for logs and API responses.
    pub fn status(&self) -> &'static str {
        match self {
            ExtractionOutcome::Extracted { method, .. } => method.label(),
            ExtractionOutcome::Failed { .. } => "failed",
            ExtractionOutcome::Unsupported => "unsupported",
        }
    }

    /// Flattens the outcome into the string stored as document notes.
    pub fn into_notes(self) -> String {
        match self {
            ExtractionOutcome::Extracted { text, .. } => text.trim().to_string(),
            ExtractionOutcome::Failed { kind, error } => diagnostic(kind, &error),
            ExtractionOutcome::Unsupported => UNSUPPORTED_MARKER.to_string(),
        }
    }
}

fn extracted(text: &str, method: ExtractionMethod) -> ExtractionOutcome {
    ExtractionOutcome::Extracted {
        text: text.trim().to_string(),
        method,
    }
}

fn diagnostic(kind: FileKind, error: &ExtractionError) -> String {
    let cause = error.details().trim();
    match kind {
        FileKind::Pdf => format!("[extraction fallback failed: {}]", cause),
        FileKind::Docx => format!("[docx extraction error: {}]", cause),
        FileKind::Image => format!("[ocr error: {}]", cause),
        FileKind::Unsupported => UNSUPPORTED_MARKER.to_string(),
    }
}

/// True for strings produced as extraction diagnostics rather than content.
pub fn is_diagnostic_text(text: &str) -> bool {
    text == UNSUPPORTED_MARKER
        || ["[extraction fallback failed: ", "[docx extraction error: ", "[ocr error: "]
            .iter()
            .any(|prefix| text.starts_with(prefix) && text.ends_with(']'))
}

#[derive(Clone)]
pub struct ExtractionPipeline {
    text_layer: Arc<dyn TextLayerReader>,
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Arc<dyn OcrEngine>,
}

impl ExtractionPipeline {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            text_layer: Arc::new(LopdfTextLayer),
            rasterizer: Arc::new(PdftoppmRasterizer::new(
                config.pdftoppm_path.clone(),
                config.pdf_dpi,
            )),
            ocr: Arc::new(TesseractEngine::new(
                config.ocr_language.clone(),
                config.tessdata_path.clone(),
            )),
        }
    }

    pub fn with_components(
        text_layer: Arc<dyn TextLayerReader>,
        rasterizer: Arc<dyn PageRasterizer>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self { text_layer, rasterizer, ocr }
    }

    pub fn with_ocr_engine(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Extracts best-effort text from `path`, returning a diagnostic string on failure.
    pub fn extract(&self, path: &Path, extension: &str) -> String {
        self.run(path, extension).into_notes()
    }

    /// Runs the strategy for `extension` and reports which branch fired.
    pub fn run(&self, path: &Path, extension: &str) -> ExtractionOutcome {
        let kind = FileKind::from_extension(extension);
        debug!("Extracting {:?} as {:?}", path, kind);

        let outcome = match kind {
            FileKind::Pdf => self.extract_pdf(path),
            FileKind::Docx => match docx::extract_docx_text(path) {
                Ok(text) => extracted(&text, ExtractionMethod::Docx),
                Err(error) => ExtractionOutcome::Failed { kind, error },
            },
            FileKind::Image => match self.ocr_image_file(path) {
                Ok(text) => extracted(&text, ExtractionMethod::ImageOcr),
                Err(error) => ExtractionOutcome::Failed { kind, error },
            },
            FileKind::Unsupported => ExtractionOutcome::Unsupported,
        };

        match &outcome {
            ExtractionOutcome::Extracted { text, method } => {
                info!("Extracted {} chars from {:?} via {:?}", text.len(), path, method);
            }
            ExtractionOutcome::Failed { error, .. } => {
                warn!(
                    "Extraction failed for {:?} [{}]: {}",
                    path,
                    error.error_code(),
                    error
                );
            }
            ExtractionOutcome::Unsupported => {
                info!(
                    "Skipping extraction for {:?}: unsupported extension '{}'",
                    path, extension
                );
            }
        }

        outcome
    }

    fn extract_pdf(&self, path: &Path) -> ExtractionOutcome {
        match self.text_layer.first_page_text(path) {
            Ok(text) if !text.trim().is_empty() => {
                return extracted(&text, ExtractionMethod::PdfTextLayer);
            }
            Ok(_) => debug!("Page 1 of {:?} has no text layer, falling back to OCR", path),
            Err(e) => debug!(
                "Text layer unreadable for {:?} ({}), falling back to OCR",
                path, e
            ),
        }

        let page = match self.rasterizer.rasterize_first_page(path) {
            Ok(page) => page,
            Err(error) => return ExtractionOutcome::Failed { kind: FileKind::Pdf, error },
        };

        // The raster is dropped as soon as recognition returns.
        match self.ocr.recognize(&page) {
            Ok(text) => extracted(&text, ExtractionMethod::PdfOcr),
            Err(error) => ExtractionOutcome::Failed { kind: FileKind::Pdf, error },
        }
    }

    fn ocr_image_file(&self, path: &Path) -> Result<String, ExtractionError> {
        let image = image::ImageReader::open(path)
            .map_err(|e| {
                ExtractionError::recognition(format!("cannot open {}: {}", path.display(), e))
            })?
            .with_guessed_format()
            .map_err(|e| {
                ExtractionError::recognition(format!("cannot read {}: {}", path.display(), e))
            })?
            .decode()
            .map_err(|e| ExtractionError::recognition(format!("cannot decode image: {}", e)))?;

        self.ocr.recognize(&image)
    }
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
