use image::DynamicImage;
#[cfg(feature = "ocr")]
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

#[cfg(feature = "ocr")]
use tesseract::Tesseract;

#[cfg(feature = "ocr")]
use super::error::panic_message;
use super::error::ExtractionError;

/// Optical character recognition over a decoded image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> Result<String, ExtractionError>;
}

/// OCR engine backed by Tesseract.
///
/// A fresh Tesseract handle is created per call; nothing is cached between
/// documents.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    language: String,
    datapath: Option<String>,
}

impl TesseractEngine {
    pub fn new(language: impl Into<String>, datapath: Option<String>) -> Self {
        Self {
            language: language.into(),
            datapath,
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("eng", None)
    }
}

impl OcrEngine for TesseractEngine {
    #[cfg(feature = "ocr")]
    fn recognize(&self, image: &DynamicImage) -> Result<String, ExtractionError> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(ExtractionError::recognition("image has no pixels"));
        }
        debug!("Running tesseract ({}) on {}x{} image", self.language, width, height);

        let result = catch_unwind(AssertUnwindSafe(|| -> Result<String, ExtractionError> {
            let mut tesseract = Tesseract::new(self.datapath.as_deref(), Some(&self.language))
                .map_err(|e| {
                    ExtractionError::recognition(format!("tesseract initialization failed: {}", e))
                })?
                .set_frame(gray.as_raw(), width as i32, height as i32, 1, width as i32)
                .map_err(|e| {
                    ExtractionError::recognition(format!("tesseract rejected image: {}", e))
                })?;

            tesseract
                .get_text()
                .map_err(|e| ExtractionError::recognition(format!("failed to extract text: {}", e)))
        }));

        result.map_err(|payload| ExtractionError::recognition(panic_message(payload)))?
    }

    #[cfg(not(feature = "ocr"))]
    fn recognize(&self, _image: &DynamicImage) -> Result<String, ExtractionError> {
        debug!("OCR requested for language {} but the ocr feature is disabled", self.language);
        Err(ExtractionError::recognition("OCR feature not enabled"))
    }
}
