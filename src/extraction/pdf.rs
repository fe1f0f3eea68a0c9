use image::DynamicImage;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::process::Command;
use tracing::debug;

use super::error::{panic_message, ExtractionError};

/// Reads the embedded text layer of the first page of a PDF.
pub trait TextLayerReader: Send + Sync {
    fn first_page_text(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Renders the first page of a PDF into an in-memory image.
pub trait PageRasterizer: Send + Sync {
    fn rasterize_first_page(&self, path: &Path) -> Result<DynamicImage, ExtractionError>;
}

/// Text layer reader backed by `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct LopdfTextLayer;

impl TextLayerReader for LopdfTextLayer {
    fn first_page_text(&self, path: &Path) -> Result<String, ExtractionError> {
        let header = read_header(path)?;
        if !is_valid_pdf(&header) {
            return Err(ExtractionError::structured(format!(
                "missing or corrupted PDF header ({} bytes read)",
                header.len()
            )));
        }

        // lopdf can panic on sufficiently broken cross-reference tables
        let loaded = catch_unwind(AssertUnwindSafe(|| lopdf::Document::load(path)))
            .map_err(|payload| ExtractionError::structured(panic_message(payload)))?;
        let document = loaded.map_err(|e| ExtractionError::structured(e.to_string()))?;

        if document.get_pages().is_empty() {
            return Err(ExtractionError::structured("PDF has no pages"));
        }

        let text = catch_unwind(AssertUnwindSafe(|| document.extract_text(&[1])))
            .map_err(|payload| ExtractionError::structured(panic_message(payload)))?
            .map_err(|e| ExtractionError::structured(e.to_string()))?;

        debug!("Text layer of page 1 in {:?}: {} chars", path, text.len());
        Ok(text)
    }
}

/// Rasterizer that shells out to poppler's `pdftoppm` and decodes the PNG it
/// writes to stdout.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self { binary: binary.into(), dpi }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm", super::DEFAULT_PDF_DPI)
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize_first_page(&self, path: &Path) -> Result<DynamicImage, ExtractionError> {
        // first page only, written to stdout as a single PNG
        let output = Command::new(&self.binary)
            .args(["-f", "1", "-l", "1"])
            .arg("-r")
            .arg(self.dpi.to_string())
            .args(["-png", "-singlefile"])
            .arg(path)
            .output()
            .map_err(|e| {
                ExtractionError::rasterization(format!("failed to run {}: {}", self.binary, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::rasterization(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(ExtractionError::rasterization(format!(
                "{} produced no image",
                self.binary
            )));
        }

        debug!(
            "Rasterized page 1 of {:?} at {} DPI ({} bytes)",
            path,
            self.dpi,
            output.stdout.len()
        );

        image::load_from_memory(&output.stdout).map_err(|e| {
            ExtractionError::rasterization(format!("rendered page could not be decoded: {}", e))
        })
    }
}

fn read_header(path: &Path) -> Result<Vec<u8>, ExtractionError> {
    use std::io::Read;

    let file = std::fs::File::open(path).map_err(|e| {
        ExtractionError::structured(format!("cannot open {}: {}", path.display(), e))
    })?;
    let mut header = Vec::with_capacity(1024);
    file.take(1024).read_to_end(&mut header).map_err(|e| {
        ExtractionError::structured(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(header)
}

/// Check if the given bytes start a PDF file.
/// Tolerates leading null bytes or whitespace before the `%PDF-` marker.
pub fn is_valid_pdf(data: &[u8]) -> bool {
    if data.len() < 5 {
        return false;
    }

    let search_limit = data.len().min(1024);
    data[..search_limit].windows(5).any(|window| window == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_pdf() {
        assert!(is_valid_pdf(b"%PDF-1.7\n"));
        assert!(is_valid_pdf(b"\0\0\n%PDF-1.4 rest"));
        assert!(!is_valid_pdf(b"%PD"));
        assert!(!is_valid_pdf(b"PK\x03\x04 not a pdf at all"));
    }

    #[test]
    fn test_text_layer_rejects_non_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is plain text pretending to be a pdf").unwrap();

        let err = LopdfTextLayer.first_page_text(&path).unwrap_err();
        assert_eq!(err.error_code(), "EXTRACT_STRUCTURED_FAILED");
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_text_layer_rejects_truncated_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("truncated.pdf");
        std::fs::write(&path, b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog").unwrap();

        assert!(LopdfTextLayer.first_page_text(&path).is_err());
    }

    #[test]
    fn test_missing_rasterizer_binary() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();

        let rasterizer = PdftoppmRasterizer::new("definitely-not-a-real-pdftoppm", 300);
        let err = rasterizer.rasterize_first_page(&path).unwrap_err();
        assert_eq!(err.error_code(), "EXTRACT_RASTERIZE_FAILED");
        assert!(err.to_string().contains("failed to run"));
    }
}
