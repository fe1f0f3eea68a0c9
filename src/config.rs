use anyhow::{Context, Result};
use std::env;

use crate::extraction::{ExtractionConfig, DEFAULT_PDF_DPI};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_address: String,
    pub upload_path: String,
    pub allowed_file_types: Vec<String>,
    pub max_file_size_mb: u64,
    pub ocr_language: String,
    pub pdf_dpi: u32,
    pub tessdata_path: Option<String>,
    pub pdftoppm_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://arsip.db?mode=rwc".to_string()),
            server_address: env::var("SERVER_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            upload_path: env::var("UPLOAD_PATH")
                .unwrap_or_else(|_| "./uploads".to_string()),
            allowed_file_types: parse_file_types(
                &env::var("ALLOWED_FILE_TYPES")
                    .unwrap_or_else(|_| "pdf,docx,jpg,jpeg,png".to_string()),
            ),
            max_file_size_mb: match env::var("MAX_FILE_SIZE_MB") {
                Ok(value) => value.parse().context("MAX_FILE_SIZE_MB must be a whole number")?,
                Err(_) => 50,
            },
            ocr_language: env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string()),
            pdf_dpi: match env::var("OCR_PDF_DPI") {
                Ok(value) => value.parse().context("OCR_PDF_DPI must be a whole number")?,
                Err(_) => DEFAULT_PDF_DPI,
            },
            tessdata_path: env::var("TESSDATA_PREFIX").ok().filter(|s| !s.trim().is_empty()),
            pdftoppm_path: env::var("PDFTOPPM_PATH").unwrap_or_else(|_| "pdftoppm".to_string()),
        })
    }

    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            pdf_dpi: self.pdf_dpi,
            ocr_language: self.ocr_language.clone(),
            tessdata_path: self.tessdata_path.clone(),
            pdftoppm_path: self.pdftoppm_path.clone(),
        }
    }

    pub fn max_file_size_bytes(&self) -> usize {
        (self.max_file_size_mb as usize) * 1024 * 1024
    }
}

/// Splits a comma separated list such as `"PDF, .docx,png"` into bare,
/// lower-cased extensions.
pub fn parse_file_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_types() {
        assert_eq!(parse_file_types("PDF, .docx,png,,"), vec!["pdf", "docx", "png"]);
        assert!(parse_file_types("").is_empty());
    }

    #[test]
    fn test_extraction_config_mirrors_settings() {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            server_address: "127.0.0.1:0".to_string(),
            upload_path: "./uploads".to_string(),
            allowed_file_types: vec!["pdf".to_string()],
            max_file_size_mb: 2,
            ocr_language: "ind".to_string(),
            pdf_dpi: 150,
            tessdata_path: Some("/usr/share/tessdata".to_string()),
            pdftoppm_path: "/opt/poppler/bin/pdftoppm".to_string(),
        };

        let extraction = config.extraction_config();
        assert_eq!(extraction.pdf_dpi, 150);
        assert_eq!(extraction.ocr_language, "ind");
        assert_eq!(extraction.tessdata_path.as_deref(), Some("/usr/share/tessdata"));
        assert_eq!(extraction.pdftoppm_path, "/opt/poppler/bin/pdftoppm");
        assert_eq!(config.max_file_size_bytes(), 2 * 1024 * 1024);
    }
}
