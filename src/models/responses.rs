use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::document::{display_date, DocumentRecord};
use super::listing::{SortDirection, SortField};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i64,
    pub filename: String,
    pub category: String,
    pub doc_type: String,
    pub company_type: String,
    pub company_name: String,
    pub issued_date: String,
    /// `issued_date` rendered as `dd/Mon/yyyy`
    pub issued_date_display: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub file_url: String,
}

impl From<DocumentRecord> for DocumentResponse {
    fn from(doc: DocumentRecord) -> Self {
        Self {
            id: doc.id,
            file_url: format!("/uploads/{}", urlencoding::encode(&doc.filename)),
            issued_date_display: display_date(&doc.issued_date),
            filename: doc.filename,
            category: doc.category,
            doc_type: doc.doc_type,
            company_type: doc.company_type,
            company_name: doc.company_name,
            issued_date: doc.issued_date,
            notes: doc.notes,
            created_at: doc.created_at,
        }
    }
}

/// Result of the upload step: the file is stored but no record exists yet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadPreviewResponse {
    pub filename: String,
    pub extracted_text: String,
    /// Which extraction branch fired (`pdf_text_layer`, `pdf_ocr`, `docx`,
    /// `image_ocr`, `failed`, `unsupported`).
    pub extraction_status: String,
    pub company_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentDetailResponse {
    pub document: DocumentResponse,
    /// Freshly re-extracted text of the stored file.
    pub extracted_text: String,
    pub extraction_status: String,
    pub company_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub categories: Vec<String>,
    pub company_types: Vec<String>,
    pub companies: Vec<String>,
    pub selected_category: String,
    pub selected_company_type: String,
    pub selected_company: String,
    pub date_from: String,
    pub date_to: String,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchUploadResponse {
    pub uploaded: usize,
    /// Original names of files that were not accepted.
    pub skipped: Vec<String>,
    pub documents: Vec<DocumentResponse>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteDocumentResponse {
    pub id: i64,
    pub filename: String,
    pub file_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str) -> DocumentRecord {
        DocumentRecord {
            id: 7,
            filename: filename.to_string(),
            category: "Invoice".to_string(),
            doc_type: String::new(),
            company_type: String::new(),
            company_name: String::new(),
            issued_date: "2025-07-09".to_string(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_url_is_percent_encoded() {
        let response = DocumentResponse::from(record("Laporan Q1 (final).pdf"));

        assert_eq!(response.file_url, "/uploads/Laporan%20Q1%20%28final%29.pdf");
        assert_eq!(response.filename, "Laporan Q1 (final).pdf");
    }

    #[test]
    fn test_plain_file_url_is_unchanged() {
        let response = DocumentResponse::from(record("report_1a2b3c4d.pdf"));

        assert_eq!(response.file_url, "/uploads/report_1a2b3c4d.pdf");
        assert_eq!(response.issued_date_display, "09/Jul/2025");
    }
}
