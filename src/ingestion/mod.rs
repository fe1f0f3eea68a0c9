pub mod batch_import;
pub mod document_ingestion;
