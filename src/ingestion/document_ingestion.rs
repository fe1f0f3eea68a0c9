/*!
 * Document ingestion shared by the upload routes, batch upload and the
 * directory importer: store the blob under a collision-free name, run the
 * extraction pipeline on the final path, and optionally insert the record.
 */

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::db::Database;
use crate::extraction::{ExtractionError, ExtractionOutcome, ExtractionPipeline, FileKind};
use crate::models::{DocumentMetadata, DocumentRecord};
use crate::services::file_service::{extension_of, sanitize_filename, FileService, StoredFile};

/// Flattened extraction result plus the branch that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub status: &'static str,
}

impl From<ExtractionOutcome> for ExtractedText {
    fn from(outcome: ExtractionOutcome) -> Self {
        let status = outcome.status();
        Self { text: outcome.into_notes(), status }
    }
}

#[derive(Clone)]
pub struct DocumentIngestionService {
    db: Database,
    file_service: FileService,
    pipeline: ExtractionPipeline,
    allowed_file_types: Vec<String>,
}

impl DocumentIngestionService {
    pub fn new(
        db: Database,
        file_service: FileService,
        pipeline: ExtractionPipeline,
        allowed_file_types: Vec<String>,
    ) -> Self {
        Self { db, file_service, pipeline, allowed_file_types }
    }

    pub fn file_service(&self) -> &FileService {
        &self.file_service
    }

    pub fn allowed_file_types(&self) -> &[String] {
        &self.allowed_file_types
    }

    /// Checks the name the upload will actually be stored under.
    pub fn is_allowed(&self, filename: &str) -> bool {
        let stored_name = sanitize_filename(filename);
        self.file_service.is_allowed_file_type(&stored_name, &self.allowed_file_types)
    }

    /// Saves the upload without extracting anything yet.
    pub async fn store(&self, original_name: &str, data: &[u8]) -> Result<StoredFile> {
        let stored = self.file_service.save_file(original_name, data).await?;
        info!(
            "Stored upload '{}' as '{}' ({} bytes)",
            original_name, stored.filename, stored.size
        );
        Ok(stored)
    }

    /// Removes a stored file that will not get a record.
    pub async fn discard(&self, stored: &StoredFile) {
        if let Err(e) = self.file_service.delete_file(&stored.filename).await {
            error!("Failed to remove '{}': {}", stored.filename, e);
        }
    }

    /// Saves the upload and extracts its text. No record is created; the
    /// caller shows the text for confirmation first.
    pub async fn store_and_extract(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<(StoredFile, ExtractedText)> {
        let stored = self.store(original_name, data).await?;
        let extracted = self.extract_path(stored.path.clone(), stored.extension.clone()).await;
        Ok((stored, extracted))
    }

    /// Re-runs extraction on a file already in the content directory.
    pub async fn extract_stored(&self, filename: &str) -> Result<ExtractedText> {
        let path = self.file_service.file_path(filename)?;
        Ok(self.extract_path(path, extension_of(filename)).await)
    }

    /// Stores, extracts and inserts a record using `defaults` for every
    /// metadata field except notes, which receive the extracted text.
    pub async fn ingest(
        &self,
        original_name: &str,
        data: &[u8],
        defaults: &DocumentMetadata,
    ) -> Result<DocumentRecord> {
        let stored = self.store(original_name, data).await?;
        self.ingest_stored(&stored, defaults).await
    }

    /// Extracts and inserts a record for a file saved with [`Self::store`].
    /// The file is removed again when no record can be created.
    pub async fn ingest_stored(
        &self,
        stored: &StoredFile,
        defaults: &DocumentMetadata,
    ) -> Result<DocumentRecord> {
        let extracted = self
            .extract_path(stored.path.clone(), stored.extension.clone())
            .await;

        let metadata = DocumentMetadata {
            notes: Some(extracted.text),
            ..defaults.clone()
        };

        let new_document = match metadata.into_new_document(stored.filename.clone()) {
            Ok(doc) => doc,
            Err(e) => {
                // keep the content directory in sync with the table
                self.discard(stored).await;
                return Err(e.into());
            }
        };

        match self.db.create_document(&new_document).await {
            Ok(record) => {
                debug!(
                    "Created document {} for '{}' ({})",
                    record.id, record.filename, extracted.status
                );
                Ok(record)
            }
            Err(e) => {
                error!("Failed to insert record for '{}': {}", stored.filename, e);
                self.discard(stored).await;
                Err(e)
            }
        }
    }

    /// Runs the synchronous pipeline off the async executor.
    async fn extract_path(&self, path: PathBuf, extension: String) -> ExtractedText {
        let pipeline = self.pipeline.clone();
        let kind = FileKind::from_extension(&extension);

        match tokio::task::spawn_blocking(move || pipeline.run(&path, &extension)).await {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                error!("Extraction task failed: {}", e);
                let outcome = match kind {
                    FileKind::Unsupported => ExtractionOutcome::Unsupported,
                    kind => ExtractionOutcome::Failed {
                        kind,
                        error: ExtractionError::recognition(format!(
                            "extraction task aborted: {}",
                            e
                        )),
                    },
                };
                outcome.into()
            }
        }
    }
}
