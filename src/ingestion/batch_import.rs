use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::ingestion::document_ingestion::DocumentIngestionService;
use crate::models::{DocumentMetadata, DocumentRecord};

#[derive(Debug, Default)]
pub struct BatchImportSummary {
    pub imported: Vec<DocumentRecord>,
    /// Files that matched the allow-list but could not be imported.
    pub failed: Vec<(PathBuf, String)>,
    /// Diagnostics stored as notes, for reporting.
    pub extraction_failures: usize,
}

/// Imports every allowed file found directly inside a directory.
pub struct BatchImporter {
    ingestion: DocumentIngestionService,
}

impl BatchImporter {
    pub fn new(ingestion: DocumentIngestionService) -> Self {
        Self { ingestion }
    }

    /// Allowed files directly inside `dir_path`, sorted by name.
    pub fn collect_files(&self, dir_path: &Path) -> Result<Vec<PathBuf>> {
        if !dir_path.is_dir() {
            return Err(anyhow!("Directory {} does not exist", dir_path.display()));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| self.ingestion.is_allowed(name))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        Ok(files)
    }

    pub async fn import_directory(
        &self,
        dir_path: &Path,
        defaults: &DocumentMetadata,
    ) -> Result<BatchImportSummary> {
        defaults.validate()?;

        info!("Starting batch import from directory: {:?}", dir_path);
        let files = self.collect_files(dir_path)?;
        if files.is_empty() {
            return Err(anyhow!(
                "No importable files ({}) in {}",
                self.ingestion.allowed_file_types().join(", "),
                dir_path.display()
            ));
        }
        info!("Found {} files to import", files.len());

        let mut summary = BatchImportSummary::default();
        for path in files {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let data = match fs::read(&path).await {
                Ok(data) => data,
                Err(e) => {
                    warn!("Skipping unreadable file {:?}: {}", path, e);
                    summary.failed.push((path, e.to_string()));
                    continue;
                }
            };

            match self.ingestion.ingest(&name, &data, defaults).await {
                Ok(record) => {
                    if crate::extraction::is_diagnostic_text(&record.notes) {
                        summary.extraction_failures += 1;
                    }
                    info!("Imported {:?} as document {} ('{}')", path, record.id, record.filename);
                    summary.imported.push(record);
                }
                Err(e) => {
                    error!("Failed to import {:?}: {}", path, e);
                    summary.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            "Batch import finished: {} imported, {} failed, {} without extracted text",
            summary.imported.len(),
            summary.failed.len(),
            summary.extraction_failures
        );
        Ok(summary)
    }
}
