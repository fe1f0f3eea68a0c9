use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};
use uuid::Uuid;

/// How many suffixed names to try before giving up on a save.
const MAX_NAME_ATTEMPTS: usize = 16;

/// A blob persisted in the content directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Final, de-duplicated name inside the content directory.
    pub filename: String,
    pub path: PathBuf,
    /// Lower-cased extension without the dot; empty when the name has none.
    pub extension: String,
    pub size: u64,
}

#[derive(Clone)]
pub struct FileService {
    upload_path: String,
}

impl FileService {
    pub fn new(upload_path: String) -> Self {
        Self { upload_path }
    }

    pub fn upload_path(&self) -> &Path {
        Path::new(&self.upload_path)
    }

    /// Create the content directory if it does not exist yet
    pub async fn initialize_directory_structure(&self) -> Result<()> {
        let base_path = self.upload_path();
        if let Err(e) = fs::create_dir_all(base_path).await {
            error!("Failed to create directory {:?}: {}", base_path, e);
            return Err(anyhow!("Failed to create upload directory: {}", e));
        }
        info!("Ensured directory exists: {:?}", base_path);
        Ok(())
    }

    pub fn is_allowed_file_type(&self, filename: &str, allowed_types: &[String]) -> bool {
        let extension = extension_of(filename);
        !extension.is_empty() && allowed_types.contains(&extension)
    }

    /// Absolute location of a stored file. Names that would escape the
    /// content directory are rejected.
    pub fn file_path(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty() || sanitize_filename(filename) != filename {
            return Err(anyhow!("Invalid stored filename: {:?}", filename));
        }
        Ok(self.upload_path().join(filename))
    }

    pub async fn file_exists(&self, filename: &str) -> bool {
        match self.file_path(filename) {
            Ok(path) => fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Saves `data` under the sanitized original name, appending a short
    /// unique suffix (`report_1a2b3c4d.pdf`) when the name is taken.
    ///
    /// Files are created with `create_new`, so two concurrent uploads of the
    /// same name can never overwrite each other.
    pub async fn save_file(&self, original_name: &str, data: &[u8]) -> Result<StoredFile> {
        let base_name = sanitize_filename(original_name);
        let upload_dir = self.upload_path();

        if let Err(e) = fs::create_dir_all(upload_dir).await {
            error!("Failed to create upload directory: {}", e);
            return Err(anyhow!("Failed to create upload directory: {}", e));
        }

        let mut candidate = base_name.clone();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = upload_dir.join(&candidate);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    write_or_discard(file, &path, data).await?;
                    if candidate != base_name {
                        info!(
                            "Stored '{}' as '{}' to avoid a name collision",
                            original_name, candidate
                        );
                    }
                    return Ok(StoredFile {
                        extension: extension_of(&candidate),
                        filename: candidate,
                        path,
                        size: data.len() as u64,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = with_unique_suffix(&base_name);
                }
                Err(e) => return Err(anyhow!("Failed to save {}: {}", path.display(), e)),
            }
        }

        Err(anyhow!(
            "Could not find a free name for '{}' after {} attempts",
            original_name,
            MAX_NAME_ATTEMPTS
        ))
    }

    pub async fn read_file(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.file_path(filename)?;
        let data = fs::read(&path).await?;
        Ok(data)
    }

    /// Removes a stored file. Returns `false` when it was already gone.
    pub async fn delete_file(&self, filename: &str) -> Result<bool> {
        let path = self.file_path(filename)?;
        match fs::remove_file(&path).await {
            Ok(_) => {
                info!("Deleted file: {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // possibly removed by a concurrent request
                info!("File already deleted: {}", path.display());
                Ok(false)
            }
            Err(e) => {
                warn!("Failed to delete file {}: {}", path.display(), e);
                Err(anyhow!("Failed to delete file {}: {}", path.display(), e))
            }
        }
    }
}

/// Lower-cased extension of `filename` without the leading dot.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

/// Writes `data` to a freshly created file at `path`. A failed write
/// removes the file again so no partial upload keeps the reserved name.
pub(crate) async fn write_or_discard<W>(mut file: W, path: &Path, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written: std::io::Result<()> = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = fs::remove_file(path).await {
            warn!("Failed to remove partial file {}: {}", path.display(), remove_err);
        }
        return Err(anyhow!("Failed to write {}: {}", path.display(), e));
    }
    Ok(())
}

/// Reduces a client supplied name to a single safe path component.
///
/// Directory parts are dropped, characters outside letters, digits, `.`,
/// `-`, `_`, space and parentheses become `_`, and leading dots are removed
/// so hidden or relative names cannot be produced. The stem and extension
/// are cleaned separately, so the extension survives even when nothing of
/// the stem does (`..pdf` becomes `document.pdf`).
pub fn sanitize_filename(name: &str) -> String {
    let last_component = name.rsplit(['/', '\\']).next().unwrap_or("");
    let path = Path::new(last_component);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(last_component);
    let stem = clean_name_part(stem);
    let stem = if stem.is_empty() { "document".to_string() } else { stem };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(clean_name_part)
        .filter(|e| !e.is_empty());

    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn clean_name_part(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ' | '(' | ')') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim().trim_matches('.').trim().to_string()
}

fn with_unique_suffix(filename: &str) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let path = Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext),
        None => format!("{}_{}", stem, suffix),
    }
}
