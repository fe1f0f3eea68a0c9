#[cfg(test)]
use crate::services::file_service::{extension_of, sanitize_filename, write_or_discard, FileService};
#[cfg(test)]
use std::fs;
#[cfg(test)]
use std::io;
#[cfg(test)]
use std::pin::Pin;
#[cfg(test)]
use std::task::{Context, Poll};
#[cfg(test)]
use tokio::io::AsyncWrite;
#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
fn create_test_file_service() -> (FileService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let upload_path = temp_dir.path().to_string_lossy().to_string();
    let service = FileService::new(upload_path);
    (service, temp_dir)
}

/// Accepts nothing; every write fails as if the disk were full.
#[cfg(test)]
struct FullDisk;

#[cfg(test)]
impl AsyncWrite for FullDisk {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::other("no space left on device")))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_file_keeps_free_name() {
        let (service, temp_dir) = create_test_file_service();

        let stored = service.save_file("report.pdf", b"%PDF-1.5").await.unwrap();

        assert_eq!(stored.filename, "report.pdf");
        assert_eq!(stored.extension, "pdf");
        assert_eq!(stored.size, 8);
        assert_eq!(stored.path, temp_dir.path().join("report.pdf"));
        assert_eq!(fs::read(&stored.path).unwrap(), b"%PDF-1.5");
    }

    #[tokio::test]
    async fn test_save_file_collision_gets_suffix() {
        let (service, _temp_dir) = create_test_file_service();

        let first = service.save_file("report.pdf", b"first").await.unwrap();
        let second = service.save_file("report.pdf", b"second").await.unwrap();

        assert_eq!(first.filename, "report.pdf");
        assert_ne!(second.filename, first.filename);

        // report_xxxxxxxx.pdf
        let stem = second.filename.strip_suffix(".pdf").unwrap();
        let suffix = stem.strip_prefix("report_").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));

        // the original content is untouched
        assert_eq!(fs::read(&first.path).unwrap(), b"first");
        assert_eq!(fs::read(&second.path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_save_file_without_extension() {
        let (service, _temp_dir) = create_test_file_service();

        service.save_file("README", b"a").await.unwrap();
        let second = service.save_file("README", b"b").await.unwrap();

        assert!(second.filename.starts_with("README_"));
        assert!(!second.filename.contains('.'));
        assert_eq!(second.extension, "");
    }

    #[tokio::test]
    async fn test_save_file_strips_directories() {
        let (service, temp_dir) = create_test_file_service();

        let stored = service.save_file("../../etc/passwd", b"x").await.unwrap();

        assert_eq!(stored.filename, "passwd");
        assert!(stored.path.starts_with(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_save_file_name_without_stem_keeps_extension() {
        let (service, temp_dir) = create_test_file_service();

        let stored = service.save_file("..pdf", b"%PDF-1.5").await.unwrap();

        assert_eq!(stored.filename, "document.pdf");
        assert_eq!(stored.extension, "pdf");
        assert_eq!(stored.path, temp_dir.path().join("document.pdf"));
        assert!(service.file_path(&stored.filename).is_ok());
    }

    #[tokio::test]
    async fn test_failed_write_removes_partial_file() {
        let (_service, temp_dir) = create_test_file_service();
        let path = temp_dir.path().join("report.pdf");
        fs::write(&path, b"").unwrap();

        let err = write_or_discard(FullDisk, &path, b"%PDF-1.5").await.unwrap_err();

        assert!(err.to_string().contains("no space left on device"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let (service, _temp_dir) = create_test_file_service();
        let stored = service.save_file("scan.png", b"png").await.unwrap();

        assert!(service.file_exists(&stored.filename).await);
        assert!(service.delete_file(&stored.filename).await.unwrap());
        assert!(!service.file_exists(&stored.filename).await);

        // already gone
        assert!(!service.delete_file(&stored.filename).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_file() {
        let (service, _temp_dir) = create_test_file_service();
        service.save_file("notes.docx", b"PK").await.unwrap();

        assert_eq!(service.read_file("notes.docx").await.unwrap(), b"PK");
        assert!(service.read_file("missing.docx").await.is_err());
    }

    #[test]
    fn test_file_path_rejects_escaping_names() {
        let (service, _temp_dir) = create_test_file_service();

        assert!(service.file_path("report.pdf").is_ok());
        assert!(service.file_path("../report.pdf").is_err());
        assert!(service.file_path("a/b.pdf").is_err());
        assert!(service.file_path("").is_err());
    }

    #[test]
    fn test_is_allowed_file_type() {
        let (service, _temp_dir) = create_test_file_service();
        let allowed = vec!["pdf".to_string(), "docx".to_string(), "png".to_string()];

        assert!(service.is_allowed_file_type("scan.PDF", &allowed));
        assert!(service.is_allowed_file_type("letter.docx", &allowed));
        assert!(!service.is_allowed_file_type("photo.xyz", &allowed));
        assert!(!service.is_allowed_file_type("pdf", &allowed));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Laporan Q1 (final).pdf"), "Laporan Q1 (final).pdf");
        assert_eq!(sanitize_filename("C:\\Users\\x\\scan.png"), "scan.png");
        assert_eq!(sanitize_filename("a:b*c?.pdf"), "a_b_c_.pdf");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("../"), "document");
        assert_eq!(sanitize_filename(".."), "document");
    }

    #[test]
    fn test_sanitize_filename_keeps_extension() {
        assert_eq!(sanitize_filename("..pdf"), "document.pdf");
        assert_eq!(sanitize_filename("dir/.docx"), "docx");
        assert_eq!(sanitize_filename("???.png"), "___.png");
        assert_eq!(sanitize_filename(".hidden.pdf"), "hidden.pdf");
        assert_eq!(sanitize_filename("report..pdf"), "report.pdf");
        assert_eq!(sanitize_filename("archive.tar.gz"), "archive.tar.gz");
        assert_eq!(sanitize_filename("trailing."), "trailing");
    }

    #[test]
    fn test_sanitized_names_are_stable() {
        for name in ["..pdf", "a..", "Laporan Q1 (final).pdf", "x/ .y. .pdf", "report."] {
            let once = sanitize_filename(name);
            assert_eq!(sanitize_filename(&once), once, "{:?}", name);
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Report.PDF"), "pdf");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("README"), "");
    }
}
