//! Fixture builders and stub extraction collaborators shared by unit and
//! integration tests.

use anyhow::Result;
use image::{DynamicImage, ImageBuffer, Rgb};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;

use crate::config::{parse_file_types, Config};
use crate::db::Database;
use crate::extraction::{
    ExtractionError, ExtractionPipeline, OcrEngine, PageRasterizer, TextLayerReader,
};
use crate::ingestion::document_ingestion::DocumentIngestionService;
use crate::services::file_service::FileService;
use crate::{create_router, AppState};

/// Writes a PDF with one page per entry in `pages`. An empty or
/// whitespace-only entry produces a page without any text operators.
pub fn build_text_pdf(path: &Path, pages: &[&str]) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = Vec::new();
        if !text.trim().is_empty() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 24.into()]));
            operations.push(Operation::new("Td", vec![72.into(), 720.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

/// Writes a minimal DOCX package whose body holds the given paragraphs.
pub fn build_docx(path: &Path, paragraphs: &[&str]) -> Result<()> {
    let mut body = String::new();
    for paragraph in paragraphs {
        body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
        body.push_str(&xml_escape(paragraph));
        body.push_str("</w:t></w:r></w:p>");
    }
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(
        b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
          <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
          <Override PartName=\"/word/document.xml\" \
          ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
          </Types>",
    )?;
    zip.start_file("word/document.xml", options)?;
    zip.write_all(document.as_bytes())?;
    zip.finish()?;
    Ok(())
}

/// Writes a small gradient PNG.
pub fn build_png(path: &Path, width: u32, height: u32) -> Result<()> {
    sample_image(width, height).save(path)?;
    Ok(())
}

pub fn sample_image(width: u32, height: u32) -> DynamicImage {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    DynamicImage::ImageRgb8(img)
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// OCR stub returning a fixed answer and counting invocations.
#[derive(Debug, Default)]
pub struct CountingOcr {
    response: Option<String>,
    calls: AtomicUsize,
}

impl CountingOcr {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self { response: Some(text.to_string()), calls: AtomicUsize::new(0) })
    }

    /// A stub whose every call fails with a recognition error.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self { response: None, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for CountingOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| ExtractionError::recognition("tesseract is not installed"))
    }
}

/// Rasterizer stub producing a blank page, or failing on demand.
#[derive(Debug, Default)]
pub struct StubRasterizer {
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl StubRasterizer {
    pub fn blank_page() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(cause: &str) -> Arc<Self> {
        Arc::new(Self { fail_with: Some(cause.to_string()), calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageRasterizer for StubRasterizer {
    fn rasterize_first_page(&self, _path: &Path) -> Result<DynamicImage, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(cause) => Err(ExtractionError::rasterization(cause.clone())),
            None => Ok(sample_image(8, 8)),
        }
    }
}

/// Text layer stub returning canned page-1 text.
#[derive(Debug)]
pub struct StubTextLayer(pub Result<String, ExtractionError>);

impl TextLayerReader for StubTextLayer {
    fn first_page_text(&self, _path: &Path) -> Result<String, ExtractionError> {
        self.0.clone()
    }
}

/// Pipeline using the real `lopdf` text layer with stubbed rasterizer and OCR,
/// so tests never depend on poppler or tesseract being installed.
pub fn stub_pipeline(ocr: Arc<CountingOcr>, rasterizer: Arc<StubRasterizer>) -> ExtractionPipeline {
    ExtractionPipeline::default()
        .with_rasterizer(rasterizer)
        .with_ocr_engine(ocr)
}

/// A fully wired application backed by in-memory SQLite and a temporary
/// content directory, using stubbed rasterizer and OCR.
pub struct TestApp {
    pub state: Arc<AppState>,
    pub ocr: Arc<CountingOcr>,
    pub rasterizer: Arc<StubRasterizer>,
    // dropped last so the content directory outlives the state
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        Self::with_stubs(CountingOcr::returning("SCANNED TEXT"), StubRasterizer::blank_page()).await
    }

    pub async fn with_stubs(
        ocr: Arc<CountingOcr>,
        rasterizer: Arc<StubRasterizer>,
    ) -> Result<Self> {
        let upload_dir = tempfile::tempdir()?;
        let config = test_config(&upload_dir.path().to_string_lossy());

        let db = Database::connect_and_migrate(&config.database_url).await?;
        let file_service = FileService::new(config.upload_path.clone());
        file_service.initialize_directory_structure().await?;

        let ingestion = DocumentIngestionService::new(
            db.clone(),
            file_service,
            stub_pipeline(ocr.clone(), rasterizer.clone()),
            config.allowed_file_types.clone(),
        );
        let state = Arc::new(AppState { db, config, ingestion });

        Ok(Self { state, ocr, rasterizer, upload_dir })
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub fn upload_path(&self) -> &Path {
        self.upload_dir.path()
    }
}

/// Configuration for tests: in-memory database, default allow-list, 1 MiB
/// upload limit.
pub fn test_config(upload_path: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_address: "127.0.0.1:0".to_string(),
        upload_path: upload_path.to_string(),
        allowed_file_types: parse_file_types("pdf,docx,jpg,jpeg,png"),
        max_file_size_mb: 1,
        ocr_language: "eng".to_string(),
        pdf_dpi: 72,
        tessdata_path: None,
        pdftoppm_path: "pdftoppm".to_string(),
    }
}

const MULTIPART_BOUNDARY: &str = "arsip-test-boundary";

/// Encodes `files` (field name, file name, bytes) and plain `fields` as a
/// `multipart/form-data` body, text fields first. Returns the content type
/// and the body.
pub fn multipart_body(
    files: &[(&str, &str, &[u8])],
    fields: &[(&str, &str)],
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        push_text_part(&mut body, name, value);
    }
    for (name, filename, data) in files {
        push_file_part(&mut body, name, filename, data);
    }
    finish_multipart(body)
}

/// Like [`multipart_body`] but with the text fields after the files.
pub fn multipart_body_files_first(
    files: &[(&str, &str, &[u8])],
    fields: &[(&str, &str)],
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, filename, data) in files {
        push_file_part(&mut body, name, filename, data);
    }
    for (name, value) in fields {
        push_text_part(&mut body, name, value);
    }
    finish_multipart(body)
}

fn push_text_part(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn push_file_part(body: &mut Vec<u8>, name: &str, filename: &str, data: &[u8]) {
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
}

fn finish_multipart(mut body: Vec<u8>) -> (String, Vec<u8>) {
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    (format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY), body)
}
