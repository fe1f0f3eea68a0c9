use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;

use super::error::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the body paragraphs of a DOCX file and joins them with newlines.
///
/// Only top-level body paragraphs are returned; paragraphs nested in tables
/// or text boxes are skipped. Tabs and explicit breaks inside a paragraph are
/// kept as `\t` and `\n`.
pub fn extract_docx_text(path: &Path) -> Result<String, ExtractionError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ExtractionError::structured(format!("cannot open {}: {}", path.display(), e))
    })?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ExtractionError::structured(format!("not a DOCX package: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::structured(format!("{} not found: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::structured(format!("cannot read {}: {}", DOCUMENT_PART, e)))?;

    Ok(paragraphs_from_xml(&xml)?.join("\n"))
}

fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    // w:tbl and w:txbxContent nesting
    let mut nested = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            ExtractionError::structured(format!(
                "malformed document XML at byte {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => nested += 1,
                b"w:p" if nested == 0 => current = Some(String::new()),
                b"w:t" => in_text = current.is_some() && nested == 0,
                _ => {}
            },
            Event::Empty(e) => {
                if nested > 0 {
                    continue;
                }
                match e.name().as_ref() {
                    b"w:p" => paragraphs.push(String::new()),
                    b"w:tab" => push_char(&mut current, '\t'),
                    b"w:br" | b"w:cr" => push_char(&mut current, '\n'),
                    _ => {}
                }
            }
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::structured(format!("bad text run: {}", e)))?;
                if let Some(paragraph) = current.as_mut() {
                    paragraph.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => nested = nested.saturating_sub(1),
                b"w:p" if nested == 0 => {
                    if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_char(current: &mut Option<String>, c: char) {
    if let Some(paragraph) = current.as_mut() {
        paragraph.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    #[test]
    fn test_paragraphs_in_document_order() {
        let xml = format!(
            r#"<w:document {NS}><w:body>
                <w:p><w:r><w:t>Hello</w:t></w:r></w:p>
                <w:p><w:r><w:t xml:space="preserve">Wor</w:t></w:r><w:r><w:t>ld</w:t></w:r></w:p>
            </w:body></w:document>"#
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Hello", "World"]);
    }

    #[test]
    fn test_empty_paragraphs_tabs_and_entities() {
        let xml = format!(
            r#"<w:document {NS}><w:body>
                <w:p/>
                <w:p><w:r><w:t>A</w:t><w:tab/><w:t>B &amp; C</w:t><w:br/><w:t>D</w:t></w:r></w:p>
            </w:body></w:document>"#
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["", "A\tB & C\nD"]);
    }

    #[test]
    fn test_table_paragraphs_are_skipped() {
        let xml = format!(
            r#"<w:document {NS}><w:body>
                <w:p><w:r><w:t>Before</w:t></w:r></w:p>
                <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
                <w:p><w:r><w:t>After</w:t></w:r></w:p>
            </w:body></w:document>"#
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Before", "After"]);
    }

    #[test]
    fn test_instruction_text_is_ignored() {
        let xml = format!(
            r#"<w:document {NS}><w:body>
                <w:p><w:r><w:instrText>PAGE</w:instrText></w:r><w:r><w:t>Title</w:t></w:r></w:p>
            </w:body></w:document>"#
        );
        assert_eq!(paragraphs_from_xml(&xml).unwrap(), vec!["Title"]);
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fake.docx");
        std::fs::write(&path, b"plain bytes").unwrap();

        let err = extract_docx_text(&path).unwrap_err();
        assert!(err.to_string().contains("not a DOCX package"));
    }
}
