//! Text extraction strategies.
//!
//! Each supported format is turned into a single UTF-8 string; images are
//! not extracted but re-encoded as a base64 data URI, which is their
//! canonical stored representation. Extraction either succeeds completely
//! or fails with a structured error — a partial result is never returned.

use std::io::{Cursor, Read};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use quick_xml::events::Event;
use thiserror::Error;

use super::FileKind;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("file is not valid UTF-8 text")]
    Utf8,

    #[error("failed to parse PDF: {0}")]
    Pdf(String),

    #[error("failed to extract text from PDF page {page}: {cause}")]
    PdfPage { page: u32, cause: String },

    #[error("failed to read DOCX document: {0}")]
    Docx(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalized artifact produced by extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedContent {
    /// Extracted UTF-8 text, ready for summarization.
    Text(String),
    /// Base64 data URI of an image payload, ready for description.
    ImageDataUri(String),
}

/// Run the extraction strategy selected by classification.
pub fn extract(
    kind: &FileKind,
    mime_type: &str,
    bytes: &[u8],
) -> Result<ExtractedContent, ExtractionError> {
    match kind {
        FileKind::PlainText => extract_plain_text(bytes).map(ExtractedContent::Text),
        FileKind::Pdf => extract_pdf(bytes).map(ExtractedContent::Text),
        FileKind::Docx => extract_docx(bytes).map(ExtractedContent::Text),
        FileKind::Image => Ok(ExtractedContent::ImageDataUri(encode_data_uri(
            mime_type, bytes,
        ))),
        FileKind::Unsupported(reason) => Err(ExtractionError::Unsupported(reason.clone())),
    }
}

/// Encode raw bytes as a `data:<mime>;base64,<payload>` URI.
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Plain text passes through verbatim; invalid UTF-8 is an error, never a
/// lossy decode.
fn extract_plain_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| ExtractionError::Utf8)
}

/// Extract text from a PDF page by page.
///
/// Pages are visited strictly in ascending 1-based order, page texts are
/// joined with a single newline, and the final concatenation is trimmed.
/// A failure on any page fails the whole document.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    let pages = doc.get_pages();
    let mut page_texts = Vec::with_capacity(pages.len());
    for (&page_number, _) in pages.iter() {
        let text = doc
            .extract_text(&[page_number])
            .map_err(|e| ExtractionError::PdfPage {
                page: page_number,
                cause: e.to_string(),
            })?;
        page_texts.push(text);
    }

    Ok(page_texts.join("\n").trim().to_string())
}

/// Extract raw text from a DOCX container.
///
/// Reads `word/document.xml` from the zip and collects `w:t` text runs,
/// with paragraph ends as newlines. Formatting is discarded; the collected
/// text is returned without further normalization.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(e.to_string()))?
        .read_to_string(&mut xml)?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let run = e
                    .unescape()
                    .map_err(|err| ExtractionError::Docx(err.to_string()))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractionError::Docx(e.to_string())),
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn pdf_bytes(page_texts: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![50.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
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

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_plain_text_passthrough() {
        let out = extract(&FileKind::PlainText, "text/plain", b"Hello world").unwrap();
        assert_eq!(out, ExtractedContent::Text("Hello world".to_string()));
    }

    #[test]
    fn test_plain_text_rejects_invalid_utf8() {
        let err = extract(&FileKind::PlainText, "text/plain", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractionError::Utf8));
    }

    #[test]
    fn test_image_passthrough_data_uri() {
        let out = extract(&FileKind::Image, "image/png", b"hi").unwrap();
        assert_eq!(
            out,
            ExtractedContent::ImageDataUri("data:image/png;base64,aGk=".to_string())
        );
    }

    #[test]
    fn test_pdf_pages_in_ascending_order() {
        let bytes = pdf_bytes(&["alpha alpha", "beta beta", "gamma gamma"]);
        let out = extract(&FileKind::Pdf, "application/pdf", &bytes).unwrap();
        let text = match out {
            ExtractedContent::Text(t) => t,
            other => panic!("expected text, got {:?}", other),
        };

        let alpha = text.find("alpha").expect("page 1 text missing");
        let beta = text.find("beta").expect("page 2 text missing");
        let gamma = text.find("gamma").expect("page 3 text missing");
        assert!(alpha < beta && beta < gamma);
        // Final concatenation is trimmed.
        assert_eq!(text, text.trim());
    }

    #[test]
    fn test_pdf_malformed_fails() {
        let err = extract(&FileKind::Pdf, "application/pdf", b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[test]
    fn test_docx_collects_text_runs() {
        let xml = r#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;
        let out = extract(&FileKind::Docx, "", &docx_bytes(xml)).unwrap();
        assert_eq!(
            out,
            ExtractedContent::Text("First paragraph.\nSecond paragraph.\n".to_string())
        );
    }

    #[test]
    fn test_docx_corrupt_container_fails() {
        let err = extract(&FileKind::Docx, "", b"PK garbage").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_docx_missing_document_xml_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract(&FileKind::Docx, "", &bytes).unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_unsupported_kind_is_an_error() {
        let kind = FileKind::Unsupported("unrecognized type".to_string());
        let err = extract(&kind, "", b"").unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(_)));
    }
}
