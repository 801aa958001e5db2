//! Content ingestion: format classification and text extraction.
//!
//! Classification is a pure decision over the file's declared MIME type and
//! its name. It runs before any byte of the file is read, so unsupported
//! uploads are rejected without I/O.

mod extract;

pub use extract::{encode_data_uri, extract, ExtractedContent, ExtractionError};

/// Extraction strategy for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Pdf,
    Docx,
    Image,
    Unsupported(String),
}

/// Decide the extraction strategy for a file.
///
/// Rules apply in priority order; the first match wins. The suffix checks
/// are ASCII case-insensitive so `Report.DOCX` classifies like `report.docx`.
pub fn classify(mime_type: &str, filename: &str) -> FileKind {
    let name = filename.to_ascii_lowercase();

    if mime_type.starts_with("image/") {
        FileKind::Image
    } else if mime_type == "text/plain" {
        FileKind::PlainText
    } else if name.ends_with(".docx") {
        FileKind::Docx
    } else if mime_type == "application/pdf" {
        FileKind::Pdf
    } else if name.ends_with(".doc") {
        FileKind::Unsupported("legacy format, convert to .docx".to_string())
    } else {
        FileKind::Unsupported("unrecognized type".to_string())
    }
}
