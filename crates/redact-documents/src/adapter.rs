//! Document adapter trait and registry

use std::path::Path;

use redact_core::MatchSpan;
use serde::{Deserialize, Serialize};

use crate::error::{ApplicatorError, ApplicatorErrorKind, Operation, Result};
use crate::{DocxDocument, PdfDocument};

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }

    /// What a text segment is called for this format
    pub fn unit_name(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pages",
            DocumentKind::Docx => "paragraphs",
        }
    }
}

/// A page (PDF) or paragraph (DOCX) inside the extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// Plain text extracted from a document, with segment offsets
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    text: String,
    segments: Vec<Segment>,
}

impl DocumentText {
    pub fn new(text: String, segments: Vec<Segment>) -> Self {
        Self { text, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check that a span still describes this text
    pub(crate) fn check_span(&self, span: &MatchSpan, operation: Operation) -> Result<()> {
        match self.text.get(span.start..span.end) {
            Some(found) if found == span.text => Ok(()),
            _ => Err(ApplicatorError::new(
                operation,
                ApplicatorErrorKind::SpanMismatch {
                    start: span.start,
                    end: span.end,
                },
            )),
        }
    }
}

/// How redactions are rendered
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionStyle {
    /// Replacement character for Word documents
    pub block_char: char,
    /// RGB fill of PDF redaction boxes
    pub fill_color: [f32; 3],
    /// Estimated PDF glyph advance, as a fraction of the font size
    pub glyph_width: f32,
}

impl Default for RedactionStyle {
    fn default() -> Self {
        Self {
            block_char: '█',
            fill_color: [0.0, 0.0, 0.0],
            glyph_width: 0.5,
        }
    }
}

/// Capability set shared by all formats
pub trait DocumentAdapter: Send {
    fn kind(&self) -> DocumentKind;

    /// Text the match spans are computed against
    fn text(&self) -> &DocumentText;

    /// Permanently apply spans computed over [`text`](Self::text).
    ///
    /// Returns the number of pages or paragraphs that changed.
    fn redact(&mut self, spans: &[MatchSpan]) -> Result<usize>;

    /// Write the document to `output`. Either the whole file is written or
    /// nothing is left behind.
    fn save(&mut self, output: &Path) -> Result<()>;
}

/// Opens the right adapter for a file
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    style: RedactionStyle,
}

impl AdapterRegistry {
    pub fn new(style: RedactionStyle) -> Self {
        Self { style }
    }

    /// Open a document; blocks on file I/O
    pub fn open(&self, path: &Path) -> Result<Box<dyn DocumentAdapter>> {
        match DocumentKind::from_path(path) {
            Some(DocumentKind::Pdf) => Ok(Box::new(PdfDocument::open(path, &self.style)?)),
            Some(DocumentKind::Docx) => Ok(Box::new(DocxDocument::open(path, &self.style)?)),
            None => Err(ApplicatorError::new(
                Operation::Open,
                ApplicatorErrorKind::UnsupportedFormat(
                    path.extension()
                        .map(|e| format!(".{}", e.to_string_lossy()))
                        .unwrap_or_else(|| path.display().to_string()),
                ),
            )),
        }
    }
}
