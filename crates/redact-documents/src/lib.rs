//! Document adapters for redact
//!
//! Each supported format implements [`DocumentAdapter`]: extract plain text
//! with page/paragraph offsets, apply match spans, and save a copy.

pub mod adapter;
pub mod docx;
pub mod error;
pub mod output;
pub mod pdf;

pub use adapter::{
    AdapterRegistry, DocumentAdapter, DocumentKind, DocumentText, RedactionStyle, Segment,
};
pub use docx::DocxDocument;
pub use error::{ApplicatorError, ApplicatorErrorKind, Operation, Result};
pub use pdf::{BoundingBox, PdfDocument, Rect};
