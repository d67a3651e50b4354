//! Error types for redact-documents

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApplicatorError>;

/// The adapter operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Open,
    Extract,
    Locate,
    Apply,
    Replace,
    Save,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Open => "open",
            Operation::Extract => "extract",
            Operation::Locate => "locate",
            Operation::Apply => "apply",
            Operation::Replace => "replace",
            Operation::Save => "save",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[error("Document {operation} failed")]
pub struct ApplicatorError {
    pub operation: Operation,
    #[source]
    pub kind: ApplicatorErrorKind,
}

impl ApplicatorError {
    pub fn new(operation: Operation, kind: impl Into<ApplicatorErrorKind>) -> Self {
        Self {
            operation,
            kind: kind.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApplicatorErrorKind {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Document is encrypted")]
    Encrypted,

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Span {start}..{end} does not match the document text")]
    SpanMismatch { start: usize, end: usize },
}

/// Tag an error with the operation it happened in
pub(crate) trait During<T> {
    fn during(self, operation: Operation) -> Result<T>;
}

impl<T, E: Into<ApplicatorErrorKind>> During<T> for std::result::Result<T, E> {
    fn during(self, operation: Operation) -> Result<T> {
        self.map_err(|e| ApplicatorError::new(operation, e))
    }
}
