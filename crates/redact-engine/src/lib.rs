//! Preview and redaction of documents on disk
//!
//! Opening, scanning and saving run on tokio's blocking pool. Operations on
//! the same document are serialized through [`DocumentLocks`].

pub mod error;
pub mod locks;

use std::path::{Path, PathBuf};

use redact_core::{MatchConfig, Preview, RedactionResult, find_matches};
use redact_documents::{AdapterRegistry, DocumentKind, RedactionStyle};
use serde::{Deserialize, Serialize};

pub use error::{EngineError, Result};
pub use locks::DocumentLocks;

/// Outcome of a completed redaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: DocumentKind,
    /// Pages or paragraphs that had something redacted
    pub units_redacted: usize,
    /// Pages or paragraphs in the document
    pub units_total: usize,
    #[serde(flatten)]
    pub result: RedactionResult,
}

pub struct RedactionEngine {
    registry: AdapterRegistry,
    locks: DocumentLocks,
}

impl RedactionEngine {
    pub fn new(style: RedactionStyle) -> Self {
        Self {
            registry: AdapterRegistry::new(style),
            locks: DocumentLocks::new(),
        }
    }

    /// Extract a document's text and report what would be redacted
    pub async fn preview(&self, input: &Path, config: &MatchConfig) -> Result<Preview> {
        let input = resolve_input(input).await?;
        let guard = self.locks.lock(&input).await;

        let registry = self.registry.clone();
        let config = config.clone();
        let path = input.clone();
        let outcome = tokio::task::spawn_blocking(move || -> Result<Preview> {
            let document = registry.open(&path)?;
            let text = document.text().as_str().to_string();
            let spans = find_matches(&text, &config);
            Ok(Preview::new(text, spans))
        })
        .await;

        drop(guard);
        self.locks.prune();

        let preview = outcome??;
        tracing::info!("Previewed {}: {} matches", input.display(), preview.total());
        Ok(preview)
    }

    /// Redact `input` into `output`, which must not be the input itself.
    ///
    /// The report is only returned once the output file is fully written.
    pub async fn redact(&self, input: &Path, output: &Path, config: &MatchConfig) -> Result<RedactionReport> {
        let input = resolve_input(input).await?;
        if same_file(&input, output).await {
            return Err(EngineError::OutputIsInput(output.to_path_buf()));
        }

        let guard = self.locks.lock(&input).await;

        let registry = self.registry.clone();
        let config = config.clone();
        let source = input.clone();
        let target = output.to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || -> Result<RedactionReport> {
            let mut document = registry.open(&source)?;
            let spans = find_matches(document.text().as_str(), &config);
            let units_total = document.text().segments().len();

            let units_redacted = document.redact(&spans)?;
            document.save(&target)?;

            Ok(RedactionReport {
                input: source,
                output: target,
                format: document.kind(),
                units_redacted,
                units_total,
                result: RedactionResult::from_spans(&spans),
            })
        })
        .await;

        drop(guard);
        self.locks.prune();

        let report = outcome??;
        tracing::info!(
            "Redacted {} -> {}: {} spans in {} of {} {}",
            report.input.display(),
            report.output.display(),
            report.result.span_count,
            report.units_redacted,
            report.units_total,
            report.format.unit_name()
        );
        Ok(report)
    }
}

impl Default for RedactionEngine {
    fn default() -> Self {
        Self::new(RedactionStyle::default())
    }
}

async fn resolve_input(input: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(input)
        .await
        .map_err(|_| EngineError::InputNotFound(input.to_path_buf()))
}

/// Whether `output` names the already-canonical `input`, even if it does
/// not exist yet or is spelled differently
async fn same_file(input: &Path, output: &Path) -> bool {
    if let Ok(canonical) = tokio::fs::canonicalize(output).await {
        return canonical == input;
    }

    let (Some(parent), Some(name)) = (output.parent(), output.file_name()) else {
        return false;
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    match tokio::fs::canonicalize(parent).await {
        Ok(dir) => dir.join(name) == input,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_documents::{ApplicatorErrorKind, Operation};
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let mut body = String::from(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        );
        for p in paragraphs {
            body.push_str(&format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p));
        }
        body.push_str("</w:body></w:document>");

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
        std::fs::write(path, zip.finish().unwrap().into_inner()).unwrap();
    }

    #[tokio::test]
    async fn test_preview_reports_matches() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.docx");
        write_docx(&input, &["Reach me at jane@corp.com", "SSN 123-45-6789"]);

        let engine = RedactionEngine::default();
        let preview = engine.preview(&input, &MatchConfig::all_categories()).await.unwrap();

        assert_eq!(preview.total(), 2);
        assert_eq!(preview.text, "Reach me at jane@corp.com\nSSN 123-45-6789");
        assert!(engine.locks.is_empty());
    }

    #[tokio::test]
    async fn test_redact_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.docx");
        let output = dir.path().join("memo_redacted.docx");
        write_docx(&input, &["Reach me at jane@corp.com", "nothing", "SSN 123-45-6789"]);

        let engine = RedactionEngine::default();
        let report = engine
            .redact(&input, &output, &MatchConfig::all_categories())
            .await
            .unwrap();

        assert_eq!(report.format, DocumentKind::Docx);
        assert_eq!(report.result.span_count, 2);
        assert_eq!(report.units_redacted, 2);
        assert_eq!(report.units_total, 3);
        assert!(output.exists());

        let preview = engine.preview(&output, &MatchConfig::all_categories()).await.unwrap();
        assert_eq!(preview.total(), 0);
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RedactionEngine::default();
        let err = engine
            .redact(&dir.path().join("nope.pdf"), &dir.path().join("out.pdf"), &MatchConfig::all_categories())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InputNotFound(_)));
    }

    #[tokio::test]
    async fn test_output_may_not_be_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.docx");
        write_docx(&input, &["SSN 123-45-6789"]);
        let before = std::fs::read(&input).unwrap();

        let engine = RedactionEngine::default();
        let config = MatchConfig::all_categories();

        let err = engine.redact(&input, &input, &config).await.unwrap_err();
        assert!(matches!(err, EngineError::OutputIsInput(_)));

        let respelled = dir.path().join(".").join("memo.docx");
        let err = engine.redact(&input, &respelled, &config).await.unwrap_err();
        assert!(matches!(err, EngineError::OutputIsInput(_)));

        assert_eq!(std::fs::read(&input).unwrap(), before);
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "SSN 123-45-6789").unwrap();

        let engine = RedactionEngine::default();
        let err = engine
            .preview(&input, &MatchConfig::all_categories())
            .await
            .unwrap_err();
        match err {
            EngineError::Applicator(e) => {
                assert_eq!(e.operation, Operation::Open);
                assert!(matches!(e.kind, ApplicatorErrorKind::UnsupportedFormat(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.docx");
        let output = dir.path().join("missing").join("memo.docx");
        write_docx(&input, &["SSN 123-45-6789"]);

        let engine = RedactionEngine::default();
        let err = engine
            .redact(&input, &output, &MatchConfig::all_categories())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Applicator(ref e) if e.operation == Operation::Save));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_concurrent_redactions_of_one_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("memo.docx");
        write_docx(&input, &["SSN 123-45-6789"]);
        let first = dir.path().join("a.docx");
        let second = dir.path().join("b.docx");

        let engine = RedactionEngine::default();
        let config = MatchConfig::all_categories();
        let (a, b) = tokio::join!(
            engine.redact(&input, &first, &config),
            engine.redact(&input, &second, &config)
        );

        assert_eq!(a.unwrap().result.span_count, 1);
        assert_eq!(b.unwrap().result.span_count, 1);
        assert!(engine.locks.is_empty());
    }
}
