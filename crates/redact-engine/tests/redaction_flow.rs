//! End-to-end redaction of generated PDF and Word files

use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use redact_core::{Category, MatchConfig, SpanLabel, TermSet};
use redact_documents::{DocumentKind, RedactionStyle};
use redact_engine::{EngineError, RedactionEngine};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn write_pdf(path: &Path, lines: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 11.into()]),
        Operation::new("TL", vec![14.into()]),
        Operation::new("Td", vec![50.into(), 750.into()]),
    ];
    for line in lines {
        operations.push(Operation::new("'", vec![Object::string_literal(*line)]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations }.encode().unwrap();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1,
            "MediaBox" => Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let mut body = String::from(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for p in paragraphs {
        body.push_str(&format!(
            r#"<w:p><w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            p
        ));
    }
    body.push_str("</w:body></w:document>");

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("[Content_Types].xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(b"<Types/>").unwrap();
    zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
    zip.write_all(body.as_bytes()).unwrap();
    std::fs::write(path, zip.finish().unwrap().into_inner()).unwrap();
}

fn docx_body(path: &Path) -> String {
    let mut archive = ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut body = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut body)
        .unwrap();
    body
}

#[tokio::test]
async fn pdf_redaction_removes_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("statement.pdf");
    let output = dir.path().join("statement_redacted.pdf");
    write_pdf(
        &input,
        &[
            "Account holder: Jane Roe",
            "Card 4111 1111 1111 1111",
            "Opened 2021-03-14",
        ],
    );

    let engine = RedactionEngine::default();
    let config = MatchConfig::all_categories();

    let preview = engine.preview(&input, &config).await.unwrap();
    let labels: Vec<_> = preview.spans.iter().map(|s| s.label).collect();
    assert_eq!(
        labels,
        vec![
            SpanLabel::Category(Category::CreditCard),
            SpanLabel::Category(Category::Date)
        ]
    );

    let report = engine.redact(&input, &output, &config).await.unwrap();
    assert_eq!(report.format, DocumentKind::Pdf);
    assert_eq!(report.result.span_count, 2);
    assert_eq!(report.units_redacted, 1);

    let after = engine.preview(&output, &config).await.unwrap();
    assert!(after.spans.is_empty());
    assert!(!after.text.contains("4111"));
    assert!(after.text.contains("Account holder: Jane Roe"));
}

#[tokio::test]
async fn docx_redaction_uses_block_characters() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("letter.docx");
    let output = dir.path().join("letter_redacted.docx");
    write_docx(
        &input,
        &["Dear Jane,", "Your SSN 123-45-6789 is on file.", "Project Falcon starts soon."],
    );

    let terms = Arc::new(TermSet::from_lines(["falcon"]));
    let config = MatchConfig::new([Category::Ssn], terms);
    let engine = RedactionEngine::new(RedactionStyle {
        block_char: '#',
        ..RedactionStyle::default()
    });

    let report = engine.redact(&input, &output, &config).await.unwrap();
    assert_eq!(report.result.span_count, 2);
    assert_eq!(report.result.category_counts[&SpanLabel::Custom], 1);
    assert_eq!(report.units_redacted, 2);

    let body = docx_body(&output);
    assert!(body.contains("Your SSN ########### is on file."));
    assert!(body.contains("Project ###### starts soon."));
    assert!(body.contains("<w:i/>"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["format"], "docx");
    assert_eq!(json["span_count"], 2);
    assert_eq!(json["category_counts"]["ssn"], 1);
}

#[tokio::test]
async fn disabled_categories_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.docx");
    let output = dir.path().join("note_out.docx");
    write_docx(&input, &["mail jane@corp.com or call 555-123-4567"]);

    let config = MatchConfig::new([Category::Phone], Arc::new(TermSet::new()));
    let engine = RedactionEngine::default();
    engine.redact(&input, &output, &config).await.unwrap();

    let body = docx_body(&output);
    assert!(body.contains("jane@corp.com"));
    assert!(!body.contains("555-123-4567"));
}

#[tokio::test]
async fn redacting_onto_the_input_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("letter.docx");
    write_docx(&input, &["SSN 123-45-6789"]);

    let engine = RedactionEngine::default();
    let err = engine
        .redact(&input, &input, &MatchConfig::all_categories())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::OutputIsInput(_)));
    assert!(docx_body(&input).contains("123-45-6789"));
}
