//! Word adapter: block characters substituted inside `<w:t>` runs
//!
//! The package is edited at the XML text level so run properties, styles
//! and every other part of the archive stay exactly as they were.

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use redact_core::MatchSpan;
use regex::{Captures, Regex};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::adapter::{DocumentAdapter, DocumentKind, DocumentText, RedactionStyle, Segment};
use crate::error::{ApplicatorError, ApplicatorErrorKind, During, Operation, Result};
use crate::output::write_atomically;

const MAIN_PART: &str = "word/document.xml";

static TEXT_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^word/(document|header\d*|footer\d*|footnotes|endnotes)\.xml$").unwrap()
});

/// Paragraph starts, text runs, and run-level tabs and breaks, in document
/// order. Tab stops (`<w:tab w:val=.../>` inside `<w:tabs>`) carry attributes
/// and are not matched.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<w:p(?:\s[^>]*)?/?>|<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:(tab)\s*/>|<w:(br|cr)(?:\s[^>]*)?/>",
    )
    .unwrap()
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|amp|lt|gt|quot|apos);").unwrap()
});

struct TextRun {
    /// Byte range of the escaped run content inside the part's XML
    content: Range<usize>,
    /// Unescaped run text
    text: String,
    /// Offset of `text` in the document text
    offset: usize,
    paragraph: usize,
    /// Run-relative byte ranges to mask, with their replacement character
    masked: Vec<(Range<usize>, char)>,
}

impl TextRun {
    fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    fn rendered(&self) -> String {
        self.text
            .char_indices()
            .map(|(i, ch)| {
                self.masked
                    .iter()
                    .find(|(range, _)| range.contains(&i))
                    .map_or(ch, |(_, block)| *block)
            })
            .collect()
    }
}

struct XmlPart {
    /// Entry index in the source archive
    index: usize,
    name: String,
    xml: String,
    runs: Vec<TextRun>,
}

impl XmlPart {
    fn is_dirty(&self) -> bool {
        self.runs.iter().any(|r| !r.masked.is_empty())
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.xml.len());
        let mut last = 0;
        for run in self.runs.iter().filter(|r| !r.masked.is_empty()) {
            out.push_str(&self.xml[last..run.content.start]);
            out.push_str(&escape(&run.rendered()));
            last = run.content.end;
        }
        out.push_str(&self.xml[last..]);
        out
    }
}

pub struct DocxDocument {
    source: Vec<u8>,
    parts: Vec<XmlPart>,
    text: DocumentText,
    block_char: char,
}

impl DocxDocument {
    pub fn open(path: &Path, style: &RedactionStyle) -> Result<Self> {
        let source = std::fs::read(path).during(Operation::Open)?;
        Self::from_bytes(source, style)
    }

    pub fn from_bytes(source: Vec<u8>, style: &RedactionStyle) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(source.as_slice())).during(Operation::Open)?;

        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index).during(Operation::Open)?;
            if TEXT_PART.is_match(file.name()) {
                entries.push((index, file.name().to_string()));
            }
        }
        if !entries.iter().any(|(_, name)| name == MAIN_PART) {
            return Err(ApplicatorError::new(
                Operation::Open,
                ApplicatorErrorKind::Malformed(format!("missing {}", MAIN_PART)),
            ));
        }
        entries.sort_by(|(_, a), (_, b)| (a != MAIN_PART).cmp(&(b != MAIN_PART)).then(a.cmp(b)));

        let mut text = String::new();
        let mut segments: Vec<Segment> = Vec::new();
        let mut parts = Vec::with_capacity(entries.len());

        for (index, name) in entries {
            let mut xml = String::new();
            archive
                .by_index(index)
                .during(Operation::Extract)?
                .read_to_string(&mut xml)
                .during(Operation::Extract)?;

            let runs = extract_runs(&xml, &mut text, &mut segments);
            tracing::debug!("{}: {} text runs", name, runs.len());
            parts.push(XmlPart {
                index,
                name,
                xml,
                runs,
            });
        }

        Ok(Self {
            source,
            parts,
            text: DocumentText::new(text, segments),
            block_char: style.block_char,
        })
    }

    /// Replace every character of `span` with `block`, run by run.
    ///
    /// Offsets stay those of the original text, so several spans from one
    /// scan can be applied in any order. Returns the number of paragraphs
    /// the span touched.
    pub fn replace_text(&mut self, span: &MatchSpan, block: char) -> Result<usize> {
        Ok(self.mask_span(span, block)?.len())
    }

    fn mask_span(&mut self, span: &MatchSpan, block: char) -> Result<BTreeSet<usize>> {
        self.text.check_span(span, Operation::Replace)?;

        let mut paragraphs = BTreeSet::new();
        for run in self.parts.iter_mut().flat_map(|p| p.runs.iter_mut()) {
            if run.offset >= span.end || run.end() <= span.start || run.text.is_empty() {
                continue;
            }
            let from = span.start.max(run.offset) - run.offset;
            let to = span.end.min(run.end()) - run.offset;
            run.masked.push((from..to, block));
            paragraphs.insert(run.paragraph);
        }
        Ok(paragraphs)
    }

    fn write_package(&self, writer: &mut dyn Write) -> std::result::Result<(), ApplicatorErrorKind> {
        let mut archive = ZipArchive::new(Cursor::new(self.source.as_slice()))?;
        let mut zip = ZipWriter::new(Cursor::new(Vec::with_capacity(self.source.len())));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for index in 0..archive.len() {
            match self.parts.iter().find(|p| p.index == index && p.is_dirty()) {
                Some(part) => {
                    zip.start_file(part.name.as_str(), options)?;
                    zip.write_all(part.render().as_bytes())?;
                }
                None => zip.raw_copy_file(archive.by_index_raw(index)?)?,
            }
        }

        let package = zip.finish()?.into_inner();
        writer.write_all(&package)?;
        Ok(())
    }
}

impl DocumentAdapter for DocxDocument {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Docx
    }

    /// Text as extracted on open; redactions are not reflected here
    fn text(&self) -> &DocumentText {
        &self.text
    }

    fn redact(&mut self, spans: &[MatchSpan]) -> Result<usize> {
        let block = self.block_char;
        let mut touched = BTreeSet::new();
        for span in spans {
            touched.extend(self.mask_span(span, block)?);
        }
        Ok(touched.len())
    }

    fn save(&mut self, output: &Path) -> Result<()> {
        let dirty: Vec<&str> = self
            .parts
            .iter()
            .filter(|p| p.is_dirty())
            .map(|p| p.name.as_str())
            .collect();
        tracing::debug!("Rewriting parts: {:?}", dirty);

        write_atomically(output, |writer| self.write_package(writer))
    }
}

/// Scan one part, appending its paragraphs to the shared text
fn extract_runs(xml: &str, text: &mut String, segments: &mut Vec<Segment>) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut in_paragraph = false;

    for token in TOKEN.captures_iter(xml) {
        let content = token.get(1);
        let separator = if token.get(2).is_some() {
            Some('\t')
        } else if token.get(3).is_some() {
            Some('\n')
        } else {
            None
        };
        let starts_paragraph = content.is_none() && separator.is_none();

        if starts_paragraph || !in_paragraph {
            if !segments.is_empty() {
                text.push('\n');
            }
            segments.push(Segment {
                index: segments.len(),
                start: text.len(),
                end: text.len(),
            });
            in_paragraph = true;
        }

        // Tabs and breaks are text between runs, never masked
        if let Some(separator) = separator {
            text.push(separator);
            if let Some(segment) = segments.last_mut() {
                segment.end = text.len();
            }
            continue;
        }

        let Some(content) = content else {
            continue;
        };
        let run_text = unescape(content.as_str());
        let offset = text.len();
        text.push_str(&run_text);

        let paragraph = segments.len() - 1;
        if let Some(segment) = segments.last_mut() {
            segment.end = text.len();
        }
        runs.push(TextRun {
            content: content.range(),
            text: run_text,
            offset,
            paragraph,
            masked: Vec::new(),
        });
    }

    runs
}

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    ENTITY
        .replace_all(raw, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ => entity[1..].parse().ok().and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
