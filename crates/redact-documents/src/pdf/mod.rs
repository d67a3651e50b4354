//! PDF adapter: opaque boxes plus removal of the underlying text

mod layout;

use std::collections::BTreeSet;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use redact_core::MatchSpan;
use serde::{Deserialize, Serialize};

pub use layout::Rect;
use layout::{ContentStream, Glyph, GlyphSource, Matrix, PageTextBuilder, Resources};

use crate::adapter::{DocumentAdapter, DocumentKind, DocumentText, RedactionStyle, Segment};
use crate::error::{ApplicatorError, ApplicatorErrorKind, During, Operation as Op, Result};
use crate::output::write_atomically;

/// A region to redact on one page (1-based page number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub page: u32,
    pub rect: Rect,
}

struct PageLayout {
    number: u32,
    id: ObjectId,
    stream: ContentStream,
    glyphs: Vec<Glyph>,
    boxes: Vec<Rect>,
}

/// Form XObjects reachable from any page, shared between the pages that draw them
#[derive(Default)]
struct Forms {
    ids: Vec<ObjectId>,
    streams: Vec<ContentStream>,
    /// Forms with blanked glyphs, rewritten on save
    dirty: BTreeSet<usize>,
}

pub struct PdfDocument {
    document: Document,
    pages: Vec<PageLayout>,
    forms: Forms,
    text: DocumentText,
    style: RedactionStyle,
}

impl PdfDocument {
    pub fn open(path: &Path, style: &RedactionStyle) -> Result<Self> {
        let document = Document::load(path).during(Op::Open)?;
        Self::from_document(document, style)
    }

    pub fn from_bytes(bytes: &[u8], style: &RedactionStyle) -> Result<Self> {
        let document = Document::load_mem(bytes).during(Op::Open)?;
        Self::from_document(document, style)
    }

    fn from_document(document: Document, style: &RedactionStyle) -> Result<Self> {
        if document.is_encrypted() {
            return Err(ApplicatorError::new(Op::Open, ApplicatorErrorKind::Encrypted));
        }

        let mut text = String::new();
        let mut segments = Vec::new();
        let mut forms = Forms::default();
        let mut streams = Vec::new();

        for (number, id) in document.get_pages() {
            let content = document.get_and_decode_page_content(id).during(Op::Extract)?;
            let dictionaries = page_resources(&document, id)?;
            let resources = collect_resources(&document, &dictionaries, &mut forms)?;
            streams.push((number, id, ContentStream::new(content, Matrix::IDENTITY, resources)));
        }

        let mut pages = Vec::with_capacity(streams.len());
        for (index, (number, id, stream)) in streams.into_iter().enumerate() {
            let start = text.len();
            let glyphs = PageTextBuilder::new(&mut text, &forms.streams, style.glyph_width)
                .layout(&stream)
                .map_err(|kind| ApplicatorError::new(Op::Extract, kind))?;
            segments.push(Segment {
                index,
                start,
                end: text.len(),
            });
            text.push('\n');

            pages.push(PageLayout {
                number,
                id,
                stream,
                glyphs,
                boxes: Vec::new(),
            });
        }

        tracing::debug!(
            "Loaded PDF with {} pages, {} forms, {} bytes of text",
            pages.len(),
            forms.streams.len(),
            text.len()
        );

        Ok(Self {
            document,
            pages,
            forms,
            text: DocumentText::new(text, segments),
            style: style.clone(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Boxes covering a span, one per page line it touches
    pub fn locate_span(&self, span: &MatchSpan) -> Result<Vec<BoundingBox>> {
        self.text.check_span(span, Op::Locate)?;

        let mut boxes: Vec<BoundingBox> = Vec::new();
        for page in &self.pages {
            let from = page.glyphs.partition_point(|g| g.offset < span.start);
            for glyph in page.glyphs[from..].iter().take_while(|g| g.offset < span.end) {
                match boxes.last_mut() {
                    Some(last) if last.page == page.number && same_line(&last.rect, &glyph.rect) => {
                        last.rect = last.rect.union(&glyph.rect);
                    }
                    _ => boxes.push(BoundingBox {
                        page: page.number,
                        rect: glyph.rect,
                    }),
                }
            }
        }
        Ok(boxes)
    }

    /// Blank every glyph whose centre lies inside a box and queue the boxes
    /// to be painted. Returns the number of pages touched.
    pub fn apply_redaction(&mut self, boxes: &[BoundingBox]) -> Result<usize> {
        if let Some(missing) = boxes
            .iter()
            .find(|b| !self.pages.iter().any(|p| p.number == b.page))
        {
            return Err(ApplicatorError::new(
                Op::Apply,
                ApplicatorErrorKind::Malformed(format!("page {} does not exist", missing.page)),
            ));
        }

        let mut touched = 0;
        for page in &mut self.pages {
            let page_boxes: Vec<Rect> = boxes
                .iter()
                .filter(|b| b.page == page.number)
                .map(|b| b.rect)
                .collect();
            if page_boxes.is_empty() {
                continue;
            }

            let mut removed = 0;
            for glyph in &page.glyphs {
                let (x, y) = glyph.rect.center();
                if !page_boxes.iter().any(|r| r.contains(x, y)) {
                    continue;
                }
                let content = match glyph.source.form {
                    None => &mut page.stream.content,
                    Some(form) => {
                        self.forms.dirty.insert(form);
                        match self.forms.streams.get_mut(form) {
                            Some(stream) => &mut stream.content,
                            None => return Err(changed_under_redaction()),
                        }
                    }
                };
                blank_glyph(content, glyph.source)?;
                removed += 1;
            }

            tracing::debug!(
                "Page {}: {} boxes, {} glyphs removed",
                page.number,
                page_boxes.len(),
                removed
            );
            page.boxes.extend(page_boxes);
            touched += 1;
        }
        Ok(touched)
    }

    fn write_forms(&mut self) -> Result<()> {
        for &index in &self.forms.dirty {
            let (Some(&id), Some(form)) = (self.forms.ids.get(index), self.forms.streams.get(index)) else {
                continue;
            };
            let bytes = form.content.encode().during(Op::Save)?;
            self.document
                .get_object_mut(id)
                .and_then(Object::as_stream_mut)
                .during(Op::Save)?
                .set_plain_content(bytes);
            tracing::debug!("Rewrote form XObject {:?}", id);
        }
        Ok(())
    }

    fn write_pages(&mut self) -> Result<()> {
        let [r, g, b] = self.style.fill_color;
        for page in self.pages.iter().filter(|p| !p.boxes.is_empty()) {
            let original = &page.stream.content.operations;
            let mut operations = Vec::with_capacity(original.len() + page.boxes.len() + 6);

            // Isolate the original graphics state from the boxes drawn after it
            operations.push(Operation::new("q", vec![]));
            operations.extend(original.iter().cloned());
            operations.push(Operation::new("Q", vec![]));

            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "rg",
                vec![Object::Real(r.into()), Object::Real(g.into()), Object::Real(b.into())],
            ));
            for rect in &page.boxes {
                operations.push(Operation::new(
                    "re",
                    vec![
                        Object::Real(rect.x.into()),
                        Object::Real(rect.y.into()),
                        Object::Real(rect.width.into()),
                        Object::Real(rect.height.into()),
                    ],
                ));
            }
            operations.push(Operation::new("f", vec![]));
            operations.push(Operation::new("Q", vec![]));

            let bytes = Content { operations }.encode().during(Op::Save)?;
            self.document
                .change_page_content(page.id, bytes)
                .during(Op::Save)?;
        }
        Ok(())
    }
}

impl DocumentAdapter for PdfDocument {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn text(&self) -> &DocumentText {
        &self.text
    }

    fn redact(&mut self, spans: &[MatchSpan]) -> Result<usize> {
        let mut boxes = Vec::new();
        for span in spans {
            boxes.extend(self.locate_span(span)?);
        }
        self.apply_redaction(&boxes)
    }

    fn save(&mut self, output: &Path) -> Result<()> {
        self.write_forms()?;
        self.write_pages()?;
        let document = &mut self.document;
        write_atomically(output, |mut writer| {
            document.save_to(&mut writer)?;
            Ok(())
        })
    }
}

fn same_line(a: &Rect, b: &Rect) -> bool {
    let (_, ay) = a.center();
    let (_, by) = b.center();
    (ay - by).abs() < a.height.min(b.height) / 2.0
}

fn blank_glyph(content: &mut Content, source: GlyphSource) -> Result<()> {
    let operand = content
        .operations
        .get_mut(source.op)
        .and_then(|op| op.operands.get_mut(source.operand));

    let target = match (operand, source.element) {
        (Some(Object::Array(elements)), Some(element)) => elements.get_mut(element),
        (operand, None) => operand,
        _ => None,
    };

    match target {
        Some(Object::String(bytes, _)) if source.byte < bytes.len() => {
            bytes[source.byte] = b' ';
            Ok(())
        }
        _ => Err(changed_under_redaction()),
    }
}

fn changed_under_redaction() -> ApplicatorError {
    ApplicatorError::new(
        Op::Apply,
        ApplicatorErrorKind::Malformed("text operator changed under redaction".to_string()),
    )
}

/// The page's resource dictionaries, nearest first, including inherited ones
fn page_resources(document: &Document, page: ObjectId) -> Result<Vec<&Dictionary>> {
    let (inline, inherited) = document.get_page_resources(page).during(Op::Extract)?;
    let mut dictionaries: Vec<&Dictionary> = inline.into_iter().collect();
    dictionaries.extend(inherited.into_iter().filter_map(|id| document.get_dictionary(id).ok()));
    Ok(dictionaries)
}

/// Fonts and form XObjects named by a stream's resources. Earlier
/// dictionaries shadow later ones. Forms are loaded into `forms` on first use.
fn collect_resources(document: &Document, dictionaries: &[&Dictionary], forms: &mut Forms) -> Result<Resources> {
    let mut resources = Resources::default();

    for dictionary in dictionaries.iter().rev() {
        if let Ok(fonts) = document.get_dict_in_dict(dictionary, b"Font") {
            for (name, font) in fonts.iter() {
                if is_composite_font(document, font) {
                    resources.composite_fonts.insert(name.clone());
                } else {
                    resources.composite_fonts.remove(name);
                }
            }
        }

        if let Ok(xobjects) = document.get_dict_in_dict(dictionary, b"XObject") {
            for (name, xobject) in xobjects.iter() {
                let Ok(id) = xobject.as_reference() else {
                    continue;
                };
                if let Some(index) = load_form(document, id, dictionaries, forms)? {
                    resources.forms.insert(name.clone(), index);
                }
            }
        }
    }

    Ok(resources)
}

fn is_composite_font(document: &Document, font: &Object) -> bool {
    document
        .dereference(font)
        .ok()
        .and_then(|(_, font)| font.as_dict().ok())
        .and_then(|font| font.get(b"Subtype").ok())
        .and_then(|subtype| subtype.as_name().ok())
        == Some(b"Type0".as_slice())
}

/// Decode a form XObject once and return its index, or `None` for images
/// and other non-form XObjects
fn load_form(
    document: &Document,
    id: ObjectId,
    inherited: &[&Dictionary],
    forms: &mut Forms,
) -> Result<Option<usize>> {
    if let Some(index) = forms.ids.iter().position(|&known| known == id) {
        return Ok(Some(index));
    }
    let Ok(Object::Stream(stream)) = document.get_object(id) else {
        return Ok(None);
    };
    if stream.dict.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Form".as_slice()) {
        return Ok(None);
    }

    // Reserve the slot first so a form naming itself resolves to this index
    let index = forms.ids.len();
    forms.ids.push(id);
    forms.streams.push(ContentStream::new(
        Content { operations: Vec::new() },
        Matrix::IDENTITY,
        Resources::default(),
    ));

    let data = stream.get_plain_content().during(Op::Extract)?;
    let content = Content::decode(&data).during(Op::Extract)?;
    let matrix = stream
        .dict
        .get(b"Matrix")
        .and_then(Object::as_array)
        .ok()
        .and_then(|values| layout::matrix(values))
        .unwrap_or(Matrix::IDENTITY);

    // Forms without their own resources use the page's
    let own = document.get_dict_in_dict(&stream.dict, b"Resources").ok();
    let dictionaries: Vec<&Dictionary> = match own {
        Some(dictionary) => vec![dictionary],
        None => inherited.to_vec(),
    };
    let resources = collect_resources(document, &dictionaries, forms)?;

    forms.streams[index] = ContentStream::new(content, matrix, resources);
    Ok(Some(index))
}
