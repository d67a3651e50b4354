//! Text layout recovered from page content streams
//!
//! Only the operators needed to place text are interpreted. Glyph widths
//! are estimated from the font size rather than read from font programs,
//! and string bytes are decoded one glyph per byte, so text shown in a
//! composite (Type0) font is refused rather than guessed at. Form XObjects
//! drawn with `Do` are followed, their glyphs tagged with the form they
//! came from.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::Object;
use lopdf::content::{Content, Operation};
use serde::{Deserialize, Serialize};

use crate::error::ApplicatorErrorKind;

/// Axis-aligned rectangle in default user space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.top()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(x, y, self.right().max(other.right()) - x, self.top().max(other.top()) - y)
    }

    fn from_points(points: &[(f32, f32)]) -> Rect {
        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for &(x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// PDF transformation matrix `[a b c d e f]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix([f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f32, ty: f32) -> Matrix {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`, i.e. apply `self` first
    fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }
}

/// Location of a glyph's byte inside a content stream's operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GlyphSource {
    /// Index into the document's form XObjects, `None` for the page content
    pub form: Option<usize>,
    pub op: usize,
    pub operand: usize,
    pub element: Option<usize>,
    pub byte: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Glyph {
    /// Byte offset of the glyph's character in the document text
    pub offset: usize,
    pub ch: char,
    pub rect: Rect,
    pub source: GlyphSource,
}

/// Resource names visible to one content stream
#[derive(Debug, Default)]
pub(crate) struct Resources {
    /// Fonts whose strings hold multi-byte character codes
    pub composite_fonts: BTreeSet<Vec<u8>>,
    /// Form XObjects by name, as indices into the document's forms
    pub forms: BTreeMap<Vec<u8>, usize>,
}

/// Page content or a form XObject, decoded
#[derive(Debug)]
pub(crate) struct ContentStream {
    pub content: Content,
    /// Form space to user space, identity for page content
    pub matrix: Matrix,
    pub resources: Resources,
}

impl ContentStream {
    pub fn new(content: Content, matrix: Matrix, resources: Resources) -> Self {
        Self {
            content,
            matrix,
            resources,
        }
    }
}

/// Text state and graphics state needed for glyph placement
#[derive(Clone)]
struct State {
    ctm: Matrix,
    stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font_size: f32,
    /// Set while the selected font is composite
    composite_font: Option<String>,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    rise: f32,
}

impl Default for State {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font_size: 12.0,
            composite_font: None,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            rise: 0.0,
        }
    }
}

impl State {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Strings in composite fonts are CIDs, not one glyph per byte
    fn check_font(&self) -> Result<(), ApplicatorErrorKind> {
        match &self.composite_font {
            Some(name) => Err(ApplicatorErrorKind::UnsupportedFormat(format!(
                "text drawn with composite (Type0) font /{name} cannot be extracted"
            ))),
            None => Ok(()),
        }
    }
}

/// Output of laying out one page: text is appended to a shared buffer
pub(crate) struct PageTextBuilder<'a> {
    text: &'a mut String,
    forms: &'a [ContentStream],
    glyphs: Vec<Glyph>,
    glyph_width: f32,
    /// End point and font size of the previous glyph, device space
    last: Option<(f32, f32, f32)>,
}

impl<'a> PageTextBuilder<'a> {
    pub fn new(text: &'a mut String, forms: &'a [ContentStream], glyph_width: f32) -> Self {
        Self {
            text,
            forms,
            glyphs: Vec::new(),
            glyph_width,
            last: None,
        }
    }

    /// Interpret the page's operations, and the forms it draws, and collect its glyphs
    pub fn layout(mut self, page: &ContentStream) -> Result<Vec<Glyph>, ApplicatorErrorKind> {
        let mut state = State::default();
        self.interpret(page, None, &mut state, &mut Vec::new())?;
        Ok(self.glyphs)
    }

    fn interpret(
        &mut self,
        stream: &ContentStream,
        form: Option<usize>,
        state: &mut State,
        active: &mut Vec<usize>,
    ) -> Result<(), ApplicatorErrorKind> {
        for (index, operation) in stream.content.operations.iter().enumerate() {
            let operands = &operation.operands;
            let at = (form, index);
            match operation.operator.as_str() {
                "q" => state.stack.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = state.stack.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix(operands) {
                        state.ctm = m.then(&state.ctm);
                    }
                }
                "BT" => {
                    state.tm = Matrix::IDENTITY;
                    state.tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    if let Some(name) = operands.first().and_then(|o| o.as_name().ok()) {
                        state.composite_font = stream
                            .resources
                            .composite_fonts
                            .contains(name)
                            .then(|| String::from_utf8_lossy(name).into_owned());
                    }
                    if let Some(size) = operands.get(1).and_then(number) {
                        state.font_size = size;
                    }
                }
                "TL" => state.leading = first(operands).unwrap_or(state.leading),
                "Tc" => state.char_spacing = first(operands).unwrap_or(state.char_spacing),
                "Tw" => state.word_spacing = first(operands).unwrap_or(state.word_spacing),
                "Tz" => state.h_scale = first(operands).map(|s| s / 100.0).unwrap_or(state.h_scale),
                "Ts" => state.rise = first(operands).unwrap_or(state.rise),
                "Td" => {
                    if let (Some(tx), Some(ty)) = (operand(operands, 0), operand(operands, 1)) {
                        state.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (operand(operands, 0), operand(operands, 1)) {
                        state.leading = -ty;
                        state.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix(operands) {
                        state.tm = m;
                        state.tlm = m;
                    }
                }
                "T*" => state.next_line(),
                "Tj" => self.show_string(state, operation, at, 0)?,
                "'" => {
                    state.next_line();
                    self.show_string(state, operation, at, 0)?;
                }
                "\"" => {
                    if let (Some(aw), Some(ac)) = (operand(operands, 0), operand(operands, 1)) {
                        state.word_spacing = aw;
                        state.char_spacing = ac;
                    }
                    state.next_line();
                    self.show_string(state, operation, at, 2)?;
                }
                "TJ" => self.show_array(state, operation, at)?,
                "Do" => {
                    let target = operands
                        .first()
                        .and_then(|o| o.as_name().ok())
                        .and_then(|name| stream.resources.forms.get(name))
                        .copied();
                    // A form that draws itself is skipped rather than followed
                    if let Some(target) = target.filter(|t| !active.contains(t)) {
                        self.draw_form(target, state, active)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn draw_form(
        &mut self,
        target: usize,
        state: &State,
        active: &mut Vec<usize>,
    ) -> Result<(), ApplicatorErrorKind> {
        let forms = self.forms;
        let Some(form) = forms.get(target) else {
            return Ok(());
        };

        let mut inner = state.clone();
        inner.stack.clear();
        inner.ctm = form.matrix.then(&state.ctm);

        active.push(target);
        let result = self.interpret(form, Some(target), &mut inner, active);
        active.pop();
        result
    }

    fn show_string(
        &mut self,
        state: &mut State,
        operation: &Operation,
        (form, op): (Option<usize>, usize),
        operand: usize,
    ) -> Result<(), ApplicatorErrorKind> {
        if let Some(Object::String(bytes, _)) = operation.operands.get(operand) {
            state.check_font()?;
            for (byte_index, &byte) in bytes.iter().enumerate() {
                let source = GlyphSource {
                    form,
                    op,
                    operand,
                    element: None,
                    byte: byte_index,
                };
                self.show_glyph(state, byte, source);
            }
        }
        Ok(())
    }

    fn show_array(
        &mut self,
        state: &mut State,
        operation: &Operation,
        (form, op): (Option<usize>, usize),
    ) -> Result<(), ApplicatorErrorKind> {
        let Some(Object::Array(elements)) = operation.operands.first() else {
            return Ok(());
        };
        for (element, object) in elements.iter().enumerate() {
            match object {
                Object::String(bytes, _) => {
                    state.check_font()?;
                    for (byte_index, &byte) in bytes.iter().enumerate() {
                        let source = GlyphSource {
                            form,
                            op,
                            operand: 0,
                            element: Some(element),
                            byte: byte_index,
                        };
                        self.show_glyph(state, byte, source);
                    }
                }
                other => {
                    if let Some(adjust) = number(other) {
                        let tx = -adjust / 1000.0 * state.font_size * state.h_scale;
                        state.tm = Matrix::translate(tx, 0.0).then(&state.tm);
                    }
                }
            }
        }
        Ok(())
    }

    fn show_glyph(&mut self, state: &mut State, byte: u8, source: GlyphSource) {
        let fs = state.font_size;
        let width = self.glyph_width * fs;
        let advance = width * state.h_scale;
        let trm = state.tm.then(&state.ctm);

        let corners = [
            trm.apply(0.0, state.rise - 0.25 * fs),
            trm.apply(advance, state.rise - 0.25 * fs),
            trm.apply(0.0, state.rise + 0.9 * fs),
            trm.apply(advance, state.rise + 0.9 * fs),
        ];
        let rect = Rect::from_points(&corners);
        let (start_x, start_y) = trm.apply(0.0, state.rise);
        let device_size = rect.height.max(f32::EPSILON);

        self.separate_from_previous(start_x, start_y, device_size, byte == b' ');

        let ch = byte as char;
        if !ch.is_control() {
            self.glyphs.push(Glyph {
                offset: self.text.len(),
                ch,
                rect,
                source,
            });
            self.text.push(ch);
        }

        let mut tx = width + state.char_spacing;
        if byte == b' ' {
            tx += state.word_spacing;
        }
        state.tm = Matrix::translate(tx * state.h_scale, 0.0).then(&state.tm);

        let (end_x, end_y) = state.tm.then(&state.ctm).apply(0.0, state.rise);
        self.last = Some((end_x, end_y, device_size));
    }

    /// Insert a line break or space when the pen jumped since the last glyph
    fn separate_from_previous(&mut self, x: f32, y: f32, size: f32, is_space: bool) {
        let Some((last_x, last_y, last_size)) = self.last else {
            return;
        };
        let size = size.max(last_size);
        if (y - last_y).abs() > size * 0.5 {
            if !self.text.ends_with('\n') {
                self.text.push('\n');
            }
        } else if !is_space
            && x - last_x > size * 0.3
            && !self.text.ends_with(' ')
            && !self.text.ends_with('\n')
        {
            self.text.push(' ');
        }
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn operand(operands: &[Object], index: usize) -> Option<f32> {
    operands.get(index).and_then(number)
}

fn first(operands: &[Object]) -> Option<f32> {
    operand(operands, 0)
}

pub(crate) fn matrix(operands: &[Object]) -> Option<Matrix> {
    if operands.len() != 6 {
        return None;
    }
    let mut values = [0.0f32; 6];
    for (value, object) in values.iter_mut().zip(operands) {
        *value = number(object)?;
    }
    Some(Matrix(values))
}
