//! Content stream interpretation using lopdf
//!
//! Walks a page's content stream, tracks the graphics and text state, and
//! emits one [`TextRenderEvent`] per shown string with its user-space
//! baseline, single-space width and font identity.

use crate::event::{TextEventSink, TextRenderEvent};
use crate::font::{fallback_decode, get_number, page_fonts, FontInfo};
use crate::geometry::{
    multiply_matrices, user_space_height, user_space_width, LineSegment, Matrix, Point, IDENTITY,
};
use crate::BoldLinesError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Text state parameters saved and restored with `q`/`Q`
#[derive(Debug, Clone, PartialEq)]
struct TextState {
    font: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    /// Horizontal scaling as a fraction (1.0 = 100%)
    h_scaling: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: Vec::new(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// Interprets the content stream of one page
pub struct PageInterpreter<'a> {
    doc: &'a Document,
    fonts: BTreeMap<Vec<u8>, FontInfo<'a>>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    in_text_block: bool,
    /// Missing font resources already reported
    warned_fonts: BTreeSet<Vec<u8>>,
}

impl<'a> PageInterpreter<'a> {
    pub fn new(doc: &'a Document, page_id: ObjectId) -> Self {
        Self {
            doc,
            fonts: page_fonts(doc, page_id),
            state: GraphicsState {
                ctm: IDENTITY,
                text: TextState::default(),
            },
            stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            in_text_block: false,
            warned_fonts: BTreeSet::new(),
        }
    }

    /// Decode and run the page's content stream
    pub fn run(
        doc: &'a Document,
        page_id: ObjectId,
        sink: &mut dyn TextEventSink,
    ) -> Result<(), BoldLinesError> {
        let content_data = doc
            .get_page_content(page_id)
            .map_err(|e| BoldLinesError::Parse(e.to_string()))?;
        let content =
            Content::decode(&content_data).map_err(|e| BoldLinesError::Parse(e.to_string()))?;

        let mut interpreter = PageInterpreter::new(doc, page_id);
        interpreter.execute(&content.operations, sink);
        Ok(())
    }

    pub fn execute(&mut self, operations: &[Operation], sink: &mut dyn TextEventSink) {
        for op in operations {
            self.apply(op, sink);
        }
        debug!(
            "Interpreted {} operations, {} fonts",
            operations.len(),
            self.fonts.len()
        );
    }

    fn apply(&mut self, op: &Operation, sink: &mut dyn TextEventSink) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.state.ctm = multiply_matrices(&m, &self.state.ctm);
                }
            }
            "BT" => {
                self.in_text_block = true;
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "ET" => self.in_text_block = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Ok(name) = operands[0].as_name() {
                        self.state.text.font = name.to_vec();
                    }
                    if let Some(size) = get_number(&operands[1]) {
                        self.state.text.font_size = size;
                    }
                }
            }
            "Tc" => set_number(operands, &mut self.state.text.char_spacing),
            "Tw" => set_number(operands, &mut self.state.text.word_spacing),
            "TL" => set_number(operands, &mut self.state.text.leading),
            "Ts" => set_number(operands, &mut self.state.text.rise),
            "Tz" => {
                if let Some(scale) = operands.first().and_then(get_number) {
                    self.state.text.h_scaling = scale / 100.0;
                }
            }
            "Td" => {
                if let Some((tx, ty)) = pair_operand(operands) {
                    self.move_text_position(tx, ty);
                }
            }
            "TD" => {
                if let Some((tx, ty)) = pair_operand(operands) {
                    self.state.text.leading = -ty;
                    self.move_text_position(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operand(operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show_string(bytes, sink);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show_string(bytes, sink);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    set_number(&operands[0..1], &mut self.state.text.word_spacing);
                    set_number(&operands[1..2], &mut self.state.text.char_spacing);
                    self.next_line();
                    if let Object::String(bytes, _) = &operands[2] {
                        self.show_string(bytes, sink);
                    }
                }
            }
            "TJ" => {
                if let Some(Ok(array)) = operands.first().map(|o| o.as_array()) {
                    for item in array {
                        match item {
                            Object::String(bytes, _) => self.show_string(bytes, sink),
                            other => {
                                if let Some(adjustment) = get_number(other) {
                                    let text = &self.state.text;
                                    let tx = -adjustment / 1000.0 * text.font_size * text.h_scaling;
                                    self.advance(tx);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_text_position(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply_matrices(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_text_position(0.0, -leading);
    }

    fn advance(&mut self, tx: f32) {
        self.text_matrix = multiply_matrices(&translation(tx, 0.0), &self.text_matrix);
    }

    fn show_string(&mut self, bytes: &[u8], sink: &mut dyn TextEventSink) {
        if !self.in_text_block {
            return;
        }

        let text_state = &self.state.text;
        let font = self.fonts.get(&text_state.font);
        if font.is_none()
            && !text_state.font.is_empty()
            && self.warned_fonts.insert(text_state.font.clone())
        {
            warn!(
                "Font resource /{} not found on page",
                String::from_utf8_lossy(&text_state.font)
            );
        }

        let text = font
            .and_then(|f| f.decode(self.doc, bytes))
            .unwrap_or_else(|| fallback_decode(bytes));

        // Width of the run in unscaled text space
        let mut width = 0.0;
        match font {
            Some(f) => {
                for code in f.codes(bytes) {
                    let glyph = f.glyph_width(code) / 1000.0 * text_state.font_size;
                    let word = if f.is_word_break(code) {
                        text_state.word_spacing
                    } else {
                        0.0
                    };
                    width += (glyph + text_state.char_spacing + word) * text_state.h_scaling;
                }
            }
            None => {
                for &b in bytes {
                    let glyph = crate::font::DEFAULT_GLYPH_WIDTH / 1000.0 * text_state.font_size;
                    let word = if b == b' ' { text_state.word_spacing } else { 0.0 };
                    width += (glyph + text_state.char_spacing + word) * text_state.h_scaling;
                }
            }
        }

        // The baseline stops at the last glyph, not after its trailing spacing
        let trailing_word = if text.ends_with(' ') {
            text_state.word_spacing
        } else {
            0.0
        };
        let visible_width =
            width - (text_state.char_spacing + trailing_word) * text_state.h_scaling;

        let space_glyph = font
            .map(|f| f.space_width())
            .unwrap_or(crate::font::DEFAULT_SPACE_WIDTH);
        let space_width = (space_glyph / 1000.0 * text_state.font_size
            + text_state.char_spacing
            + text_state.word_spacing)
            * text_state.h_scaling;

        let to_user = multiply_matrices(&self.text_matrix, &self.state.ctm);
        let rise = text_state.rise;
        let baseline = LineSegment::new(Point::new(0.0, rise), Point::new(visible_width, rise))
            .transform(&to_user);
        let rise = user_space_height(rise, &to_user);

        sink.render_text(TextRenderEvent {
            text,
            baseline,
            space_width: user_space_width(space_width, &to_user),
            font: font.and_then(|f| f.base_font.clone()),
            rise,
        });

        self.advance(width);
    }
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn set_number(operands: &[Object], target: &mut f32) {
    if let Some(value) = operands.first().and_then(get_number) {
        *target = value;
    }
}

fn pair_operand(operands: &[Object]) -> Option<(f32, f32)> {
    match operands {
        [a, b, ..] => Some((get_number(a)?, get_number(b)?)),
        _ => None,
    }
}

fn matrix_operand(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (i, operand) in operands.iter().take(6).enumerate() {
        m[i] = get_number(operand)?;
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn run_ops(ops: Vec<Operation>) -> Vec<TextRenderEvent> {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        let mut interpreter = PageInterpreter::new(&doc, page_id);
        let mut events = Vec::new();
        interpreter.execute(&ops, &mut events);
        events
    }

    #[test]
    fn test_tj_emits_positioned_event() {
        let events = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op("Td", vec![72.into(), 700.into()]),
            op("Tj", vec![Object::string_literal("Hi")]),
            op("ET", vec![]),
        ]);

        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.text, "Hi");
        assert_eq!(e.start(), Point::new(72.0, 700.0));
        // Two glyphs at the default width of 500/1000 em, 10pt
        assert_eq!(e.end(), Point::new(82.0, 700.0));
        assert_eq!(e.space_width, 2.5);
        // Unknown resource name: no font identity
        assert_eq!(e.font, None);
    }

    #[test]
    fn test_text_outside_bt_is_ignored() {
        let events = run_ops(vec![op("Tj", vec![Object::string_literal("x")])]);
        assert!(events.is_empty());
    }

    #[test]
    fn test_tj_array_splits_strings_and_applies_kerning() {
        let events = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op("Td", vec![100.into(), 500.into()]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("A"),
                    (-1000).into(),
                    Object::string_literal("B"),
                ])],
            ),
            op("ET", vec![]),
        ]);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].start(), Point::new(100.0, 500.0));
        assert_eq!(events[0].end(), Point::new(105.0, 500.0));
        // 5 for "A" plus 10 from the -1000 adjustment
        assert_eq!(events[1].start(), Point::new(115.0, 500.0));
    }

    #[test]
    fn test_rise_is_part_of_event_baseline() {
        let events = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op("Ts", vec![3.into()]),
            op("Td", vec![0.into(), 600.into()]),
            op("Tj", vec![Object::string_literal("2")]),
            op("ET", vec![]),
        ]);
        assert_eq!(events[0].rise, 3.0);
        assert_eq!(events[0].start().y, 603.0);
    }

    #[test]
    fn test_rise_is_scaled_into_user_space() {
        let events = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec!["F2".into(), 1.into()]),
            op(
                "Tm",
                vec![12.into(), 0.into(), 0.into(), 12.into(), 72.into(), 700.into()],
            ),
            op("Tj", vec![Object::string_literal("E=mc")]),
            op("Ts", vec![Object::Real(0.4)]),
            op("Tj", vec![Object::string_literal("2")]),
            op("ET", vec![]),
        ]);

        assert_eq!(events[0].end(), Point::new(96.0, 700.0));
        let sup = &events[1];
        assert!((sup.start().y - 704.8).abs() < 1e-3);
        assert!((sup.rise - 4.8).abs() < 1e-3);
        let compensated = crate::geometry::baseline_segment(sup, 0.01);
        assert!((compensated.start.y - 700.0).abs() < 1e-3);
        assert_eq!(compensated.start.x, 96.0);
    }

    #[test]
    fn test_missing_font_is_recorded_once() {
        let mut doc = Document::with_version("1.5");
        let page_id = doc.add_object(dictionary! { "Type" => "Page" });
        let mut interpreter = PageInterpreter::new(&doc, page_id);
        let mut events = Vec::new();
        interpreter.execute(
            &[
                op("BT", vec![]),
                op("Tf", vec!["F9".into(), 10.into()]),
                op("Tj", vec![Object::string_literal("a")]),
                op("Tj", vec![Object::string_literal("b")]),
                op("Tf", vec!["F8".into(), 10.into()]),
                op("Tj", vec![Object::string_literal("c")]),
                op("Tf", vec!["F9".into(), 10.into()]),
                op("Tj", vec![Object::string_literal("d")]),
                op("ET", vec![]),
            ],
            &mut events,
        );

        assert_eq!(events.len(), 4);
        let warned: Vec<&[u8]> = interpreter.warned_fonts.iter().map(|n| n.as_slice()).collect();
        assert_eq!(warned, vec![b"F8".as_slice(), b"F9".as_slice()]);
    }

    #[test]
    fn test_quote_operator_sets_spacing_and_moves_down() {
        let events = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op("Td", vec![50.into(), 700.into()]),
            op("TL", vec![14.into()]),
            op(
                "\"",
                vec![2.into(), 1.into(), Object::string_literal("a b")],
            ),
            op("Tj", vec![Object::string_literal("c")]),
            op("ET", vec![]),
        ]);

        assert_eq!(events.len(), 2);
        let quoted = &events[0];
        assert_eq!(quoted.text, "a b");
        assert_eq!(quoted.start(), Point::new(50.0, 686.0));
        // Glyphs 5 + 5 + 5, Tc 1 on each, Tw 2 on the space; trailing Tc excluded
        assert_eq!(quoted.end(), Point::new(69.0, 686.0));
        assert_eq!(quoted.space_width, 5.5);
        // Spacing stays in effect for the following string
        assert_eq!(events[1].start(), Point::new(70.0, 686.0));
        assert_eq!(events[1].end(), Point::new(75.0, 686.0));
    }

    #[test]
    fn test_leading_and_next_line() {
        let events = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op("TD", vec![50.into(), 700.into()]),
            op("TL", vec![14.into()]),
            op("T*", vec![]),
            op("Tj", vec![Object::string_literal("a")]),
            op("'", vec![Object::string_literal("b")]),
            op("ET", vec![]),
        ]);
        assert_eq!(events[0].start(), Point::new(50.0, 686.0));
        assert_eq!(events[1].start(), Point::new(50.0, 672.0));
    }

    #[test]
    fn test_ctm_and_save_restore() {
        let events = run_ops(vec![
            op("q", vec![]),
            op("cm", vec![2.into(), 0.into(), 0.into(), 2.into(), 10.into(), 20.into()]),
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op("Td", vec![5.into(), 5.into()]),
            op("Tj", vec![Object::string_literal("a")]),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Td", vec![5.into(), 5.into()]),
            op("Tj", vec![Object::string_literal("b")]),
            op("ET", vec![]),
        ]);
        assert_eq!(events[0].start(), Point::new(20.0, 30.0));
        assert_eq!(events[0].space_width, 5.0);
        assert_eq!(events[1].start(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_char_spacing_excluded_from_visible_width() {
        let events = run_ops(vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), 10.into()]),
            op("Tc", vec![1.into()]),
            op("Tj", vec![Object::string_literal("ab")]),
            op("Tj", vec![Object::string_literal("c")]),
            op("ET", vec![]),
        ]);
        // (5 + 1) * 2 = 12 advance, visible width 11
        assert_eq!(events[0].end().x, 11.0);
        assert_eq!(events[1].start().x, 12.0);
    }
}
