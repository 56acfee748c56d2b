//! Text-rendering events emitted by a page interpreter

use crate::geometry::{LineSegment, Point};

/// One rendered glyph run, as produced by a single show-text operation
/// (or a single string element of a `TJ` array).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRenderEvent {
    /// Decoded text of the run
    pub text: String,
    /// Baseline in user space, including the glyph rise
    pub baseline: LineSegment,
    /// Width of a single space in user space
    pub space_width: f32,
    /// PostScript name of the font (`/BaseFont`), if the font declares one
    pub font: Option<String>,
    /// Text rise (`Ts`) in effect for the run, converted to user space
    pub rise: f32,
}

impl TextRenderEvent {
    pub fn start(&self) -> Point {
        self.baseline.start
    }

    pub fn end(&self) -> Point {
        self.baseline.end
    }
}

/// Receiver of the events of one page, in content-stream order
pub trait TextEventSink {
    fn render_text(&mut self, event: TextRenderEvent);
}

impl TextEventSink for Vec<TextRenderEvent> {
    fn render_text(&mut self, event: TextRenderEvent) {
        self.push(event);
    }
}
