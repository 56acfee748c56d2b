//! Per-page fragment collection
//!
//! Turns the raw event stream of one page into [`TextChunk`]s carrying
//! rise-compensated geometry, registers every chunk's line height, and keeps
//! the subsequence of styled (bold) chunks in arrival order.

use crate::event::{TextEventSink, TextRenderEvent};
use crate::geometry::{baseline_segment, line_height, Point};
use crate::merger::MergeConfig;
use crate::registry::LineHeightRegistry;
use crate::style::StyleClassifier;
use log::warn;

/// A fragment with the geometry used for merging
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    /// Start of the rise-compensated baseline
    pub start: Point,
    /// End of the rise-compensated baseline
    pub end: Point,
    /// Width of a single space in the chunk's font
    pub char_space_width: f32,
    pub line_height: f32,
    pub is_bold: bool,
}

impl TextChunk {
    pub fn from_event(event: &TextRenderEvent, rise_threshold: f32, is_bold: bool) -> Self {
        let segment = baseline_segment(event, rise_threshold);
        TextChunk {
            text: event.text.clone(),
            start: segment.start,
            end: segment.end,
            char_space_width: event.space_width,
            line_height: line_height(&segment),
            is_bold,
        }
    }

    /// Horizontal extent of the chunk
    pub fn width(&self) -> f32 {
        self.end.x - self.start.x
    }

    /// Signed horizontal gap from the end of `previous` to the start of `self`
    pub fn distance_from_end_of(&self, previous: &TextChunk) -> f32 {
        self.start.x - previous.end.x
    }
}

/// Collects the chunks of a single page
pub struct FragmentCollector<'a> {
    classifier: &'a StyleClassifier,
    rise_threshold: f32,
    chunks: Vec<TextChunk>,
    selected: Vec<usize>,
    registry: LineHeightRegistry,
    dropped: usize,
}

impl<'a> FragmentCollector<'a> {
    pub fn new(config: &MergeConfig, classifier: &'a StyleClassifier) -> Self {
        Self {
            classifier,
            rise_threshold: config.rise_threshold,
            chunks: Vec::new(),
            selected: Vec::new(),
            registry: LineHeightRegistry::new(config.height_match),
            dropped: 0,
        }
    }

    pub fn collect(&mut self, event: &TextRenderEvent) {
        if !event.baseline.is_finite() || !event.space_width.is_finite() || !event.rise.is_finite()
        {
            warn!(
                "Dropping text fragment {:?} with non-finite geometry",
                event.text
            );
            self.dropped += 1;
            return;
        }

        let font = event.font.as_deref();
        let is_bold = self.classifier.is_bold(font);
        let chunk = TextChunk::from_event(event, self.rise_threshold, is_bold);

        self.registry.register(chunk.line_height);
        if self.classifier.is_selected(font) {
            self.selected.push(self.chunks.len());
        }
        self.chunks.push(chunk);
    }

    /// Number of events discarded for degenerate geometry
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn finish(self) -> PageFragments {
        PageFragments {
            chunks: self.chunks,
            selected: self.selected,
            registry: self.registry,
        }
    }
}

impl TextEventSink for FragmentCollector<'_> {
    fn render_text(&mut self, event: TextRenderEvent) {
        self.collect(&event);
    }
}

/// Everything collected for one page
#[derive(Debug, Clone, Default)]
pub struct PageFragments {
    chunks: Vec<TextChunk>,
    selected: Vec<usize>,
    registry: LineHeightRegistry,
}

impl PageFragments {
    /// All chunks, bold or not, in arrival order
    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    /// Styled chunks in arrival order
    pub fn bold_chunks(&self) -> impl Iterator<Item = &TextChunk> + '_ {
        self.selected.iter().map(move |&i| &self.chunks[i])
    }

    pub fn bold_count(&self) -> usize {
        self.selected.len()
    }

    pub fn registry(&self) -> &LineHeightRegistry {
        &self.registry
    }

    /// Leftmost start x over all chunks on the page
    pub fn left_edge(&self) -> Option<f32> {
        self.chunks.iter().map(|c| c.start.x).reduce(f32::min)
    }

    /// Rightmost end x over all chunks on the page
    pub fn right_edge(&self) -> Option<f32> {
        self.chunks.iter().map(|c| c.end.x).reduce(f32::max)
    }
}
