//! Bold run reconstruction
//!
//! Walks the bold chunks of a page in arrival order and joins each one to its
//! predecessor with either a space (same visual line, or a phrase wrapped from
//! the right margin onto the next line) or a line break.

use crate::collector::{PageFragments, TextChunk};
use crate::registry::{HeightMatch, LineHeightRegistry};

/// Separator placed between chunks judged to be on different lines
pub const LINE_BREAK: &str = "\n";

/// Configuration for run merging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeConfig {
    /// Maximum horizontal gap between chunks on the same line that still
    /// belong to one run (default: 12)
    pub inline_gap: f32,
    /// How close to the page's left edge a chunk must start to count as a
    /// wrapped continuation (default: 2)
    pub margin_threshold: f32,
    /// Rises at or below this magnitude are ignored (default: 0.01)
    pub rise_threshold: f32,
    /// Line height comparison (default: exact)
    pub height_match: HeightMatch,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            inline_gap: 12.0,
            margin_threshold: 2.0,
            rise_threshold: 0.01,
            height_match: HeightMatch::Exact,
        }
    }
}

/// How a chunk attaches to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// Same visual line, close enough to be one phrase
    Inline,
    /// Continues a phrase that wrapped at the right margin
    Wrapped,
    NewLine,
}

impl Join {
    pub fn separator(self) -> &'static str {
        match self {
            Join::Inline | Join::Wrapped => " ",
            Join::NewLine => LINE_BREAK,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunMerger {
    config: MergeConfig,
}

impl RunMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Merge the bold chunks of a page into one string
    pub fn merge(&self, page: &PageFragments) -> String {
        let (left_edge, right_edge) = match (page.left_edge(), page.right_edge()) {
            (Some(l), Some(r)) => (l, r),
            _ => return String::new(),
        };

        let mut output = String::new();
        let mut previous: Option<&TextChunk> = None;

        for chunk in page.bold_chunks() {
            if let Some(prev) = previous {
                let join = self.join(chunk, prev, left_edge, right_edge, page.registry());
                output.push_str(join.separator());
            }
            output.push_str(&chunk.text);
            previous = Some(chunk);
        }

        output
    }

    /// Decide how `current` attaches to `previous`
    pub fn join(
        &self,
        current: &TextChunk,
        previous: &TextChunk,
        left_edge: f32,
        right_edge: f32,
        registry: &LineHeightRegistry,
    ) -> Join {
        let inline = registry.same_line(current.line_height, previous.line_height)
            && current.distance_from_end_of(previous).abs() < self.config.inline_gap;
        if inline {
            return Join::Inline;
        }

        let starts_at_left_margin = current.start.x - left_edge < self.config.margin_threshold;
        let previous_reached_right_margin =
            right_edge - previous.end.x < current.char_space_width + current.width();
        if starts_at_left_margin
            && previous_reached_right_margin
            && registry.are_adjacent_lines(current.line_height, previous.line_height)
        {
            return Join::Wrapped;
        }

        Join::NewLine
    }
}

impl Default for RunMerger {
    fn default() -> Self {
        Self::new(MergeConfig::default())
    }
}
