//! Per-page registry of line heights in first-seen order
//!
//! Adjacency between two lines is decided by their position in this
//! registry, not by how far apart the heights are numerically. This assumes
//! lines are first encountered top to bottom in the content stream, which
//! does not hold for multi-column pages.

/// How two line heights are compared
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HeightMatch {
    /// Bit-for-bit float equality
    #[default]
    Exact,
    /// Heights within `eps` of each other are the same line
    Tolerance(f32),
}

impl HeightMatch {
    pub fn matches(&self, a: f32, b: f32) -> bool {
        match *self {
            HeightMatch::Exact => a == b,
            HeightMatch::Tolerance(eps) => (a - b).abs() <= eps,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineHeightRegistry {
    heights: Vec<f32>,
    matching: HeightMatch,
}

impl LineHeightRegistry {
    pub fn new(matching: HeightMatch) -> Self {
        Self {
            heights: Vec::new(),
            matching,
        }
    }

    /// Record a height unless an equal one is already registered
    pub fn register(&mut self, height: f32) {
        if self.index_of(height).is_none() {
            self.heights.push(height);
        }
    }

    /// Position of the first registered height matching `height`
    pub fn index_of(&self, height: f32) -> Option<usize> {
        self.heights
            .iter()
            .position(|&h| self.matching.matches(h, height))
    }

    /// True if `current` was registered right after `previous`
    pub fn are_adjacent_lines(&self, current: f32, previous: f32) -> bool {
        match (self.index_of(current), self.index_of(previous)) {
            (Some(c), Some(p)) => c == p + 1,
            _ => false,
        }
    }

    pub fn same_line(&self, a: f32, b: f32) -> bool {
        self.matching.matches(a, b)
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}
