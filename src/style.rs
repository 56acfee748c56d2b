//! Font-based style classification
//!
//! A fragment's style is inferred from its font's PostScript name. Only bold
//! is detected today; further detectors plug into [`StyleClassifier`].

/// Marker searched for in PostScript font names
pub const BOLD_MARKER: &str = "Bold";

/// A style signal a detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    Bold,
}

/// Check if a font name indicates bold weight.
///
/// Case-sensitive substring match, so "SemiBold" and "ExtraBold" count as
/// bold while "bold" in lowercase does not.
pub fn is_bold_font(font_name: &str) -> bool {
    font_name.contains(BOLD_MARKER)
}

/// Predicate deciding whether a font carries one particular style
pub trait StyleDetector: Send + Sync {
    fn style(&self) -> TextStyle;

    /// `font` is the PostScript name, `None` when the font declares none
    fn detect(&self, font: Option<&str>) -> bool;
}

/// Substring-based bold detector
#[derive(Debug, Clone)]
pub struct BoldDetector {
    marker: String,
}

impl BoldDetector {
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for BoldDetector {
    fn default() -> Self {
        Self::with_marker(BOLD_MARKER)
    }
}

impl StyleDetector for BoldDetector {
    fn style(&self) -> TextStyle {
        TextStyle::Bold
    }

    fn detect(&self, font: Option<&str>) -> bool {
        match font {
            Some(name) if !self.marker.is_empty() => name.contains(self.marker.as_str()),
            _ => false,
        }
    }
}

/// Set of style detectors applied to every fragment
pub struct StyleClassifier {
    detectors: Vec<Box<dyn StyleDetector>>,
}

impl StyleClassifier {
    /// Classifier with no detectors; nothing is ever selected
    pub fn empty() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn with_detector(mut self, detector: impl StyleDetector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    /// All styles detected for the given font
    pub fn classify(&self, font: Option<&str>) -> Vec<TextStyle> {
        self.detectors
            .iter()
            .filter(|d| d.detect(font))
            .map(|d| d.style())
            .collect()
    }

    pub fn has_style(&self, font: Option<&str>, style: TextStyle) -> bool {
        self.detectors
            .iter()
            .any(|d| d.style() == style && d.detect(font))
    }

    pub fn is_bold(&self, font: Option<&str>) -> bool {
        self.has_style(font, TextStyle::Bold)
    }

    /// Whether any detector fires, i.e. the fragment belongs in the output
    pub fn is_selected(&self, font: Option<&str>) -> bool {
        self.detectors.iter().any(|d| d.detect(font))
    }
}

impl Default for StyleClassifier {
    fn default() -> Self {
        Self::empty().with_detector(BoldDetector::default())
    }
}

impl std::fmt::Debug for StyleClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let styles: Vec<TextStyle> = self.detectors.iter().map(|d| d.style()).collect();
        f.debug_struct("StyleClassifier")
            .field("styles", &styles)
            .finish()
    }
}
