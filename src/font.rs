//! Font resolution for the page interpreter
//!
//! Resolves a page's font resources into the pieces the interpreter needs:
//! the PostScript name used for style detection, glyph widths for baseline
//! geometry, and text decoding through lopdf's font encodings.

use lopdf::{Dictionary, Document, Object};
use std::collections::BTreeMap;

/// Glyph width (in thousandths of text space) assumed when a font carries no
/// width information, as with the standard 14 fonts
pub const DEFAULT_GLYPH_WIDTH: f32 = 500.0;
/// Space width assumed when the font does not give one
pub const DEFAULT_SPACE_WIDTH: f32 = 250.0;

const SPACE_CODE: u32 = 32;

/// Per-code glyph widths
#[derive(Debug, Clone, PartialEq)]
pub enum GlyphWidths {
    /// Simple font: `/FirstChar` + `/Widths`, `/MissingWidth` otherwise
    Simple {
        first_char: u32,
        widths: Vec<f32>,
        missing: f32,
    },
    /// Composite font: `/W` ranges of the descendant font, `/DW` otherwise
    Composite {
        ranges: Vec<(u32, u32, f32)>,
        default: f32,
    },
    /// No width information at all
    Unknown,
}

impl GlyphWidths {
    pub fn width(&self, code: u32) -> Option<f32> {
        match self {
            GlyphWidths::Simple {
                first_char,
                widths,
                missing,
            } => {
                let w = code
                    .checked_sub(*first_char)
                    .and_then(|i| widths.get(i as usize))
                    .copied()
                    .unwrap_or(*missing);
                Some(w)
            }
            GlyphWidths::Composite { ranges, default } => Some(
                ranges
                    .iter()
                    .find(|(lo, hi, _)| (*lo..=*hi).contains(&code))
                    .map(|(_, _, w)| *w)
                    .unwrap_or(*default),
            ),
            GlyphWidths::Unknown => None,
        }
    }
}

/// A resolved font resource
#[derive(Debug, Clone)]
pub struct FontInfo<'a> {
    dict: &'a Dictionary,
    /// PostScript name from `/BaseFont`
    pub base_font: Option<String>,
    /// Type0 fonts use two-byte codes
    pub composite: bool,
    pub widths: GlyphWidths,
}

impl<'a> FontInfo<'a> {
    pub fn from_dict(doc: &'a Document, dict: &'a Dictionary) -> Self {
        let composite = name_of(doc, dict, b"Subtype").as_deref() == Some("Type0");
        let widths = if composite {
            composite_widths(doc, dict)
        } else {
            simple_widths(doc, dict)
        };

        FontInfo {
            dict,
            base_font: name_of(doc, dict, b"BaseFont"),
            composite,
            widths,
        }
    }

    /// Split a string operand into character codes
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    /// Width of a code in thousandths of text space
    pub fn glyph_width(&self, code: u32) -> f32 {
        match self.widths.width(code) {
            Some(w) if w <= 0.0 && code == SPACE_CODE => DEFAULT_SPACE_WIDTH,
            Some(w) => w,
            None if code == SPACE_CODE => DEFAULT_SPACE_WIDTH,
            None => DEFAULT_GLYPH_WIDTH,
        }
    }

    pub fn space_width(&self) -> f32 {
        self.glyph_width(SPACE_CODE)
    }

    /// Word spacing applies to single-byte code 32 only
    pub fn is_word_break(&self, code: u32) -> bool {
        !self.composite && code == SPACE_CODE
    }

    /// Decode a string operand using the font's encoding
    pub fn decode(&self, doc: &Document, bytes: &[u8]) -> Option<String> {
        let encoding = self.dict.get_font_encoding(doc).ok()?;
        Document::decode_text(&encoding, bytes).ok()
    }
}

/// Resolve every font resource of a page, keyed by resource name
pub fn page_fonts<'a>(
    doc: &'a Document,
    page_id: lopdf::ObjectId,
) -> BTreeMap<Vec<u8>, FontInfo<'a>> {
    doc.get_page_fonts(page_id)
        .unwrap_or_default()
        .into_iter()
        .map(|(name, dict)| (name, FontInfo::from_dict(doc, dict)))
        .collect()
}

/// Decode string bytes without a font: UTF-16BE with BOM, else Latin-1
pub fn fallback_decode(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Helper to get f32 from Object
pub(crate) fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    doc.dereference(obj).map(|(_, o)| o).unwrap_or(obj)
}

fn lookup<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|o| resolve(doc, o))
}

fn name_of(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    lookup(doc, dict, key)
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).to_string())
        .filter(|n| !n.is_empty())
}

fn simple_widths(doc: &Document, dict: &Dictionary) -> GlyphWidths {
    let widths = lookup(doc, dict, b"Widths").and_then(|o| o.as_array().ok());
    let Some(widths) = widths else {
        return GlyphWidths::Unknown;
    };

    let first_char = lookup(doc, dict, b"FirstChar")
        .and_then(get_number)
        .unwrap_or(0.0)
        .max(0.0) as u32;
    let missing = lookup(doc, dict, b"FontDescriptor")
        .and_then(|o| o.as_dict().ok())
        .and_then(|fd| lookup(doc, fd, b"MissingWidth"))
        .and_then(get_number)
        .unwrap_or(0.0);

    GlyphWidths::Simple {
        first_char,
        widths: widths
            .iter()
            .map(|w| get_number(resolve(doc, w)).unwrap_or(missing))
            .collect(),
        missing,
    }
}

fn composite_widths(doc: &Document, dict: &Dictionary) -> GlyphWidths {
    let descendant = lookup(doc, dict, b"DescendantFonts")
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok());
    let Some(descendant) = descendant else {
        return GlyphWidths::Unknown;
    };

    let default = lookup(doc, descendant, b"DW")
        .and_then(get_number)
        .unwrap_or(1000.0);
    let ranges = lookup(doc, descendant, b"W")
        .and_then(|o| o.as_array().ok())
        .map(|w| parse_cid_widths(doc, w))
        .unwrap_or_default();

    GlyphWidths::Composite { ranges, default }
}

/// Parse a `/W` array: `c [w1 w2 ...]` and `c_first c_last w` entries
fn parse_cid_widths(doc: &Document, w: &[Object]) -> Vec<(u32, u32, f32)> {
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < w.len() {
        let Some(first) = get_number(resolve(doc, &w[i])) else {
            break;
        };
        let first = first.max(0.0) as u32;

        match w.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    if let Some(width) = get_number(resolve(doc, width)) {
                        let code = first + offset as u32;
                        ranges.push((code, code, width));
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = get_number(last).unwrap_or(first as f32).max(0.0) as u32;
                let width = w.get(i + 2).and_then(|o| get_number(resolve(doc, o)));
                if let Some(width) = width {
                    ranges.push((first, last, width));
                }
                i += 3;
            }
            None => break,
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_simple_font_widths() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => "Arial-BoldMT",
            "FirstChar" => 32,
            "LastChar" => 34,
            "Widths" => vec![278.into(), 333.into(), 474.into()],
        };
        let info = FontInfo::from_dict(&doc, &font);

        assert_eq!(info.base_font.as_deref(), Some("Arial-BoldMT"));
        assert!(!info.composite);
        assert_eq!(info.space_width(), 278.0);
        assert_eq!(info.glyph_width(33), 333.0);
        // Outside the table and no MissingWidth: zero width
        assert_eq!(info.glyph_width(90), 0.0);
        assert_eq!(info.codes(b"AB"), vec![65, 66]);
    }

    #[test]
    fn test_standard_font_without_widths() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        };
        let info = FontInfo::from_dict(&doc, &font);
        assert_eq!(info.widths, GlyphWidths::Unknown);
        assert_eq!(info.glyph_width(65), DEFAULT_GLYPH_WIDTH);
        assert_eq!(info.space_width(), DEFAULT_SPACE_WIDTH);
        assert!(info.is_word_break(32));
    }

    #[test]
    fn test_composite_font_widths() {
        let doc = Document::with_version("1.5");
        let descendant = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 1000,
            "W" => vec![
                3.into(),
                Object::Array(vec![250.into(), 600.into()]),
                10.into(),
                20.into(),
                700.into(),
            ],
        };
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "ABCDEF+Calibri-Bold",
            "DescendantFonts" => vec![descendant.into()],
        };
        let info = FontInfo::from_dict(&doc, &font);

        assert!(info.composite);
        assert_eq!(info.codes(&[0x00, 0x03, 0x00, 0x0C]), vec![3, 12]);
        assert_eq!(info.glyph_width(3), 250.0);
        assert_eq!(info.glyph_width(4), 600.0);
        assert_eq!(info.glyph_width(15), 700.0);
        assert_eq!(info.glyph_width(100), 1000.0);
        assert!(!info.is_word_break(32));
    }

    #[test]
    fn test_missing_base_font() {
        let doc = Document::with_version("1.5");
        let font = dictionary! { "Type" => "Font", "Subtype" => "Type3" };
        assert_eq!(FontInfo::from_dict(&doc, &font).base_font, None);
    }

    #[test]
    fn test_fallback_decode() {
        assert_eq!(fallback_decode(b"Hello"), "Hello");
        assert_eq!(fallback_decode(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
        assert_eq!(fallback_decode(&[0xE9]), "\u{e9}");
    }
}
