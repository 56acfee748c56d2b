//! Bold text extraction from PDFs using lopdf
//!
//! This crate provides:
//! - A content stream interpreter that turns pages into positioned glyph runs
//! - Font-based style classification of those runs
//! - Reconstruction of bold runs into coherent lines, joining fragments that
//!   sit on the same line or wrap from one line onto the next

pub mod collector;
pub mod document;
pub mod event;
pub mod font;
pub mod geometry;
pub mod interpreter;
pub mod merger;
pub mod registry;
pub mod style;

pub use collector::{FragmentCollector, PageFragments, TextChunk};
pub use document::{PageSource, PdfDocument};
pub use event::{TextEventSink, TextRenderEvent};
pub use merger::{MergeConfig, RunMerger};
pub use registry::{HeightMatch, LineHeightRegistry};
pub use style::{is_bold_font, BoldDetector, StyleClassifier, StyleDetector, TextStyle};

use log::debug;
use rayon::prelude::*;
use std::path::Path;

/// Options for bold line extraction
#[derive(Debug, Default)]
pub struct ExtractOptions {
    /// Merge thresholds and line height matching
    pub merge: MergeConfig,
    /// Style detectors deciding which fragments are extracted
    pub classifier: StyleClassifier,
    /// Process pages on the rayon thread pool (output order is unchanged)
    pub parallel: bool,
    /// Restrict extraction to an inclusive 1-indexed page range
    pub pages: Option<(u32, u32)>,
}

/// Bold lines found on a single page
#[derive(Debug, Clone, PartialEq)]
pub struct PageBoldLines {
    /// Page number (1-indexed)
    pub page: u32,
    pub lines: Vec<String>,
}

/// Extract bold lines from a PDF file
pub fn extract_bold_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, BoldLinesError> {
    extract_bold_lines_with_options(path, &ExtractOptions::default())
}

/// Extract bold lines from a PDF file with custom options
pub fn extract_bold_lines_with_options<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<Vec<String>, BoldLinesError> {
    Ok(flatten(extract_pages_from_file(path, options)?))
}

/// Extract bold lines from a PDF memory buffer
pub fn extract_bold_lines_mem(buffer: &[u8]) -> Result<Vec<String>, BoldLinesError> {
    extract_bold_lines_mem_with_options(buffer, &ExtractOptions::default())
}

/// Extract bold lines from a PDF memory buffer with custom options
pub fn extract_bold_lines_mem_with_options(
    buffer: &[u8],
    options: &ExtractOptions,
) -> Result<Vec<String>, BoldLinesError> {
    Ok(flatten(extract_pages_mem(buffer, options)?))
}

/// Bold lines of a PDF file grouped per page
pub fn extract_pages_from_file<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<Vec<PageBoldLines>, BoldLinesError> {
    let buffer = std::fs::read(path)?;
    extract_pages_mem(&buffer, options)
}

/// Bold lines of a PDF memory buffer grouped per page.
///
/// In parallel mode every rayon worker parses its own copy of the document,
/// so pages can be interpreted concurrently.
pub fn extract_pages_mem(
    buffer: &[u8],
    options: &ExtractOptions,
) -> Result<Vec<PageBoldLines>, BoldLinesError> {
    let doc = PdfDocument::from_bytes(buffer)?;
    if !options.parallel {
        return extract_pages(&doc, options);
    }

    let page_numbers = page_range(doc.page_count(), options.pages)?;
    drop(doc);

    page_numbers
        .par_iter()
        .map_init(
            || PdfDocument::from_bytes(buffer),
            |doc, &page| {
                let doc = doc
                    .as_ref()
                    .map_err(|e| BoldLinesError::Parse(e.to_string()))?;
                page_lines(doc, page, options)
            },
        )
        .collect()
}

/// Flat list of non-empty bold lines from any page source, in page order
pub fn extract_from_source<S: PageSource + ?Sized>(
    source: &S,
    options: &ExtractOptions,
) -> Result<Vec<String>, BoldLinesError> {
    Ok(flatten(extract_pages(source, options)?))
}

/// Bold lines grouped per page, pages processed in order
pub fn extract_pages<S: PageSource + ?Sized>(
    source: &S,
    options: &ExtractOptions,
) -> Result<Vec<PageBoldLines>, BoldLinesError> {
    page_range(source.page_count(), options.pages)?
        .into_iter()
        .map(|page| page_lines(source, page, options))
        .collect()
}

fn page_lines<S: PageSource + ?Sized>(
    source: &S,
    page: u32,
    options: &ExtractOptions,
) -> Result<PageBoldLines, BoldLinesError> {
    let text = page_text(source, page, &options.merge, &options.classifier)?;
    Ok(PageBoldLines {
        page,
        lines: split_lines(&text),
    })
}

fn flatten(pages: Vec<PageBoldLines>) -> Vec<String> {
    pages.into_iter().flat_map(|page| page.lines).collect()
}

/// Merged bold text of one page, lines separated by [`merger::LINE_BREAK`]
pub fn page_text<S: PageSource + ?Sized>(
    source: &S,
    page: u32,
    config: &MergeConfig,
    classifier: &StyleClassifier,
) -> Result<String, BoldLinesError> {
    let fragments = collect_page(source, page, config, classifier)?;
    Ok(RunMerger::new(*config).merge(&fragments))
}

/// Collect the chunks of one page without merging them
pub fn collect_page<S: PageSource + ?Sized>(
    source: &S,
    page: u32,
    config: &MergeConfig,
    classifier: &StyleClassifier,
) -> Result<PageFragments, BoldLinesError> {
    let mut collector = FragmentCollector::new(config, classifier);
    source.render_page(page, &mut collector)?;
    let dropped = collector.dropped();
    let fragments = collector.finish();

    debug!(
        "Page {}: {} chunks, {} bold, {} line heights, {} dropped",
        page,
        fragments.chunks().len(),
        fragments.bold_count(),
        fragments.registry().len(),
        dropped
    );

    Ok(fragments)
}

/// Split merged page text into its non-empty lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn page_range(page_count: u32, range: Option<(u32, u32)>) -> Result<Vec<u32>, BoldLinesError> {
    match range {
        None => Ok((1..=page_count).collect()),
        Some((first, last)) => {
            if first == 0 || first > page_count {
                return Err(BoldLinesError::PageOutOfRange(first));
            }
            if last < first {
                return Err(BoldLinesError::PageOutOfRange(last));
            }
            Ok((first..=last.min(page_count)).collect())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BoldLinesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("Invalid PDF structure")]
    InvalidStructure,
    #[error("Page {0} is out of range")]
    PageOutOfRange(u32),
}

impl From<lopdf::Error> for BoldLinesError {
    fn from(e: lopdf::Error) -> Self {
        BoldLinesError::Parse(e.to_string())
    }
}
