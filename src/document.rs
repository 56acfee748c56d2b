//! Document handles that feed pages to the extractor

use crate::event::TextEventSink;
use crate::interpreter::PageInterpreter;
use crate::BoldLinesError;
use lopdf::{Document, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// A paginated source of text-rendering events
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Render page `page_number` (1-indexed), delivering its events to `sink`
    /// in content-stream order
    fn render_page(
        &self,
        page_number: u32,
        sink: &mut dyn TextEventSink,
    ) -> Result<(), BoldLinesError>;
}

/// A PDF loaded with lopdf
pub struct PdfDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfDocument {
    /// Load a PDF file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BoldLinesError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BoldLinesError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        Self::from_document(Document::load(path)?)
    }

    /// Load a PDF from a memory buffer
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, BoldLinesError> {
        Self::from_document(Document::load_mem(buffer)?)
    }

    /// Wrap a loaded document, rejecting encrypted files and missing page trees
    pub fn from_document(doc: Document) -> Result<Self, BoldLinesError> {
        if doc.is_encrypted() {
            return Err(BoldLinesError::Encrypted);
        }

        let has_page_tree = doc
            .catalog()
            .ok()
            .and_then(|catalog| catalog.get(b"Pages").ok())
            .and_then(|pages| doc.dereference(pages).ok())
            .is_some_and(|(_, pages)| pages.as_dict().is_ok());
        if !has_page_tree {
            return Err(BoldLinesError::InvalidStructure);
        }

        let pages = doc.get_pages();
        Ok(Self { doc, pages })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn render_page(
        &self,
        page_number: u32,
        sink: &mut dyn TextEventSink,
    ) -> Result<(), BoldLinesError> {
        let page_id = *self
            .pages
            .get(&page_number)
            .ok_or(BoldLinesError::PageOutOfRange(page_number))?;
        PageInterpreter::run(&self.doc, page_id, sink)
    }
}

/// In-memory pages of pre-decoded events
impl PageSource for Vec<Vec<crate::event::TextRenderEvent>> {
    fn page_count(&self) -> u32 {
        self.len() as u32
    }

    fn render_page(
        &self,
        page_number: u32,
        sink: &mut dyn TextEventSink,
    ) -> Result<(), BoldLinesError> {
        let events = page_number
            .checked_sub(1)
            .and_then(|i| self.get(i as usize))
            .ok_or(BoldLinesError::PageOutOfRange(page_number))?;
        for event in events {
            sink.render_text(event.clone());
        }
        Ok(())
    }
}
