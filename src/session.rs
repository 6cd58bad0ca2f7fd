use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Result, SplitError};
use crate::page_order::PageOrder;
use crate::pdf::PdfDocument;
use crate::plan::{clamp_range, SplitMode, SplitModeKind};
use crate::split::{Progress, SplitResult, SplitState, Splitter};

/// Everything a user has chosen for the currently loaded document.
///
/// Loading a new file replaces the document and resets every per-document
/// setting. Taking `&mut self` for [`Session::split`] means a second split
/// cannot start until the first has finished.
pub struct Session {
    source: Option<Arc<PdfDocument>>,
    mode: SplitModeKind,
    range: (u32, u32),
    custom_ranges: Vec<String>,
    page_order: PageOrder,
    splitter: Splitter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            source: None,
            mode: SplitModeKind::default(),
            range: (1, 1),
            custom_ranges: Vec::new(),
            page_order: PageOrder::new(0),
            splitter: Splitter::new(),
        }
    }

    /// Decode `bytes` and make it the current document. Returns its page count.
    pub fn load(&mut self, bytes: &[u8]) -> Result<u32> {
        let doc = PdfDocument::load(bytes)?;
        Ok(self.replace_document(doc))
    }

    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<u32> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let page_count = self.load(&bytes)?;
        info!(path = %path.display(), "opened PDF");
        Ok(page_count)
    }

    fn replace_document(&mut self, doc: PdfDocument) -> u32 {
        let page_count = doc.page_count();
        self.source = Some(Arc::new(doc));
        self.range = (1, page_count);
        self.custom_ranges.clear();
        self.page_order = PageOrder::new(page_count);
        self.splitter = Splitter::new();
        page_count
    }

    /// Page count of the loaded document, or 0 when nothing is loaded.
    pub fn page_count(&self) -> u32 {
        self.source.as_ref().map_or(0, |doc| doc.page_count())
    }

    pub fn set_mode(&mut self, mode: SplitModeKind) {
        debug!(?mode, "split mode changed");
        self.mode = mode;
    }

    /// Set the single-range bounds, clamped into the loaded document.
    /// Returns the bounds actually stored.
    pub fn set_range_params(&mut self, start: u32, end: u32) -> Result<(u32, u32)> {
        let page_count = self.loaded()?.page_count();
        self.range = clamp_range(start, end, page_count);
        if self.range != (start, end) {
            debug!(start, end, clamped = ?self.range, "range clamped");
        }
        Ok(self.range)
    }

    pub fn add_custom_range(&mut self, expression: impl Into<String>) {
        self.custom_ranges.push(expression.into());
    }

    /// Drop the expression at `index` (0-based) and return it.
    pub fn remove_custom_range(&mut self, index: usize) -> Result<String> {
        if index >= self.custom_ranges.len() {
            return Err(SplitError::InvalidPosition {
                position: index,
                len: self.custom_ranges.len(),
            });
        }
        Ok(self.custom_ranges.remove(index))
    }

    pub fn page_order(&self) -> &PageOrder {
        &self.page_order
    }

    /// Move the page at position `from` to position `to` in reorder mode's
    /// page order.
    pub fn move_page(&mut self, from: usize, to: usize) -> Result<()> {
        self.page_order = self.page_order.move_page(from, to)?;
        Ok(())
    }

    /// Replace the page order with an explicit permutation of 1-based pages.
    pub fn set_page_order(&mut self, pages: Vec<u32>) -> Result<()> {
        let page_count = self.loaded()?.page_count();
        self.page_order = PageOrder::from_pages(pages, page_count)?;
        Ok(())
    }

    /// The selected mode with its parameters taken from the session.
    pub fn split_mode(&self) -> SplitMode {
        match self.mode {
            SplitModeKind::Range => SplitMode::Range {
                start: self.range.0,
                end: self.range.1,
            },
            SplitModeKind::EveryPage => SplitMode::EveryPage,
            SplitModeKind::CustomRanges => SplitMode::CustomRanges(self.custom_ranges.clone()),
            SplitModeKind::Reorder => SplitMode::Reorder(self.page_order.clone()),
        }
    }

    pub fn split_state(&self) -> &SplitState {
        self.splitter.state()
    }

    /// Split the loaded document according to the session's mode.
    pub async fn split<F>(&mut self, progress: F) -> Result<Vec<SplitResult>>
    where
        F: FnMut(Progress),
    {
        let source = Arc::clone(self.loaded()?);
        let mode = self.split_mode();
        self.splitter.run(source, &mode, progress).await
    }

    fn loaded(&self) -> Result<&Arc<PdfDocument>> {
        self.source.as_ref().ok_or(SplitError::NoDocumentLoaded)
    }
}
