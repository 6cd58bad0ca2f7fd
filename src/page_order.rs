use crate::error::{Result, SplitError};

/// The user's arrangement of 1-based page numbers for reorder mode.
///
/// Always a permutation of `1..=page_count`: it can only be created in
/// identity order or from a checked permutation, and only changed by moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOrder {
    pages: Vec<u32>,
}

impl PageOrder {
    /// Identity order `[1, 2, ..., page_count]`.
    pub fn new(page_count: u32) -> Self {
        PageOrder {
            pages: (1..=page_count).collect(),
        }
    }

    /// Accept an explicit arrangement if it is a permutation of `1..=page_count`.
    pub fn from_pages(pages: Vec<u32>, page_count: u32) -> Result<Self> {
        let mut seen = vec![false; page_count as usize];
        let valid = pages.len() == page_count as usize
            && pages.iter().all(|&p| {
                if p == 0 || p > page_count || seen[(p - 1) as usize] {
                    return false;
                }
                seen[(p - 1) as usize] = true;
                true
            });

        if !valid {
            return Err(SplitError::InvalidPageOrder { page_count });
        }
        Ok(PageOrder { pages })
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.pages
    }

    /// Remove the page at position `from` and reinsert it at position `to`
    /// (both 0-based positions within the order), returning the new order.
    pub fn move_page(&self, from: usize, to: usize) -> Result<Self> {
        let len = self.pages.len();
        for position in [from, to] {
            if position >= len {
                return Err(SplitError::InvalidPosition { position, len });
            }
        }

        let mut pages = self.pages.clone();
        let moved = pages.remove(from);
        pages.insert(to, moved);
        Ok(PageOrder { pages })
    }

    /// 0-based source indices in display order.
    pub fn to_indices(&self) -> Vec<u32> {
        self.pages.iter().map(|p| p - 1).collect()
    }
}
