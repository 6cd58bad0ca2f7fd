use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use tracing::warn;

/// One comma-separated token of a range expression: a single page or an
/// inclusive span, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    /// Parse a token like "5" or "3-7". Anything else ("a", "-4", "1-2-3", "")
    /// yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Some(dash_pos) = s.find('-') {
            // A leading dash would be a negative number, not a span
            if dash_pos == 0 {
                return None;
            }

            let start = parse_page_number(&s[..dash_pos])?;
            let end = parse_page_number(&s[dash_pos + 1..])?;

            Some(PageRange {
                start,
                end: Some(end),
            })
        } else {
            let page = parse_page_number(s)?;
            Some(PageRange {
                start: page,
                end: None,
            })
        }
    }

    /// Expand this range into the 1-based page numbers that exist in a
    /// document of `total_pages` pages. Pages outside `[1, total_pages]` are
    /// dropped, and a reversed span (`end < start`) expands to nothing.
    pub fn expand(&self, total_pages: u32) -> RangeInclusive<u32> {
        let end = self.end.unwrap_or(self.start);
        // Empty for reversed spans and for spans entirely outside the document
        self.start.max(1)..=end.min(total_pages)
    }
}

fn parse_page_number(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok()
}

/// Parse a comma-separated list of page ranges like "1-5, 8, 10-12",
/// dropping tokens that are not a page number or a span.
pub fn parse_page_ranges(s: &str) -> Vec<PageRange> {
    s.split(',')
        .filter_map(|part| {
            let range = PageRange::parse(part);
            if range.is_none() && !part.trim().is_empty() {
                warn!(token = part.trim(), "ignoring malformed page range");
            }
            range
        })
        .collect()
}

/// Expand a range expression into ascending, deduplicated 0-based page
/// indices valid for a document of `total_pages` pages.
pub fn expand_page_ranges(s: &str, total_pages: u32) -> Vec<u32> {
    let pages: BTreeSet<u32> = parse_page_ranges(s)
        .iter()
        .flat_map(|range| range.expand(total_pages))
        .map(|page| page - 1)
        .collect();
    pages.into_iter().collect()
}
