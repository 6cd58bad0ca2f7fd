use tracing::{debug, warn};

use crate::error::{Result, SplitError};
use crate::page_order::PageOrder;
use crate::page_range::expand_page_ranges;

/// A split strategy together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMode {
    /// One file with the inclusive 1-based pages `start..=end`.
    Range { start: u32, end: u32 },
    /// One file per source page.
    EveryPage,
    /// One file per non-empty range expression.
    CustomRanges(Vec<String>),
    /// One file with every page in the given order.
    Reorder(PageOrder),
}

impl SplitMode {
    pub fn kind(&self) -> SplitModeKind {
        match self {
            SplitMode::Range { .. } => SplitModeKind::Range,
            SplitMode::EveryPage => SplitModeKind::EveryPage,
            SplitMode::CustomRanges(_) => SplitModeKind::CustomRanges,
            SplitMode::Reorder(_) => SplitModeKind::Reorder,
        }
    }
}

/// Mode selector without parameters, as chosen on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitModeKind {
    #[default]
    Range,
    EveryPage,
    CustomRanges,
    Reorder,
}

/// One planned output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    pub name: String,
    /// 0-based source page indices, in output order.
    pub source_pages: Vec<u32>,
}

impl ExtractionJob {
    pub fn page_count(&self) -> u32 {
        self.source_pages.len() as u32
    }
}

/// Clamp a start/end pair into a valid range for a document of
/// `page_count` pages: `end` is raised to `start`, then both are pulled into
/// `[1, page_count]`.
pub fn clamp_range(start: u32, end: u32, page_count: u32) -> (u32, u32) {
    let end = end.max(start);
    let start = start.clamp(1, page_count.max(1));
    let end = end.clamp(start, page_count.max(1));
    (start, end)
}

/// Turn a split mode into the list of output documents to build.
pub fn plan(mode: &SplitMode, page_count: u32) -> Result<Vec<ExtractionJob>> {
    let jobs = match mode {
        SplitMode::Range { start, end } => vec![plan_range(*start, *end, page_count)?],
        SplitMode::EveryPage => (0..page_count)
            .map(|index| ExtractionJob {
                name: format!("page_{}.pdf", index + 1),
                source_pages: vec![index],
            })
            .collect(),
        SplitMode::CustomRanges(expressions) => plan_custom_ranges(expressions, page_count)?,
        SplitMode::Reorder(order) => {
            if order.as_slice().len() != page_count as usize {
                return Err(SplitError::InvalidPageOrder { page_count });
            }
            vec![ExtractionJob {
                name: "reordered_pages.pdf".to_string(),
                source_pages: order.to_indices(),
            }]
        }
    };

    if jobs.is_empty() {
        return Err(SplitError::NoPagesSelected {
            reason: "document has no pages".to_string(),
        });
    }

    debug!(mode = ?mode.kind(), jobs = jobs.len(), "planned split");
    Ok(jobs)
}

fn plan_range(start: u32, end: u32, page_count: u32) -> Result<ExtractionJob> {
    if start < 1 || start > end || end > page_count {
        return Err(SplitError::NoPagesSelected {
            reason: format!(
                "range {}-{} is not within 1-{}",
                start, end, page_count
            ),
        });
    }

    Ok(ExtractionJob {
        name: format!("pages_{}-{}.pdf", start, end),
        source_pages: (start - 1..end).collect(),
    })
}

fn plan_custom_ranges(expressions: &[String], page_count: u32) -> Result<Vec<ExtractionJob>> {
    let expressions: Vec<&str> = expressions
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();

    if expressions.is_empty() {
        return Err(SplitError::NoValidRanges);
    }

    let mut jobs = Vec::new();
    for expression in expressions {
        let source_pages = expand_page_ranges(expression, page_count);
        if source_pages.is_empty() {
            warn!(expression, "range selects no pages, skipping");
            continue;
        }
        jobs.push(ExtractionJob {
            name: format!("range_{}.pdf", jobs.len() + 1),
            source_pages,
        });
    }

    if jobs.is_empty() {
        return Err(SplitError::NoValidRanges);
    }
    Ok(jobs)
}
