use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Not a valid PDF file: {reason}")]
    InvalidFile { reason: String },

    #[error("Please load a PDF file first.")]
    NoDocumentLoaded,

    #[error("No pages selected: {reason}")]
    NoPagesSelected { reason: String },

    #[error("Please specify valid page ranges.")]
    NoValidRanges,

    #[error("Page index {index} is out of range (document has {page_count} pages)")]
    InvalidPageIndex { index: u32, page_count: u32 },

    #[error("Page order must be a permutation of 1-{page_count}")]
    InvalidPageOrder { page_count: u32 },

    #[error("Position {position} is out of range (length {len})")]
    InvalidPosition { position: usize, len: usize },

    #[error("Failed to decode PDF: {0}")]
    Decode(String),

    #[error("Failed to encode PDF: {0}")]
    Encode(String),

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SplitError>;
