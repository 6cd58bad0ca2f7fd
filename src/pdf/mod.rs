pub mod document;
pub mod extract;

#[cfg(test)]
pub mod test_support;

pub use document::PdfDocument;
pub use extract::{build_document, extract, serialize};
