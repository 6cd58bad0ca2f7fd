use lopdf::{Document, Object, ObjectId};
use std::path::Path;
use tracing::info;

use crate::error::{Result, SplitError};

/// A decoded source PDF. Read-only once loaded; a new file means a new value.
pub struct PdfDocument {
    pub doc: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::load(&bytes)
    }

    /// Decode a PDF from an in-memory buffer.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        if !has_pdf_header(bytes) {
            return Err(SplitError::InvalidFile {
                reason: "missing %PDF- header".to_string(),
            });
        }

        let doc = Document::load_mem(bytes).map_err(|e| SplitError::Decode(e.to_string()))?;

        // get_pages is keyed by 1-based page number, so values come out in page order
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(SplitError::InvalidFile {
                reason: "document has no pages".to_string(),
            });
        }

        info!(pages = page_ids.len(), bytes = bytes.len(), "loaded PDF");
        Ok(PdfDocument { doc, page_ids })
    }

    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    /// Object ID of the page at a 0-based index
    pub fn page_id(&self, index: u32) -> Result<ObjectId> {
        self.page_ids
            .get(index as usize)
            .copied()
            .ok_or(SplitError::InvalidPageIndex {
                index,
                page_count: self.page_count(),
            })
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.mod_date = get_string_from_dict(dict, b"ModDate");
                info.subject = get_string_from_dict(dict, b"Subject");
                info.keywords = get_string_from_dict(dict, b"Keywords");
            }
        }

        info.version = self.doc.version.clone();
        info.page_count = self.page_count();
        info
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"%PDF-")
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub version: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    if let Some(utf16) = bytes.strip_prefix(&[0xFEu8, 0xFF][..]) {
        let u16_chars: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        // PDFDocEncoding, approximated as Latin-1
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}
