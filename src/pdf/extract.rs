use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Result, SplitError};
use crate::pdf::PdfDocument;
use crate::plan::ExtractionJob;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `/Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Build a new PDF holding exactly the job's source pages, in job order, and
/// serialize it.
pub fn extract(source: &PdfDocument, job: &ExtractionJob) -> Result<Vec<u8>> {
    let mut new_doc = build_document(source, job)?;
    serialize(&mut new_doc)
}

/// Build the output document for one job without serializing it.
///
/// The output starts empty and receives only the objects the selected pages
/// reach, with content streams and resources carried over as-is. It gets a
/// fresh catalog and a flat page tree, so attributes the source pages
/// inherited are written onto each page. References to pages outside the job
/// (link destinations, for example) become `null`. The source document is
/// never modified.
pub fn build_document(source: &PdfDocument, job: &ExtractionJob) -> Result<Document> {
    let page_ids = job
        .source_pages
        .iter()
        .map(|&index| source.page_id(index))
        .collect::<Result<Vec<_>>>()?;

    if page_ids.is_empty() {
        return Err(SplitError::NoPagesSelected {
            reason: format!("{} has no pages", job.name),
        });
    }

    let mut copier = PageCopier::new(source, &page_ids);
    let pages_id = copier.target.new_object_id();

    let mut placed = HashSet::new();
    let mut kids = Vec::with_capacity(page_ids.len());
    for &page_id in &page_ids {
        let mut page = flatten_page(&source.doc, page_id)?;
        page.remove(b"Parent");
        let mut page = copier.copy_dictionary(&page);
        page.set("Parent", Object::Reference(pages_id));

        // The same source page twice in one job needs its own page object
        let id = if placed.insert(page_id) {
            let reserved = copier.copied[&page_id];
            copier.target.objects.insert(reserved, Object::Dictionary(page));
            reserved
        } else {
            copier.target.add_object(page)
        };
        kids.push(Object::Reference(id));
    }
    copier.copy_pending();

    let mut new_doc = copier.target;
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    new_doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = new_doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    new_doc.trailer.set("Root", Object::Reference(catalog_id));

    debug!(
        job = %job.name,
        pages = job.page_count(),
        objects = new_doc.objects.len(),
        "built output document"
    );

    Ok(new_doc)
}

pub fn serialize(doc: &mut Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| SplitError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Copies objects from the source into a fresh document, following
/// references but never walking into the source page tree.
struct PageCopier<'a> {
    source: &'a Document,
    target: Document,
    /// Source object ID -> ID in `target`
    copied: HashMap<ObjectId, ObjectId>,
    /// Source pages that are not part of the job
    excluded_pages: HashSet<ObjectId>,
    /// Referenced source objects that have an ID in `target` but no body yet
    pending: Vec<(ObjectId, ObjectId)>,
}

impl<'a> PageCopier<'a> {
    fn new(source: &'a PdfDocument, page_ids: &[ObjectId]) -> Self {
        let mut target = Document::with_version(source.doc.version.clone());

        // Selected pages get their IDs up front so references between them
        // (a link from one kept page to another) resolve to the copies
        let mut copied = HashMap::new();
        for &page_id in page_ids {
            copied
                .entry(page_id)
                .or_insert_with(|| target.new_object_id());
        }
        let excluded_pages = (0..source.page_count())
            .filter_map(|index| source.page_id(index).ok())
            .filter(|id| !copied.contains_key(id))
            .collect();

        PageCopier {
            source: &source.doc,
            target,
            copied,
            excluded_pages,
            pending: Vec::new(),
        }
    }

    fn copy_pending(&mut self) {
        let source = self.source;
        while let Some((source_id, target_id)) = self.pending.pop() {
            let object = match source.get_object(source_id) {
                Ok(object) => self.copy_object(object),
                Err(_) => Object::Null,
            };
            self.target.objects.insert(target_id, object);
        }
    }

    fn copy_object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_object(item)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Stream(stream) => {
                let mut stream = stream.clone();
                stream.dict = self.copy_dictionary(&stream.dict);
                Object::Stream(stream)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_object(value));
        }
        copy
    }

    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if let Some(&target_id) = self.copied.get(&id) {
            return Object::Reference(target_id);
        }
        if self.excluded_pages.contains(&id) || self.is_page_tree_node(id) {
            return Object::Null;
        }

        let target_id = self.target.new_object_id();
        self.copied.insert(id, target_id);
        self.pending.push((id, target_id));
        Object::Reference(target_id)
    }

    fn is_page_tree_node(&self, id: ObjectId) -> bool {
        self.source
            .get_dictionary(id)
            .and_then(|dict| dict.get(b"Type"))
            .and_then(Object::as_name)
            .map_or(false, |name| name == b"Pages")
    }
}

/// Clone a page dictionary with its inherited attributes made explicit.
fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc
        .get_dictionary(page_id)
        .map_err(|e| SplitError::Decode(format!("page {:?}: {}", page_id, e)))?
        .clone();

    for key in INHERITABLE_KEYS {
        if page.has(key) {
            continue;
        }
        if let Some(value) = find_inherited(doc, &page, key)? {
            page.set(key.to_vec(), value.clone());
        }
    }

    Ok(page)
}

fn find_inherited<'a>(
    doc: &'a Document,
    page: &Dictionary,
    key: &[u8],
) -> Result<Option<&'a Object>> {
    let mut parent = parent_of(page);
    let mut depth = 0;

    while let Some(node_id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            return Err(SplitError::Decode("page tree is too deep or cyclic".to_string()));
        }

        let node = doc
            .get_dictionary(node_id)
            .map_err(|e| SplitError::Decode(format!("page tree node {:?}: {}", node_id, e)))?;
        if let Ok(value) = node.get(key) {
            return Ok(Some(value));
        }
        parent = parent_of(node);
    }

    Ok(None)
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Parent").and_then(Object::as_reference).ok()
}
