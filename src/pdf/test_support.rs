//! In-memory PDFs for tests. Every page draws the text `Page N` so output
//! documents can be traced back to their source pages.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

fn page_content(number: u32) -> Vec<u8> {
    format!("BT /F1 12 Tf 100 700 Td (Page {}) Tj ET", number).into_bytes()
}

fn font_resources(doc: &mut Document) -> Dictionary {
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )])
}

fn letter_box() -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ])
}

fn add_page(doc: &mut Document, parent: ObjectId, number: u32) -> ObjectId {
    let content_id = doc.add_object(Stream::new(Dictionary::new(), page_content(number)));
    doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(parent)),
        ("Contents", Object::Reference(content_id)),
    ]))
}

fn finish(mut doc: Document, pages_id: ObjectId) -> Vec<u8> {
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    save(doc)
}

/// A flat page tree whose pages inherit `Resources` and `MediaBox` from the root.
pub fn build_pdf(num_pages: u32) -> Vec<u8> {
    build_document(num_pages, None)
}

pub fn build_pdf_with_info(num_pages: u32, title: &str) -> Vec<u8> {
    build_document(num_pages, Some(title))
}

fn build_document(num_pages: u32, title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (1..=num_pages)
        .map(|n| Object::Reference(add_page(&mut doc, pages_id, n)))
        .collect();

    let resources = font_resources(&mut doc);
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        ("Kids", Object::Array(kids)),
        ("Resources", Object::Dictionary(resources)),
        ("MediaBox", letter_box()),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    if let Some(title) = title {
        let info_id = doc.add_object(Dictionary::from_iter(vec![(
            "Title",
            Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
        )]));
        doc.trailer.set("Info", Object::Reference(info_id));
    }

    finish(doc, pages_id)
}

/// Two intermediate `Pages` nodes; the second one rotates its pages by 90
/// degrees. Pages `1..=split_at` sit under the first node.
pub fn build_nested_pdf(num_pages: u32, split_at: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let root_id = doc.new_object_id();
    let left_id = doc.new_object_id();
    let right_id = doc.new_object_id();

    let left_kids: Vec<Object> = (1..=split_at)
        .map(|n| Object::Reference(add_page(&mut doc, left_id, n)))
        .collect();
    let right_kids: Vec<Object> = (split_at + 1..=num_pages)
        .map(|n| Object::Reference(add_page(&mut doc, right_id, n)))
        .collect();

    let node = |parent: ObjectId, kids: Vec<Object>| {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Parent", Object::Reference(parent)),
            ("Count", Object::Integer(kids.len() as i64)),
            ("Kids", Object::Array(kids)),
        ])
    };
    let left = node(root_id, left_kids);
    let mut right = node(root_id, right_kids);
    right.set("Rotate", Object::Integer(90));
    doc.objects.insert(left_id, Object::Dictionary(left));
    doc.objects.insert(right_id, Object::Dictionary(right));

    let resources = font_resources(&mut doc);
    let root = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(vec![Object::Reference(left_id), Object::Reference(right_id)]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("MediaBox", letter_box()),
    ]);
    doc.objects.insert(root_id, Object::Dictionary(root));

    finish(doc, root_id)
}

/// The `Page N` marker drawn by each page of `bytes`, in page order.
pub fn page_markers(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let page = doc.get_dictionary(page_id).unwrap();
            let content_id = page.get(b"Contents").unwrap().as_reference().unwrap();
            let stream = doc.get_object(content_id).unwrap().as_stream().unwrap();
            let text = String::from_utf8_lossy(&stream.content).into_owned();
            let start = text.find("(Page ").unwrap() + 1;
            let end = start + text[start..].find(')').unwrap();
            text[start..end].to_string()
        })
        .collect()
}

/// The page dictionaries of `bytes`, in page order, without inheritance.
pub fn page_dictionaries(bytes: &[u8]) -> Vec<Dictionary> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page_id| doc.get_dictionary(page_id).unwrap().clone())
        .collect()
}

fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Give page `from` a Link annotation whose `/Dest` points at page `to`
/// (both 1-based).
pub fn add_link(bytes: &[u8], from: u32, to: u32) -> Vec<u8> {
    let mut doc = Document::load_mem(bytes).unwrap();
    let ids = page_ids(&doc);
    let (from_id, to_id) = (ids[from as usize - 1], ids[to as usize - 1]);

    let annot_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Annot".to_vec())),
        ("Subtype", Object::Name(b"Link".to_vec())),
        (
            "Rect",
            Object::Array(vec![
                Object::Integer(100),
                Object::Integer(700),
                Object::Integer(200),
                Object::Integer(720),
            ]),
        ),
        ("P", Object::Reference(from_id)),
        (
            "Dest",
            Object::Array(vec![Object::Reference(to_id), Object::Name(b"Fit".to_vec())]),
        ),
    ]));
    doc.get_object_mut(from_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Annots", Object::Array(vec![Object::Reference(annot_id)]));

    save(doc)
}

/// Hang page `page` (1-based) off a `Pages` node that is its own parent, so
/// looking up its inherited attributes never terminates on its own.
pub fn break_parent_chain(bytes: &[u8], page: u32) -> Vec<u8> {
    let mut doc = Document::load_mem(bytes).unwrap();
    let page_id = page_ids(&doc)[page as usize - 1];

    let node_id = doc.new_object_id();
    doc.objects.insert(
        node_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Parent", Object::Reference(node_id)),
            ("Count", Object::Integer(0)),
            ("Kids", Object::Array(Vec::new())),
        ])),
    );
    doc.get_object_mut(page_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("Parent", Object::Reference(node_id));

    save(doc)
}

/// How many objects in `bytes` are page dictionaries, reachable or not.
pub fn count_page_objects(bytes: &[u8]) -> usize {
    let doc = Document::load_mem(bytes).unwrap();
    doc.objects
        .values()
        .filter(|object| {
            object
                .as_dict()
                .and_then(|dict| dict.get(b"Type"))
                .and_then(Object::as_name)
                .map_or(false, |name| name == b"Page")
        })
        .count()
}
