use super::PdfDocument;
use crate::error::EngineError;
use lopdf::{Dictionary, Object, ObjectId};
use std::collections::{BTreeMap, BTreeSet};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Keys pointing back up the object graph. Copying never follows them.
const BACK_REFERENCES: [&[u8]; 2] = [b"Parent", b"P"];

/// Nesting limit when walking up the page tree.
const MAX_TREE_DEPTH: usize = 64;

/// The document operations splitting and merging are built from.
///
/// Page handles returned by [`DocumentEngine::copy_pages`] belong to the
/// destination document and only become visible once appended.
pub trait DocumentEngine: Send + Sync {
    type Document: Send;
    type Page: Send;

    fn load(&self, bytes: &[u8]) -> Result<Self::Document, EngineError>;

    fn create(&self) -> Self::Document;

    fn page_count(&self, doc: &Self::Document) -> u32;

    /// Copy the pages at `indices` (zero-based) from `src` into `dest`, in
    /// the given order.
    fn copy_pages(
        &self,
        dest: &mut Self::Document,
        src: &Self::Document,
        indices: &[u32],
    ) -> Result<Vec<Self::Page>, EngineError>;

    fn append_pages(
        &self,
        dest: &mut Self::Document,
        pages: Vec<Self::Page>,
    ) -> Result<(), EngineError>;

    fn serialize(&self, doc: &mut Self::Document) -> Result<Vec<u8>, EngineError>;
}

/// [`DocumentEngine`] backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl DocumentEngine for LopdfEngine {
    type Document = PdfDocument;
    type Page = ObjectId;

    fn load(&self, bytes: &[u8]) -> Result<PdfDocument, EngineError> {
        PdfDocument::from_bytes(bytes)
    }

    fn create(&self) -> PdfDocument {
        PdfDocument::empty()
    }

    fn page_count(&self, doc: &PdfDocument) -> u32 {
        doc.page_count()
    }

    fn copy_pages(
        &self,
        dest: &mut PdfDocument,
        src: &PdfDocument,
        indices: &[u32],
    ) -> Result<Vec<ObjectId>, EngineError> {
        copy_pages(dest, src, indices)
    }

    fn append_pages(&self, dest: &mut PdfDocument, pages: Vec<ObjectId>) -> Result<(), EngineError> {
        let root = dest.pages_root()?;

        for page_id in &pages {
            dest.doc
                .get_dictionary_mut(*page_id)
                .map_err(|e| malformed(format!("page {:?} was not copied: {}", page_id, e)))?
                .set("Parent", Object::Reference(root));
        }

        let tree = dest
            .doc
            .get_dictionary_mut(root)
            .map_err(|e| malformed(format!("page tree root: {}", e)))?;
        let mut kids = match tree.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            _ => Vec::new(),
        };
        kids.extend(pages.into_iter().map(Object::Reference));
        tree.set("Count", Object::Integer(kids.len() as i64));
        tree.set("Kids", Object::Array(kids));
        Ok(())
    }

    fn serialize(&self, doc: &mut PdfDocument) -> Result<Vec<u8>, EngineError> {
        doc.to_bytes()
    }
}

/// Copy pages together with everything they reference.
///
/// Objects reachable from the selected pages are copied under fresh IDs in
/// `dest`; references to anything outside that set become `null`. Other pages
/// of `src` are never pulled in, even through link destinations. Attributes
/// inherited from the source page tree are written onto the copied pages.
fn copy_pages(
    dest: &mut PdfDocument,
    src: &PdfDocument,
    indices: &[u32],
) -> Result<Vec<ObjectId>, EngineError> {
    let page_ids = src.page_ids();
    let total = page_ids.len() as u32;

    let mut pages = Vec::with_capacity(indices.len());
    for &index in indices {
        let page_id = *page_ids
            .get(index as usize)
            .ok_or(EngineError::PageOutOfRange { index, total })?;
        pages.push((page_id, flattened_page(src, page_id)?));
    }

    // Selected pages get their IDs first so references between them survive.
    let mut id_map: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
    let mut copy_ids = Vec::with_capacity(pages.len());
    for (page_id, _) in &pages {
        let new_id = dest.doc.new_object_id();
        id_map.entry(*page_id).or_insert(new_id);
        copy_ids.push(new_id);
    }

    let unselected: BTreeSet<ObjectId> = page_ids
        .iter()
        .filter(|id| !id_map.contains_key(id))
        .copied()
        .collect();

    let mut pending = Vec::new();
    for (_, dict) in &pages {
        push_dict_references(dict, &mut pending);
    }
    let mut dependencies = Vec::new();
    while let Some(id) = pending.pop() {
        if id_map.contains_key(&id) || unselected.contains(&id) {
            continue;
        }
        let Ok(object) = src.doc.get_object(id) else {
            continue;
        };
        id_map.insert(id, dest.doc.new_object_id());
        dependencies.push(id);
        push_references(object, &mut pending);
    }

    for id in dependencies {
        if let Ok(object) = src.doc.get_object(id) {
            dest.doc
                .objects
                .insert(id_map[&id], remap_object(object, &id_map));
        }
    }
    for ((_, dict), new_id) in pages.iter().zip(&copy_ids) {
        dest.doc
            .objects
            .insert(*new_id, Object::Dictionary(remap_dict(dict, &id_map)));
    }

    Ok(copy_ids)
}

/// The page dictionary with inherited attributes made explicit and its
/// `Parent` link removed.
fn flattened_page(src: &PdfDocument, page_id: ObjectId) -> Result<Dictionary, EngineError> {
    let mut page = src
        .doc
        .get_dictionary(page_id)
        .map_err(|e| malformed(format!("page {:?}: {}", page_id, e)))?
        .clone();

    let mut missing: Vec<&[u8]> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(node_id) = parent {
        if missing.is_empty() || depth == MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = src.doc.get_dictionary(node_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                page.set(key.to_vec(), value.clone());
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    page.remove(b"Parent");
    Ok(page)
}

fn push_references(object: &Object, pending: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => pending.push(*id),
        Object::Array(items) => {
            for item in items {
                push_references(item, pending);
            }
        }
        Object::Dictionary(dict) => push_dict_references(dict, pending),
        Object::Stream(stream) => push_dict_references(&stream.dict, pending),
        _ => {}
    }
}

fn push_dict_references(dict: &Dictionary, pending: &mut Vec<ObjectId>) {
    for (key, value) in dict.iter() {
        if BACK_REFERENCES.contains(&key.as_slice()) {
            continue;
        }
        push_references(value, pending);
    }
}

fn remap_object(object: &Object, id_map: &BTreeMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => match id_map.get(id) {
            Some(new_id) => Object::Reference(*new_id),
            None => Object::Null,
        },
        Object::Array(items) => {
            Object::Array(items.iter().map(|item| remap_object(item, id_map)).collect())
        }
        Object::Dictionary(dict) => Object::Dictionary(remap_dict(dict, id_map)),
        Object::Stream(stream) => {
            let mut stream = stream.clone();
            stream.dict = remap_dict(&stream.dict, id_map);
            Object::Stream(stream)
        }
        other => other.clone(),
    }
}

fn remap_dict(dict: &Dictionary, id_map: &BTreeMap<ObjectId, ObjectId>) -> Dictionary {
    let mut remapped = Dictionary::new();
    for (key, value) in dict.iter() {
        remapped.set(key.clone(), remap_object(value, id_map));
    }
    remapped
}

fn malformed(reason: String) -> EngineError {
    EngineError::Malformed { reason }
}
