//! Page range copy: build a new document out of pages taken from one or more
//! source documents.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::debug;

use crate::error::PdfMantraError;
use crate::pdf::reader::inherited_attribute;

/// Page attributes that may be inherited from the page tree and must be
/// copied onto the page before it is detached from its original tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Destination document being assembled from copied pages.
pub struct PageAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PageAssembler {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append every page of `source`, in order.
    pub fn append_document(&mut self, source: Document) -> crate::error::Result<()> {
        let count = source.get_pages().len() as u32;
        let pages: Vec<u32> = (1..=count).collect();
        self.append_pages(source, &pages)
    }

    /// Append the given 1-based pages of `source`, in the given order.
    ///
    /// A page listed more than once is cloned into a fresh page object so
    /// that every entry of the page tree is a distinct object.
    pub fn append_pages(&mut self, mut source: Document, pages: &[u32]) -> crate::error::Result<()> {
        let source_pages = source.get_pages();
        let mut selected = Vec::with_capacity(pages.len());
        for &page_num in pages {
            let id = source_pages.get(&page_num).copied().ok_or_else(|| {
                PdfMantraError::page_range(format!(
                    "page {} does not exist (document has {} pages)",
                    page_num,
                    source_pages.len()
                ))
            })?;
            selected.push(id);
        }

        flatten_inherited_attributes(&mut source, &selected)?;

        // Import the whole source graph with shifted IDs. Objects that end up
        // unreachable are dropped by `finish`.
        let offset = self.doc.max_id;
        for (id, object) in std::mem::take(&mut source.objects) {
            self.doc
                .objects
                .insert(shift_id(id, offset), shift_references(object, offset));
        }
        self.doc.max_id = self.doc.max_id.max(source.max_id + offset);

        let mut used: HashSet<ObjectId> = self.kids.iter().copied().collect();
        for id in selected {
            let imported = shift_id(id, offset);
            let page_id = if used.insert(imported) {
                imported
            } else {
                let copy = self.doc.get_dictionary(imported)?.clone();
                let copy_id = self.doc.add_object(copy);
                used.insert(copy_id);
                copy_id
            };
            self.doc
                .get_dictionary_mut(page_id)?
                .set("Parent", self.pages_id);
            self.kids.push(page_id);
        }

        debug!(pages = pages.len(), total = self.kids.len(), "appended pages");
        Ok(())
    }

    /// Write the page tree, drop unreachable objects, and return the document.
    pub fn finish(mut self) -> crate::error::Result<Document> {
        if self.kids.is_empty() {
            return Err(PdfMantraError::invalid_input("no pages to write"));
        }

        let kids: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();
        let pages = self.doc.get_dictionary_mut(self.pages_id)?;
        pages.set("Kids", kids);
        pages.set("Count", self.kids.len() as i64);

        self.doc.prune_objects();
        self.doc.renumber_objects();
        Ok(self.doc)
    }
}

/// Copy inheritable attributes down onto each selected page.
fn flatten_inherited_attributes(doc: &mut Document, page_ids: &[ObjectId]) -> crate::error::Result<()> {
    for &page_id in page_ids {
        let mut missing: Vec<(&[u8], Object)> = Vec::new();
        {
            let page = doc.get_dictionary(page_id)?;
            for key in INHERITABLE_KEYS {
                if page.has(key) {
                    continue;
                }
                if let Some(value) = inherited_attribute(doc, page_id, key) {
                    missing.push((key, value));
                }
            }
        }
        if missing.is_empty() {
            continue;
        }
        let page: &mut Dictionary = doc.get_dictionary_mut(page_id)?;
        for (key, value) in missing {
            page.set(key, value);
        }
    }
    Ok(())
}

fn shift_id(id: ObjectId, offset: u32) -> ObjectId {
    (id.0 + offset, id.1)
}

/// Recursively shift every object reference by `offset`.
fn shift_references(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference(id) => Object::Reference(shift_id(id, offset)),
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| shift_references(item, offset))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(shift_dictionary(dict, offset)),
        Object::Stream(mut stream) => {
            stream.dict = shift_dictionary(stream.dict, offset);
            Object::Stream(stream)
        }
        other => other,
    }
}

fn shift_dictionary(mut dict: Dictionary, offset: u32) -> Dictionary {
    for (_, value) in dict.iter_mut() {
        *value = shift_references(std::mem::replace(value, Object::Null), offset);
    }
    dict
}
