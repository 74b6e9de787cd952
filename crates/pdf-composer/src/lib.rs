//! Merging externally supplied PDF pages into a generated document.
//!
//! Pages are deep-copied with every object they reference and spliced into
//! the target's page tree, either appended or in front of a given page.

mod error;

pub use error::ComposerError;

use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;

/// Where merged pages go in the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPosition {
    #[default]
    Append,
    /// Before the page with this zero-based index.
    Before(usize),
}

/// Copies objects from one document into another, assigning fresh ids.
struct ObjectCopier<'a> {
    source_doc: &'a Document,
    target_doc: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source_doc: &'a Document, target_doc: &'a mut Document) -> Self {
        Self {
            source_doc,
            target_doc,
            id_map: HashMap::new(),
        }
    }

    /// Deep copies `source_id`, copying each referenced object once.
    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Reserve the id before recursing so reference cycles terminate.
        let new_id = self.target_doc.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source_doc.get_object(source_id)?.clone();
        let new_obj = self.remap_references(obj)?;

        match self.target_doc.objects.get_mut(&new_id) {
            Some(target_obj) => *target_obj = new_obj,
            None => return Err(lopdf::Error::ObjectNotFound(new_id)),
        }
        Ok(new_id)
    }

    /// Copies a page without following `/Parent`, which would drag in the
    /// source's whole page tree.
    fn copy_page(&mut self, page_id: ObjectId, new_parent: ObjectId) -> Result<ObjectId, lopdf::Error> {
        let mut page = self.source_doc.get_dictionary(page_id)?.clone();
        page.remove(b"Parent");
        inherit_page_attributes(self.source_doc, page_id, &mut page);

        let new_id = self.target_doc.add_object(Object::Null);
        self.id_map.insert(page_id, new_id);
        let mut remapped = match self.remap_references(Object::Dictionary(page))? {
            Object::Dictionary(dict) => dict,
            _ => return Err(lopdf::Error::ObjectNotFound(page_id)),
        };
        remapped.set("Parent", Object::Reference(new_parent));
        match self.target_doc.objects.get_mut(&new_id) {
            Some(target_obj) => *target_obj = Object::Dictionary(remapped),
            None => return Err(lopdf::Error::ObjectNotFound(new_id)),
        }
        Ok(new_id)
    }

    /// Replaces every reference in `obj` with the id of its copy.
    fn remap_references(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => {
                let new_id = self.copy_object(id)?;
                Ok(Object::Reference(new_id))
            }
            Object::Array(arr) => {
                let new_arr = arr
                    .into_iter()
                    .map(|o| self.remap_references(o))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Object::Array(new_arr))
            }
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Stream(stream))
            }
            _ => Ok(obj),
        }
    }
}

/// Pulls inheritable attributes from ancestor `Pages` nodes onto the page,
/// since the copy loses its parent chain.
fn inherit_page_attributes(doc: &Document, page_id: ObjectId, page: &mut lopdf::Dictionary) {
    const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
    let mut current = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|d| d.get(b"Parent").ok())
        .and_then(|p| p.as_reference().ok());
    // Bounded walk in case of a malformed, cyclic tree.
    for _ in 0..32 {
        let Some(parent_id) = current else { break };
        let Ok(parent) = doc.get_dictionary(parent_id) else { break };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = parent.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        current = parent.get(b"Parent").ok().and_then(|p| p.as_reference().ok());
    }
}

/// Merges every page of `source` into `target` at `position`.
///
/// The target's page tree must be flat (its root `Kids` are pages), which is
/// what the towerdoc writer produces. An index past the end appends. Object
/// ids of existing target pages are kept, so their links and outline entries
/// stay valid. Returns the number of pages inserted.
pub fn merge_documents(
    target: &mut Document,
    source: Document,
    position: InsertPosition,
) -> Result<usize, ComposerError> {
    let mut sorted_source_pages: Vec<_> = source.get_pages().into_iter().collect();
    if sorted_source_pages.is_empty() {
        return Ok(0);
    }
    sorted_source_pages.sort_by_key(|(page_num, _)| *page_num);

    let root_id = target.trailer.get(b"Root")?.as_reference()?;
    let pages_id = target.get_dictionary(root_id)?.get(b"Pages")?.as_reference()?;

    let mut copier = ObjectCopier::new(&source, target);
    let mut new_page_refs = Vec::with_capacity(sorted_source_pages.len());
    for (_, page_id) in sorted_source_pages {
        let new_page_id = copier.copy_page(page_id, pages_id)?;
        new_page_refs.push(Object::Reference(new_page_id));
    }
    let inserted = new_page_refs.len();

    let pages_dict = target.get_object_mut(pages_id)?.as_dict_mut()?;
    let mut kids = pages_dict.get(b"Kids")?.as_array()?.clone();
    let original_count = pages_dict.get(b"Count")?.as_i64()?;

    let at = match position {
        InsertPosition::Append => kids.len(),
        InsertPosition::Before(index) => index.min(kids.len()),
    };
    kids.splice(at..at, new_page_refs);

    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", original_count + inserted as i64);
    log::debug!("Merged {} pages at position {}.", inserted, at);
    Ok(inserted)
}

/// Byte-level convenience over [`merge_documents`].
pub fn merge_pdf_bytes(target: &[u8], source: &[u8], position: InsertPosition) -> Result<Vec<u8>, ComposerError> {
    let mut target_doc = Document::load_mem(target)?;
    let source_doc = Document::load_mem(source)?;
    merge_documents(&mut target_doc, source_doc, position)?;
    let mut out = Vec::new();
    target_doc.save_to(&mut out)?;
    Ok(out)
}

/// Number of pages in a PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize, ComposerError> {
    Ok(Document::load_mem(bytes)?.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, StringFormat, dictionary};

    /// A document with `num_pages` pages, each showing "`prefix` N".
    fn create_dummy_pdf(num_pages: u32, text_prefix: &str) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut page_ids = vec![];
        for i in 1..=num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![100.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("{} {}", text_prefix, i).into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            page_ids.push(page_id.into());
        }

        // MediaBox and Resources live on the tree root and must be inherited.
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => num_pages as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
        };
        doc.objects.insert(pages_id, pages_dict.into());

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn page_text(doc: &Document, page_number: u32) -> String {
        let page_id = *doc.get_pages().get(&page_number).unwrap();
        String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
    }

    #[test]
    fn append_places_pages_last() {
        let mut target_doc = create_dummy_pdf(2, "Generated");
        let source_doc = create_dummy_pdf(3, "Redline");

        let inserted = merge_documents(&mut target_doc, source_doc, InsertPosition::Append).unwrap();

        assert_eq!(inserted, 3);
        assert_eq!(target_doc.get_pages().len(), 5);
        assert!(page_text(&target_doc, 2).contains("Generated 2"));
        assert!(page_text(&target_doc, 3).contains("Redline 1"));
    }

    #[test]
    fn insert_before_page_index() {
        let mut target_doc = create_dummy_pdf(4, "Generated");
        let source_doc = create_dummy_pdf(2, "Redline");

        merge_documents(&mut target_doc, source_doc, InsertPosition::Before(2)).unwrap();

        let texts: Vec<String> = (1..=6).map(|n| page_text(&target_doc, n)).collect();
        assert!(texts[1].contains("Generated 2"));
        assert!(texts[2].contains("Redline 1"));
        assert!(texts[3].contains("Redline 2"));
        assert!(texts[4].contains("Generated 3"));
    }

    #[test]
    fn copied_pages_keep_inherited_attributes_and_new_parent() {
        let mut target_doc = create_dummy_pdf(1, "Generated");
        let source_doc = create_dummy_pdf(1, "Redline");
        merge_documents(&mut target_doc, source_doc, InsertPosition::Before(0)).unwrap();

        let first = *target_doc.get_pages().get(&1).unwrap();
        let page = target_doc.get_dictionary(first).unwrap();
        assert!(page.get(b"MediaBox").is_ok());
        assert!(page.get(b"Resources").is_ok());
        let root_id = target_doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let pages_id = target_doc.get_dictionary(root_id).unwrap().get(b"Pages").unwrap().as_reference().unwrap();
        assert_eq!(page.get(b"Parent").unwrap().as_reference().unwrap(), pages_id);
    }

    #[test]
    fn index_past_the_end_appends() {
        let mut target_doc = create_dummy_pdf(1, "Generated");
        merge_documents(&mut target_doc, create_dummy_pdf(1, "Redline"), InsertPosition::Before(99)).unwrap();
        assert!(page_text(&target_doc, 2).contains("Redline 1"));
    }

    #[test]
    fn merging_bytes_round_trips() {
        let mut target = Vec::new();
        create_dummy_pdf(2, "Generated").save_to(&mut target).unwrap();
        let mut source = Vec::new();
        create_dummy_pdf(3, "Redline").save_to(&mut source).unwrap();

        let merged = merge_pdf_bytes(&target, &source, InsertPosition::Append).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 5);
    }
}
