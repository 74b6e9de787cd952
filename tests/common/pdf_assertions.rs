use lopdf::{Dictionary, Document as LopdfDocument, Object};

/// Extract all text content from a PDF document
pub fn extract_text(doc: &LopdfDocument) -> String {
    let mut text = String::new();
    let pages = doc.get_pages();
    for page_num in 1..=pages.len() {
        if let Ok(page_text) = doc.extract_text(&[page_num as u32]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    text
}

/// Information about a link annotation
#[derive(Debug)]
pub struct LinkAnnotation {
    /// 1-based page the annotation sits on.
    pub page: u32,
    pub rect: Option<[f32; 4]>,
    pub is_internal: bool,
    /// Page object the GoTo destination points at, if any.
    pub target_page: Option<lopdf::ObjectId>,
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn action_target(doc: &LopdfDocument, annot: &Dictionary) -> (bool, Option<lopdf::ObjectId>) {
    let dest = |d: &Object| {
        resolve(doc, d)
            .and_then(|d| d.as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|first| first.as_reference().ok())
    };
    if let Ok(d) = annot.get(b"Dest") {
        return (true, dest(d));
    }
    let Some(action) = annot
        .get(b"A")
        .ok()
        .and_then(|a| resolve(doc, a))
        .and_then(|a| a.as_dict().ok())
    else {
        return (false, None);
    };
    let is_goto = action
        .get(b"S")
        .and_then(|s| s.as_name())
        .is_ok_and(|name| name == b"GoTo");
    (is_goto, action.get(b"D").ok().and_then(dest))
}

/// Extract link annotations from PDF pages
pub fn extract_link_annotations(doc: &LopdfDocument) -> Vec<LinkAnnotation> {
    let mut annotations = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        let Ok(page_dict) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Some(annots) = page_dict
            .get(b"Annots")
            .ok()
            .and_then(|a| resolve(doc, a))
            .and_then(|a| a.as_array().ok())
        else {
            continue;
        };
        for annot_ref in annots {
            let Some(annot) = resolve(doc, annot_ref).and_then(|a| a.as_dict().ok()) else {
                continue;
            };
            let is_link = annot
                .get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|name| name == b"Link");
            if !is_link {
                continue;
            }
            let rect = annot.get(b"Rect").ok().and_then(|r| r.as_array().ok()).and_then(|arr| {
                (arr.len() >= 4).then(|| {
                    [
                        arr[0].as_float().unwrap_or(0.0),
                        arr[1].as_float().unwrap_or(0.0),
                        arr[2].as_float().unwrap_or(0.0),
                        arr[3].as_float().unwrap_or(0.0),
                    ]
                })
            });
            let (is_internal, target_page) = action_target(doc, annot);
            annotations.push(LinkAnnotation {
                page: page_num,
                rect,
                is_internal,
                target_page,
            });
        }
    }
    annotations
}

/// Count internal links in the PDF
pub fn count_internal_links(doc: &LopdfDocument) -> usize {
    extract_link_annotations(doc)
        .iter()
        .filter(|a| a.is_internal)
        .count()
}

/// 1-based page number of a page object.
pub fn page_number_of(doc: &LopdfDocument, page_id: lopdf::ObjectId) -> Option<u32> {
    doc.get_pages()
        .into_iter()
        .find(|(_, id)| *id == page_id)
        .map(|(n, _)| n)
}

/// Check if PDF has outlines (bookmarks/TOC)
pub fn has_outlines(doc: &LopdfDocument) -> bool {
    doc.catalog().is_ok_and(|catalog| catalog.has(b"Outlines"))
}

/// Number of image XObjects embedded in the file.
pub fn image_xobject_count(doc: &LopdfDocument) -> usize {
    doc.objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()))
        .count()
}

// ============================================================================
// Fluent Assertion Macros
// ============================================================================

/// Assert that PDF contains specific text
#[macro_export]
macro_rules! assert_pdf_contains_text {
    ($pdf:expr, $text:expr) => {
        let extracted = $crate::common::pdf_assertions::extract_text(&$pdf.doc);
        assert!(
            extracted.contains($text),
            "PDF should contain '{}', but extracted text was:\n{}",
            $text,
            extracted
        );
    };
}

/// Assert that PDF does NOT contain specific text
#[macro_export]
macro_rules! assert_pdf_not_contains_text {
    ($pdf:expr, $text:expr) => {
        let extracted = $crate::common::pdf_assertions::extract_text(&$pdf.doc);
        assert!(
            !extracted.contains($text),
            "PDF should NOT contain '{}', but it was found in:\n{}",
            $text,
            extracted
        );
    };
}

/// Assert the number of pages in a PDF
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $count:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $pdf.page_count()
        );
    };
}

/// Assert that PDF has a specific number of internal links
#[macro_export]
macro_rules! assert_pdf_internal_link_count {
    ($pdf:expr, $count:expr) => {
        let link_count = $crate::common::pdf_assertions::count_internal_links(&$pdf.doc);
        assert_eq!(
            link_count, $count,
            "Expected {} internal links, got {}",
            $count, link_count
        );
    };
}
