//! Link annotations and document outlines, built against the final page ids.

use crate::error::RenderError;
use crate::writer::StreamingPdfWriter;
use lopdf::{Object, ObjectId, StringFormat, dictionary};
use std::collections::HashMap;
use std::io::{Seek, Write};
use towerdoc_layout::{LaidOutDocument, LayoutElement};
use towerdoc_types::AnchorId;

/// One bookmark in the document outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub title: String,
    pub anchor: AnchorId,
}

impl OutlineEntry {
    pub fn new(title: impl Into<String>, anchor: AnchorId) -> Self {
        Self {
            title: title.into(),
            anchor,
        }
    }
}

fn destination(
    document: &LaidOutDocument,
    anchor: &AnchorId,
    page_ids: &[ObjectId],
    page_height: f32,
) -> Option<Vec<Object>> {
    let location = document.anchors.get(anchor)?;
    let page_id = page_ids.get(location.page_index)?;
    Some(vec![
        Object::Reference(*page_id),
        "FitH".into(),
        (page_height - location.y_pos).into(),
    ])
}

/// Creates a GoTo link annotation for every link area in the document.
///
/// Returns the annotation ids keyed by page index. Links whose anchor is not
/// defined in `document` are skipped with a warning.
pub fn create_link_annotations<W: Write + Seek>(
    writer: &mut StreamingPdfWriter<W>,
    document: &LaidOutDocument,
    page_ids: &[ObjectId],
    page_height: f32,
) -> Result<HashMap<usize, Vec<ObjectId>>, RenderError> {
    let mut link_annots_by_page: HashMap<usize, Vec<ObjectId>> = HashMap::new();

    for page in &document.pages {
        for el in &page.elements {
            let LayoutElement::Link(target) = &el.element else {
                continue;
            };
            let Some(dest) = destination(document, target, page_ids, page_height) else {
                log::warn!("Link target '{}' was never laid out; skipping link.", target.href());
                continue;
            };

            let action = dictionary! { "Type" => "Action", "S" => "GoTo", "D" => dest };
            let action_id = writer.buffer_object(action.into());
            let rect = vec![
                el.x.into(),
                (page_height - (el.y + el.height)).into(),
                (el.x + el.width).into(),
                (page_height - el.y).into(),
            ];
            let annot = dictionary! {
                "Type" => "Annot", "Subtype" => "Link", "Rect" => rect,
                "Border" => vec![0.into(), 0.into(), 0.into()], "A" => action_id,
            };
            let annot_id = writer.buffer_object(annot.into());
            link_annots_by_page.entry(page.index).or_default().push(annot_id);
        }
    }
    Ok(link_annots_by_page)
}

/// Builds a flat bookmark outline. Returns the root `Outlines` id, or `None`
/// when no entry resolves to a page.
pub fn build_outlines<W: Write + Seek>(
    writer: &mut StreamingPdfWriter<W>,
    entries: &[OutlineEntry],
    document: &LaidOutDocument,
    page_ids: &[ObjectId],
    page_height: f32,
) -> Result<Option<ObjectId>, RenderError> {
    let items: Vec<(ObjectId, &OutlineEntry, Vec<Object>)> = entries
        .iter()
        .filter_map(|entry| {
            destination(document, &entry.anchor, page_ids, page_height)
                .map(|dest| (writer.new_object_id(), entry, dest))
        })
        .collect();

    let (Some(first), Some(last)) = (items.first(), items.last()) else {
        return Ok(None);
    };
    let (first_id, last_id) = (first.0, last.0);

    let outline_root_id = writer.new_object_id();
    writer.buffer_object_at_id(
        outline_root_id,
        dictionary! {
            "Type" => "Outlines", "First" => first_id, "Last" => last_id, "Count" => items.len() as i64,
        }
        .into(),
    );

    for (i, (id, entry, dest)) in items.iter().enumerate() {
        let mut dict = dictionary! {
            "Title" => Object::String(to_win_ansi(&entry.title), StringFormat::Literal),
            "Parent" => outline_root_id, "Dest" => dest.clone(),
        };
        if i > 0 {
            dict.set("Prev", items[i - 1].0);
        }
        if let Some(next) = items.get(i + 1) {
            dict.set("Next", next.0);
        }
        writer.buffer_object_at_id(*id, dict.into());
    }
    Ok(Some(outline_root_id))
}

/// Encodes text for the WinAnsi-encoded standard fonts. Characters outside
/// the encoding become `?`.
pub fn to_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}
