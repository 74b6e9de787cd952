use crate::error::RenderError;
use crate::helpers::{self, OutlineEntry};
use crate::images::ImageSet;
use crate::painter::PageContext;
use crate::writer::StreamingPdfWriter;
use lopdf::{Object, ObjectId, dictionary};
use std::collections::HashMap;
use std::io::{Cursor, Seek, Write};
use towerdoc_layout::{LaidOutDocument, LayoutElement};
use towerdoc_types::{ResourceUri, Size};

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub title: Option<String>,
    /// The `Y` in `Page X of Y`. Zero means the laid-out page count.
    pub total_pages: usize,
    pub outline: Vec<OutlineEntry>,
}

/// Writes a [`LaidOutDocument`] as a PDF, resolving footers, link areas and
/// bookmarks against the final page objects.
pub struct LopdfRenderer<'a> {
    page_size: Size,
    images: &'a ImageSet,
}

impl<'a> LopdfRenderer<'a> {
    pub fn new(page_size: Size, images: &'a ImageSet) -> Self {
        Self { page_size, images }
    }

    pub fn render(&self, document: &LaidOutDocument, options: &RenderOptions) -> Result<Vec<u8>, RenderError> {
        self.render_to(document, options, Cursor::new(Vec::new()))
            .map(Cursor::into_inner)
    }

    pub fn render_to<W: Write + Seek>(
        &self,
        document: &LaidOutDocument,
        options: &RenderOptions,
        out: W,
    ) -> Result<W, RenderError> {
        let mut writer = StreamingPdfWriter::new(out, "1.7")?;
        if let Some(title) = &options.title {
            writer.set_title(title);
        }
        let page_width = self.page_size.width;
        let page_height = self.page_size.height;

        let xobject_names = self.register_images(&mut writer, document);
        let total = if options.total_pages > 0 {
            options.total_pages
        } else {
            document.page_count()
        };

        let page_ids: Vec<ObjectId> = document.pages.iter().map(|_| writer.new_object_id()).collect();
        let mut content_ids = Vec::with_capacity(document.pages.len());
        for page in &document.pages {
            let footer_text = format!("Page {} of {}", page.number, total);
            let mut ctx = PageContext::new(page_height, &xobject_names, &footer_text);
            for el in &page.elements {
                ctx.draw_element(el);
            }
            content_ids.push(writer.buffer_content_stream(ctx.finish())?);
        }

        let link_annots_by_page =
            helpers::create_link_annotations(&mut writer, document, &page_ids, page_height)?;
        let outline_root_id =
            helpers::build_outlines(&mut writer, &options.outline, document, &page_ids, page_height)?;
        writer.set_outline_root_id(outline_root_id);

        for (i, (page_id, content_id)) in page_ids.iter().zip(&content_ids).enumerate() {
            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => writer.pages_id,
                "MediaBox" => vec![0.0.into(), 0.0.into(), page_width.into(), page_height.into()],
                "Contents" => *content_id,
                "Resources" => writer.resources_id,
            };
            if let Some(annots) = link_annots_by_page.get(&i) {
                page_dict.set(
                    "Annots",
                    Object::Array(annots.iter().copied().map(Object::Reference).collect()),
                );
            }
            writer.buffer_object_at_id(*page_id, page_dict.into());
        }

        log::debug!(
            "Wrote {} pages ({} images, {} linked pages).",
            page_ids.len(),
            xobject_names.len(),
            link_annots_by_page.len()
        );
        writer.set_page_ids(page_ids);
        Ok(writer.finish()?)
    }

    fn register_images<W: Write + Seek>(
        &self,
        writer: &mut StreamingPdfWriter<W>,
        document: &LaidOutDocument,
    ) -> HashMap<ResourceUri, String> {
        let mut names = HashMap::new();
        let sources = document.pages.iter().flat_map(|p| &p.elements).filter_map(|el| match &el.element {
            LayoutElement::Image(image) => Some(&image.src),
            _ => None,
        });
        for src in sources {
            if names.contains_key(src) {
                continue;
            }
            if let Some(image) = self.images.get(src) {
                let name = format!("Im{}", names.len() + 1);
                writer.add_xobject(&name, image.to_stream());
                names.insert(src.clone(), name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{prepare_image, test_images};
    use lopdf::Document;
    use towerdoc_layout::{
        Block, ImageBlock, LayoutEngine, LeaderLine, Margins, PageGeometry, PageSize, SectionBlock, TextStyle,
    };
    use towerdoc_types::AnchorId;

    fn engine() -> LayoutEngine {
        LayoutEngine::new(PageGeometry::new(PageSize::Letter, Margins::default()))
    }

    fn render(document: &LaidOutDocument, images: &ImageSet, options: &RenderOptions) -> Document {
        let bytes = LopdfRenderer::new(PageSize::Letter.dimensions_pt(), images)
            .render(document, options)
            .unwrap();
        Document::load_mem(&bytes).unwrap()
    }

    fn annotation_count(doc: &Document) -> usize {
        doc.get_pages()
            .values()
            .filter_map(|id| doc.get_dictionary(*id).ok())
            .filter_map(|page| page.get(b"Annots").ok())
            .filter_map(|annots| annots.as_array().ok())
            .map(Vec::len)
            .sum()
    }

    #[test]
    fn links_become_goto_annotations() {
        let _ = env_logger::builder().is_test(true).try_init();
        let style = TextStyle::body(11.0);
        let blocks = vec![
            Block::Section(SectionBlock::new(
                "Table of contents",
                vec![
                    Block::Leader(LeaderLine::linked("Scope of Work", 10, "p.2", AnchorId::new("scope-of-work"), style)),
                    Block::Leader(LeaderLine::linked("Ghost", 10, "p.9", AnchorId::new("ghost"), style)),
                ],
            )),
            Block::Section(SectionBlock::new(
                "Scope of Work",
                vec![Block::paragraph("Inspect the tower.", style)],
            )),
        ];
        let document = engine().layout(&blocks).unwrap();
        let options = RenderOptions {
            title: Some("Report".into()),
            total_pages: 0,
            outline: vec![OutlineEntry::new("Scope of Work", AnchorId::new("scope-of-work"))],
        };
        let doc = render(&document, &ImageSet::new(), &options);

        assert_eq!(doc.get_pages().len(), 2);
        // The unresolved "ghost" link is dropped.
        assert_eq!(annotation_count(&doc), 1);
        let catalog = doc.catalog().unwrap();
        assert!(catalog.get(b"Outlines").is_ok());
    }

    #[test]
    fn footers_show_the_reported_total() {
        let document = engine()
            .layout(&[Block::paragraph("One page.", TextStyle::default())])
            .unwrap();
        let options = RenderOptions {
            total_pages: 7,
            ..Default::default()
        };
        let doc = render(&document, &ImageSet::new(), &options);
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Page 1 of 7"), "got {text:?}");
    }

    #[test]
    fn prepared_images_are_embedded_once() {
        let uri = ResourceUri::new("front.png");
        let mut images = ImageSet::new();
        images.insert(uri.clone(), prepare_image(&uri, &test_images::png(10, 5)).unwrap());
        let image = ImageBlock::new(uri, 100.0).with_intrinsic(Size::new(10.0, 5.0));
        let document = engine()
            .layout(&[Block::Image(image.clone()), Block::Image(image)])
            .unwrap();
        let doc = render(&document, &images, &RenderOptions::default());

        let xobjects = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()))
            .count();
        assert_eq!(xobjects, 1);
    }
}
