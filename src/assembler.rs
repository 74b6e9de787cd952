//! Turns a report record into the ordered sections of an inspection report.
//!
//! Assembly never fails: every missing value has a fallback (`N/A` text,
//! a single `N/A` table row, the placeholder image or a captioned frame).

use crate::assets::AssetResolver;
use crate::config::CompositorConfig;
use crate::section::SectionMarker;
use crate::toc_page::{TOC_TITLE, TocPageRenderer};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use towerdoc_layout::{Block, ImageBlock, TableBlock, TableColumn, TextAlign, TextStyle};
use towerdoc_render_lopdf::ImageSet;
use towerdoc_traits::ResourceProvider;
use towerdoc_types::report::{NOT_AVAILABLE, cell};
use towerdoc_types::{AnchorId, Appendix, RedlineOffset, ReportRecord, ResourceUri, TocEntry};

pub const FRONT_PAGE: &str = "Front Page";
pub const AUTHOR_PAGE: &str = "Author";
pub const SCOPE_OF_WORK: &str = "Scope of Work";
pub const ANTENNA_INVENTORY: &str = "Antenna Inventory";
pub const TRANSMISSION_LINES: &str = "Transmission Lines";
pub const DEFICIENCY_SUMMARY: &str = "Deficiency Summary";
pub const DEFICIENCY_PHOTOS: &str = "Deficiency Photos";
pub const CHECKLIST: &str = "Checklist";

const FRONT_IMAGE_HEIGHT: f32 = 300.0;
const PHOTO_HEIGHT: f32 = 180.0;
const SIGNATURE_HEIGHT: f32 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Blocks(Vec<Block>),
    /// Filled in per pass from the table-of-contents listing.
    TableOfContents,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub marker: SectionMarker,
    pub content: SectionContent,
}

/// A fully assembled report, ready to be laid out by either pass.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub id: String,
    pub title: String,
    pub sections: Vec<ReportSection>,
    pub redline: RedlineOffset,
    pub redline_document: Option<ResourceUri>,
    pub images: ImageSet,
    /// Image URIs the document draws, placeholders included.
    pub referenced_images: Vec<ResourceUri>,
}

impl ReportDocument {
    pub fn markers(&self) -> impl Iterator<Item = &SectionMarker> {
        self.sections.iter().map(|s| &s.marker)
    }

    /// The first section whose page labels count redline pages. Jumped
    /// redline pages are inserted right before it.
    pub fn first_offset_section(&self) -> Option<&SectionMarker> {
        self.markers().find(|m| m.offset_redlines)
    }

    /// One entry per listed section. Used to size the table of contents
    /// before any page numbers are known.
    pub fn provisional_toc(&self) -> Vec<TocEntry> {
        self.markers()
            .filter(|m| m.listed)
            .map(|m| TocEntry::new(m.title.clone(), 1))
            .collect()
    }

    /// The flow blocks for one pass, with `toc` rendered on the contents page.
    pub fn blocks(&self, toc: &[TocEntry], renderer: &TocPageRenderer) -> Vec<Block> {
        let jump = self.redline.jump_redlines && !self.redline.is_noop();
        let mut shifted = false;
        let mut blocks = Vec::with_capacity(self.sections.len() + 1);
        for section in &self.sections {
            if jump && !shifted && section.marker.offset_redlines {
                blocks.push(Block::ShiftPageNumbers(self.redline.redline_pages));
                shifted = true;
            }
            let content = match &section.content {
                SectionContent::Blocks(content) => content.clone(),
                SectionContent::TableOfContents => renderer.render(toc),
            };
            blocks.push(section.marker.wrap(content));
        }
        blocks
    }
}

pub struct DocumentAssembler<'a> {
    config: &'a CompositorConfig,
    provider: Arc<dyn ResourceProvider>,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(config: &'a CompositorConfig, provider: Arc<dyn ResourceProvider>) -> Self {
        Self { config, provider }
    }

    fn base(&self) -> f32 {
        self.config.base_font_size
    }

    fn body(&self) -> TextStyle {
        TextStyle::body(self.base())
    }

    pub fn assemble(&self, record: &ReportRecord) -> ReportDocument {
        let mut assets = AssetResolver::new(
            Arc::clone(&self.provider),
            self.config.placeholder_image.clone(),
        );
        let front_matter = self.config.offset_front_matter;

        let mut sections = vec![
            ReportSection {
                marker: SectionMarker::new(FRONT_PAGE).offsetting_redlines(front_matter),
                content: SectionContent::Blocks(self.front_page(record, &mut assets)),
            },
            ReportSection {
                marker: SectionMarker::new(AUTHOR_PAGE).offsetting_redlines(front_matter),
                content: SectionContent::Blocks(self.author_page(record, &mut assets)),
            },
            ReportSection {
                marker: SectionMarker::new(TOC_TITLE)
                    .offsetting_redlines(front_matter)
                    .unlisted(),
                content: SectionContent::TableOfContents,
            },
        ];

        let body = [
            (SCOPE_OF_WORK, self.scope_of_work(record)),
            (ANTENNA_INVENTORY, self.antenna_inventory(record)),
            (TRANSMISSION_LINES, self.transmission_lines(record)),
            (DEFICIENCY_SUMMARY, self.deficiency_summary(record)),
            (DEFICIENCY_PHOTOS, self.deficiency_photos(record, &mut assets)),
            (CHECKLIST, self.checklist(record)),
        ];
        for (title, content) in body {
            sections.push(self.content_section(title.to_string(), content));
        }
        for (i, appendix) in record.appendices.iter().enumerate() {
            let title = appendix_title(appendix, i);
            let content = self.appendix(appendix, &mut assets);
            sections.push(self.content_section(title, content));
        }
        disambiguate_anchors(&mut sections);

        let (images, referenced_images) = assets.finish();
        log::debug!(
            "Assembled report '{}': {} sections, {} images.",
            record.id,
            sections.len(),
            images.len()
        );
        ReportDocument {
            id: record.id.clone(),
            title: self.document_title(record),
            sections,
            redline: record.redline,
            redline_document: record.redline_document.clone().filter(|u| !u.is_blank()),
            images,
            referenced_images,
        }
    }

    fn content_section(&self, title: String, content: Vec<Block>) -> ReportSection {
        let mut blocks = Vec::with_capacity(content.len() + 1);
        blocks.push(Block::heading(title.clone(), 1));
        blocks.extend(content);
        ReportSection {
            marker: SectionMarker::new(title).offsetting_redlines(true),
            content: SectionContent::Blocks(blocks),
        }
    }

    fn document_title(&self, record: &ReportRecord) -> String {
        let site = [record.site_code.trim().to_string(), record.title_cased_site_name()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .join(" ");
        if site.is_empty() {
            self.config.title_prefix.clone()
        } else {
            format!("{} - {}", self.config.title_prefix, site)
        }
    }

    fn front_page(&self, record: &ReportRecord, assets: &mut AssetResolver) -> Vec<Block> {
        let centered = |style: TextStyle| style.with_align(TextAlign::Center);
        let mut blocks = vec![
            Block::HideFooter,
            Block::paragraph(
                self.config.title_prefix.clone(),
                centered(TextStyle::heading(self.base(), 1)),
            ),
            Block::paragraph(
                or_na(&format!("{} {}", record.site_code.trim(), record.title_cased_site_name())),
                centered(TextStyle::heading(self.base(), 2)),
            ),
            Block::Spacer(self.base()),
        ];

        let mut front: Vec<ImageBlock> = record
            .usable_front_images()
            .map(|uri| assets.image(Some(uri), FRONT_IMAGE_HEIGHT))
            .collect();
        if front.is_empty() {
            log::debug!("Report '{}' has no front images; using the placeholder.", record.id);
            front.push(assets.placeholder(FRONT_IMAGE_HEIGHT));
        }
        let mut front = front.into_iter();
        if let Some(main) = front.next() {
            blocks.push(Block::Image(main));
        }
        let rest: Vec<ImageBlock> = front
            .map(|mut image| {
                image.max_height = PHOTO_HEIGHT * 0.6;
                image
            })
            .collect();
        for row in rest.chunks(2) {
            blocks.push(Block::ImageRow(row.to_vec()));
        }

        blocks.push(Block::Spacer(self.base()));
        let facts = vec![
            vec!["Site Code".to_string(), or_na(&record.site_code)],
            vec!["Site Name".to_string(), or_na(&record.title_cased_site_name())],
            vec!["Region".to_string(), or_na(&record.region)],
            vec!["Job Number".to_string(), or_na(&record.job_number)],
            vec!["Customer".to_string(), record.customer_name().to_string()],
            vec!["Inspection Date".to_string(), record.display_date()],
        ];
        blocks.push(Block::Table(
            TableBlock::new(vec![TableColumn::new("Field", 1.0), TableColumn::new("Value", 2.0)])
                .with_rows(facts)
                .without_header(),
        ));
        blocks
    }

    fn author_page(&self, record: &ReportRecord, assets: &mut AssetResolver) -> Vec<Block> {
        let body = self.body();
        let mut blocks = vec![
            Block::heading(AUTHOR_PAGE, 1),
            Block::paragraph(format!("Prepared by: {}", record.engineer_name()), body),
            Block::paragraph(format!("Inspection date: {}", record.display_date()), body),
            Block::paragraph(format!("Job number: {}", or_na(&record.job_number)), body),
            Block::Spacer(self.base()),
        ];
        match record.signature_image.as_ref().filter(|u| !u.is_blank()) {
            Some(signature) => {
                blocks.push(Block::Image(
                    assets.image(Some(signature), SIGNATURE_HEIGHT).with_caption("Signature"),
                ));
            }
            None => blocks.push(Block::paragraph(format!("Signature: {NOT_AVAILABLE}"), body)),
        }
        blocks
    }

    fn scope_of_work(&self, record: &ReportRecord) -> Vec<Block> {
        let paragraphs: Vec<&String> = record
            .scope_of_work
            .iter()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if paragraphs.is_empty() {
            return vec![Block::paragraph(NOT_AVAILABLE, self.body())];
        }
        paragraphs
            .into_iter()
            .map(|p| Block::paragraph(p.trim(), self.body()))
            .collect()
    }

    fn antenna_inventory(&self, record: &ReportRecord) -> Vec<Block> {
        let columns = vec![
            TableColumn::new("Sector", 1.0),
            TableColumn::new("Position", 1.0),
            TableColumn::new("Carrier", 1.4),
            TableColumn::new("Model", 1.8),
            TableColumn::new("Height", 1.0),
            TableColumn::new("Azimuth", 1.0),
        ];
        let rows = record
            .antennas
            .iter()
            .map(|a| {
                vec![
                    cell(&a.sector),
                    cell(&a.position),
                    cell(&a.carrier),
                    cell(&a.model),
                    cell(&a.height),
                    cell(&a.azimuth),
                ]
            })
            .collect();
        vec![table(columns, rows)]
    }

    fn transmission_lines(&self, record: &ReportRecord) -> Vec<Block> {
        let columns = vec![
            TableColumn::new("Size", 1.0),
            TableColumn::new("Count", 0.8),
            TableColumn::new("Carrier", 1.4),
            TableColumn::new("Location", 2.0),
        ];
        let rows = record
            .transmission_lines
            .iter()
            .map(|t| vec![cell(&t.size), cell(&t.count), cell(&t.carrier), cell(&t.location)])
            .collect();
        vec![table(columns, rows)]
    }

    fn deficiency_summary(&self, record: &ReportRecord) -> Vec<Block> {
        let columns = vec![
            TableColumn::new("#", 0.4),
            TableColumn::new("Description", 3.0),
            TableColumn::new("Location", 1.4),
            TableColumn::new("Severity", 1.0),
        ];
        let rows = record
            .deficiencies
            .iter()
            .enumerate()
            .map(|(i, d)| {
                vec![
                    (i + 1).to_string(),
                    or_na(&d.description),
                    cell(&d.location),
                    cell(&d.severity),
                ]
            })
            .collect();
        vec![table(columns, rows)]
    }

    fn deficiency_photos(&self, record: &ReportRecord, assets: &mut AssetResolver) -> Vec<Block> {
        let mut blocks = Vec::new();
        for (i, deficiency) in record.deficiencies.iter().enumerate() {
            let photos: Vec<&ResourceUri> = deficiency.photos.iter().filter(|u| !u.is_blank()).collect();
            if photos.is_empty() {
                continue;
            }
            blocks.push(Block::heading(format!("{}. {}", i + 1, or_na(&deficiency.description)), 3));
            let images: Vec<ImageBlock> = photos
                .into_iter()
                .map(|uri| assets.image(Some(uri), PHOTO_HEIGHT))
                .collect();
            for row in images.chunks(2) {
                blocks.push(Block::ImageRow(row.to_vec()));
            }
        }
        if blocks.is_empty() {
            blocks.push(Block::paragraph(NOT_AVAILABLE, self.body()));
        }
        blocks
    }

    fn checklist(&self, record: &ReportRecord) -> Vec<Block> {
        let columns = vec![
            TableColumn::new("Item", 3.0),
            TableColumn::new("Status", 0.8),
            TableColumn::new("Notes", 2.2),
        ];
        let rows = record
            .checklist
            .iter()
            .map(|row| vec![or_na(&row.item), row.status.label().to_string(), cell(&row.notes)])
            .collect();
        vec![table(columns, rows)]
    }

    fn appendix(&self, appendix: &Appendix, assets: &mut AssetResolver) -> Vec<Block> {
        let mut blocks: Vec<Block> = appendix
            .notes
            .iter()
            .filter(|n| !n.trim().is_empty())
            .map(|n| Block::paragraph(n.trim(), self.body()))
            .collect();
        for uri in appendix.images.iter().filter(|u| !u.is_blank()) {
            blocks.push(Block::Image(assets.image(Some(uri), FRONT_IMAGE_HEIGHT)));
        }
        if blocks.is_empty() {
            blocks.push(Block::paragraph(NOT_AVAILABLE, self.body()));
        }
        blocks
    }
}

/// A table with a single `N/A` row when there is nothing to show.
fn table(columns: Vec<TableColumn>, mut rows: Vec<Vec<String>>) -> Block {
    if rows.is_empty() {
        rows.push(vec![NOT_AVAILABLE.to_string(); columns.len()]);
    }
    Block::Table(TableBlock::new(columns).with_rows(rows))
}

fn or_na(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

fn appendix_title(appendix: &Appendix, index: usize) -> String {
    let title = appendix.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    format!("Appendix {}", appendix_letters(index))
}

/// `A`..`Z`, then `AA`, `AB` and so on.
fn appendix_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.into_iter().rev().collect()
}

/// Gives every section its own anchor. Among sections sharing a title the
/// last one keeps the title slug, since its page is the one the contents
/// entry ends up with. Earlier ones get a numeric suffix.
fn disambiguate_anchors(sections: &mut [ReportSection]) {
    let totals: HashMap<AnchorId, usize> = sections.iter().map(|s| s.marker.id.clone()).counts();
    if totals.values().all(|&n| n == 1) {
        return;
    }
    let mut taken: HashSet<AnchorId> = totals.keys().cloned().collect();
    let mut seen: HashMap<AnchorId, usize> = HashMap::new();
    for section in sections.iter_mut() {
        let id = section.marker.id.clone();
        let total = totals.get(&id).copied().unwrap_or(1);
        let occurrence = seen.entry(id.clone()).or_default();
        *occurrence += 1;
        if *occurrence == total {
            continue;
        }
        let mut suffix = *occurrence;
        let unique = loop {
            let candidate = AnchorId::new(format!("{}-{}", id.as_str(), suffix));
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        log::debug!("Section '{}' repeats; anchored at '{}'.", section.marker.title, unique);
        taken.insert(unique.clone());
        section.marker.id = unique;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use towerdoc_traits::InMemoryResourceProvider;
    use towerdoc_types::{AntennaRow, ChecklistRow, ChecklistStatus, Deficiency};

    fn assemble(record: &ReportRecord) -> ReportDocument {
        let config = CompositorConfig::default();
        DocumentAssembler::new(&config, Arc::new(InMemoryResourceProvider::new())).assemble(record)
    }

    fn content<'d>(doc: &'d ReportDocument, title: &str) -> &'d [Block] {
        let section = doc.sections.iter().find(|s| s.marker.title == title).unwrap();
        match &section.content {
            SectionContent::Blocks(blocks) => blocks,
            SectionContent::TableOfContents => &[],
        }
    }

    fn tables(blocks: &[Block]) -> Vec<&TableBlock> {
        blocks
            .iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn record() -> ReportRecord {
        ReportRecord {
            id: "r-1".into(),
            site_code: "NY1234".into(),
            site_name: "hilltop relay".into(),
            region: "NE".into(),
            job_number: "J-77".into(),
            ..Default::default()
        }
    }

    #[test]
    fn sections_follow_the_report_order() {
        let mut record = record();
        record.appendices = vec![
            Appendix {
                title: "Appendix A - Drawings".into(),
                ..Default::default()
            },
            Appendix::default(),
        ];
        let doc = assemble(&record);
        let titles: Vec<_> = doc.markers().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                FRONT_PAGE,
                AUTHOR_PAGE,
                TOC_TITLE,
                SCOPE_OF_WORK,
                ANTENNA_INVENTORY,
                TRANSMISSION_LINES,
                DEFICIENCY_SUMMARY,
                DEFICIENCY_PHOTOS,
                CHECKLIST,
                "Appendix A - Drawings",
                "Appendix B",
            ]
        );
        assert_eq!(doc.title, "Tower Inspection Report - NY1234 Hilltop Relay");
    }

    #[test]
    fn empty_tables_get_a_single_na_row() {
        let doc = assemble(&record());
        for title in [ANTENNA_INVENTORY, TRANSMISSION_LINES, DEFICIENCY_SUMMARY, CHECKLIST] {
            let table = tables(content(&doc, title))[0];
            assert_eq!(table.rows.len(), 1, "{title}");
            assert!(table.rows[0].iter().all(|c| c == NOT_AVAILABLE), "{title}");
        }
    }

    #[test]
    fn missing_values_render_as_na() {
        let mut record = record();
        record.antennas = vec![AntennaRow {
            carrier: Some("Verizon".into()),
            ..Default::default()
        }];
        record.checklist = vec![ChecklistRow {
            item: "Grounding inspected".into(),
            status: ChecklistStatus::Unset,
            notes: None,
        }];
        let doc = assemble(&record);

        let antennas = tables(content(&doc, ANTENNA_INVENTORY))[0];
        assert_eq!(antennas.rows[0][2], "Verizon");
        assert_eq!(antennas.rows[0][0], NOT_AVAILABLE);

        let checklist = tables(content(&doc, CHECKLIST))[0];
        assert_eq!(checklist.rows[0], vec!["Grounding inspected", "N/A", "N/A"]);

        let author = content(&doc, AUTHOR_PAGE);
        assert!(author.contains(&Block::paragraph("Prepared by: N/A", TextStyle::body(10.0))));
    }

    #[test]
    fn front_page_without_images_uses_the_placeholder() {
        let doc = assemble(&record());
        let front = content(&doc, FRONT_PAGE);
        assert_eq!(front[0], Block::HideFooter);
        let image = front
            .iter()
            .find_map(|b| match b {
                Block::Image(image) => Some(image),
                _ => None,
            })
            .unwrap();
        // No placeholder bytes are available here, so it degrades to a frame.
        assert!(image.src.is_none());
        assert!(image.caption.is_some());
    }

    #[test]
    fn only_content_sections_offset_redlines_by_default() {
        let doc = assemble(&record());
        assert_eq!(doc.first_offset_section().map(|m| m.title.as_str()), Some(SCOPE_OF_WORK));
        let toc = doc.markers().find(|m| m.title == TOC_TITLE).unwrap();
        assert!(!toc.listed);
    }

    #[test]
    fn jumped_redlines_shift_numbers_before_the_first_offset_section() {
        let mut record = record();
        record.redline = RedlineOffset::new(4, true);
        let doc = assemble(&record);
        let renderer = TocPageRenderer::new(crate::toc_page::LeaderMetrics::for_font(11.0, 504.0), 10.0);
        let blocks = doc.blocks(&doc.provisional_toc(), &renderer);

        let shift_at = blocks.iter().position(|b| matches!(b, Block::ShiftPageNumbers(4))).unwrap();
        match &blocks[shift_at + 1] {
            Block::Section(section) => assert_eq!(section.title, SCOPE_OF_WORK),
            other => panic!("expected a section, got {other:?}"),
        }
        assert_eq!(
            blocks.iter().filter(|b| matches!(b, Block::ShiftPageNumbers(_))).count(),
            1
        );
    }

    #[test]
    fn deficiency_photos_are_grouped_per_deficiency() {
        let mut record = record();
        record.deficiencies = vec![
            Deficiency {
                description: "Loose bolts".into(),
                photos: vec!["a.jpg".into(), "b.jpg".into(), "c.jpg".into()],
                ..Default::default()
            },
            Deficiency {
                description: "Rust".into(),
                ..Default::default()
            },
        ];
        let doc = assemble(&record);
        let photos = content(&doc, DEFICIENCY_PHOTOS);
        assert!(photos.contains(&Block::heading("1. Loose bolts", 3)));
        let rows: Vec<usize> = photos
            .iter()
            .filter_map(|b| match b {
                Block::ImageRow(row) => Some(row.len()),
                _ => None,
            })
            .collect();
        assert_eq!(rows, vec![2, 1]);
    }

    #[test]
    fn untitled_appendices_past_z_keep_distinct_letters() {
        assert_eq!(appendix_letters(0), "A");
        assert_eq!(appendix_letters(25), "Z");
        assert_eq!(appendix_letters(26), "AA");
        assert_eq!(appendix_letters(27), "AB");
        assert_eq!(appendix_letters(701), "ZZ");
        assert_eq!(appendix_letters(702), "AAA");

        let mut record = record();
        record.appendices = vec![Appendix::default(); 28];
        let doc = assemble(&record);
        let titles: Vec<_> = doc.markers().map(|m| m.title.as_str()).collect();
        assert_eq!(titles[titles.len() - 2..], ["Appendix AA", "Appendix AB"]);
    }

    #[test]
    fn repeated_titles_get_distinct_anchors() {
        let mut record = record();
        let photos = Appendix {
            title: "Photos".into(),
            ..Default::default()
        };
        record.appendices = vec![photos.clone(), photos.clone(), photos];
        let doc = assemble(&record);

        let ids: Vec<_> = doc
            .markers()
            .filter(|m| m.title == "Photos")
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["photos-1", "photos-2", "photos"]);
        assert_eq!(doc.markers().map(|m| &m.id).unique().count(), doc.sections.len());
    }
}
