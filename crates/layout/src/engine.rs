use crate::LayoutError;
use crate::block::{Block, ImageBlock, LeaderLine, SectionBlock, TableBlock};
use crate::elements::{ImageElement, LayoutElement, PositionedElement, TextElement};
use crate::page::PageGeometry;
use crate::pagination::check_child_fit;
use crate::style::{BoxStyle, TextAlign, TextStyle};
use crate::text::{LineLayout, break_lines, truncate_to_width};
use std::collections::HashMap;
use towerdoc_types::{AnchorId, Color, Rect, Size};

const CELL_PADDING: f32 = 4.0;
const IMAGE_GAP: f32 = 10.0;
const CAPTION_GAP: f32 = 4.0;
/// Height over width for images whose pixel size is unknown.
const FALLBACK_ASPECT: f32 = 0.75;

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutPage {
    /// Zero-based physical index within the generated document.
    pub index: usize,
    /// The number printed in the footer.
    pub number: usize,
    pub elements: Vec<PositionedElement>,
    pub show_footer: bool,
}

impl LaidOutPage {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match &e.element {
            LayoutElement::Text(t) => Some(t.content.as_str()),
            _ => None,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = (&AnchorId, Rect)> {
        self.elements.iter().filter_map(|e| match &e.element {
            LayoutElement::Link(target) => Some((target, e.rect())),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorLocation {
    pub page_index: usize,
    pub y_pos: f32,
}

/// The physical pages a section occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionExtent {
    pub anchor: AnchorId,
    pub title: String,
    pub first_page_index: usize,
    pub last_page_index: usize,
}

impl SectionExtent {
    /// One-based natural page the section starts on.
    pub fn first_page(&self) -> usize {
        self.first_page_index + 1
    }

    pub fn last_page(&self) -> usize {
        self.last_page_index + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct LaidOutDocument {
    pub pages: Vec<LaidOutPage>,
    pub anchors: HashMap<AnchorId, AnchorLocation>,
    /// Sections in document order.
    pub sections: Vec<SectionExtent>,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn section(&self, title: &str) -> Option<&SectionExtent> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn section_titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }
}

/// Paginates a flat or nested list of [`Block`]s onto fixed-size pages.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    geometry: PageGeometry,
    base_font_size: f32,
}

impl LayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            base_font_size: 10.0,
        }
    }

    pub fn with_base_font_size(mut self, size: f32) -> Self {
        if size > 0.0 {
            self.base_font_size = size;
        }
        self
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn base_font_size(&self) -> f32 {
        self.base_font_size
    }

    pub fn content_width(&self) -> f32 {
        self.geometry.content_rect().width
    }

    pub fn layout(&self, blocks: &[Block]) -> Result<LaidOutDocument, LayoutError> {
        let mut paginator = Paginator::new(self);
        paginator.place_blocks(blocks)?;
        let document = paginator.finish();
        log::debug!(
            "Laid out {} top-level blocks onto {} pages ({} sections).",
            blocks.len(),
            document.pages.len(),
            document.sections.len()
        );
        Ok(document)
    }
}

struct MeasuredRow {
    cells: Vec<Vec<LineLayout>>,
    height: f32,
}

struct MeasuredImage<'b> {
    block: &'b ImageBlock,
    size: Size,
    caption: Vec<LineLayout>,
    height: f32,
}

struct Paginator<'a> {
    engine: &'a LayoutEngine,
    bounds: Rect,
    pages: Vec<LaidOutPage>,
    cursor_y: f32,
    number_shift: usize,
    pending_anchors: Vec<AnchorId>,
    anchors: HashMap<AnchorId, AnchorLocation>,
    sections: Vec<SectionExtent>,
    placed: usize,
    last_placed_page: usize,
}

impl<'a> Paginator<'a> {
    fn new(engine: &'a LayoutEngine) -> Self {
        let mut paginator = Self {
            engine,
            bounds: engine.geometry.content_rect(),
            pages: Vec::new(),
            cursor_y: 0.0,
            number_shift: 0,
            pending_anchors: Vec::new(),
            anchors: HashMap::new(),
            sections: Vec::new(),
            placed: 0,
            last_placed_page: 0,
        };
        paginator.new_page();
        paginator
    }

    fn base(&self) -> f32 {
        self.engine.base_font_size
    }

    fn current_index(&self) -> usize {
        self.pages.len() - 1
    }

    fn current(&mut self) -> &mut LaidOutPage {
        let index = self.current_index();
        &mut self.pages[index]
    }

    fn at_page_top(&self) -> bool {
        self.cursor_y <= 0.01
    }

    fn page_is_empty(&self) -> bool {
        self.at_page_top() && self.pages[self.current_index()].elements.is_empty()
    }

    fn new_page(&mut self) {
        let index = self.pages.len();
        self.pages.push(LaidOutPage {
            index,
            number: index + 1 + self.number_shift,
            elements: Vec::new(),
            show_footer: true,
        });
        self.cursor_y = 0.0;
    }

    fn ensure_space(&mut self, height: f32) -> Result<(), LayoutError> {
        if height > self.bounds.height + 0.01 {
            return Err(LayoutError::ElementTooLarge(height, self.bounds.height));
        }
        if !self.at_page_top() && check_child_fit(self.cursor_y, height, self.bounds).should_break {
            self.new_page();
        }
        Ok(())
    }

    fn push(&mut self, x: f32, dy: f32, width: f32, height: f32, element: LayoutElement) {
        let y = self.bounds.y + self.cursor_y + dy;
        let page_index = self.current_index();
        for anchor in self.pending_anchors.drain(..) {
            self.anchors
                .insert(anchor, AnchorLocation { page_index, y_pos: y });
        }
        self.placed += 1;
        self.last_placed_page = page_index;
        self.pages[page_index].elements.push(PositionedElement {
            x,
            y,
            width,
            height,
            element,
        });
    }

    fn resolve_pending_here(&mut self) {
        let page_index = self.current_index();
        let y_pos = self.bounds.y + self.cursor_y;
        for anchor in self.pending_anchors.drain(..) {
            self.anchors.insert(anchor, AnchorLocation { page_index, y_pos });
        }
    }

    fn place_blocks(&mut self, blocks: &[Block]) -> Result<(), LayoutError> {
        for (i, block) in blocks.iter().enumerate() {
            self.place(block, blocks.get(i + 1))?;
        }
        Ok(())
    }

    fn place(&mut self, block: &Block, next: Option<&Block>) -> Result<(), LayoutError> {
        match block {
            Block::Heading { text, level } => self.place_heading(text, *level, next),
            Block::Paragraph { text, style } => {
                let lines = break_lines(text, self.bounds.width, style);
                if !lines.is_empty() {
                    self.place_lines(&lines, style)?;
                    self.cursor_y += style.size * 0.5;
                }
                Ok(())
            }
            Block::Table(table) => self.place_table(table),
            Block::Image(image) => self.place_image_row(std::slice::from_ref(image)),
            Block::ImageRow(images) if images.is_empty() => Ok(()),
            Block::ImageRow(images) => self.place_image_row(images),
            Block::Leader(line) => self.place_leader(line),
            Block::Section(section) => self.place_section(section),
            Block::Spacer(height) => {
                if !self.at_page_top() {
                    if check_child_fit(self.cursor_y, *height, self.bounds).should_break {
                        self.new_page();
                    } else {
                        self.cursor_y += height;
                    }
                }
                Ok(())
            }
            Block::Rule => {
                self.ensure_space(8.0)?;
                let x = self.bounds.x;
                let width = self.bounds.width;
                self.push(
                    x,
                    4.0,
                    width,
                    0.0,
                    LayoutElement::Rule(BoxStyle::outlined(Color::gray(170), 0.75)),
                );
                self.cursor_y += 8.0;
                Ok(())
            }
            Block::PageBreak => {
                if !self.page_is_empty() {
                    self.new_page();
                }
                Ok(())
            }
            Block::HideFooter => {
                self.current().show_footer = false;
                Ok(())
            }
            Block::ShiftPageNumbers(shift) => {
                self.number_shift += shift;
                if self.page_is_empty() {
                    self.current().number += shift;
                }
                Ok(())
            }
        }
    }

    fn place_lines(&mut self, lines: &[LineLayout], style: &TextStyle) -> Result<(), LayoutError> {
        let line_box = style.line_box();
        for line in lines {
            self.ensure_space(line_box)?;
            if !line.text.is_empty() {
                let x = self.bounds.x + align_offset(style.align, self.bounds.width, line.width);
                self.push(
                    x,
                    0.0,
                    line.width,
                    line_box,
                    LayoutElement::Text(TextElement {
                        content: line.text.clone(),
                        style: *style,
                    }),
                );
            }
            self.cursor_y += line_box;
        }
        Ok(())
    }

    fn place_heading(&mut self, text: &str, level: u8, next: Option<&Block>) -> Result<(), LayoutError> {
        let style = TextStyle::heading(self.base(), level);
        let lines = break_lines(text, self.bounds.width, &style);
        if lines.is_empty() {
            return Ok(());
        }
        let space_before = if self.at_page_top() { 0.0 } else { style.size * 0.6 };
        let space_after = style.size * 0.4;
        let height = lines.len() as f32 * style.line_box();
        let keep_with_next = next.map(|b| self.min_height(b)).unwrap_or(0.0);

        let needed = space_before + height + space_after + keep_with_next;
        if !self.at_page_top() && check_child_fit(self.cursor_y, needed, self.bounds).should_break {
            self.new_page();
        } else {
            self.cursor_y += space_before;
        }
        self.place_lines(&lines, &style)?;
        self.cursor_y += space_after;
        Ok(())
    }

    fn place_section(&mut self, section: &SectionBlock) -> Result<(), LayoutError> {
        if section.start_new_page && !self.page_is_empty() {
            self.new_page();
        }
        let slot = self.sections.len();
        self.sections.push(SectionExtent {
            anchor: section.anchor.clone(),
            title: section.title.clone(),
            first_page_index: self.current_index(),
            last_page_index: self.current_index(),
        });
        self.pending_anchors.push(section.anchor.clone());
        let placed_before = self.placed;

        self.place_blocks(&section.blocks)?;

        if self.pending_anchors.contains(&section.anchor) {
            self.resolve_pending_here();
        }
        let first = self
            .anchors
            .get(&section.anchor)
            .map(|loc| loc.page_index)
            .unwrap_or_else(|| self.current_index());
        let last = if self.placed > placed_before {
            self.last_placed_page.max(first)
        } else {
            first
        };
        self.sections[slot].first_page_index = first;
        self.sections[slot].last_page_index = last;
        Ok(())
    }

    fn place_leader(&mut self, line: &LeaderLine) -> Result<(), LayoutError> {
        let style = line.style;
        let height = style.line_box();
        self.ensure_space(height)?;

        let x = self.bounds.x;
        let width = self.bounds.width;
        let gap = style.measure(" ");
        let label_width = line
            .page_label
            .as_deref()
            .map(|label| style.measure(label))
            .unwrap_or(0.0);
        let title_budget = if line.page_label.is_some() {
            width - label_width - 2.0 * gap
        } else {
            width
        };
        let title = truncate_to_width(&line.title, title_budget.max(0.0), &style);
        let title_width = style.measure(&title);
        self.push(
            x,
            0.0,
            title_width,
            height,
            LayoutElement::Text(TextElement {
                content: title,
                style,
            }),
        );

        if let Some(label) = &line.page_label {
            let dot_width = style.measure(".");
            let room = width - title_width - label_width - 2.0 * gap;
            let fit = if dot_width > 0.0 {
                (room / dot_width).floor().max(0.0) as usize
            } else {
                0
            };
            let dots = line.dots.min(fit);
            if dots > 0 {
                let dots_width = dots as f32 * dot_width;
                self.push(
                    x + width - label_width - gap - dots_width,
                    0.0,
                    dots_width,
                    height,
                    LayoutElement::Text(TextElement {
                        content: ".".repeat(dots),
                        style: style.with_color(Color::gray(110)),
                    }),
                );
            }
            self.push(
                x + width - label_width,
                0.0,
                label_width,
                height,
                LayoutElement::Text(TextElement {
                    content: label.clone(),
                    style,
                }),
            );
        }

        if let Some(target) = &line.target {
            self.push(x, 0.0, width, height, LayoutElement::Link(target.clone()));
        }
        self.cursor_y += height + style.size * 0.35;
        Ok(())
    }

    fn column_widths(&self, table: &TableBlock) -> Vec<f32> {
        let total: f32 = table.columns.iter().map(|c| c.weight.max(0.0)).sum();
        let count = table.columns.len() as f32;
        table
            .columns
            .iter()
            .map(|c| {
                if total > 0.0 {
                    self.bounds.width * c.weight.max(0.0) / total
                } else {
                    self.bounds.width / count
                }
            })
            .collect()
    }

    fn measure_row(&self, cells: &[String], widths: &[f32], style: &TextStyle) -> MeasuredRow {
        let cells: Vec<Vec<LineLayout>> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let text = cells.get(i).map(String::as_str).unwrap_or("");
                break_lines(text, (w - 2.0 * CELL_PADDING).max(1.0), style)
            })
            .collect();
        let max_lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        MeasuredRow {
            height: max_lines as f32 * style.line_box() + 2.0 * CELL_PADDING,
            cells,
        }
    }

    fn place_row(&mut self, row: &MeasuredRow, widths: &[f32], style: &TextStyle, fill: Option<Color>) {
        let mut x = self.bounds.x;
        for (lines, width) in row.cells.iter().zip(widths) {
            let cell = BoxStyle {
                fill,
                stroke: Some(Color::gray(190)),
                stroke_width: 0.5,
            };
            self.push(x, 0.0, *width, row.height, LayoutElement::Box(cell));
            for (k, line) in lines.iter().enumerate() {
                if line.text.is_empty() {
                    continue;
                }
                let inner = width - 2.0 * CELL_PADDING;
                self.push(
                    x + CELL_PADDING + align_offset(style.align, inner, line.width),
                    CELL_PADDING + k as f32 * style.line_box(),
                    line.width,
                    style.line_box(),
                    LayoutElement::Text(TextElement {
                        content: line.text.clone(),
                        style: *style,
                    }),
                );
            }
            x += width;
        }
        self.cursor_y += row.height;
    }

    fn place_table(&mut self, table: &TableBlock) -> Result<(), LayoutError> {
        if table.columns.is_empty() {
            return Ok(());
        }
        let widths = self.column_widths(table);
        let header_style = TextStyle::table_header(self.base());
        let cell_style = TextStyle::table_cell(self.base());

        let header = table.show_header.then(|| {
            let names: Vec<String> = table.columns.iter().map(|c| c.header.clone()).collect();
            self.measure_row(&names, &widths, &header_style)
        });
        let header_height = header.as_ref().map(|h| h.height).unwrap_or(0.0);
        let rows: Vec<MeasuredRow> = table
            .rows
            .iter()
            .map(|r| self.measure_row(r, &widths, &cell_style))
            .collect();

        // Only one line of an oversized first row has to fit under the header.
        let min_row = cell_style.line_box() + 2.0 * CELL_PADDING;
        let first_row = rows.first().map(|r| r.height.min(min_row)).unwrap_or(0.0);
        self.ensure_space(header_height + first_row)?;
        if let Some(header) = &header {
            self.place_row(header, &widths, &header_style, Some(Color::BRAND));
        }

        for (i, row) in rows.iter().enumerate() {
            let fill = (i % 2 == 1).then_some(Color::gray(242));
            if header_height + row.height > self.bounds.height + 0.01 {
                self.place_split_row(row, &widths, &cell_style, fill, header.as_ref(), &header_style)?;
                continue;
            }
            if check_child_fit(self.cursor_y, row.height, self.bounds).should_break {
                self.break_table_page(header.as_ref(), &widths, &header_style);
            }
            self.place_row(row, &widths, &cell_style, fill);
        }
        self.cursor_y += self.base() * 0.8;
        Ok(())
    }

    fn break_table_page(&mut self, header: Option<&MeasuredRow>, widths: &[f32], header_style: &TextStyle) {
        self.new_page();
        if let Some(header) = header {
            self.place_row(header, widths, header_style, Some(Color::BRAND));
        }
    }

    /// Whole cell lines that still fit on the current page inside one row.
    fn row_lines_left(&self, line_box: f32) -> usize {
        if line_box <= 0.0 {
            return 0;
        }
        let room = self.bounds.height - self.cursor_y - 2.0 * CELL_PADDING;
        ((room + 0.01) / line_box).floor().max(0.0) as usize
    }

    /// Flows a row taller than a page across pages, placing the same slice of
    /// every cell's lines on each page and repeating the header.
    fn place_split_row(
        &mut self,
        row: &MeasuredRow,
        widths: &[f32],
        style: &TextStyle,
        fill: Option<Color>,
        header: Option<&MeasuredRow>,
        header_style: &TextStyle,
    ) -> Result<(), LayoutError> {
        let line_box = style.line_box();
        let total = row.cells.iter().map(Vec::len).max().unwrap_or(0);
        let mut start = 0;
        while start < total {
            let mut fit = self.row_lines_left(line_box);
            if fit == 0 {
                self.break_table_page(header, widths, header_style);
                fit = self.row_lines_left(line_box);
                if fit == 0 {
                    let header_height = header.map(|h| h.height).unwrap_or(0.0);
                    return Err(LayoutError::ElementTooLarge(
                        header_height + line_box + 2.0 * CELL_PADDING,
                        self.bounds.height,
                    ));
                }
            }
            let end = (start + fit).min(total);
            let slice = MeasuredRow {
                cells: row
                    .cells
                    .iter()
                    .map(|lines| lines.get(start..end.min(lines.len())).unwrap_or(&[]).to_vec())
                    .collect(),
                height: (end - start) as f32 * line_box + 2.0 * CELL_PADDING,
            };
            self.place_row(&slice, widths, style, fill);
            start = end;
        }
        Ok(())
    }

    fn measure_image<'b>(&self, image: &'b ImageBlock, width: f32) -> MeasuredImage<'b> {
        let caption_style = TextStyle::caption(self.base());
        let caption = image
            .caption
            .as_deref()
            .map(|c| break_lines(c, width, &caption_style))
            .unwrap_or_default();
        let caption_height = if caption.is_empty() {
            0.0
        } else {
            CAPTION_GAP + caption.len() as f32 * caption_style.line_box()
        };
        let max_height = image
            .max_height
            .min(self.bounds.height - caption_height)
            .max(1.0);
        let size = match image.intrinsic {
            Some(px) if image.src.is_some() => {
                let scale = (width / px.width).min(max_height / px.height);
                Size::new(px.width * scale, px.height * scale)
            }
            _ => Size::new(width, (width * FALLBACK_ASPECT).min(max_height)),
        };
        MeasuredImage {
            block: image,
            size,
            height: size.height + caption_height,
            caption,
        }
    }

    fn place_image_row(&mut self, images: &[ImageBlock]) -> Result<(), LayoutError> {
        let count = images.len() as f32;
        let column_width = (self.bounds.width - IMAGE_GAP * (count - 1.0)) / count;
        let measured: Vec<MeasuredImage<'_>> = images
            .iter()
            .map(|img| self.measure_image(img, column_width))
            .collect();
        let row_height = measured.iter().map(|m| m.height).fold(0.0, f32::max);
        self.ensure_space(row_height)?;

        let caption_style = TextStyle::caption(self.base());
        for (i, m) in measured.iter().enumerate() {
            let column_x = self.bounds.x + i as f32 * (column_width + IMAGE_GAP);
            let image_x = column_x + (column_width - m.size.width) / 2.0;
            let element = match &m.block.src {
                Some(src) => LayoutElement::Image(ImageElement { src: src.clone() }),
                None => LayoutElement::Box(BoxStyle {
                    fill: Some(Color::gray(225)),
                    stroke: Some(Color::gray(150)),
                    stroke_width: 0.75,
                }),
            };
            self.push(image_x, 0.0, m.size.width, m.size.height, element);
            for (k, line) in m.caption.iter().enumerate() {
                self.push(
                    column_x + align_offset(caption_style.align, column_width, line.width),
                    m.size.height + CAPTION_GAP + k as f32 * caption_style.line_box(),
                    line.width,
                    caption_style.line_box(),
                    LayoutElement::Text(TextElement {
                        content: line.text.clone(),
                        style: caption_style,
                    }),
                );
            }
        }
        self.cursor_y += row_height + IMAGE_GAP;
        Ok(())
    }

    /// Smallest height `block` needs before it can start, for keep-with-next.
    fn min_height(&self, block: &Block) -> f32 {
        match block {
            Block::Heading { level, .. } => TextStyle::heading(self.base(), *level).line_box(),
            Block::Paragraph { text, style } if !text.trim().is_empty() => style.line_box(),
            Block::Table(table) if !table.columns.is_empty() => {
                let header = TextStyle::table_header(self.base()).line_box();
                let cell = TextStyle::table_cell(self.base()).line_box();
                let header = if table.show_header { header } else { 0.0 };
                header + cell + 4.0 * CELL_PADDING
            }
            Block::Image(image) => self.measure_image(image, self.bounds.width).height,
            Block::ImageRow(images) if !images.is_empty() => {
                let count = images.len() as f32;
                let width = (self.bounds.width - IMAGE_GAP * (count - 1.0)) / count;
                images
                    .iter()
                    .map(|img| self.measure_image(img, width).height)
                    .fold(0.0, f32::max)
            }
            Block::Leader(line) => line.style.line_box(),
            Block::Section(section) if !section.start_new_page => section
                .blocks
                .first()
                .map(|b| self.min_height(b))
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn finish(mut self) -> LaidOutDocument {
        self.resolve_pending_here();
        let footer = self.engine.geometry.footer_rect();
        if footer.height > 0.0 {
            let style = TextStyle::body(self.base() * 0.8)
                .with_color(Color::gray(90))
                .with_align(TextAlign::Center);
            let height = style.line_box().min(footer.height);
            for page in self.pages.iter_mut().filter(|p| p.show_footer) {
                page.elements.push(PositionedElement {
                    x: footer.x,
                    y: footer.y + (footer.height - height) / 2.0,
                    width: footer.width,
                    height,
                    element: LayoutElement::PageNumberPlaceholder(style),
                });
            }
        }
        LaidOutDocument {
            pages: self.pages,
            anchors: self.anchors,
            sections: self.sections,
        }
    }
}

fn align_offset(align: TextAlign, available: f32, used: f32) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => ((available - used) / 2.0).max(0.0),
        TextAlign::Right => (available - used).max(0.0),
    }
}
