//! The flow content a report is assembled from.
//!
//! Blocks are plain data. The [`LayoutEngine`](crate::LayoutEngine) decides
//! where they land; nothing here knows about pages.

use crate::style::TextStyle;
use towerdoc_types::{AnchorId, ResourceUri, Size};

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { text: String, level: u8 },
    Paragraph { text: String, style: TextStyle },
    Table(TableBlock),
    Image(ImageBlock),
    /// Images side by side, sharing the content width equally.
    ImageRow(Vec<ImageBlock>),
    /// One table-of-contents line: title, leader dots, page label.
    Leader(LeaderLine),
    Section(SectionBlock),
    Spacer(f32),
    Rule,
    PageBreak,
    /// Suppresses the `Page X of Y` footer on the current page.
    HideFooter,
    /// Adds to the printed number of the current page and every page after it.
    ShiftPageNumbers(usize),
}

impl Block {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Block::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn paragraph(text: impl Into<String>, style: TextStyle) -> Self {
        Block::Paragraph {
            text: text.into(),
            style,
        }
    }
}

/// A titled run of blocks whose page extent is tracked under `anchor`.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlock {
    pub anchor: AnchorId,
    pub title: String,
    pub blocks: Vec<Block>,
    pub start_new_page: bool,
}

impl SectionBlock {
    pub fn new(title: impl Into<String>, blocks: Vec<Block>) -> Self {
        let title = title.into();
        Self {
            anchor: AnchorId::from_title(&title),
            title,
            blocks,
            start_new_page: true,
        }
    }

    pub fn with_anchor(mut self, anchor: AnchorId) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn inline(mut self) -> Self {
        self.start_new_page = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub header: String,
    /// Relative share of the table width.
    pub weight: f32,
}

impl TableColumn {
    pub fn new(header: impl Into<String>, weight: f32) -> Self {
        Self {
            header: header.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
    /// Whether the header row is drawn, and repeated after page breaks.
    pub show_header: bool,
}

impl TableBlock {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            show_header: true,
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.show_header = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    /// `None` draws a grey frame in place of the picture.
    pub src: Option<ResourceUri>,
    pub caption: Option<String>,
    pub max_height: f32,
    /// Pixel dimensions, used for the aspect ratio when known.
    pub intrinsic: Option<Size>,
}

impl ImageBlock {
    pub fn new(src: ResourceUri, max_height: f32) -> Self {
        Self {
            src: Some(src),
            caption: None,
            max_height,
            intrinsic: None,
        }
    }

    pub fn frame(caption: impl Into<String>, max_height: f32) -> Self {
        Self {
            src: None,
            caption: Some(caption.into()),
            max_height,
            intrinsic: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_intrinsic(mut self, size: Size) -> Self {
        if size.width > 0.0 && size.height > 0.0 {
            self.intrinsic = Some(size);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderLine {
    pub title: String,
    pub dots: usize,
    pub page_label: Option<String>,
    pub target: Option<AnchorId>,
    pub style: TextStyle,
}

impl LeaderLine {
    pub fn plain(title: impl Into<String>, style: TextStyle) -> Self {
        Self {
            title: title.into(),
            dots: 0,
            page_label: None,
            target: None,
            style,
        }
    }

    pub fn linked(
        title: impl Into<String>,
        dots: usize,
        page_label: impl Into<String>,
        target: AnchorId,
        style: TextStyle,
    ) -> Self {
        Self {
            title: title.into(),
            dots,
            page_label: Some(page_label.into()),
            target: Some(target),
            style,
        }
    }

    /// The line as it reads in plain text.
    pub fn text(&self) -> String {
        let mut s = self.title.clone();
        if let Some(label) = &self.page_label {
            s.push(' ');
            s.push_str(&".".repeat(self.dots));
            s.push(' ');
            s.push_str(label);
        }
        s
    }
}
