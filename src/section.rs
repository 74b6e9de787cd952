//! Section markers: a titled block of report content that knows how to
//! record where it landed.

use crate::toc::TocAccumulator;
use towerdoc_layout::{Block, SectionBlock, SectionExtent};
use towerdoc_types::{AnchorId, RedlineOffset};

/// Whether a render is observing page numbers or producing final output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Capture,
    Final,
}

/// The first and last page a section was captured on, offsets applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapturedPages {
    pub first: usize,
    pub last: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarker {
    pub id: AnchorId,
    pub title: String,
    /// Whether redline pages count towards this section's page labels.
    pub offset_redlines: bool,
    /// Whether the section is listed in the table of contents at all.
    pub listed: bool,
}

impl SectionMarker {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: AnchorId::from_title(&title),
            title,
            offset_redlines: false,
            listed: true,
        }
    }

    pub fn with_id(mut self, id: AnchorId) -> Self {
        self.id = id;
        self
    }

    pub fn offsetting_redlines(mut self, offset: bool) -> Self {
        self.offset_redlines = offset;
        self
    }

    pub fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    /// Wraps `blocks` in a section that starts on a new page under this
    /// marker's anchor. Both modes produce the same blocks; the marker's
    /// output never carries table-of-contents data.
    pub fn wrap(&self, blocks: Vec<Block>) -> Block {
        Block::Section(SectionBlock::new(self.title.clone(), blocks).with_anchor(self.id.clone()))
    }

    /// The label a natural, 1-based page number is captured under.
    pub fn effective_page(&self, natural: usize, offset: &RedlineOffset) -> usize {
        if self.offset_redlines {
            offset.adjust(natural)
        } else {
            natural
        }
    }

    /// Registers the first page of this marker's laid-out section with `toc`.
    ///
    /// `extent` is the section the capture-pass layout produced for this
    /// marker. Markers and extents pair up by position, so two sections that
    /// share a title each report their own pages.
    pub fn capture(&self, extent: &SectionExtent, offset: &RedlineOffset, toc: &mut TocAccumulator) -> CapturedPages {
        let pages = CapturedPages {
            first: self.effective_page(extent.first_page(), offset),
            last: self.effective_page(extent.last_page(), offset),
        };
        if self.listed {
            toc.register(self.title.clone(), pages.first);
        }
        log::debug!(
            "Captured '{}' on pages {}-{} (natural {}-{}).",
            self.title,
            pages.first,
            pages.last,
            extent.first_page(),
            extent.last_page()
        );
        pages
    }
}
