//! Renders the table-of-contents page from a frozen list of entries.

use serde::{Deserialize, Serialize};
use towerdoc_layout::{Block, LeaderLine, TextStyle};
use towerdoc_types::{AnchorId, TocEntry};

pub const TOC_TITLE: &str = "Table of contents";

/// Character-width estimates used to size the dot leader of one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderMetrics {
    pub container_width: f32,
    pub title_char_width: f32,
    pub page_char_width: f32,
    pub dot_width: f32,
}

impl LeaderMetrics {
    /// Estimates for Helvetica at `font_size`: an average glyph for titles,
    /// the digit advance for page labels and the period advance for dots.
    pub fn for_font(font_size: f32, container_width: f32) -> Self {
        Self {
            container_width,
            title_char_width: font_size * 0.5,
            page_char_width: font_size * 0.556,
            dot_width: font_size * 0.278,
        }
    }

    /// `floor((container - title_len * title_w - label_len * page_w) / dot_w)`,
    /// never negative.
    pub fn dot_count(&self, title: &str, page_label: &str) -> usize {
        if self.dot_width <= 0.0 {
            return 0;
        }
        let used = title.chars().count() as f32 * self.title_char_width
            + page_label.chars().count() as f32 * self.page_char_width;
        let dots = ((self.container_width - used) / self.dot_width).floor();
        if dots.is_finite() && dots > 0.0 {
            dots as usize
        } else {
            0
        }
    }
}

#[derive(Debug, Clone)]
pub struct TocPageRenderer {
    metrics: LeaderMetrics,
    base_font_size: f32,
}

impl TocPageRenderer {
    pub fn new(metrics: LeaderMetrics, base_font_size: f32) -> Self {
        Self {
            metrics,
            base_font_size,
        }
    }

    pub fn metrics(&self) -> &LeaderMetrics {
        &self.metrics
    }

    fn line_style(&self) -> TextStyle {
        TextStyle::body(self.base_font_size * 1.1)
    }

    /// One line per entry. Appendices get their title only: no link, dots or
    /// page label.
    pub fn lines(&self, entries: &[TocEntry]) -> Vec<LeaderLine> {
        let style = self.line_style();
        entries
            .iter()
            .map(|entry| {
                if entry.is_appendix() {
                    return LeaderLine::plain(entry.title.clone(), style);
                }
                let label = entry.page_label();
                let dots = self.metrics.dot_count(&entry.title, &label);
                LeaderLine::linked(
                    entry.title.clone(),
                    dots,
                    label,
                    AnchorId::from_title(&entry.title),
                    style,
                )
            })
            .collect()
    }

    /// The heading followed by the entry lines.
    pub fn render(&self, entries: &[TocEntry]) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(entries.len() + 2);
        blocks.push(Block::heading(TOC_TITLE, 1));
        blocks.push(Block::Spacer(self.base_font_size));
        blocks.extend(self.lines(entries).into_iter().map(Block::Leader));
        blocks
    }
}
