use serde::{Deserialize, Serialize};

/// How many externally merged redline pages shift the generated page numbers.
///
/// With `jump_redlines` unset the redline drawings are appended after the
/// whole generated document, so only the captured labels move. With it set
/// they are physically inserted before the first offsetting section, so the
/// page numbering of that section and everything after it moves as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RedlineOffset {
    pub redline_pages: usize,
    pub jump_redlines: bool,
}

impl RedlineOffset {
    pub fn new(redline_pages: usize, jump_redlines: bool) -> Self {
        Self {
            redline_pages,
            jump_redlines,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.redline_pages == 0
    }

    /// The page label captured for a section whose natural page is `base`.
    pub fn adjust(&self, base: usize) -> usize {
        base + self.redline_pages
    }

    /// The page number a page is laid out under. Only jumped redlines shift
    /// the layout itself.
    pub fn layout_base(&self, base: usize) -> usize {
        if self.jump_redlines {
            base + self.redline_pages
        } else {
            base
        }
    }

    /// Total page count once the redline pages are merged in.
    pub fn reported_total(&self, natural_total: usize) -> usize {
        natural_total + self.redline_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_noop() {
        let offset = RedlineOffset::default();
        assert!(offset.is_noop());
        assert_eq!(offset.adjust(4), 4);
        assert_eq!(offset.layout_base(4), 4);
    }

    #[test]
    fn offset_without_jump_only_moves_labels() {
        let offset = RedlineOffset::new(5, false);
        assert_eq!(offset.adjust(1), 6);
        assert_eq!(offset.layout_base(1), 1);
        assert_eq!(offset.reported_total(12), 17);
    }

    #[test]
    fn offset_with_jump_moves_layout_too() {
        let offset = RedlineOffset::new(5, true);
        assert_eq!(offset.layout_base(1), 6);
        assert_eq!(offset.layout_base(10), 15);
        assert_eq!(offset.reported_total(10), 15);
    }
}
