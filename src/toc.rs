//! The per-render table-of-contents accumulator.
//!
//! Section markers register `(title, page)` pairs here during the capture
//! pass. The final pass only reads it. A fresh accumulator is created for
//! every render request, so concurrent renders never share one.

use towerdoc_types::TocEntry;

/// Ordered, title-unique list of captured sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocAccumulator {
    entries: Vec<TocEntry>,
}

impl TocAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `title` as starting on `page_number`.
    ///
    /// A title registered again replaces its earlier entry, and the new entry
    /// moves to the end of the list.
    pub fn register(&mut self, title: impl Into<String>, page_number: usize) {
        let title = title.into();
        let replaced = self.remove(&title);
        if replaced {
            log::trace!("Re-captured '{}' on page {}.", title, page_number);
        }
        self.entries.push(TocEntry::new(title, page_number.max(1)));
    }

    fn remove(&mut self, title: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.title != title);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn get(&self, title: &str) -> Option<&TocEntry> {
        self.entries.iter().find(|entry| entry.title == title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TocEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a TocAccumulator {
    type Item = &'a TocEntry;
    type IntoIter = std::slice::Iter<'a, TocEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recapture_replaces_instead_of_duplicating() {
        let mut toc = TocAccumulator::new();
        toc.register("Scope of Work", 4);
        toc.register("Scope of Work", 4);
        assert_eq!(toc.entries(), &[TocEntry::new("Scope of Work", 4)]);
    }

    #[test]
    fn last_write_wins_and_moves_to_the_end() {
        let mut toc = TocAccumulator::new();
        toc.register("Front Page", 1);
        toc.register("Scope of Work", 3);
        toc.register("Front Page", 2);

        let titles: Vec<_> = toc.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Scope of Work", "Front Page"]);
        assert_eq!(toc.get("Front Page").map(|e| e.page_number), Some(2));
    }

    #[test]
    fn page_numbers_are_at_least_one() {
        let mut toc = TocAccumulator::new();
        toc.register("Front Page", 0);
        assert_eq!(toc.entries()[0].page_number, 1);
    }
}
