use serde::{Deserialize, Serialize};

/// One navigable section in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    /// The plain-text section title.
    pub title: String,
    /// The 1-based page label the section starts on, redline offset included.
    pub page_number: usize,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, page_number: usize) -> Self {
        Self {
            title: title.into(),
            page_number,
        }
    }

    /// Appendices are listed without a link or page number. The title must
    /// start with "appendix" in any case; leading whitespace does not count.
    pub fn is_appendix(&self) -> bool {
        self.title
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("appendix"))
    }

    /// The `p.N` label shown after the leader dots.
    pub fn page_label(&self) -> String {
        format!("p.{}", self.page_number)
    }
}
