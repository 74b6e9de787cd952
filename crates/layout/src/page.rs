use serde::{Deserialize, Serialize};
use towerdoc_types::{Rect, Size};

/// Paper size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageSize {
    A4,
    #[default]
    Letter,
    Custom { width: f32, height: f32 },
}

impl PageSize {
    pub fn dimensions_pt(self) -> Size {
        match self {
            PageSize::A4 => Size::new(595.28, 841.89),
            PageSize::Letter => Size::new(612.0, 792.0),
            PageSize::Custom { width, height } => Size::new(width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::all(54.0)
    }
}

/// The fixed page frame every laid-out page shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub size: Size,
    pub margins: Margins,
    /// Space reserved above the bottom margin for the page footer.
    pub footer_height: f32,
}

impl PageGeometry {
    pub fn new(size: PageSize, margins: Margins) -> Self {
        Self {
            size: size.dimensions_pt(),
            margins,
            footer_height: 24.0,
        }
    }

    pub fn with_footer_height(mut self, height: f32) -> Self {
        self.footer_height = height.max(0.0);
        self
    }

    /// The area body content flows into, in top-down page coordinates.
    pub fn content_rect(&self) -> Rect {
        Rect::new(
            self.margins.left,
            self.margins.top,
            (self.size.width - self.margins.left - self.margins.right).max(0.0),
            (self.size.height - self.margins.top - self.margins.bottom - self.footer_height)
                .max(0.0),
        )
    }

    /// The strip the `Page X of Y` footer is drawn in.
    pub fn footer_rect(&self) -> Rect {
        let content = self.content_rect();
        Rect::new(content.x, content.bottom(), content.width, self.footer_height)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(PageSize::default(), Margins::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_rect_excludes_margins_and_footer() {
        let geometry = PageGeometry::new(PageSize::Letter, Margins::all(50.0)).with_footer_height(20.0);
        let content = geometry.content_rect();
        assert_eq!(content, Rect::new(50.0, 50.0, 512.0, 672.0));
        let footer = geometry.footer_rect();
        assert_eq!(footer.y, 722.0);
        assert_eq!(footer.height, 20.0);
    }

    #[test]
    fn page_size_from_json() {
        let size: PageSize = serde_json::from_str("\"a4\"").unwrap();
        assert_eq!(size, PageSize::A4);
        let size: PageSize =
            serde_json::from_str(r#"{"custom":{"width":300,"height":400}}"#).unwrap();
        assert_eq!(size.dimensions_pt(), Size::new(300.0, 400.0));
    }
}
