use crate::style::{BoxStyle, TextStyle};
use towerdoc_types::{AnchorId, Rect, ResourceUri};

/// An element placed on a page, in top-down page coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedElement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub element: LayoutElement,
}

impl PositionedElement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutElement {
    /// One line of text; `y` is the top of its line box.
    Text(TextElement),
    Box(BoxStyle),
    /// A horizontal rule along the top edge of the element.
    Rule(BoxStyle),
    Image(ImageElement),
    /// A clickable area that jumps to an anchor in the same document.
    Link(AnchorId),
    /// Resolved into `Page X of Y` once the total page count is known.
    PageNumberPlaceholder(TextStyle),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextElement {
    pub content: String,
    pub style: TextStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageElement {
    pub src: ResourceUri,
}
