use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Element has a height of {0:.2} which exceeds the total page content height of {1:.2}.")]
    ElementTooLarge(f32, f32),
}

pub mod block;
mod elements;
pub(crate) mod engine;
pub mod fonts;
pub mod page;
pub mod pagination;
pub mod style;
pub mod text;

pub use self::block::{Block, ImageBlock, LeaderLine, SectionBlock, TableBlock, TableColumn};
pub use self::elements::{ImageElement, LayoutElement, PositionedElement, TextElement};
pub use self::engine::{
    AnchorLocation, LaidOutDocument, LaidOutPage, LayoutEngine, SectionExtent,
};
pub use self::fonts::FontFace;
pub use self::page::{Margins, PageGeometry, PageSize};
pub use self::style::{BoxStyle, TextAlign, TextStyle};

pub use towerdoc_types::{Rect, Size};
