//! PDF output for towerdoc layouts using lopdf.
//!
//! Pages are painted from positioned elements with the base-14 Helvetica
//! faces. Link areas become GoTo annotations, outlines are built from the
//! caller's entries and `Page X of Y` placeholders are resolved per page.

mod error;
mod helpers;
mod images;
mod painter;
mod renderer;
mod writer;

pub use error::RenderError;
pub use helpers::{OutlineEntry, build_outlines, create_link_annotations, to_win_ansi};
pub use images::{ImageSet, PreparedImage, prepare_image};
pub use renderer::{LopdfRenderer, RenderOptions};
pub use writer::StreamingPdfWriter;
