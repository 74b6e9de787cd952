pub mod color;
pub mod geometry;
pub mod ids;
pub mod redline;
pub mod report;
pub mod toc;

pub use color::Color;
pub use geometry::{Rect, Size};
pub use ids::{AnchorId, ResourceUri};
pub use redline::RedlineOffset;
pub use report::{
    AntennaRow, Appendix, ChecklistRow, ChecklistStatus, Deficiency, ReportRecord,
    TransmissionLineRow,
};
pub use toc::TocEntry;
