//! towerdoc composes tower inspection reports into PDFs.
//!
//! A report is rendered twice. The first pass records the page every section
//! starts on; the second lays the document out again with those numbers on
//! the table-of-contents page, each line linked to its section.
//!
//! ```ignore
//! use towerdoc::CompositorBuilder;
//!
//! let compositor = CompositorBuilder::new().with_asset_dir("assets")?.build()?;
//! let rendered = compositor.compose_record(&record)?;
//! std::fs::write("report.pdf", rendered.pdf)?;
//! ```

pub mod assembler;
pub mod assets;
pub mod batch;
pub mod builder;
pub mod compositor;
pub mod config;
pub mod error;
pub mod filename;
pub mod section;
pub mod server;
pub mod store;
pub mod toc;
pub mod toc_page;

pub use assembler::{DocumentAssembler, ReportDocument, ReportSection, SectionContent};
pub use builder::CompositorBuilder;
pub use compositor::{CaptureResult, Compositor, RenderPhase, RenderedReport};
pub use config::CompositorConfig;
pub use error::ReportError;
pub use filename::report_file_name;
pub use section::{CapturedPages, RenderMode, SectionMarker};
pub use store::{InMemoryReportStore, JsonDirectoryStore, ReportStore, StoreError};
pub use toc::TocAccumulator;
pub use toc_page::{LeaderMetrics, TocPageRenderer};

pub use towerdoc_layout::{Margins, PageSize};
pub use towerdoc_types::{RedlineOffset, ReportRecord, ResourceUri, TocEntry};
