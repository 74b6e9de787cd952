#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_assertions;

use lopdf::Document as LopdfDocument;
use std::sync::Arc;
use towerdoc::{Compositor, CompositorBuilder, ReportError, ReportRecord, RenderedReport};
use towerdoc_traits::InMemoryResourceProvider;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    /// Create a GeneratedPdf from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    pub fn from_report(report: &RenderedReport) -> Result<Self, Box<dyn std::error::Error>> {
        Self::from_bytes(report.pdf.clone())
    }

    /// Get the number of pages in the PDF
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Text of a single 1-based page.
    pub fn page_text(&self, page: u32) -> String {
        self.doc.extract_text(&[page]).unwrap_or_default()
    }

    /// Save PDF to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A compositor whose assets come from `provider`.
pub fn compositor_with(provider: InMemoryResourceProvider) -> Result<Compositor, ReportError> {
    CompositorBuilder::new()
        .with_resource_provider(Arc::new(provider))
        .build()
}

/// Both passes over `record`, with no assets available.
pub fn compose(record: &ReportRecord) -> Result<(RenderedReport, GeneratedPdf), Box<dyn std::error::Error>> {
    let compositor = compositor_with(InMemoryResourceProvider::new())?;
    let report = compositor.compose_record(record)?;
    let pdf = GeneratedPdf::from_report(&report)?;
    Ok((report, pdf))
}
