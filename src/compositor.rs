// src/compositor.rs
//! The two-pass report compositor.
//!
//! Pass 1 lays the whole report out and lets every section marker record the
//! page it starts on. Its output is thrown away. Pass 2 lays the report out
//! again with the captured entries on the table-of-contents page and writes
//! the PDF, linking each contents line to its section.

use crate::assembler::{DocumentAssembler, ReportDocument};
use crate::config::CompositorConfig;
use crate::error::ReportError;
use crate::section::{CapturedPages, RenderMode};
use crate::toc::TocAccumulator;
use crate::toc_page::TocPageRenderer;
use std::sync::Arc;
use std::time::Instant;
use towerdoc_layout::{LaidOutDocument, LayoutEngine};
use towerdoc_pdf_composer::{InsertPosition, merge_pdf_bytes, page_count};
use towerdoc_render_lopdf::{LopdfRenderer, OutlineEntry, RenderOptions};
use towerdoc_traits::ResourceProvider;
use towerdoc_types::{AnchorId, ReportRecord, TocEntry};

/// Where a single render currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    CapturePass,
    FinalPass,
    Done,
}

impl RenderPhase {
    fn advance(self, next: RenderPhase, report_id: &str) -> RenderPhase {
        log::debug!("Report '{}': {:?} -> {:?}", report_id, self, next);
        next
    }
}

/// What the capture pass observed.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub toc: TocAccumulator,
    /// Physical pages the capture layout produced.
    pub page_count: usize,
    /// Captured page ranges of every laid-out section, in document order.
    pub sections: Vec<(String, CapturedPages)>,
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub pdf: Vec<u8>,
    /// Physical pages in `pdf`, merged redline pages included.
    pub page_count: usize,
    /// Generated pages plus the configured redline pages.
    pub reported_page_count: usize,
    pub section_titles: Vec<String>,
    pub toc: Vec<TocEntry>,
    /// Pages actually merged from the record's redline document.
    pub merged_redline_pages: usize,
}

/// Renders assembled reports. Holds no per-render state, so one instance can
/// serve concurrent requests.
pub struct Compositor {
    config: CompositorConfig,
    engine: LayoutEngine,
    toc_renderer: TocPageRenderer,
    provider: Arc<dyn ResourceProvider>,
}

impl Compositor {
    pub(crate) fn new(config: CompositorConfig, provider: Arc<dyn ResourceProvider>) -> Self {
        let engine = LayoutEngine::new(config.geometry()).with_base_font_size(config.base_font_size);
        let toc_renderer = TocPageRenderer::new(config.leader_metrics(), config.base_font_size);
        Self {
            config,
            engine,
            toc_renderer,
            provider,
        }
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn assemble(&self, record: &ReportRecord) -> ReportDocument {
        DocumentAssembler::new(&self.config, Arc::clone(&self.provider)).assemble(record)
    }

    fn layout(&self, document: &ReportDocument, mode: RenderMode, toc: &TocAccumulator) -> Result<LaidOutDocument, ReportError> {
        let listing = match mode {
            RenderMode::Capture => document.provisional_toc(),
            RenderMode::Final => toc.entries().to_vec(),
        };
        let blocks = document.blocks(&listing, &self.toc_renderer);
        Ok(self.engine.layout(&blocks)?)
    }

    /// Runs the capture pass and returns everything it observed.
    pub fn capture_pass(&self, document: &ReportDocument) -> Result<CaptureResult, ReportError> {
        let start = Instant::now();
        log::info!("[PASS 1] Capturing section pages for '{}'.", document.id);

        let layout = self.layout(document, RenderMode::Capture, &TocAccumulator::new())?;
        if layout.sections.len() != document.sections.len() {
            log::warn!(
                "Report '{}' has {} section markers but {} laid-out sections.",
                document.id,
                document.sections.len(),
                layout.sections.len()
            );
        }
        let mut toc = TocAccumulator::new();
        let sections = document
            .markers()
            .zip(&layout.sections)
            .map(|(marker, extent)| {
                let pages = marker.capture(extent, &document.redline, &mut toc);
                (marker.title.clone(), pages)
            })
            .collect();

        log::info!(
            "[PASS 1] Complete. Captured {} entries over {} pages in {:.2?}.",
            toc.len(),
            layout.page_count(),
            start.elapsed()
        );
        Ok(CaptureResult {
            toc,
            page_count: layout.page_count(),
            sections,
        })
    }

    /// The capture pass, reduced to its table-of-contents entries.
    pub fn capture(&self, document: &ReportDocument) -> Result<TocAccumulator, ReportError> {
        Ok(self.capture_pass(document)?.toc)
    }

    /// The final pass: lays out with `toc` on the contents page and writes the
    /// PDF.
    pub fn render(&self, document: &ReportDocument, toc: &TocAccumulator) -> Result<RenderedReport, ReportError> {
        let start = Instant::now();
        log::info!("[PASS 2] Rendering '{}' with {} contents entries.", document.id, toc.len());

        let layout = self.layout(document, RenderMode::Final, toc)?;
        let natural_total = layout.page_count();
        let reported_total = document.redline.reported_total(natural_total);

        let outline = toc
            .entries()
            .iter()
            .map(|entry| OutlineEntry::new(entry.title.clone(), AnchorId::from_title(&entry.title)))
            .collect();
        let options = RenderOptions {
            title: Some(document.title.clone()),
            total_pages: reported_total,
            outline,
        };
        let pdf = LopdfRenderer::new(self.config.geometry().size, &document.images).render(&layout, &options)?;
        let (pdf, merged) = self.merge_redlines(pdf, document, &layout);

        log::info!(
            "[PASS 2] Complete. {} generated pages, {} merged, reported total {} in {:.2?}.",
            natural_total,
            merged,
            reported_total,
            start.elapsed()
        );
        Ok(RenderedReport {
            pdf,
            page_count: natural_total + merged,
            reported_page_count: reported_total,
            section_titles: layout.section_titles().into_iter().map(str::to_string).collect(),
            toc: toc.entries().to_vec(),
            merged_redline_pages: merged,
        })
    }

    /// Both passes. A fresh accumulator is created for this call alone.
    pub fn compose(&self, document: &ReportDocument) -> Result<RenderedReport, ReportError> {
        let phase = RenderPhase::Idle.advance(RenderPhase::CapturePass, &document.id);
        let captured = self.capture_pass(document)?;

        let phase = phase.advance(RenderPhase::FinalPass, &document.id);
        let rendered = self.render(document, &captured.toc)?;
        let generated = rendered.page_count - rendered.merged_redline_pages;
        if generated != captured.page_count {
            log::warn!(
                "Report '{}' laid out to {} pages in pass 1 but {} in pass 2; contents page numbers may be off.",
                document.id,
                captured.page_count,
                generated
            );
        }

        phase.advance(RenderPhase::Done, &document.id);
        Ok(rendered)
    }

    /// A single final-mode render with an empty contents page.
    pub fn preview(&self, document: &ReportDocument) -> Result<RenderedReport, ReportError> {
        let phase = RenderPhase::Idle.advance(RenderPhase::FinalPass, &document.id);
        let rendered = self.render(document, &TocAccumulator::new())?;
        phase.advance(RenderPhase::Done, &document.id);
        Ok(rendered)
    }

    pub fn compose_record(&self, record: &ReportRecord) -> Result<RenderedReport, ReportError> {
        self.compose(&self.assemble(record))
    }

    pub fn preview_record(&self, record: &ReportRecord) -> Result<RenderedReport, ReportError> {
        self.preview(&self.assemble(record))
    }

    /// Merges the record's redline PDF, if it names one the provider can load
    /// and parse. Otherwise the report is returned unchanged and the merge is
    /// left to whoever handles the PDF next.
    fn merge_redlines(&self, pdf: Vec<u8>, document: &ReportDocument, layout: &LaidOutDocument) -> (Vec<u8>, usize) {
        let Some(uri) = &document.redline_document else {
            return (pdf, 0);
        };
        let redlines = match self.provider.load(uri) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Redline document '{}' not merged: {}", uri, e);
                return (pdf, 0);
            }
        };
        let redline_pages = match page_count(&redlines) {
            Ok(pages) => pages,
            Err(e) => {
                log::warn!("Redline document '{}' is not a readable PDF, not merged: {}", uri, e);
                return (pdf, 0);
            }
        };
        if redline_pages != document.redline.redline_pages {
            log::warn!(
                "Redline document '{}' has {} pages but the report counts {}.",
                uri,
                redline_pages,
                document.redline.redline_pages
            );
        }

        let position = match document.first_offset_section() {
            Some(marker) if document.redline.jump_redlines => layout
                .sections
                .iter()
                .find(|s| s.anchor == marker.id)
                .map(|s| InsertPosition::Before(s.first_page_index))
                .unwrap_or_default(),
            _ => InsertPosition::Append,
        };
        log::debug!("Merging {} redline pages at {:?}.", redline_pages, position);
        match merge_pdf_bytes(&pdf, &redlines, position) {
            Ok(merged) => (merged, redline_pages),
            Err(e) => {
                log::warn!("Redline document '{}' could not be merged: {}", uri, e);
                (pdf, 0)
            }
        }
    }
}
