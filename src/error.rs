// src/error.rs
use crate::store::StoreError;
use thiserror::Error;
use towerdoc_layout::LayoutError;
use towerdoc_render_lopdf::RenderError;

/// A comprehensive error type for fetching, composing and serving a report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// No record exists for the requested identifier. Raised before any
    /// rendering starts.
    #[error("Report '{0}' not found")]
    NotFound(String),

    #[error("Report store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration is invalid: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportError::NotFound(_))
    }
}
