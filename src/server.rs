//! HTTP routes serving rendered reports.

use crate::compositor::{Compositor, RenderedReport};
use crate::error::ReportError;
use crate::filename::report_file_name;
use crate::store::ReportStore;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub compositor: Arc<Compositor>,
    pub store: Arc<dyn ReportStore>,
}

impl AppState {
    pub fn new(compositor: Arc<Compositor>, store: Arc<dyn ReportStore>) -> Self {
        Self { compositor, store }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderKind {
    Full,
    Preview,
}

#[derive(Debug, Default, Deserialize)]
pub struct PdfQuery {
    #[serde(default)]
    pub download: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reports/:id/pdf", get(report_pdf))
        .route("/reports/:id/preview", get(report_preview))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn report_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PdfQuery>,
) -> Result<Response, ApiError> {
    let disposition = if query.download { "attachment" } else { "inline" };
    serve_report(state, id, RenderKind::Full, disposition).await
}

async fn report_preview(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    serve_report(state, id, RenderKind::Preview, "inline").await
}

async fn serve_report(
    state: AppState,
    id: String,
    kind: RenderKind,
    disposition: &'static str,
) -> Result<Response, ApiError> {
    log::info!("{:?} render requested for report '{}'.", kind, id);
    let (file_name, rendered) = tokio::task::spawn_blocking(move || render_report(&state, &id, kind))
        .await
        .map_err(|e| ReportError::Internal(format!("render task failed: {e}")))??;

    log::info!(
        "Served '{}' ({} pages, {} bytes).",
        file_name,
        rendered.page_count,
        rendered.pdf.len()
    );
    let content_disposition = format!("{disposition}; filename=\"{file_name}\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        rendered.pdf,
    )
        .into_response())
}

/// Runs on a blocking thread. The record is fetched first so a missing
/// report fails before any rendering starts.
fn render_report(state: &AppState, id: &str, kind: RenderKind) -> Result<(String, RenderedReport), ReportError> {
    let record = state
        .store
        .fetch(id)?
        .ok_or_else(|| ReportError::NotFound(id.to_string()))?;
    let document = state.compositor.assemble(&record);
    let rendered = match kind {
        RenderKind::Full => state.compositor.compose(&document)?,
        RenderKind::Preview => state.compositor.preview(&document)?,
    };
    Ok((report_file_name(&record), rendered))
}

/// Maps report errors onto plain-text HTTP responses.
#[derive(Debug)]
pub struct ApiError(ReportError);

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            ReportError::NotFound(id) => {
                log::info!("Report '{}' not found.", id);
                (StatusCode::NOT_FOUND, "not found").into_response()
            }
            ReportError::Store(crate::store::StoreError::InvalidId(id)) => {
                log::info!("Rejected report id '{}'.", id);
                (StatusCode::NOT_FOUND, "not found").into_response()
            }
            err => {
                log::error!("Internal error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
