//! Renders many records in parallel. Every render owns its accumulator, so
//! the workers share nothing but the compositor.

use crate::compositor::Compositor;
use crate::error::ReportError;
use crate::filename::report_file_name;
use crate::store::parse_record;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Renders every `*.json` record in `input` into `output`, named after the
/// record's site.
pub fn render_directory(compositor: &Compositor, input: &Path, output: &Path) -> Result<BatchSummary, ReportError> {
    let mut records: Vec<PathBuf> = fs::read_dir(input)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    records.sort();
    fs::create_dir_all(output)?;

    let start = Instant::now();
    log::info!(
        "Rendering {} records on {} threads.",
        records.len(),
        rayon::current_num_threads()
    );

    let results: Vec<(PathBuf, Result<PathBuf, ReportError>)> = records
        .into_par_iter()
        .map(|path| {
            let result = render_file(compositor, &path, output);
            (path, result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (path, result) in results {
        match result {
            Ok(pdf) => summary.rendered.push(pdf),
            Err(e) => {
                log::error!("Failed to render {}: {}", path.display(), e);
                summary.failed.push((path, e.to_string()));
            }
        }
    }
    log::info!(
        "Batch finished in {:.2?}: {} rendered, {} failed.",
        start.elapsed(),
        summary.rendered.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// Renders one record file, returning the path of the written PDF.
pub fn render_file(compositor: &Compositor, path: &Path, output: &Path) -> Result<PathBuf, ReportError> {
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let json = fs::read_to_string(path)?;
    let record = parse_record(&id, &json)?;
    let rendered = compositor.compose_record(&record)?;

    // Several records may share a site; the record id keeps names unique.
    let name = report_file_name(&record);
    let file_name = match name.strip_suffix(".pdf") {
        Some(stem) if !id.is_empty() => format!("{stem} ({id}).pdf"),
        _ => name,
    };
    let target = output.join(file_name);
    fs::write(&target, &rendered.pdf)?;
    log::debug!("Wrote {} ({} pages).", target.display(), rendered.page_count);
    Ok(target)
}
