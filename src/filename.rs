use itertools::Itertools;
use towerdoc_types::ReportRecord;

const FALLBACK_NAME: &str = "report";

/// `"<SITECODE> <Title Cased Site Name> <REGION> <JOB>.pdf"`, skipping empty
/// parts. Anything outside `[A-Za-z0-9 ._-]` is dropped so the name is safe
/// inside a `Content-Disposition` header.
pub fn report_file_name(record: &ReportRecord) -> String {
    let stem = [
        record.site_code.trim().to_uppercase(),
        record.title_cased_site_name(),
        record.region.trim().to_uppercase(),
        record.job_number.trim().to_string(),
    ]
    .iter()
    .map(|part| sanitize(part))
    .filter(|part| !part.is_empty())
    .join(" ");

    if stem.is_empty() {
        format!("{FALLBACK_NAME}.pdf")
    } else {
        format!("{stem}.pdf")
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}
