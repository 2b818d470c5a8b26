//! Report enumeration from a child's report index page

use crate::domain::{FetchError, ReportId};
use crate::io::session::{strip_newlines, PageSource};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn report_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<a href="/reports/(\d+)">"#).expect("report link regex is valid"))
}

/// Path of the report index page for a child
pub fn index_path(child_id: &str) -> String {
    format!("/accounts/{}/reports", child_id)
}

/// Path of a single report page
pub fn report_path(id: &ReportId) -> String {
    format!("/reports/{}", id)
}

/// Report ids linked from an index page, in document order (newest first as
/// the site publishes them). Duplicated links are kept.
pub fn extract_report_ids(html: &str) -> Vec<ReportId> {
    report_link_regex()
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| ReportId(m.as_str().to_string()))
        .collect()
}

/// Fetch the child's index page and list its reports
pub fn list_reports<S: PageSource + ?Sized>(
    source: &S,
    child_id: &str,
) -> Result<Vec<ReportId>, FetchError> {
    let page = strip_newlines(&source.get_page(&index_path(child_id))?);
    let ids = extract_report_ids(&page);
    debug!(child_id = %child_id, reports = %ids.len(), "reports_enumerated");
    Ok(ids)
}
