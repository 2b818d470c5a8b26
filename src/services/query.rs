//! Query orchestrator - authenticate, enumerate, parse, reduce
//!
//! One query is one blocking unit of work. Every request goes through the
//! same session serially, and the first failure aborts the whole query.

use crate::domain::{ChildData, HiMamaResult};
use crate::infra::config::{Credentials, SiteConfig};
use crate::io::reports::list_reports;
use crate::io::session::{PageSource, Session};
use crate::services::reducer::reduce;
use crate::services::report_parser::parse_report;
use std::time::Instant;
use tracing::{debug, info};

/// Log in and query every report of the configured child
pub fn query(site: &SiteConfig, credentials: &Credentials) -> HiMamaResult<ChildData> {
    let session = Session::authenticate(site, credentials)?;
    query_child(&session, &credentials.child_id)
}

/// Query every report of a child through an already authenticated source
pub fn query_child<S: PageSource + ?Sized>(source: &S, child_id: &str) -> HiMamaResult<ChildData> {
    let start = Instant::now();
    let ids = list_reports(source, child_id)?;

    let mut data = ChildData {
        child: None,
        at_daycare: None,
        reports: Vec::with_capacity(ids.len()),
        latest: Default::default(),
    };

    for (index, id) in ids.iter().enumerate() {
        let is_first = index == 0;
        let parsed = parse_report(source, id, is_first)?;
        if is_first {
            data.child = parsed.child;
            data.at_daycare = parsed.at_daycare;
        }
        debug!(label = %ChildData::report_label(index), report_id = %id, "report_collected");
        data.reports.push(parsed.report);
    }

    data.latest = reduce(&data.reports);

    info!(
        child_id = %child_id,
        reports = %data.reports.len(),
        categories = %data.latest.len(),
        elapsed_ms = %start.elapsed().as_millis(),
        "query_complete"
    );
    Ok(data)
}
