//! Report parser - one report page into a `Report`
//!
//! The site renders a report as a run of `<h2>` headings, each followed by
//! a sibling element holding that section's content:
//!
//! ```text
//! <h2>Ava's Report</h2><div>Tuesday, Mar 05, 2024</div>
//! <h2>Meals</h2><div><p>Breakfast - All</p><p>Fluids</p><p>Milk - 4oz</p></div>
//! <h2>Naps</h2><div><p>1:00pm - 2:30pm (1h30m)</p></div>
//! ```
//!
//! Every markup assumption lives in this module.
//!
//! - A heading containing "Preview" is skipped. On the first report of a
//!   query, a "Preview" first heading also means the child is not at daycare.
//! - A heading containing "Report" carries the child's name ("Ava's Report")
//!   and its section holds the report date ("Tuesday, Mar 05, 2024"). The
//!   weekday must be a weekday name but is not checked against the date, and
//!   chrono's `%b` also takes full month names ("March").
//! - Any other heading is a category. Each element in its section is one
//!   line for `parse_line`. An element whose text contains "Fluids" moves
//!   every later line of that section under the "Fluids" key.

use crate::domain::{DataPoint, HiMamaError, ParseError, Report, ReportId};
use crate::io::reports::report_path;
use crate::io::session::{strip_newlines, PageSource};
use crate::services::line_parser::parse_line;
use chrono::{NaiveDate, Weekday};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

pub const FLUIDS_KEY: &str = "Fluids";
const PREVIEW_MARKER: &str = "Preview";
const REPORT_MARKER: &str = "Report";
const NAME_SUFFIX: &str = "'s Report";
const DATE_FORMAT: &str = "%A, %b %d, %Y";
const DATE_FORMAT_NO_WEEKDAY: &str = "%b %d, %Y";

/// A parsed report plus the per-query facts only the first report carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub report: Report,
    /// Only set when parsed as the first report
    pub child: Option<String>,
    /// Only set when parsed as the first report
    pub at_daycare: Option<bool>,
}

fn heading_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("h2").expect("heading selector is valid"))
}

/// Fetch and parse one report page
pub fn parse_report<S: PageSource + ?Sized>(
    source: &S,
    id: &ReportId,
    is_first: bool,
) -> Result<ParsedReport, HiMamaError> {
    let page = strip_newlines(&source.get_page(&report_path(id))?);
    let parsed = parse_report_html(&page, is_first)
        .map_err(|err| HiMamaError::Parse { report_id: id.to_string(), source: err })?;

    debug!(
        report_id = %id,
        date = %parsed.report.date,
        categories = %parsed.report.category_count(),
        "report_parsed"
    );
    Ok(parsed)
}

/// Parse a (newline-stripped) report page
pub fn parse_report_html(html: &str, is_first: bool) -> Result<ParsedReport, ParseError> {
    let document = Html::parse_document(html);

    let mut child = None;
    let mut at_daycare = None;
    let mut date = None;
    let mut assignments: Vec<(String, Vec<DataPoint>)> = Vec::new();
    let mut headings = 0usize;

    for (index, heading) in document.select(heading_selector()).enumerate() {
        headings += 1;
        let heading_text = stripped_text(heading);

        if is_first && index == 0 {
            at_daycare = Some(!heading_text.contains(PREVIEW_MARKER));
        }
        if heading_text.contains(PREVIEW_MARKER) {
            continue;
        }

        let content = section_content(heading);
        if heading_text.contains(REPORT_MARKER) {
            if is_first {
                child = Some(heading_text.replace(NAME_SUFFIX, ""));
            }
            date = Some(parse_date(content)?);
        } else if let Some(content) = content {
            walk_section(&heading_text, content, &mut assignments);
        }
    }

    if headings == 0 {
        return Err(ParseError::NoSections);
    }
    let date = date.ok_or(ParseError::MissingDate)?;

    let mut report = Report::new(date);
    for (key, points) in assignments {
        report.set_category(&key, points);
    }
    Ok(ParsedReport { report, child, at_daycare })
}

/// Text of an element with every text fragment trimmed, then concatenated
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// The element right after a heading, skipping blank text and comments
fn section_content(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    heading
        .next_siblings()
        .find(|node| match node.value() {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Comment(_) => false,
            _ => true,
        })
        .and_then(ElementRef::wrap)
}

fn parse_date(content: Option<ElementRef<'_>>) -> Result<NaiveDate, ParseError> {
    let text = content
        .and_then(|c| c.text().map(str::trim).find(|t| !t.is_empty()))
        .ok_or(ParseError::MissingDate)?;

    parse_date_text(text).map_err(|source| ParseError::InvalidDate { text: text.to_string(), source })
}

/// `DATE_FORMAT` with the weekday only checked for being a weekday name
fn parse_date_text(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    match text.split_once(", ") {
        Some((weekday, rest)) if weekday.parse::<Weekday>().is_ok() => {
            NaiveDate::parse_from_str(rest, DATE_FORMAT_NO_WEEKDAY)
        }
        _ => NaiveDate::parse_from_str(text, DATE_FORMAT),
    }
}

/// Which key the lines of a section are currently filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKey<'a> {
    Category(&'a str),
    Fluids,
}

impl SectionKey<'_> {
    fn as_str(&self) -> &str {
        match self {
            SectionKey::Category(key) => key,
            SectionKey::Fluids => FLUIDS_KEY,
        }
    }
}

/// State while walking one section's child nodes.
///
/// A key is only written once at least one node was walked under it, so a
/// trailing "Fluids" marker leaves no empty "Fluids" entry behind, while a
/// section of bare text still records its category with no lines.
struct SectionWalk<'a> {
    key: SectionKey<'a>,
    points: Vec<DataPoint>,
    assigned: bool,
}

impl<'a> SectionWalk<'a> {
    fn new(key: SectionKey<'a>) -> Self {
        Self { key, points: Vec::new(), assigned: false }
    }

    fn flush(self, out: &mut Vec<(String, Vec<DataPoint>)>) {
        if self.assigned {
            out.push((self.key.as_str().to_string(), self.points));
        }
    }
}

fn walk_section(category: &str, content: ElementRef<'_>, out: &mut Vec<(String, Vec<DataPoint>)>) {
    let mut state = SectionWalk::new(SectionKey::Category(category));

    for node in content.children() {
        if let Some(element) = ElementRef::wrap(node) {
            let text = stripped_text(element);
            if text.contains(FLUIDS_KEY) {
                std::mem::replace(&mut state, SectionWalk::new(SectionKey::Fluids)).flush(out);
                continue;
            }
            state.points.push(parse_line(&text));
        }
        state.assigned = true;
    }

    state.flush(out);
}
