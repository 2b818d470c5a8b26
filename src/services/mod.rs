//! Services - the report pipeline
//!
//! - `line_parser` - one line of report text into a `DataPoint`
//! - `report_parser` - one report page into a `Report`
//! - `reducer` - latest value per category across reports
//! - `query` - authenticate, enumerate, parse, reduce
//! - `entities` - sensor entity snapshot built from a query result

pub mod entities;
pub mod line_parser;
pub mod query;
pub mod reducer;
pub mod report_parser;

// Re-export commonly used types
pub use entities::{build_entities, SensorEntity};
pub use line_parser::parse_line;
pub use query::{query, query_child};
pub use reducer::reduce;
pub use report_parser::{parse_report, parse_report_html, ParsedReport};
