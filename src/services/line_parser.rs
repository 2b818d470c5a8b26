//! Line parser - one line of report text into a `DataPoint`
//!
//! "9:30am - 10:15am (1h45m)" -> [09:30, 10:15]
//! "Apple Juice"              -> ["Apple Juice"]
//!
//! Steps: drop a trailing " (XhYm)" duration, split on an optionally
//! space-padded hyphen, and turn pieces that look like a 12-hour clock time
//! into a `NaiveTime`. A piece that looks like a time but does not parse as
//! one (e.g. "13:30pm", "at 9:30am") stays text.

use crate::domain::{DataPoint, Field};
use chrono::NaiveTime;
use regex::Regex;
use std::sync::OnceLock;

const CLOCK_FORMAT: &str = "%I:%M%p";

struct LineRegexes {
    duration: Regex,
    splitter: Regex,
    clock: Regex,
}

fn regexes() -> &'static LineRegexes {
    static RE: OnceLock<LineRegexes> = OnceLock::new();
    RE.get_or_init(|| LineRegexes {
        duration: Regex::new(r"\s\([0-9]{1,2}h[0-9]{1,2}m\)$").expect("duration regex is valid"),
        splitter: Regex::new(r"\s?-\s?").expect("splitter regex is valid"),
        clock: Regex::new(r"\d{1,2}:\d{2}[ap]m").expect("clock regex is valid"),
    })
}

pub fn parse_line(text: &str) -> DataPoint {
    let re = regexes();
    let text = text.trim();
    let text = re.duration.replace(text, "");

    re.splitter.split(&text).map(|piece| parse_piece(piece, &re.clock)).collect()
}

fn parse_piece(piece: &str, clock: &Regex) -> Field {
    if clock.is_match(piece) {
        if let Ok(time) = NaiveTime::parse_from_str(piece, CLOCK_FORMAT) {
            return Field::Time(time);
        }
    }
    Field::text(piece)
}
