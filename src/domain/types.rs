//! Shared types for the report pipeline

use chrono::{NaiveDate, NaiveTime};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Format used when a time-of-day field leaves the pipeline (ISO-8601)
pub const TIME_ISO_FORMAT: &str = "%H:%M:%S";

/// Newtype wrapper for report identifiers scraped from the index page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[repr(transparent)]
pub struct ReportId(pub String);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One field of a parsed report line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Text(String),
    Time(NaiveTime),
}

impl Field {
    pub fn text(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Text(s) => f.write_str(s),
            Field::Time(t) => write!(f, "{}", t.format(TIME_ISO_FORMAT)),
        }
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Text(s) => serializer.serialize_str(s),
            Field::Time(t) => serializer.collect_str(&t.format(TIME_ISO_FORMAT)),
        }
    }
}

/// A single parsed line of report text, fields kept in split order.
///
/// Most lines split into one to three pieces ("Apple Juice",
/// "9:30am - 10:15am"), so the fields live inline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataPoint(pub SmallVec<[Field; 4]>);

impl DataPoint {
    pub fn fields(&self) -> &[Field] {
        &self.0
    }
}

impl FromIterator<Field> for DataPoint {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        DataPoint(iter.into_iter().collect())
    }
}

impl Serialize for DataPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for field in &self.0 {
            seq.serialize_element(field)?;
        }
        seq.end()
    }
}

/// One day's report: its date plus category name -> datapoints.
///
/// Categories keep the order in which they were first assigned; assigning
/// an existing key replaces its datapoints in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub date: NaiveDate,
    categories: Vec<(String, Vec<DataPoint>)>,
}

impl Report {
    pub fn new(date: NaiveDate) -> Self {
        Self { date, categories: Vec::new() }
    }

    pub fn set_category(&mut self, key: &str, points: Vec<DataPoint>) {
        match self.categories.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = points,
            None => self.categories.push((key.to_string(), points)),
        }
    }

    pub fn category(&self, key: &str) -> Option<&[DataPoint]> {
        self.categories.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_slice())
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[DataPoint])> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len() + 1))?;
        map.serialize_entry("Date", &self.date)?;
        for (key, points) in &self.categories {
            map.serialize_entry(key, points)?;
        }
        map.end()
    }
}

/// One datapoint of one category of one report, tagged with the report date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRecord<'a> {
    pub key: &'a str,
    pub date: NaiveDate,
    pub point: &'a DataPoint,
}

/// Selected value for a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestEntry {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Value")]
    pub value: DataPoint,
}

/// Category key -> selected entry. Rebuilt from scratch on every query.
pub type LatestMap = BTreeMap<String, LatestEntry>;

/// Everything one query produced for a child
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildData {
    /// Display name from the first report's "...'s Report" heading
    pub child: Option<String>,
    /// `None` when no report was enumerated
    pub at_daycare: Option<bool>,
    /// Serialized as a map keyed by `report_label`, in report order
    #[serde(serialize_with = "serialize_labelled_reports")]
    pub reports: Vec<Report>,
    pub latest: LatestMap,
}

impl ChildData {
    /// Label the source site's data used for each report ("Report 0", ...)
    pub fn report_label(index: usize) -> String {
        format!("Report {}", index)
    }
}

fn serialize_labelled_reports<S: Serializer>(reports: &[Report], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(reports.len()))?;
    for (index, report) in reports.iter().enumerate() {
        map.serialize_entry(&ChildData::report_label(index), report)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_set_category_replaces_in_place() {
        let mut report = Report::new(date(2024, 3, 5));
        report.set_category("Meals", vec![DataPoint(smallvec![Field::text("A")])]);
        report.set_category("Naps", vec![]);
        report.set_category("Meals", vec![DataPoint(smallvec![Field::text("B")])]);

        let keys: Vec<&str> = report.categories().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Meals", "Naps"]);
        assert_eq!(report.category("Meals").unwrap()[0].fields(), &[Field::text("B")]);
    }

    #[test]
    fn test_time_field_serializes_iso() {
        let point = DataPoint(smallvec![
            Field::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()),
            Field::text("Slept well"),
        ]);
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"["09:30:00","Slept well"]"#);
    }

    #[test]
    fn test_report_serializes_date_first() {
        let mut report = Report::new(date(2024, 3, 5));
        report.set_category("Mood", vec![DataPoint(smallvec![Field::text("Happy")])]);
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"Date":"2024-03-05","Mood":[["Happy"]]}"#);
    }

    #[test]
    fn test_child_data_reports_keyed_by_label() {
        let data = ChildData {
            child: Some("Ava".to_string()),
            at_daycare: Some(true),
            reports: vec![Report::new(date(2024, 3, 6)), Report::new(date(2024, 3, 5))],
            latest: LatestMap::new(),
        };
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(
            json,
            r#"{"child":"Ava","at_daycare":true,"reports":{"Report 0":{"Date":"2024-03-06"},"Report 1":{"Date":"2024-03-05"}},"latest":{}}"#
        );
    }
}
