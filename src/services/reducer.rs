//! Latest-value reducer - one entry per category across all reports
//!
//! Reports are flattened in report order; within a category the datapoints
//! are emitted last-first. For each distinct key the first flattened record
//! wins. With the site listing reports newest first, that is the last line
//! of the key's category in the newest report that has it.

use crate::domain::{FlatRecord, LatestEntry, LatestMap, Report};
use rustc_hash::FxHashSet;

/// Every datapoint of every category, tagged with its report's date
pub fn flatten(reports: &[Report]) -> impl Iterator<Item = FlatRecord<'_>> {
    reports.iter().flat_map(|report| {
        report.categories().flat_map(move |(key, points)| {
            points.iter().rev().map(move |point| FlatRecord { key, date: report.date, point })
        })
    })
}

/// Distinct category keys that contributed at least one record
pub fn unique_keys<'a>(records: &[FlatRecord<'a>]) -> FxHashSet<&'a str> {
    records.iter().map(|r| r.key).collect()
}

pub fn reduce(reports: &[Report]) -> LatestMap {
    let records: Vec<FlatRecord<'_>> = flatten(reports).collect();

    unique_keys(&records)
        .into_iter()
        .filter_map(|key| records.iter().find(|r| r.key == key))
        .map(|r| (r.key.to_string(), LatestEntry { date: r.date, value: r.point.clone() }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataPoint, Field};
    use chrono::NaiveDate;
    use smallvec::smallvec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(s: &str) -> DataPoint {
        DataPoint(smallvec![Field::text(s)])
    }

    fn with(mut report: Report, key: &str, lines: &[&str]) -> Report {
        report.set_category(key, lines.iter().map(|l| point(l)).collect());
        report
    }

    #[test]
    fn test_first_report_last_datapoint_wins() {
        let reports = vec![
            with(Report::new(date(2024, 3, 6)), "Meals", &["A", "B"]),
            with(Report::new(date(2024, 3, 5)), "Meals", &["C", "D"]),
        ];
        let latest = reduce(&reports);

        assert_eq!(latest.len(), 1);
        let meals = &latest["Meals"];
        assert_eq!(meals.value, point("B"));
        assert_eq!(meals.date, date(2024, 3, 6));
    }

    #[test]
    fn test_key_missing_from_first_report_falls_through() {
        let reports = vec![
            with(Report::new(date(2024, 3, 6)), "Meals", &["A"]),
            with(with(Report::new(date(2024, 3, 5)), "Naps", &["Nap 1", "Nap 2"]), "Meals", &["C"]),
        ];
        let latest = reduce(&reports);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest["Meals"].value, point("A"));
        assert_eq!(latest["Naps"].value, point("Nap 2"));
        assert_eq!(latest["Naps"].date, date(2024, 3, 5));
    }

    #[test]
    fn test_empty_category_contributes_nothing() {
        let reports = vec![
            with(Report::new(date(2024, 3, 6)), "Notes", &[]),
            with(Report::new(date(2024, 3, 5)), "Notes", &["Bring diapers"]),
        ];
        let latest = reduce(&reports);
        assert_eq!(latest["Notes"].value, point("Bring diapers"));
        assert_eq!(latest["Notes"].date, date(2024, 3, 5));
    }

    #[test]
    fn test_keys_match_exactly() {
        let reports = vec![
            with(Report::new(date(2024, 3, 6)), "Teacher Notes", &["T"]),
            with(Report::new(date(2024, 3, 5)), "Notes", &["N"]),
        ];
        let latest = reduce(&reports);
        assert_eq!(latest["Notes"].value, point("N"));
        assert_eq!(latest["Teacher Notes"].value, point("T"));
    }

    #[test]
    fn test_flatten_order() {
        let reports = vec![
            with(with(Report::new(date(2024, 3, 6)), "Meals", &["A", "B"]), "Mood", &["Happy"]),
            with(Report::new(date(2024, 3, 5)), "Meals", &["C"]),
        ];
        let flat: Vec<(&str, String)> = flatten(&reports)
            .map(|r| (r.key, r.point.fields()[0].to_string()))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("Meals", "B".to_string()),
                ("Meals", "A".to_string()),
                ("Mood", "Happy".to_string()),
                ("Meals", "C".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_reports_no_entries() {
        assert!(reduce(&[]).is_empty());
    }
}
