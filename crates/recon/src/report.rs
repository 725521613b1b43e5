//! Logical report rows. Serialization (CSV, JSON, database documents) is
//! left to the caller.

use serde::Serialize;

use crate::config::{ReportConfig, ReportLayout};
use crate::model::{Report, ReportRow, WorkOrderHeader};

pub const HEADER_LABELS: [&str; 4] = ["Producer", "Operator", "Job", "Notes"];
pub const COLUMN_HEADINGS: [&str; 2] = ["Location:", "Frames to Fix:"];

/// Header fields plus `(location, frames)` rows, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTable {
    /// `(label, value)`; absent fields carry an empty value.
    pub header: Vec<(String, String)>,
    pub rows: Vec<(String, String)>,
}

impl ReportTable {
    /// Flatten into records the way the facility sheet is laid out: one
    /// header line, two spacer lines, the column headings, then the rows.
    pub fn to_records(&self) -> Vec<Vec<String>> {
        let mut records = Vec::with_capacity(self.rows.len() + 4);
        records.push(
            self.header
                .iter()
                .map(|(label, value)| format!("{label}: {value}"))
                .collect(),
        );
        records.push(Vec::new());
        records.push(Vec::new());
        records.push(COLUMN_HEADINGS.iter().map(|h| h.to_string()).collect());
        for (location, frames) in &self.rows {
            records.push(vec![location.clone(), frames.clone()]);
        }
        records
    }
}

fn header_fields(header: &WorkOrderHeader) -> Vec<(String, String)> {
    let values = [&header.producer, &header.operator, &header.job, &header.notes];
    HEADER_LABELS
        .iter()
        .zip(values)
        .map(|(label, value)| (label.to_string(), value.clone().unwrap_or_default()))
        .collect()
}

fn push_row(out: &mut Vec<(String, String)>, row: &ReportRow, config: &ReportConfig) {
    match config.layout {
        ReportLayout::PerRange if !row.frames.is_no_data() => {
            for range in row.frames.ranges() {
                out.push((row.location.clone(), range.to_string()));
            }
        }
        _ => out.push((row.location.clone(), row.frames.render(&config.no_frames_marker))),
    }
}

/// Declared rows first, then rows for locations the work order never
/// declared.
pub fn render(report: &Report, config: &ReportConfig) -> ReportTable {
    let mut rows = Vec::with_capacity(report.rows.len() + report.unmatched.len());
    for row in report.rows.iter().chain(&report.unmatched) {
        push_row(&mut rows, row, config);
    }
    ReportTable {
        header: header_fields(&report.header),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::consolidate_unsorted;

    fn report() -> Report {
        Report {
            header: WorkOrderHeader {
                producer: Some("Joe Schmo".into()),
                operator: None,
                job: Some("Dirtfixing".into()),
                notes: None,
            },
            rows: vec![
                ReportRow {
                    location: "/a".into(),
                    canonical: "/fac/a".into(),
                    frames: consolidate_unsorted(&[1, 2, 3, 7]),
                    sources: vec![],
                },
                ReportRow::no_data("/b", "/fac/b"),
            ],
            unmatched: vec![ReportRow {
                location: "/fac/c".into(),
                canonical: "/fac/c".into(),
                frames: consolidate_unsorted(&[9]),
                sources: vec![],
            }],
        }
    }

    #[test]
    fn per_location_layout() {
        let table = render(&report(), &ReportConfig::default());
        assert_eq!(table.header[0], ("Producer".to_string(), "Joe Schmo".to_string()));
        assert_eq!(table.header[1], ("Operator".to_string(), String::new()));
        assert_eq!(
            table.rows,
            vec![
                ("/a".to_string(), "1-3,7".to_string()),
                ("/b".to_string(), "No frames to fix".to_string()),
                ("/fac/c".to_string(), "9".to_string()),
            ]
        );
    }

    #[test]
    fn per_range_layout() {
        let config = ReportConfig {
            layout: ReportLayout::PerRange,
            no_frames_marker: "-".into(),
        };
        let table = render(&report(), &config);
        let rows: Vec<_> = table.rows.iter().map(|(l, f)| format!("{l} {f}")).collect();
        assert_eq!(rows, vec!["/a 1-3", "/a 7", "/b -", "/fac/c 9"]);
    }

    #[test]
    fn records_layout() {
        let table = render(&report(), &ReportConfig::default());
        let records = table.to_records();
        assert_eq!(records[0][0], "Producer: Joe Schmo");
        assert_eq!(records[0][1], "Operator: ");
        assert!(records[1].is_empty() && records[2].is_empty());
        assert_eq!(records[3], vec!["Location:", "Frames to Fix:"]);
        assert_eq!(records.len(), 4 + 3);
    }

    #[test]
    fn empty_report() {
        let table = render(&Report::default(), &ReportConfig::default());
        assert!(table.rows.is_empty());
        assert!(table.header.iter().all(|(_, v)| v.is_empty()));
    }
}
