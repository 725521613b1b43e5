use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use framefix_recon::error::ReconError;
use framefix_recon::report::ReportTable;

/// `output/frame-fixes-<YYYYMMDD>.csv`, or `output/frame-fixes.csv` when no
/// run date is known.
pub fn default_output_path(date: Option<NaiveDate>) -> PathBuf {
    let name = match date {
        Some(d) => format!("frame-fixes-{}.csv", d.format("%Y%m%d")),
        None => "frame-fixes.csv".to_string(),
    };
    Path::new("output").join(name)
}

/// Write a report table to `path`, creating parent directories.
pub fn write_report(table: &ReportTable, path: &Path) -> Result<(), ReconError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReconError::Io {
            path: parent.display().to_string(),
            reason: e.to_string(),
        })?;
    }
    let file = std::fs::File::create(path).map_err(|e| ReconError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    write_records(table, file).map_err(|reason| ReconError::Io {
        path: path.display().to_string(),
        reason,
    })
}

/// Write a report table to any writer.
pub fn write_records<W: Write>(table: &ReportTable, out: W) -> Result<(), String> {
    // Header and spacer lines have different widths from the data rows.
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(out);

    for record in table.to_records() {
        if record.is_empty() {
            // An empty record would be written as `""`; spacer lines stay blank.
            let mut inner = writer.into_inner().map_err(|e| e.to_string())?;
            inner.write_all(b"\n").map_err(|e| e.to_string())?;
            writer = csv::WriterBuilder::new().flexible(true).from_writer(inner);
        } else {
            writer.write_record(&record).map_err(|e| e.to_string())?;
        }
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn table() -> ReportTable {
        ReportTable {
            header: vec![
                ("Producer".into(), "Joe Schmo".into()),
                ("Operator".into(), "John Doe".into()),
                ("Job".into(), "Dirtfixing".into()),
                ("Notes".into(), String::new()),
            ],
            rows: vec![
                ("/hpsans13/production/Dune/reel1/partA".into(), "2-4,31-32".into()),
                ("/hpsans12/production/Dune/reel2".into(), "No frames to fix".into()),
            ],
        }
    }

    #[test]
    fn report_layout() {
        let mut buf = Vec::new();
        write_records(&table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Producer: Joe Schmo,Operator: John Doe,Job: Dirtfixing,Notes: ");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Location:,Frames to Fix:");
        // Comma-joined ranges are quoted.
        assert_eq!(lines[4], "/hpsans13/production/Dune/reel1/partA,\"2-4,31-32\"");
        assert_eq!(lines[5], "/hpsans12/production/Dune/reel2,No frames to fix");
    }

    #[test]
    fn write_creates_output_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output/frame-fixes-20230323.csv");
        write_report(&table(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Producer: Joe Schmo"));
    }

    #[test]
    fn write_failure_is_reported_as_write() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("output");
        fs::write(&blocker, "not a directory").unwrap();
        let err = write_report(&table(), &blocker.join("frame-fixes.csv")).unwrap_err();
        assert!(matches!(err, ReconError::Io { .. }));
        assert!(err.to_string().contains("cannot write"));
    }

    #[test]
    fn output_names() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 23);
        assert_eq!(default_output_path(date), PathBuf::from("output/frame-fixes-20230323.csv"));
        assert_eq!(default_output_path(None), PathBuf::from("output/frame-fixes.csv"));
    }
}
