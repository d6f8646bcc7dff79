//! Helpers shared by the file-backed snapshot adapters.

use crate::adapters::{csv_adapter, json_snapshot_adapter};
use crate::adapters::quote_record::parse_date;
use crate::domain::error::FlowbandError;
use crate::domain::quote::StockQuote;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

/// Trade date encoded in a file stem such as `2024-03-01.json`.
pub fn date_from_stem(path: &Path) -> Option<NaiveDate> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(parse_date)
}

/// Dates of every `<date>.<extension>` file directly under `dir`, ascending.
/// Files whose stem is not a date are ignored.
pub fn dated_files(dir: &Path, extension: &str) -> Result<Vec<NaiveDate>, FlowbandError> {
    let entries = fs::read_dir(dir).map_err(|e| FlowbandError::SnapshotRead {
        source_name: dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut dates = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        if let Some(date) = date_from_stem(&path) {
            dates.push(date);
        }
    }
    dates.sort();
    dates.dedup();
    Ok(dates)
}

/// Read one snapshot file, choosing the format by extension.
pub fn read_snapshot_file(path: &Path) -> Result<Vec<StockQuote>, FlowbandError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => json_snapshot_adapter::read_file(path),
        Some("csv") => csv_adapter::read_file(path),
        _ => Err(FlowbandError::SnapshotRead {
            source_name: path.display().to_string(),
            reason: "unsupported file type, expected .json or .csv".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_only_dated_files_with_extension() {
        let dir = TempDir::new().unwrap();
        for name in ["2024-03-04.json", "2024-03-01.json", "notes.json", "2024-03-05.csv"] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }
        let dates = dated_files(dir.path(), "json").unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            ]
        );
    }

    #[test]
    fn missing_directory_is_read_error() {
        let err = dated_files(Path::new("/nonexistent/snapshots"), "json").unwrap_err();
        assert!(matches!(err, FlowbandError::SnapshotRead { .. }));
    }

    #[test]
    fn unsupported_extension() {
        let err = read_snapshot_file(Path::new("quotes.xlsx")).unwrap_err();
        assert!(matches!(err, FlowbandError::SnapshotRead { .. }));
    }

    #[test]
    fn compact_date_stem() {
        assert_eq!(
            date_from_stem(Path::new("/data/20240301.csv")),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }
}
