//! CSV snapshot files.
//!
//! Expected header (column order is free, vendor aliases accepted):
//! `code,name,trade_date,time,price,prev_close,open,high,low,pct_chg,amount,main_net_inflow`

use crate::adapters::quote_record::QuoteRecord;
use crate::adapters::snapshot_file::{date_from_stem, dated_files};
use crate::domain::error::FlowbandError;
use crate::domain::quote::StockQuote;
use crate::ports::snapshot_port::SnapshotPort;
use chrono::NaiveDate;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Parse CSV rows from any reader. `default_date` fills rows with an empty
/// or absent `trade_date` column.
pub fn parse_snapshot<R: Read>(
    reader: R,
    source_name: &str,
    default_date: Option<NaiveDate>,
) -> Result<Vec<StockQuote>, FlowbandError> {
    let parse_err = |line: u64, reason: String| FlowbandError::SnapshotParse {
        source_name: source_name.to_string(),
        reason: format!("line {line}: {reason}"),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut quotes = Vec::new();
    for (i, result) in rdr.deserialize::<QuoteRecord>().enumerate() {
        // header is line 1
        let line = i as u64 + 2;
        let record = result.map_err(|e| parse_err(line, e.to_string()))?;
        let quote = record
            .into_quote(default_date, None)
            .map_err(|e| parse_err(line, e.to_string()))?;
        quotes.push(quote);
    }
    Ok(quotes)
}

/// Read a single CSV snapshot file. The file stem is the fallback trade date.
pub fn read_file(path: &Path) -> Result<Vec<StockQuote>, FlowbandError> {
    let source_name = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| FlowbandError::SnapshotRead {
        source_name: source_name.clone(),
        reason: e.to_string(),
    })?;
    let quotes = parse_snapshot(file, &source_name, date_from_stem(path))?;
    tracing::debug!(file = %source_name, rows = quotes.len(), "loaded CSV snapshot");
    Ok(quotes)
}

/// Directory of `<YYYY-MM-DD>.csv` snapshots.
pub struct CsvSnapshotAdapter {
    base_path: PathBuf,
}

impl CsvSnapshotAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, trade_date: NaiveDate) -> PathBuf {
        self.base_path.join(format!("{trade_date}.csv"))
    }
}

impl SnapshotPort for CsvSnapshotAdapter {
    fn load_snapshot(&self, trade_date: NaiveDate) -> Result<Vec<StockQuote>, FlowbandError> {
        let path = self.csv_path(trade_date);
        if !path.exists() {
            return Err(FlowbandError::NoData {
                trade_date: trade_date.to_string(),
            });
        }
        read_file(&path)
    }

    fn list_dates(&self) -> Result<Vec<NaiveDate>, FlowbandError> {
        dated_files(&self.base_path, "csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str =
        "code,name,trade_date,time,price,prev_close,open,high,low,pct_chg,amount,main_net_inflow\n";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_standard_header() {
        let data = format!(
            "{HEADER}000001,平安银行,2024-03-01,10:30:00,10.50,10.00,10.05,10.60,10.00,5.0,812345678,45000000\n"
        );
        let quotes = parse_snapshot(data.as_bytes(), "t", None).unwrap();
        assert_eq!(quotes.len(), 1);
        let q = &quotes[0];
        assert_eq!(q.code, "000001");
        assert_eq!(q.time, NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(q.pct_chg, Some(5.0));
        assert_eq!(q.main_net_inflow, 45_000_000.0);
    }

    #[test]
    fn blank_optional_columns() {
        let data = format!("{HEADER}600000,浦发银行,,,8.0,7.9,,,,,100000000,-\n");
        let quotes = parse_snapshot(data.as_bytes(), "t", Some(date(2024, 3, 1))).unwrap();
        let q = &quotes[0];
        assert_eq!(q.trade_date, date(2024, 3, 1));
        assert!(q.time.is_none());
        assert!(q.pct_chg.is_none());
        assert_eq!(q.main_net_inflow, 0.0);
        assert_eq!(q.high, 8.0);
    }

    #[test]
    fn vendor_header() {
        let data = "代码,名称,最新价,昨收,成交额,主力净流入\n300750,宁德时代,180.0,170.0,3000000000,200000000\n";
        let quotes = parse_snapshot(data.as_bytes(), "t", Some(date(2024, 3, 1))).unwrap();
        assert_eq!(quotes[0].code, "300750");
        assert_eq!(quotes[0].prev_close, 170.0);
    }

    #[test]
    fn error_names_the_line() {
        let data = format!("{HEADER}600000,x,2024-03-01,,8.0,7.9,,,,,1e8,0\n600001,y,2024-03-01,,abc,7.9,,,,,1e8,0\n");
        let err = parse_snapshot(data.as_bytes(), "snap.csv", None).unwrap_err();
        match err {
            FlowbandError::SnapshotParse { source_name, reason } => {
                assert_eq!(source_name, "snap.csv");
                assert!(reason.starts_with("line 3"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn directory_adapter() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("2024-03-01.csv"),
            format!("{HEADER}600000,浦发银行,,,8.0,7.9,,,,,100000000,0\n"),
        )
        .unwrap();
        let adapter = CsvSnapshotAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.list_dates().unwrap(), vec![date(2024, 3, 1)]);
        let quotes = adapter.load_snapshot(date(2024, 3, 1)).unwrap();
        assert_eq!(quotes[0].trade_date, date(2024, 3, 1));
        assert!(matches!(
            adapter.load_snapshot(date(2024, 3, 4)),
            Err(FlowbandError::NoData { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = read_file(Path::new("/nonexistent/2024-03-01.csv")).unwrap_err();
        assert!(matches!(err, FlowbandError::SnapshotRead { .. }));
    }
}
