//! JSON snapshot files.
//!
//! A snapshot file is either a bare array of quote rows or a wrapper object
//! carrying the date and capture time for every row:
//!
//! ```json
//! {"trade_date": "2024-03-01", "time": "10:30:00", "stocks": [ ... ]}
//! ```
//!
//! Rows without their own date fall back to the wrapper's date, then to the
//! file name (`2024-03-01.json`).

use crate::adapters::quote_record::{parse_date, parse_time, QuoteRecord};
use crate::adapters::snapshot_file::{date_from_stem, dated_files};
use crate::domain::error::FlowbandError;
use crate::domain::quote::StockQuote;
use crate::ports::snapshot_port::SnapshotPort;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct WrappedSnapshot {
    #[serde(default, alias = "date")]
    trade_date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(alias = "data", alias = "quotes")]
    stocks: Vec<Value>,
}

/// Parse snapshot JSON. `default_date` applies to rows and wrappers that
/// carry no date. Row errors name the 1-based row.
pub fn parse_snapshot(
    content: &str,
    source_name: &str,
    default_date: Option<NaiveDate>,
) -> Result<Vec<StockQuote>, FlowbandError> {
    let parse_err = |reason: String| FlowbandError::SnapshotParse {
        source_name: source_name.to_string(),
        reason,
    };

    let document: Value = serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;

    let (rows, date, time) = match document {
        Value::Array(rows) => (rows, default_date, None),
        wrapper @ Value::Object(_) => {
            let wrapped: WrappedSnapshot =
                serde_json::from_value(wrapper).map_err(|e| parse_err(e.to_string()))?;
            let date = match wrapped.trade_date {
                Some(s) => Some(
                    parse_date(&s).ok_or_else(|| parse_err(format!("invalid trade_date {s}")))?,
                ),
                None => default_date,
            };
            let time = match wrapped.time {
                Some(s) => {
                    Some(parse_time(&s).ok_or_else(|| parse_err(format!("invalid time {s}")))?)
                }
                None => None,
            };
            (wrapped.stocks, date, time)
        }
        _ => {
            return Err(parse_err(
                "expected an array of rows or an object with a stocks array".into(),
            ));
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let row_err = |reason: String| parse_err(format!("row {}: {reason}", i + 1));
            let record: QuoteRecord =
                serde_json::from_value(row).map_err(|e| row_err(e.to_string()))?;
            record.into_quote(date, time).map_err(|e| row_err(e.to_string()))
        })
        .collect()
}

/// Read a single snapshot file. The file stem is the fallback trade date.
pub fn read_file(path: &Path) -> Result<Vec<StockQuote>, FlowbandError> {
    let source_name = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| FlowbandError::SnapshotRead {
        source_name: source_name.clone(),
        reason: e.to_string(),
    })?;
    let quotes = parse_snapshot(&content, &source_name, date_from_stem(path))?;
    tracing::debug!(file = %source_name, rows = quotes.len(), "loaded JSON snapshot");
    Ok(quotes)
}

/// Directory of `<YYYY-MM-DD>.json` snapshots.
pub struct JsonSnapshotAdapter {
    base_path: PathBuf,
}

impl JsonSnapshotAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn snapshot_path(&self, trade_date: NaiveDate) -> PathBuf {
        self.base_path.join(format!("{trade_date}.json"))
    }
}

impl SnapshotPort for JsonSnapshotAdapter {
    fn load_snapshot(&self, trade_date: NaiveDate) -> Result<Vec<StockQuote>, FlowbandError> {
        let path = self.snapshot_path(trade_date);
        if !path.exists() {
            return Err(FlowbandError::NoData {
                trade_date: trade_date.to_string(),
            });
        }
        read_file(&path)
    }

    fn list_dates(&self) -> Result<Vec<NaiveDate>, FlowbandError> {
        dated_files(&self.base_path, "json")
    }
}
