//! SQLite snapshot store.
//!
//! One row per (code, trade_date). Re-importing a date replaces the stored
//! rows for the same codes, so the store always holds the latest capture
//! of each day.

use crate::domain::error::FlowbandError;
use crate::domain::quote::StockQuote;
use crate::ports::config_port::ConfigPort;
use crate::ports::snapshot_port::SnapshotPort;
use chrono::{NaiveDate, NaiveTime};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> FlowbandError {
    FlowbandError::Storage {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> FlowbandError {
    FlowbandError::StorageQuery {
        reason: e.to_string(),
    }
}

fn parse_column<T>(
    idx: usize,
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, chrono::ParseError>,
) -> rusqlite::Result<T> {
    parse(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FlowbandError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| FlowbandError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).clamp(1, 64) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        tracing::debug!(path = %db_path, pool_size, "opened snapshot store");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, FlowbandError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, FlowbandError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), FlowbandError> {
        let conn = self.connection()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS quotes (
                code TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                name TEXT NOT NULL,
                time TEXT,
                price REAL NOT NULL,
                prev_close REAL NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                pct_chg REAL,
                amount REAL NOT NULL,
                main_net_inflow REAL NOT NULL,
                PRIMARY KEY (code, trade_date)
            );
            CREATE INDEX IF NOT EXISTS idx_quotes_trade_date ON quotes(trade_date);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    /// Upsert quotes in one transaction. Returns the number of rows written.
    pub fn insert_quotes(&self, quotes: &[StockQuote]) -> Result<usize, FlowbandError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().map_err(query_error)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO quotes
                     (code, trade_date, name, time, price, prev_close, open, high, low,
                      pct_chg, amount, main_net_inflow)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                )
                .map_err(query_error)?;

            for q in quotes {
                stmt.execute(params![
                    q.code,
                    q.trade_date.format(DATE_FORMAT).to_string(),
                    q.name,
                    q.time.map(|t| t.format(TIME_FORMAT).to_string()),
                    q.price,
                    q.prev_close,
                    q.open,
                    q.high,
                    q.low,
                    q.pct_chg,
                    q.amount,
                    q.main_net_inflow,
                ])
                .map_err(query_error)?;
            }
        }

        tx.commit().map_err(query_error)?;
        tracing::info!(rows = quotes.len(), "stored snapshot rows");
        Ok(quotes.len())
    }

    /// First date, last date and number of stored dates.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, FlowbandError> {
        let dates = self.list_dates()?;
        match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => Ok(Some((*first, *last, dates.len()))),
            _ => Ok(None),
        }
    }
}

impl SnapshotPort for SqliteAdapter {
    fn load_snapshot(&self, trade_date: NaiveDate) -> Result<Vec<StockQuote>, FlowbandError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare(
                "SELECT code, trade_date, name, time, price, prev_close, open, high, low,
                        pct_chg, amount, main_net_inflow
                 FROM quotes
                 WHERE trade_date = ?1
                 ORDER BY code ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![trade_date.format(DATE_FORMAT).to_string()], |row| {
                let date_str: String = row.get(1)?;
                let time_str: Option<String> = row.get(3)?;
                let time = match time_str {
                    Some(s) => Some(parse_column(3, &s, |v| {
                        NaiveTime::parse_from_str(v, TIME_FORMAT)
                    })?),
                    None => None,
                };
                Ok(StockQuote {
                    code: row.get(0)?,
                    trade_date: parse_column(1, &date_str, |v| {
                        NaiveDate::parse_from_str(v, DATE_FORMAT)
                    })?,
                    name: row.get(2)?,
                    time,
                    price: row.get(4)?,
                    prev_close: row.get(5)?,
                    open: row.get(6)?,
                    high: row.get(7)?,
                    low: row.get(8)?,
                    pct_chg: row.get(9)?,
                    amount: row.get(10)?,
                    main_net_inflow: row.get(11)?,
                })
            })
            .map_err(query_error)?;

        let mut quotes = Vec::new();
        for row in rows {
            quotes.push(row.map_err(query_error)?);
        }

        if quotes.is_empty() {
            return Err(FlowbandError::NoData {
                trade_date: trade_date.to_string(),
            });
        }
        Ok(quotes)
    }

    fn list_dates(&self) -> Result<Vec<NaiveDate>, FlowbandError> {
        let conn = self.connection()?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT trade_date FROM quotes ORDER BY trade_date ASC")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                let s: String = row.get(0)?;
                parse_column(0, &s, |v| NaiveDate::parse_from_str(v, DATE_FORMAT))
            })
            .map_err(query_error)?;

        let mut dates = Vec::new();
        for row in rows {
            dates.push(row.map_err(query_error)?);
        }
        Ok(dates)
    }

    fn previous_date(&self, before: NaiveDate) -> Result<Option<NaiveDate>, FlowbandError> {
        let conn = self.connection()?;

        let latest: Option<String> = conn
            .query_row(
                "SELECT MAX(trade_date) FROM quotes WHERE trade_date < ?1",
                params![before.format(DATE_FORMAT).to_string()],
                |row| row.get(0),
            )
            .map_err(query_error)?;

        latest
            .map(|s| {
                NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| FlowbandError::Storage {
                    reason: format!("bad stored date {s}: {e}"),
                })
            })
            .transpose()
    }
}
