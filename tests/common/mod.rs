#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use flowband::domain::error::FlowbandError;
pub use flowband::domain::quote::StockQuote;
use flowband::ports::snapshot_port::SnapshotPort;
use std::collections::{BTreeMap, HashMap};

pub struct MockSnapshotPort {
    pub snapshots: BTreeMap<NaiveDate, Vec<StockQuote>>,
    pub errors: HashMap<NaiveDate, String>,
}

impl MockSnapshotPort {
    pub fn new() -> Self {
        Self {
            snapshots: BTreeMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_snapshot(mut self, trade_date: NaiveDate, quotes: Vec<StockQuote>) -> Self {
        self.snapshots.insert(trade_date, quotes);
        self
    }

    pub fn with_error(mut self, trade_date: NaiveDate, reason: &str) -> Self {
        self.errors.insert(trade_date, reason.to_string());
        self
    }
}

impl SnapshotPort for MockSnapshotPort {
    fn load_snapshot(&self, trade_date: NaiveDate) -> Result<Vec<StockQuote>, FlowbandError> {
        if let Some(reason) = self.errors.get(&trade_date) {
            return Err(FlowbandError::Storage {
                reason: reason.clone(),
            });
        }
        self.snapshots
            .get(&trade_date)
            .cloned()
            .ok_or_else(|| FlowbandError::NoData {
                trade_date: trade_date.to_string(),
            })
    }

    fn list_dates(&self) -> Result<Vec<NaiveDate>, FlowbandError> {
        Ok(self.snapshots.keys().copied().collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Friday 2024-03-01.
pub fn trade_day() -> NaiveDate {
    date(2024, 3, 1)
}

pub struct QuoteBuilder {
    quote: StockQuote,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
}

/// Quote for `code` on [`trade_day`] at 14:00: price 10.00, previous close
/// 10.00, turnover 500M, no net inflow. Open, high and low equal the price
/// unless set explicitly.
pub fn quote(code: &str) -> QuoteBuilder {
    QuoteBuilder {
        quote: StockQuote {
            code: code.to_string(),
            name: format!("股票{code}"),
            trade_date: trade_day(),
            time: Some(at(14, 0)),
            price: 10.0,
            prev_close: 10.0,
            open: 10.0,
            high: 10.0,
            low: 10.0,
            pct_chg: None,
            amount: 500_000_000.0,
            main_net_inflow: 0.0,
        },
        open: None,
        high: None,
        low: None,
    }
}

impl QuoteBuilder {
    pub fn name(mut self, name: &str) -> Self {
        self.quote.name = name.to_string();
        self
    }

    pub fn on(mut self, trade_date: NaiveDate) -> Self {
        self.quote.trade_date = trade_date;
        self
    }

    pub fn time(mut self, time: Option<NaiveTime>) -> Self {
        self.quote.time = time;
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.quote.price = price;
        self
    }

    pub fn prev_close(mut self, prev_close: f64) -> Self {
        self.quote.prev_close = prev_close;
        self
    }

    pub fn open(mut self, open: f64) -> Self {
        self.open = Some(open);
        self
    }

    pub fn high(mut self, high: f64) -> Self {
        self.high = Some(high);
        self
    }

    pub fn low(mut self, low: f64) -> Self {
        self.low = Some(low);
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.quote.amount = amount;
        self
    }

    /// Net inflow as a share of turnover. Call after `amount`.
    pub fn ratio(mut self, ratio: f64) -> Self {
        self.quote.main_net_inflow = ratio * self.quote.amount;
        self
    }

    pub fn inflow(mut self, inflow: f64) -> Self {
        self.quote.main_net_inflow = inflow;
        self
    }

    pub fn build(self) -> StockQuote {
        let mut q = self.quote;
        q.open = self.open.unwrap_or(q.price);
        q.high = self.high.unwrap_or(q.price.max(q.open));
        q.low = self.low.unwrap_or(q.price.min(q.open));
        q
    }
}
