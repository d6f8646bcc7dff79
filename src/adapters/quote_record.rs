//! Serde record for vendor quote rows, shared by the JSON and CSV adapters.
//!
//! Vendor dumps disagree on field names and types: AkShare exports use
//! Chinese column names, Tushare writes dates as `YYYYMMDD`, some exports
//! store codes as integers (dropping leading zeros) and use `-` for missing
//! numbers. This record accepts all of those and converts to a
//! [`StockQuote`].

use crate::domain::quote::StockQuote;
use chrono::{NaiveDate, NaiveTime};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRecord {
    #[serde(
        alias = "代码",
        alias = "symbol",
        alias = "ts_code",
        deserialize_with = "code_string"
    )]
    pub code: String,
    #[serde(default, alias = "名称")]
    pub name: String,
    #[serde(default, alias = "date", alias = "日期", deserialize_with = "lenient_string")]
    pub trade_date: Option<String>,
    #[serde(default, alias = "时间", deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, alias = "最新价", alias = "close", deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, alias = "昨收", alias = "pre_close", deserialize_with = "lenient_f64")]
    pub prev_close: Option<f64>,
    #[serde(default, alias = "今开", deserialize_with = "lenient_f64")]
    pub open: Option<f64>,
    #[serde(default, alias = "最高", deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
    #[serde(default, alias = "最低", deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(default, alias = "涨跌幅", alias = "change_pct", deserialize_with = "lenient_f64")]
    pub pct_chg: Option<f64>,
    #[serde(default, alias = "成交额", alias = "daily_amount", deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    #[serde(
        default,
        alias = "主力净流入",
        alias = "今日主力净流入-净额",
        deserialize_with = "lenient_f64"
    )]
    pub main_net_inflow: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("{code}: missing trade date")]
    MissingDate { code: String },

    #[error("{code}: invalid trade date {value}")]
    InvalidDate { code: String, value: String },

    #[error("{code}: invalid time {value}")]
    InvalidTime { code: String, value: String },

    #[error("{code}: missing price")]
    MissingPrice { code: String },
}

impl QuoteRecord {
    /// Convert to a domain quote. `default_date` / `default_time` apply when
    /// the row itself carries none (e.g. a wrapped snapshot document).
    pub fn into_quote(
        self,
        default_date: Option<NaiveDate>,
        default_time: Option<NaiveTime>,
    ) -> Result<StockQuote, RecordError> {
        let trade_date = match self.trade_date.as_deref() {
            Some(s) => parse_date(s).ok_or_else(|| RecordError::InvalidDate {
                code: self.code.clone(),
                value: s.to_string(),
            })?,
            None => default_date.ok_or_else(|| RecordError::MissingDate {
                code: self.code.clone(),
            })?,
        };

        let time = match self.time.as_deref() {
            Some(s) => Some(parse_time(s).ok_or_else(|| RecordError::InvalidTime {
                code: self.code.clone(),
                value: s.to_string(),
            })?),
            None => default_time,
        };

        let price = self.price.ok_or_else(|| RecordError::MissingPrice {
            code: self.code.clone(),
        })?;

        Ok(StockQuote {
            code: self.code,
            name: self.name,
            trade_date,
            time,
            price,
            prev_close: self.prev_close.unwrap_or(0.0),
            open: self.open.unwrap_or(0.0),
            high: self.high.unwrap_or(price).max(price),
            low: self.low.unwrap_or(price).min(price),
            pct_chg: self.pct_chg,
            amount: self.amount.unwrap_or(0.0),
            main_net_inflow: self.main_net_inflow.unwrap_or(0.0),
        })
    }
}

/// `YYYY-MM-DD` or `YYYYMMDD`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

/// `HH:MM:SS` or `HH:MM`.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

struct LenientF64;

impl<'de> Visitor<'de> for LenientF64 {
    type Value = Option<f64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string, or a blank")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let v = v.trim();
        if v.is_empty() || v == "-" || v == "--" {
            return Ok(None);
        }
        v.parse::<f64>()
            .map(Some)
            .map_err(|_| E::custom(format!("not a number: {v}")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(LenientF64)
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    d.deserialize_any(LenientF64)
}

struct LenientString;

impl<'de> Visitor<'de> for LenientString {
    type Value = Option<String>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, a number, or a blank")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let v = v.trim();
        if v.is_empty() {
            Ok(None)
        } else {
            Ok(Some(v.to_string()))
        }
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(LenientString)
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    d.deserialize_any(LenientString)
}

/// Integer codes lost their leading zeros somewhere upstream; pad back to
/// six digits.
fn code_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    struct CodeVisitor;

    impl<'de> Visitor<'de> for CodeVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a stock code")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            if v.is_empty() {
                return Err(E::custom("empty stock code"));
            }
            if v.len() < 6 && v.bytes().all(|b| b.is_ascii_digit()) {
                return Ok(format!("{v:0>6}"));
            }
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(format!("{v:06}"))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            if v < 0 {
                return Err(E::custom("negative stock code"));
            }
            Ok(format!("{v:06}"))
        }
    }

    d.deserialize_any(CodeVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> QuoteRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn english_field_names() {
        let r = record(
            r#"{"code":"600519","name":"贵州茅台","trade_date":"2024-03-01","time":"10:30:00",
                "price":1720.0,"prev_close":1700.0,"open":1705.0,"high":1730.0,"low":1698.0,
                "amount":2000000000,"main_net_inflow":150000000}"#,
        );
        let q = r.into_quote(None, None).unwrap();
        assert_eq!(q.code, "600519");
        assert_eq!(q.trade_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(q.time, NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(q.amount, 2_000_000_000.0);
        assert!(q.pct_chg.is_none());
    }

    #[test]
    fn vendor_aliases() {
        let r = record(
            r#"{"代码":"000001","名称":"平安银行","最新价":10.5,"昨收":10.0,"今开":10.1,
                "最高":10.6,"最低":10.0,"涨跌幅":5.0,"成交额":"812345678.0","今日主力净流入-净额":"-"}"#,
        );
        let q = r
            .into_quote(NaiveDate::from_ymd_opt(2024, 3, 1), None)
            .unwrap();
        assert_eq!(q.name, "平安银行");
        assert_eq!(q.pct_chg, Some(5.0));
        assert_eq!(q.amount, 812_345_678.0);
        assert_eq!(q.main_net_inflow, 0.0);
    }

    #[test]
    fn integer_code_padded() {
        let r = record(r#"{"code":1,"price":10.0,"trade_date":"20240301"}"#);
        let q = r.into_quote(None, None).unwrap();
        assert_eq!(q.code, "000001");
        assert_eq!(q.trade_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn missing_date_without_default() {
        let r = record(r#"{"code":"600000","price":10.0}"#);
        assert_eq!(
            r.into_quote(None, None).unwrap_err(),
            RecordError::MissingDate {
                code: "600000".into()
            }
        );
    }

    #[test]
    fn missing_price() {
        let r = record(r#"{"code":"600000","trade_date":"2024-03-01"}"#);
        assert!(matches!(
            r.into_quote(None, None),
            Err(RecordError::MissingPrice { .. })
        ));
    }

    #[test]
    fn high_low_default_to_price() {
        let r = record(r#"{"code":"600000","trade_date":"2024-03-01","price":10.0}"#);
        let q = r.into_quote(None, None).unwrap();
        assert_eq!(q.high, 10.0);
        assert_eq!(q.low, 10.0);
    }

    #[test]
    fn short_time_format() {
        assert_eq!(parse_time("14:05"), NaiveTime::from_hms_opt(14, 5, 0));
        assert!(parse_time("25:00").is_none());
    }

    #[test]
    fn bad_number_is_an_error() {
        let result: Result<QuoteRecord, _> =
            serde_json::from_str(r#"{"code":"600000","price":"abc"}"#);
        assert!(result.is_err());
    }
}
