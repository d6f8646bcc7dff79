//! Intraday quote snapshot rows.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One stock's state at a snapshot instant. Money fields are in CNY,
/// `pct_chg` is in percent (5.0 = +5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuote {
    pub code: String,
    pub name: String,
    pub trade_date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub price: f64,
    pub prev_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub pct_chg: Option<f64>,
    pub amount: f64,
    pub main_net_inflow: f64,
}

/// Why a quote row cannot be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QuoteIssue {
    #[error("non-positive price")]
    NonPositivePrice,

    #[error("non-positive previous close")]
    NonPositivePrevClose,

    #[error("no turnover (suspended)")]
    Suspended,

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}

impl StockQuote {
    /// Change versus previous close in percent. The vendor's figure wins
    /// when present since it already accounts for ex-rights adjustments.
    pub fn change_pct(&self) -> f64 {
        if let Some(pct) = self.pct_chg.filter(|p| p.is_finite()) {
            return pct;
        }
        if self.prev_close <= 0.0 {
            return 0.0;
        }
        (self.price - self.prev_close) / self.prev_close * 100.0
    }

    /// main_net_inflow / amount
    pub fn flow_ratio(&self) -> Option<f64> {
        flow_ratio(self.main_net_inflow, self.amount)
    }

    /// Six-digit code without exchange prefix or suffix ("sh600000",
    /// "600000.SH" and "SH600000" all become "600000").
    pub fn bare_code(&self) -> &str {
        bare_code(&self.code)
    }

    pub fn is_st(&self) -> bool {
        self.name.to_uppercase().contains("ST")
    }

    pub fn validate(&self) -> Result<(), QuoteIssue> {
        let fields = [
            ("price", self.price),
            ("prev_close", self.prev_close),
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("amount", self.amount),
            ("main_net_inflow", self.main_net_inflow),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(QuoteIssue::NonFinite(name));
            }
        }
        if self.price <= 0.0 {
            return Err(QuoteIssue::NonPositivePrice);
        }
        if self.prev_close <= 0.0 {
            return Err(QuoteIssue::NonPositivePrevClose);
        }
        if self.amount <= 0.0 {
            return Err(QuoteIssue::Suspended);
        }
        Ok(())
    }
}

/// The inflow ratio used everywhere: net main-capital inflow as a share of
/// the day's turnover. `None` when there is no turnover to divide by.
pub fn flow_ratio(main_net_inflow: f64, amount: f64) -> Option<f64> {
    if amount > 0.0 && main_net_inflow.is_finite() {
        Some(main_net_inflow / amount)
    } else {
        None
    }
}

pub fn bare_code(code: &str) -> &str {
    let code = code.trim();
    let code = match code.split_once('.') {
        Some((head, _)) => head,
        None => code,
    };
    let lower = code.get(..2).map(|p| p.to_ascii_lowercase());
    match lower.as_deref() {
        Some("sh") | Some("sz") | Some("bj") => &code[2..],
        _ => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quote() -> StockQuote {
        StockQuote {
            code: "600519.SH".into(),
            name: "贵州茅台".into(),
            trade_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0),
            price: 1720.0,
            prev_close: 1700.0,
            open: 1705.0,
            high: 1730.0,
            low: 1698.0,
            pct_chg: None,
            amount: 2_000_000_000.0,
            main_net_inflow: 150_000_000.0,
        }
    }

    #[test]
    fn change_pct_derived_from_prices() {
        assert_relative_eq!(quote().change_pct(), 20.0 / 1700.0 * 100.0);
    }

    #[test]
    fn change_pct_prefers_vendor_value() {
        let mut q = quote();
        q.pct_chg = Some(1.5);
        assert_relative_eq!(q.change_pct(), 1.5);
    }

    #[test]
    fn change_pct_zero_without_prev_close() {
        let mut q = quote();
        q.prev_close = 0.0;
        assert_eq!(q.change_pct(), 0.0);
    }

    #[test]
    fn flow_ratio_is_inflow_over_amount() {
        assert_relative_eq!(quote().flow_ratio().unwrap(), 0.075);
    }

    #[test]
    fn flow_ratio_none_without_amount() {
        let mut q = quote();
        q.amount = 0.0;
        assert!(q.flow_ratio().is_none());
    }

    #[test]
    fn bare_code_strips_exchange_markers() {
        assert_eq!(bare_code("600519.SH"), "600519");
        assert_eq!(bare_code("sz000001"), "000001");
        assert_eq!(bare_code("BJ830799"), "830799");
        assert_eq!(bare_code(" 300750 "), "300750");
    }

    #[test]
    fn is_st_matches_star_st() {
        let mut q = quote();
        q.name = "*ST 海润".into();
        assert!(q.is_st());
        q.name = "平安银行".into();
        assert!(!q.is_st());
    }

    #[test]
    fn validate_rejects_suspended() {
        let mut q = quote();
        q.amount = 0.0;
        assert_eq!(q.validate(), Err(QuoteIssue::Suspended));
    }

    #[test]
    fn validate_rejects_non_finite() {
        let mut q = quote();
        q.high = f64::NAN;
        assert_eq!(q.validate(), Err(QuoteIssue::NonFinite("high")));
    }

    #[test]
    fn validate_accepts_normal_row() {
        assert!(quote().validate().is_ok());
    }
}
