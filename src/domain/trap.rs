//! Trap-signal detection.
//!
//! A trap is a price pattern that looks like strength but is not backed by
//! main capital, or strength that is visibly being sold into. Price
//! distances are measured in limit units so the same thresholds apply to
//! 10cm and 20cm boards.

use crate::domain::board::Board;
use crate::domain::calendar::elapsed_trading_minutes;
use crate::domain::config::TrapThresholds;
use crate::domain::flow::Baseline;
use crate::domain::quote::StockQuote;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrapKind {
    /// Price pushed up while main capital leaves.
    LureUp,
    /// Touched limit-up, then the seal broke.
    BrokenLimit,
    /// Large give-back from the session high.
    HighFade,
    /// Opened strong, sold down below the open.
    GapFade,
    /// Inflow ratio deteriorating intraday while price holds.
    FlowReversal,
    /// Turnover too thin for the inflow ratio to mean much.
    ThinTurnover,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapSignal {
    pub kind: TrapKind,
    pub severity: Severity,
}

impl TrapKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrapKind::LureUp => "lure_up",
            TrapKind::BrokenLimit => "broken_limit",
            TrapKind::HighFade => "high_fade",
            TrapKind::GapFade => "gap_fade",
            TrapKind::FlowReversal => "flow_reversal",
            TrapKind::ThinTurnover => "thin_turnover",
        }
    }
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run every detector against one quote. `quote.prev_close` must already be
/// resolved (see `flow::with_previous_close`).
pub fn detect(
    board: Board,
    quote: &StockQuote,
    baseline: &Baseline,
    thresholds: &TrapThresholds,
) -> Vec<TrapSignal> {
    let mut signals = Vec::new();
    let prev_close = quote.prev_close;
    if prev_close <= 0.0 {
        return signals;
    }

    let limit = board.limit_pct();
    let to_units = |distance: f64| distance / prev_close * 100.0 / limit;
    let change = board.normalized_change(quote.change_pct());
    let ratio = quote.flow_ratio();

    if let Some(r) = ratio {
        if change >= thresholds.lure_min_change && r <= -thresholds.lure_outflow_ratio {
            signals.push(TrapSignal {
                kind: TrapKind::LureUp,
                severity: Severity::High,
            });
        }
    }

    let (_, limit_up) = board.limit_prices(prev_close);
    let touched_limit = board.is_limit_up(quote.high, prev_close);
    let sealed = board.is_limit_up(quote.price, prev_close);
    if touched_limit && !sealed {
        let severity = if ratio.is_some_and(|r| r < 0.0) {
            Severity::High
        } else {
            Severity::Medium
        };
        tracing::debug!(
            code = %quote.code,
            limit_up,
            price = quote.price,
            "limit-up seal broken"
        );
        signals.push(TrapSignal {
            kind: TrapKind::BrokenLimit,
            severity,
        });
    }

    if quote.high > quote.price && to_units(quote.high - quote.price) >= thresholds.fade_from_high
    {
        signals.push(TrapSignal {
            kind: TrapKind::HighFade,
            severity: Severity::Medium,
        });
    }

    if quote.open > 0.0
        && to_units(quote.open - prev_close) >= thresholds.gap_open
        && to_units(quote.open - quote.price) >= thresholds.gap_fade
    {
        signals.push(TrapSignal {
            kind: TrapKind::GapFade,
            severity: Severity::Medium,
        });
    }

    if let Some(delta) = baseline.intraday() {
        let warmed_up = quote
            .time
            .map(|t| elapsed_trading_minutes(t) >= thresholds.min_elapsed_minutes)
            .unwrap_or(true);
        let price_held = delta.change_delta.is_some_and(|d| d >= 0.0);
        let dropped = delta
            .ratio_change
            .is_some_and(|c| c <= -thresholds.reversal_drop);
        if warmed_up && price_held && dropped {
            signals.push(TrapSignal {
                kind: TrapKind::FlowReversal,
                severity: Severity::Medium,
            });
        }
    }

    if quote.amount < thresholds.min_amount {
        signals.push(TrapSignal {
            kind: TrapKind::ThinTurnover,
            severity: Severity::Low,
        });
    }

    signals
}

pub fn max_severity(signals: &[TrapSignal]) -> Option<Severity> {
    signals.iter().map(|s| s.severity).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::TradingCalendar;
    use chrono::{NaiveDate, NaiveTime};

    fn quote(price: f64, high: f64, open: f64, inflow: f64) -> StockQuote {
        StockQuote {
            code: "600000".into(),
            name: "浦发银行".into(),
            trade_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            time: NaiveTime::from_hms_opt(14, 0, 0),
            price,
            prev_close: 10.0,
            open,
            high,
            low: 9.9,
            pct_chg: None,
            amount: 500_000_000.0,
            main_net_inflow: inflow,
        }
    }

    fn kinds(signals: &[TrapSignal]) -> Vec<TrapKind> {
        signals.iter().map(|s| s.kind).collect()
    }

    fn th() -> TrapThresholds {
        TrapThresholds::default()
    }

    #[test]
    fn clean_uptrend_has_no_traps() {
        let q = quote(10.5, 10.55, 10.1, 40_000_000.0);
        assert!(detect(Board::MainBoard, &q, &Baseline::None, &th()).is_empty());
    }

    #[test]
    fn lure_up_when_price_up_and_money_out() {
        // +5% with -8% ratio
        let q = quote(10.5, 10.5, 10.1, -40_000_000.0);
        let signals = detect(Board::MainBoard, &q, &Baseline::None, &th());
        assert_eq!(kinds(&signals), vec![TrapKind::LureUp]);
        assert_eq!(max_severity(&signals), Some(Severity::High));
    }

    #[test]
    fn broken_limit_medium_with_inflow() {
        let q = quote(10.8, 11.0, 10.2, 10_000_000.0);
        let signals = detect(Board::MainBoard, &q, &Baseline::None, &th());
        assert!(signals.contains(&TrapSignal {
            kind: TrapKind::BrokenLimit,
            severity: Severity::Medium,
        }));
    }

    #[test]
    fn broken_limit_high_with_outflow() {
        let q = quote(10.8, 11.0, 10.2, -1_000_000.0);
        let signals = detect(Board::MainBoard, &q, &Baseline::None, &th());
        assert!(signals.contains(&TrapSignal {
            kind: TrapKind::BrokenLimit,
            severity: Severity::High,
        }));
    }

    #[test]
    fn sealed_limit_up_is_not_broken() {
        let q = quote(11.0, 11.0, 10.2, 50_000_000.0);
        let signals = detect(Board::MainBoard, &q, &Baseline::None, &th());
        assert!(!kinds(&signals).contains(&TrapKind::BrokenLimit));
    }

    #[test]
    fn twenty_cm_needs_twenty_percent_to_touch_limit() {
        let q = quote(10.8, 11.0, 10.2, 10_000_000.0);
        let signals = detect(Board::ChiNext, &q, &Baseline::None, &th());
        assert!(!kinds(&signals).contains(&TrapKind::BrokenLimit));
    }

    #[test]
    fn high_fade_from_session_high() {
        // gave back 6% of a 10% band = 0.6 units
        let q = quote(10.2, 10.8, 10.1, 10_000_000.0);
        let signals = detect(Board::MainBoard, &q, &Baseline::None, &th());
        assert!(kinds(&signals).contains(&TrapKind::HighFade));
    }

    #[test]
    fn gap_fade_after_strong_open() {
        // opened +4%, now +0.5%
        let q = quote(10.05, 10.45, 10.4, 10_000_000.0);
        let signals = detect(Board::MainBoard, &q, &Baseline::None, &th());
        assert!(kinds(&signals).contains(&TrapKind::GapFade));
    }

    #[test]
    fn flow_reversal_needs_intraday_baseline() {
        let cal = TradingCalendar::default();
        let mut prev = quote(10.4, 10.45, 10.1, 60_000_000.0);
        prev.time = NaiveTime::from_hms_opt(10, 30, 0);
        prev.amount = 300_000_000.0;
        // ratio 0.20 -> 0.06, price still rising
        let cur = quote(10.5, 10.55, 10.1, 30_000_000.0);
        let baseline = Baseline::resolve(&cur, Some(&prev), &cal);
        let signals = detect(Board::MainBoard, &cur, &baseline, &th());
        assert!(kinds(&signals).contains(&TrapKind::FlowReversal));

        let signals = detect(Board::MainBoard, &cur, &Baseline::None, &th());
        assert!(!kinds(&signals).contains(&TrapKind::FlowReversal));
    }

    #[test]
    fn flow_reversal_suppressed_in_opening_minutes() {
        let cal = TradingCalendar::default();
        let mut prev = quote(10.4, 10.45, 10.1, 60_000_000.0);
        prev.time = NaiveTime::from_hms_opt(9, 31, 0);
        prev.amount = 300_000_000.0;
        let mut cur = quote(10.5, 10.55, 10.1, 30_000_000.0);
        cur.time = NaiveTime::from_hms_opt(9, 35, 0);
        let baseline = Baseline::resolve(&cur, Some(&prev), &cal);
        let signals = detect(Board::MainBoard, &cur, &baseline, &th());
        assert!(!kinds(&signals).contains(&TrapKind::FlowReversal));
    }

    #[test]
    fn thin_turnover_is_low_severity() {
        let mut q = quote(10.5, 10.55, 10.1, 1_000_000.0);
        q.amount = 10_000_000.0;
        let signals = detect(Board::MainBoard, &q, &Baseline::None, &th());
        assert_eq!(kinds(&signals), vec![TrapKind::ThinTurnover]);
        assert_eq!(max_severity(&signals), Some(Severity::Low));
    }
}
