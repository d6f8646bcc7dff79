//! Flow baselines between two snapshots of the same stock.
//!
//! Vendor inflow and turnover figures are cumulative from the open, so an
//! intraday delta is only meaningful when both snapshots belong to the same
//! trading day. Counters reset at the open, which makes a snapshot from the
//! prior session a zero baseline; anything older is stale.

use crate::domain::calendar::TradingCalendar;
use crate::domain::quote::{flow_ratio, StockQuote};

#[derive(Debug, Clone, PartialEq)]
pub enum Baseline {
    /// No earlier snapshot for this code.
    None,
    /// Earlier snapshot from the same session.
    Intraday(FlowDelta),
    /// Snapshot from the immediately preceding trading day.
    CrossDay {
        delta: FlowDelta,
        previous_close_hint: f64,
    },
    /// Earlier snapshot more than one trading day back.
    Stale { gap: usize },
    /// Earlier snapshot dated after the current one.
    OutOfOrder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowDelta {
    pub inflow_delta: f64,
    pub amount_delta: f64,
    /// Inflow ratio of the activity between the two snapshots.
    pub incremental_ratio: Option<f64>,
    /// Current ratio minus previous ratio; only defined intraday.
    pub ratio_change: Option<f64>,
    /// Current change percent minus previous change percent.
    pub change_delta: Option<f64>,
}

impl Baseline {
    pub fn resolve(
        current: &StockQuote,
        previous: Option<&StockQuote>,
        calendar: &TradingCalendar,
    ) -> Self {
        let Some(prev) = previous else {
            return Baseline::None;
        };

        if prev.trade_date > current.trade_date {
            tracing::warn!(
                code = %current.code,
                current = %current.trade_date,
                previous = %prev.trade_date,
                "previous snapshot is newer than current, ignoring"
            );
            return Baseline::OutOfOrder;
        }

        if prev.trade_date == current.trade_date {
            if let (Some(pt), Some(ct)) = (prev.time, current.time) {
                if pt > ct {
                    tracing::warn!(
                        code = %current.code,
                        "previous snapshot time {} is after current {}, ignoring",
                        pt,
                        ct
                    );
                    return Baseline::OutOfOrder;
                }
            }
            let inflow_delta = current.main_net_inflow - prev.main_net_inflow;
            let amount_delta = current.amount - prev.amount;
            let ratio_change = match (current.flow_ratio(), prev.flow_ratio()) {
                (Some(c), Some(p)) => Some(c - p),
                _ => None,
            };
            return Baseline::Intraday(FlowDelta {
                inflow_delta,
                amount_delta,
                incremental_ratio: flow_ratio(inflow_delta, amount_delta),
                ratio_change,
                change_delta: Some(current.change_pct() - prev.change_pct()),
            });
        }

        let gap = calendar.trading_days_between(prev.trade_date, current.trade_date);
        if gap > 1 {
            return Baseline::Stale { gap };
        }

        Baseline::CrossDay {
            delta: FlowDelta {
                inflow_delta: current.main_net_inflow,
                amount_delta: current.amount,
                incremental_ratio: current.flow_ratio(),
                ratio_change: None,
                change_delta: None,
            },
            previous_close_hint: prev.price,
        }
    }

    pub fn intraday(&self) -> Option<&FlowDelta> {
        match self {
            Baseline::Intraday(delta) => Some(delta),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Baseline::None => "none",
            Baseline::Intraday(_) => "intraday",
            Baseline::CrossDay { .. } => "cross_day",
            Baseline::Stale { .. } => "stale",
            Baseline::OutOfOrder => "out_of_order",
        }
    }
}

/// Fill in a missing previous close from the prior session's last price.
pub fn with_previous_close(mut quote: StockQuote, baseline: &Baseline) -> StockQuote {
    if quote.prev_close <= 0.0 {
        if let Baseline::CrossDay {
            previous_close_hint,
            ..
        } = baseline
        {
            if *previous_close_hint > 0.0 {
                quote.prev_close = *previous_close_hint;
            }
        }
    }
    quote
}
