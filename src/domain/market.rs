//! Market-wide breadth statistics and regime classification.

use crate::domain::board::Board;
use crate::domain::percentile::PercentileTable;
use crate::domain::quote::flow_ratio;
use crate::domain::scanner::ScanResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Change below this magnitude (percent) counts as unchanged.
const FLAT_EPSILON: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    Frenzy,
    Bullish,
    Divergent,
    Bearish,
    Panic,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketRegime::Frenzy => "frenzy",
            MarketRegime::Bullish => "bullish",
            MarketRegime::Divergent => "divergent",
            MarketRegime::Bearish => "bearish",
            MarketRegime::Panic => "panic",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardStats {
    pub board: Board,
    pub count: usize,
    pub up: usize,
    pub down: usize,
    pub limit_up: usize,
    pub limit_down: usize,
    pub avg_change: f64,
    pub flow_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub total: usize,
    pub up: usize,
    pub down: usize,
    pub flat: usize,
    pub limit_up: usize,
    pub limit_down: usize,
    pub broken_limit: usize,
    pub median_change: f64,
    /// Total inflow over total turnover.
    pub aggregate_flow_ratio: Option<f64>,
    pub p90_flow_ratio: Option<f64>,
    /// limit_up / (limit_up + broken_limit)
    pub seal_rate: Option<f64>,
    pub regime: MarketRegime,
    pub boards: Vec<BoardStats>,
}

impl MarketSummary {
    pub fn compute(results: &[ScanResult]) -> Self {
        let total = results.len();
        let mut up = 0;
        let mut down = 0;
        let mut flat = 0;
        let mut limit_up = 0;
        let mut limit_down = 0;
        let mut broken_limit = 0;
        let mut inflow_sum = 0.0;
        let mut amount_sum = 0.0;

        for r in results {
            if r.change_pct.abs() < FLAT_EPSILON {
                flat += 1;
            } else if r.change_pct > 0.0 {
                up += 1;
            } else {
                down += 1;
            }
            if r.is_limit_up() {
                limit_up += 1;
            }
            if r.is_limit_down() {
                limit_down += 1;
            }
            if r.broke_limit() {
                broken_limit += 1;
            }
            inflow_sum += r.main_net_inflow;
            amount_sum += r.amount;
        }

        let changes = PercentileTable::new(results.iter().map(|r| r.change_pct));
        let median_change = changes.value_at(0.5).unwrap_or(0.0);

        let ratios = PercentileTable::new(results.iter().filter_map(|r| r.flow_ratio));
        let p90_flow_ratio = ratios.value_at(0.9);

        let seal_rate = if limit_up + broken_limit > 0 {
            Some(limit_up as f64 / (limit_up + broken_limit) as f64)
        } else {
            None
        };

        let regime = classify_regime(total, up, limit_up, limit_down);

        Self {
            total,
            up,
            down,
            flat,
            limit_up,
            limit_down,
            broken_limit,
            median_change,
            aggregate_flow_ratio: flow_ratio(inflow_sum, amount_sum),
            p90_flow_ratio,
            seal_rate,
            regime,
            boards: board_breakdown(results),
        }
    }
}

fn classify_regime(total: usize, up: usize, limit_up: usize, limit_down: usize) -> MarketRegime {
    if total == 0 {
        return MarketRegime::Divergent;
    }
    let n = total as f64;
    let up_share = up as f64 / n;
    let limit_up_share = limit_up as f64 / n;
    let limit_down_share = limit_down as f64 / n;

    if up_share >= 0.7 && limit_up_share >= 0.02 {
        MarketRegime::Frenzy
    } else if up_share >= 0.6 {
        MarketRegime::Bullish
    } else if up_share <= 0.2 && limit_down >= 2 * limit_up && limit_down_share >= 0.01 {
        MarketRegime::Panic
    } else if up_share <= 0.3 {
        MarketRegime::Bearish
    } else {
        MarketRegime::Divergent
    }
}

fn board_breakdown(results: &[ScanResult]) -> Vec<BoardStats> {
    Board::ALL
        .iter()
        .filter_map(|&board| {
            let members: Vec<&ScanResult> = results.iter().filter(|r| r.board == board).collect();
            if members.is_empty() {
                return None;
            }
            let count = members.len();
            let inflow: f64 = members.iter().map(|r| r.main_net_inflow).sum();
            let amount: f64 = members.iter().map(|r| r.amount).sum();
            Some(BoardStats {
                board,
                count,
                up: members.iter().filter(|r| r.change_pct >= FLAT_EPSILON).count(),
                down: members.iter().filter(|r| r.change_pct <= -FLAT_EPSILON).count(),
                limit_up: members.iter().filter(|r| r.is_limit_up()).count(),
                limit_down: members.iter().filter(|r| r.is_limit_down()).count(),
                avg_change: members.iter().map(|r| r.change_pct).sum::<f64>() / count as f64,
                flow_ratio: flow_ratio(inflow, amount),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_thresholds() {
        assert_eq!(classify_regime(0, 0, 0, 0), MarketRegime::Divergent);
        assert_eq!(classify_regime(100, 75, 3, 0), MarketRegime::Frenzy);
        assert_eq!(classify_regime(100, 75, 1, 0), MarketRegime::Bullish);
        assert_eq!(classify_regime(100, 62, 0, 0), MarketRegime::Bullish);
        assert_eq!(classify_regime(100, 45, 2, 2), MarketRegime::Divergent);
        assert_eq!(classify_regime(100, 25, 0, 0), MarketRegime::Bearish);
        assert_eq!(classify_regime(100, 10, 1, 5), MarketRegime::Panic);
        assert_eq!(classify_regime(100, 10, 3, 5), MarketRegime::Bearish);
    }
}
