//! Momentum bands: price tier x flow tier.

use crate::domain::board::Board;
use crate::domain::config::BandThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    LimitUp,
    Surge,
    Rise,
    Flat,
    Dip,
    Slump,
    LimitDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowTier {
    StrongInflow,
    Inflow,
    Neutral,
    Outflow,
    StrongOutflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumBand {
    Breakout,
    Accumulation,
    Advance,
    Absorption,
    Drift,
    Divergence,
    Distribution,
    Breakdown,
}

impl PriceTier {
    pub fn classify(
        board: Board,
        price: f64,
        prev_close: f64,
        change_pct: f64,
        thresholds: &BandThresholds,
    ) -> Self {
        if board.is_limit_up(price, prev_close) {
            return PriceTier::LimitUp;
        }
        if board.is_limit_down(price, prev_close) {
            return PriceTier::LimitDown;
        }
        let n = board.normalized_change(change_pct);
        if n >= thresholds.surge {
            PriceTier::Surge
        } else if n >= thresholds.rise {
            PriceTier::Rise
        } else if n <= -thresholds.surge {
            PriceTier::Slump
        } else if n <= -thresholds.rise {
            PriceTier::Dip
        } else {
            PriceTier::Flat
        }
    }
}

impl FlowTier {
    pub fn classify(ratio: Option<f64>, thresholds: &BandThresholds) -> Self {
        let Some(r) = ratio else {
            return FlowTier::Neutral;
        };
        if r >= thresholds.strong_inflow {
            FlowTier::StrongInflow
        } else if r >= thresholds.inflow {
            FlowTier::Inflow
        } else if r <= -thresholds.strong_inflow {
            FlowTier::StrongOutflow
        } else if r <= -thresholds.inflow {
            FlowTier::Outflow
        } else {
            FlowTier::Neutral
        }
    }}

impl MomentumBand {
    pub fn combine(price: PriceTier, flow: FlowTier) -> Self {
        use FlowTier as F;
        use PriceTier as P;

        if price == P::LimitDown {
            return MomentumBand::Breakdown;
        }
        match (price, flow) {
            (P::LimitUp | P::Surge, F::Inflow | F::StrongInflow) => MomentumBand::Breakout,
            (P::LimitUp | P::Surge | P::Rise, F::Outflow | F::StrongOutflow) => {
                MomentumBand::Divergence
            }
            (P::Rise | P::Flat, F::StrongInflow) => MomentumBand::Accumulation,
            (P::Rise, F::Neutral | F::Inflow) => MomentumBand::Advance,
            (P::Dip | P::Slump, F::Inflow | F::StrongInflow) => MomentumBand::Absorption,
            (P::Slump, _) => MomentumBand::Breakdown,
            (P::Flat | P::Dip, F::StrongOutflow) => MomentumBand::Distribution,
            _ => MomentumBand::Drift,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MomentumBand::Breakout => "breakout",
            MomentumBand::Accumulation => "accumulation",
            MomentumBand::Advance => "advance",
            MomentumBand::Absorption => "absorption",
            MomentumBand::Drift => "drift",
            MomentumBand::Divergence => "divergence",
            MomentumBand::Distribution => "distribution",
            MomentumBand::Breakdown => "breakdown",
        }
    }
}

impl fmt::Display for MomentumBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceTier::LimitUp => "limit_up",
            PriceTier::Surge => "surge",
            PriceTier::Rise => "rise",
            PriceTier::Flat => "flat",
            PriceTier::Dip => "dip",
            PriceTier::Slump => "slump",
            PriceTier::LimitDown => "limit_down",
        };
        f.write_str(s)
    }
}

impl fmt::Display for FlowTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowTier::StrongInflow => "strong_inflow",
            FlowTier::Inflow => "inflow",
            FlowTier::Neutral => "neutral",
            FlowTier::Outflow => "outflow",
            FlowTier::StrongOutflow => "strong_outflow",
        };
        f.write_str(s)
    }
}
