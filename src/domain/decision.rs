//! Decision tags: the final risk/opportunity verdict per stock.

use crate::domain::band::MomentumBand;
use crate::domain::config::DecisionThresholds;
use crate::domain::trap::{max_severity, Severity, TrapSignal};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionTag {
    Attack,
    Watch,
    Neutral,
    Avoid,
    Trap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Opportunity,
    Neutral,
    Risk,
}

impl DecisionTag {
    pub fn decide(
        band: MomentumBand,
        signals: &[TrapSignal],
        flow_rank: f64,
        thresholds: &DecisionThresholds,
    ) -> Self {
        let worst = max_severity(signals);

        if worst == Some(Severity::High) {
            return DecisionTag::Trap;
        }
        if matches!(
            band,
            MomentumBand::Breakdown | MomentumBand::Distribution | MomentumBand::Divergence
        ) || worst == Some(Severity::Medium)
        {
            return DecisionTag::Avoid;
        }

        let leading = matches!(band, MomentumBand::Breakout | MomentumBand::Accumulation);
        if leading && flow_rank >= thresholds.attack_rank && worst.is_none() {
            return DecisionTag::Attack;
        }

        match band {
            MomentumBand::Breakout
            | MomentumBand::Accumulation
            | MomentumBand::Advance
            | MomentumBand::Absorption => DecisionTag::Watch,
            _ => DecisionTag::Neutral,
        }
    }

    pub fn tier(self) -> Tier {
        match self {
            DecisionTag::Attack | DecisionTag::Watch => Tier::Opportunity,
            DecisionTag::Neutral => Tier::Neutral,
            DecisionTag::Avoid | DecisionTag::Trap => Tier::Risk,
        }
    }

    /// Sort key: opportunities first, traps last.
    pub fn priority(self) -> u8 {
        match self {
            DecisionTag::Attack => 0,
            DecisionTag::Watch => 1,
            DecisionTag::Neutral => 2,
            DecisionTag::Avoid => 3,
            DecisionTag::Trap => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DecisionTag::Attack => "attack",
            DecisionTag::Watch => "watch",
            DecisionTag::Neutral => "neutral",
            DecisionTag::Avoid => "avoid",
            DecisionTag::Trap => "trap",
        }
    }
}

impl fmt::Display for DecisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
