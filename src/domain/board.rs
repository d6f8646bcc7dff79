//! Market boards and their daily price-limit bands.
//!
//! Main board stocks move at most 10% per day (5% under risk warning),
//! ChiNext and STAR stocks 20%, Beijing exchange stocks 30%. Limit prices
//! are rounded to the 0.01 CNY tick.

use crate::domain::quote::bare_code;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TICK: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Board {
    #[serde(rename = "main")]
    MainBoard,
    #[serde(rename = "chinext")]
    ChiNext,
    Star,
    Beijing,
    #[serde(rename = "st")]
    RiskWarning,
}

impl Board {
    pub const ALL: [Board; 5] = [
        Board::MainBoard,
        Board::ChiNext,
        Board::Star,
        Board::Beijing,
        Board::RiskWarning,
    ];

    pub fn classify(code: &str, name: &str) -> Self {
        let code = bare_code(code);
        let board = if code.starts_with("300") || code.starts_with("301") || code.starts_with("302")
        {
            Board::ChiNext
        } else if code.starts_with("688") || code.starts_with("689") {
            Board::Star
        } else if code.starts_with("43")
            || code.starts_with("83")
            || code.starts_with("87")
            || code.starts_with("92")
        {
            Board::Beijing
        } else {
            Board::MainBoard
        };

        if board == Board::MainBoard && name.to_uppercase().contains("ST") {
            Board::RiskWarning
        } else {
            board
        }
    }

    /// Daily limit in percent.
    pub fn limit_pct(self) -> f64 {
        match self {
            Board::MainBoard => 10.0,
            Board::ChiNext | Board::Star => 20.0,
            Board::Beijing => 30.0,
            Board::RiskWarning => 5.0,
        }
    }

    pub fn is_twenty_cm(self) -> bool {
        matches!(self, Board::ChiNext | Board::Star)
    }

    /// (limit_down, limit_up)
    pub fn limit_prices(self, prev_close: f64) -> (f64, f64) {
        let pct = self.limit_pct() / 100.0;
        (
            round_to_tick(prev_close * (1.0 - pct)),
            round_to_tick(prev_close * (1.0 + pct)),
        )
    }

    pub fn is_limit_up(self, price: f64, prev_close: f64) -> bool {
        if prev_close <= 0.0 {
            return false;
        }
        let (_, up) = self.limit_prices(prev_close);
        price >= up - TICK / 2.0
    }

    pub fn is_limit_down(self, price: f64, prev_close: f64) -> bool {
        if prev_close <= 0.0 {
            return false;
        }
        let (down, _) = self.limit_prices(prev_close);
        price <= down + TICK / 2.0
    }

    /// Change expressed in limit units: +1.0 is a full limit-up move on any
    /// board, so thresholds apply uniformly to 10cm and 20cm stocks.
    pub fn normalized_change(self, change_pct: f64) -> f64 {
        change_pct / self.limit_pct()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Board::MainBoard => "main",
            Board::ChiNext => "chinext",
            Board::Star => "star",
            Board::Beijing => "beijing",
            Board::RiskWarning => "st",
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown board: {0}")]
pub struct UnknownBoard(pub String);

impl FromStr for Board {
    type Err = UnknownBoard;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" | "main_board" => Ok(Board::MainBoard),
            "chinext" | "gem" => Ok(Board::ChiNext),
            "star" => Ok(Board::Star),
            "beijing" | "bse" => Ok(Board::Beijing),
            "st" | "risk_warning" => Ok(Board::RiskWarning),
            other => Err(UnknownBoard(other.to_string())),
        }
    }
}

fn round_to_tick(price: f64) -> f64 {
    // The epsilon keeps values like 11.055 from rounding down after the
    // multiplication drifts to 1105.4999...
    ((price / TICK) + 1e-6).round() * TICK
}
