//! Classifier thresholds and scan filters.
//!
//! Price thresholds are in limit units (see [`Board::normalized_change`]),
//! flow thresholds are inflow ratios (net inflow / turnover).
//!
//! [`Board::normalized_change`]: crate::domain::board::Board::normalized_change

use crate::domain::board::Board;
use crate::domain::error::FlowbandError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct BandThresholds {
    pub surge: f64,
    pub rise: f64,
    pub strong_inflow: f64,
    pub inflow: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            surge: 0.5,
            rise: 0.2,
            strong_inflow: 0.10,
            inflow: 0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrapThresholds {
    pub lure_min_change: f64,
    pub lure_outflow_ratio: f64,
    pub fade_from_high: f64,
    pub gap_open: f64,
    pub gap_fade: f64,
    pub reversal_drop: f64,
    pub min_elapsed_minutes: u32,
    pub min_amount: f64,
}

impl Default for TrapThresholds {
    fn default() -> Self {
        Self {
            lure_min_change: 0.3,
            lure_outflow_ratio: 0.05,
            fade_from_high: 0.5,
            gap_open: 0.3,
            gap_fade: 0.3,
            reversal_drop: 0.05,
            min_elapsed_minutes: 15,
            min_amount: 30_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionThresholds {
    /// Minimum cross-sectional inflow-ratio rank for an `Attack` tag.
    pub attack_rank: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self { attack_rank: 0.8 }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanFilter {
    pub exclude_st: bool,
    /// Empty means every board.
    pub boards: Vec<Board>,
    pub min_amount: f64,
}

impl ScanFilter {
    pub fn allows_board(&self, board: Board) -> bool {
        self.boards.is_empty() || self.boards.contains(&board)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifierConfig {
    pub bands: BandThresholds,
    pub traps: TrapThresholds,
    pub decision: DecisionThresholds,
    pub filter: ScanFilter,
}

impl ClassifierConfig {
    /// Build from a config source, falling back to defaults for absent keys.
    /// Values are not range-checked here; see `config_validation`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FlowbandError> {
        let bands_default = BandThresholds::default();
        let traps_default = TrapThresholds::default();
        let decision_default = DecisionThresholds::default();

        let bands = BandThresholds {
            surge: config.get_double("bands", "surge", bands_default.surge),
            rise: config.get_double("bands", "rise", bands_default.rise),
            strong_inflow: config.get_double("bands", "strong_inflow", bands_default.strong_inflow),
            inflow: config.get_double("bands", "inflow", bands_default.inflow),
        };

        let min_elapsed = config.get_int(
            "traps",
            "min_elapsed_minutes",
            traps_default.min_elapsed_minutes as i64,
        );
        let min_elapsed_minutes =
            u32::try_from(min_elapsed).map_err(|_| FlowbandError::ConfigInvalid {
                section: "traps".into(),
                key: "min_elapsed_minutes".into(),
                reason: "must be a non-negative minute count".into(),
            })?;

        let traps = TrapThresholds {
            lure_min_change: config.get_double(
                "traps",
                "lure_min_change",
                traps_default.lure_min_change,
            ),
            lure_outflow_ratio: config.get_double(
                "traps",
                "lure_outflow_ratio",
                traps_default.lure_outflow_ratio,
            ),
            fade_from_high: config.get_double(
                "traps",
                "fade_from_high",
                traps_default.fade_from_high,
            ),
            gap_open: config.get_double("traps", "gap_open", traps_default.gap_open),
            gap_fade: config.get_double("traps", "gap_fade", traps_default.gap_fade),
            reversal_drop: config.get_double(
                "traps",
                "reversal_drop",
                traps_default.reversal_drop,
            ),
            min_elapsed_minutes,
            min_amount: config.get_double("traps", "min_amount", traps_default.min_amount),
        };

        let decision = DecisionThresholds {
            attack_rank: config.get_double("decision", "attack_rank", decision_default.attack_rank),
        };

        let boards = match config.get_string("scan", "boards") {
            Some(list) => parse_boards(&list)?,
            None => Vec::new(),
        };

        let filter = ScanFilter {
            exclude_st: config.get_bool("scan", "exclude_st", false),
            boards,
            min_amount: config.get_double("scan", "min_amount", 0.0),
        };

        Ok(Self {
            bands,
            traps,
            decision,
            filter,
        })
    }
}

pub fn parse_boards(list: &str) -> Result<Vec<Board>, FlowbandError> {
    let mut boards = Vec::new();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let board = token
            .parse::<Board>()
            .map_err(|e| FlowbandError::ConfigInvalid {
                section: "scan".into(),
                key: "boards".into(),
                reason: e.to_string(),
            })?;
        if !boards.contains(&board) {
            boards.push(board);
        }
    }
    Ok(boards)
}

/// Holidays from `[calendar] holidays`, a comma-separated date list.
pub fn parse_holidays(config: &dyn ConfigPort) -> Result<Vec<NaiveDate>, FlowbandError> {
    config
        .get_list("calendar", "holidays")
        .iter()
        .map(|t| {
            NaiveDate::parse_from_str(t, "%Y-%m-%d").map_err(|_| FlowbandError::ConfigInvalid {
                section: "calendar".into(),
                key: "holidays".into(),
                reason: format!("invalid date {t}, expected YYYY-MM-DD"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    #[test]
    fn defaults_when_sections_absent() {
        let adapter = FileConfigAdapter::from_string("[other]\nkey = 1\n").unwrap();
        let config = ClassifierConfig::from_config(&adapter).unwrap();
        assert_eq!(config, ClassifierConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let ini = "[bands]\nsurge = 0.6\n\n[traps]\nmin_elapsed_minutes = 30\n\n[decision]\nattack_rank = 0.9\n\n[scan]\nexclude_st = true\nboards = main, chinext\n";
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        let config = ClassifierConfig::from_config(&adapter).unwrap();
        assert_eq!(config.bands.surge, 0.6);
        assert_eq!(config.bands.rise, 0.2);
        assert_eq!(config.traps.min_elapsed_minutes, 30);
        assert_eq!(config.decision.attack_rank, 0.9);
        assert!(config.filter.exclude_st);
        assert_eq!(config.filter.boards, vec![Board::MainBoard, Board::ChiNext]);
    }

    #[test]
    fn negative_minutes_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[traps]\nmin_elapsed_minutes = -5\n").unwrap();
        let err = ClassifierConfig::from_config(&adapter).unwrap_err();
        assert!(matches!(err, FlowbandError::ConfigInvalid { key, .. } if key == "min_elapsed_minutes"));
    }

    #[test]
    fn unknown_board_rejected() {
        let err = parse_boards("main,nyse").unwrap_err();
        assert!(matches!(err, FlowbandError::ConfigInvalid { key, .. } if key == "boards"));
    }

    #[test]
    fn empty_filter_allows_all_boards() {
        let filter = ScanFilter::default();
        assert!(filter.allows_board(Board::Beijing));
        let filter = ScanFilter {
            boards: vec![Board::Star],
            ..ScanFilter::default()
        };
        assert!(!filter.allows_board(Board::MainBoard));
    }

    #[test]
    fn holidays_parsed() {
        let adapter =
            FileConfigAdapter::from_string("[calendar]\nholidays = 2024-10-01, 2024-10-02\n")
                .unwrap();
        let holidays = parse_holidays(&adapter).unwrap();
        assert_eq!(holidays.len(), 2);

        let bad = FileConfigAdapter::from_string("[calendar]\nholidays = 2024/10/01\n").unwrap();
        assert!(parse_holidays(&bad).is_err());
    }
}
