//! Configuration validation.
//!
//! Validates classifier thresholds before a scan runs. Values are read raw so
//! a present but malformed entry is rejected instead of falling back to the
//! default.

use crate::domain::config::{
    parse_boards, parse_holidays, BandThresholds, DecisionThresholds, ScanFilter, TrapThresholds,
};
use crate::domain::error::FlowbandError;
use crate::ports::config_port::{parse_bool, ConfigPort};

pub fn validate_classifier_config(config: &dyn ConfigPort) -> Result<(), FlowbandError> {
    validate_band_thresholds(config)?;
    validate_trap_thresholds(config)?;
    validate_attack_rank(config)?;
    validate_scan_filter(config)?;
    parse_holidays(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> FlowbandError {
    FlowbandError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, FlowbandError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(section, key, &format!("{key} is not a number: {raw}"))),
    }
}

fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, FlowbandError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(section, key, &format!("{key} is not an integer: {raw}"))),
    }
}

fn read_bool(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), FlowbandError> {
    match config.get_string(section, key) {
        Some(raw) if parse_bool(&raw).is_none() => Err(invalid(
            section,
            key,
            &format!("{key} must be true or false, got {raw}"),
        )),
        _ => Ok(()),
    }
}

fn require_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, FlowbandError> {
    let value = read_double(config, section, key, default)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(value)
}

fn require_non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), FlowbandError> {
    let value = read_double(config, section, key, default)?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(section, key, &format!("{key} must be non-negative")));
    }
    Ok(())
}

fn validate_band_thresholds(config: &dyn ConfigPort) -> Result<(), FlowbandError> {
    let d = BandThresholds::default();
    let surge = require_positive(config, "bands", "surge", d.surge)?;
    let rise = require_positive(config, "bands", "rise", d.rise)?;
    if rise >= surge {
        return Err(invalid("bands", "rise", "rise must be below surge"));
    }
    if surge > 1.0 {
        return Err(invalid(
            "bands",
            "surge",
            "surge is in limit units and cannot exceed 1",
        ));
    }

    let strong = require_positive(config, "bands", "strong_inflow", d.strong_inflow)?;
    let inflow = require_positive(config, "bands", "inflow", d.inflow)?;
    if inflow >= strong {
        return Err(invalid(
            "bands",
            "inflow",
            "inflow must be below strong_inflow",
        ));
    }
    Ok(())
}

fn validate_trap_thresholds(config: &dyn ConfigPort) -> Result<(), FlowbandError> {
    let d = TrapThresholds::default();
    require_positive(config, "traps", "lure_min_change", d.lure_min_change)?;
    require_positive(config, "traps", "lure_outflow_ratio", d.lure_outflow_ratio)?;
    require_positive(config, "traps", "fade_from_high", d.fade_from_high)?;
    require_positive(config, "traps", "gap_open", d.gap_open)?;
    require_positive(config, "traps", "gap_fade", d.gap_fade)?;
    require_positive(config, "traps", "reversal_drop", d.reversal_drop)?;

    let minutes = read_int(
        config,
        "traps",
        "min_elapsed_minutes",
        i64::from(d.min_elapsed_minutes),
    )?;
    if !(0..=240).contains(&minutes) {
        return Err(invalid(
            "traps",
            "min_elapsed_minutes",
            "min_elapsed_minutes must be between 0 and 240",
        ));
    }

    require_non_negative(config, "traps", "min_amount", d.min_amount)
}

fn validate_attack_rank(config: &dyn ConfigPort) -> Result<(), FlowbandError> {
    let d = DecisionThresholds::default();
    let value = read_double(config, "decision", "attack_rank", d.attack_rank)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(
            "decision",
            "attack_rank",
            "attack_rank must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_scan_filter(config: &dyn ConfigPort) -> Result<(), FlowbandError> {
    if let Some(list) = config.get_string("scan", "boards") {
        parse_boards(&list)?;
    }
    read_bool(config, "scan", "exclude_st")?;
    require_non_negative(config, "scan", "min_amount", ScanFilter::default().min_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn validate(ini: &str) -> Result<(), FlowbandError> {
        let adapter = FileConfigAdapter::from_string(ini).unwrap();
        validate_classifier_config(&adapter)
    }

    fn invalid_key(result: Result<(), FlowbandError>) -> String {
        match result {
            Err(FlowbandError::ConfigInvalid { key, .. }) => key,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        assert!(validate("[scan]\n").is_ok());
    }

    #[test]
    fn full_valid_config() {
        let ini = r#"
[bands]
surge = 0.6
rise = 0.25
strong_inflow = 0.12
inflow = 0.04

[traps]
min_elapsed_minutes = 30
min_amount = 50000000

[decision]
attack_rank = 0.9

[scan]
boards = main,chinext,star
exclude_st = true

[calendar]
holidays = 2024-10-01,2024-10-02
"#;
        assert!(validate(ini).is_ok());
    }

    #[test]
    fn rise_must_be_below_surge() {
        assert_eq!(invalid_key(validate("[bands]\nsurge = 0.3\nrise = 0.3\n")), "rise");
    }

    #[test]
    fn surge_capped_at_one_limit() {
        assert_eq!(invalid_key(validate("[bands]\nsurge = 1.5\n")), "surge");
    }

    #[test]
    fn inflow_must_be_below_strong_inflow() {
        assert_eq!(
            invalid_key(validate("[bands]\nstrong_inflow = 0.02\n")),
            "inflow"
        );
    }

    #[test]
    fn negative_trap_threshold_rejected() {
        assert_eq!(
            invalid_key(validate("[traps]\nfade_from_high = -0.1\n")),
            "fade_from_high"
        );
    }

    #[test]
    fn elapsed_minutes_range() {
        assert_eq!(
            invalid_key(validate("[traps]\nmin_elapsed_minutes = 300\n")),
            "min_elapsed_minutes"
        );
    }

    #[test]
    fn attack_rank_range() {
        assert_eq!(
            invalid_key(validate("[decision]\nattack_rank = 1.2\n")),
            "attack_rank"
        );
    }

    #[test]
    fn unknown_board_rejected() {
        assert_eq!(invalid_key(validate("[scan]\nboards = main,otc\n")), "boards");
    }

    #[test]
    fn bad_holiday_rejected() {
        assert_eq!(
            invalid_key(validate("[calendar]\nholidays = 2024-13-01\n")),
            "holidays"
        );
    }

    #[test]
    fn malformed_number_rejected() {
        assert_eq!(invalid_key(validate("[bands]\nsurge = 0,6\n")), "surge");
        assert_eq!(
            invalid_key(validate("[decision]\nattack_rank = high\n")),
            "attack_rank"
        );
        assert_eq!(
            invalid_key(validate("[traps]\nmin_amount = 30M\n")),
            "min_amount"
        );
    }

    #[test]
    fn malformed_minutes_rejected() {
        assert_eq!(
            invalid_key(validate("[traps]\nmin_elapsed_minutes = 15.5\n")),
            "min_elapsed_minutes"
        );
    }

    #[test]
    fn malformed_flag_rejected() {
        assert_eq!(
            invalid_key(validate("[scan]\nexclude_st = maybe\n")),
            "exclude_st"
        );
        assert!(validate("[scan]\nexclude_st = yes\n").is_ok());
    }

    #[test]
    fn padded_values_accepted() {
        assert!(validate("[bands]\nsurge =  0.6 \n[traps]\nmin_elapsed_minutes = 20\n").is_ok());
    }
}
