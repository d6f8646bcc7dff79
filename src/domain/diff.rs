//! Band and decision transitions between two scans.

use crate::domain::band::MomentumBand;
use crate::domain::decision::DecisionTag;
use crate::domain::quote::bare_code;
use crate::domain::scanner::ScanReport;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TagTransition {
    pub code: String,
    pub name: String,
    pub band_before: MomentumBand,
    pub band_after: MomentumBand,
    pub decision_before: DecisionTag,
    pub decision_after: DecisionTag,
    pub flow_ratio_before: Option<f64>,
    pub flow_ratio_after: Option<f64>,
}

impl TagTransition {
    pub fn decision_changed(&self) -> bool {
        self.decision_before != self.decision_after
    }

    /// Moved toward the opportunity end of the scale.
    pub fn is_upgrade(&self) -> bool {
        self.decision_after.priority() < self.decision_before.priority()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub transitions: Vec<TagTransition>,
    pub unchanged: usize,
}

impl ScanDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.transitions.is_empty()
    }
}

/// Compare two scans by bare code. Output lists are sorted by code.
pub fn diff_reports(before: &ScanReport, after: &ScanReport) -> ScanDiff {
    let before_by_code: BTreeMap<&str, _> = before
        .results
        .iter()
        .map(|r| (bare_code(&r.code), r))
        .collect();
    let after_by_code: BTreeMap<&str, _> = after
        .results
        .iter()
        .map(|r| (bare_code(&r.code), r))
        .collect();

    let mut diff = ScanDiff::default();

    for (code, b) in &before_by_code {
        match after_by_code.get(code) {
            None => diff.removed.push(code.to_string()),
            Some(a) => {
                if a.band != b.band || a.decision != b.decision {
                    diff.transitions.push(TagTransition {
                        code: code.to_string(),
                        name: a.name.clone(),
                        band_before: b.band,
                        band_after: a.band,
                        decision_before: b.decision,
                        decision_after: a.decision,
                        flow_ratio_before: b.flow_ratio,
                        flow_ratio_after: a.flow_ratio,
                    });
                } else {
                    diff.unchanged += 1;
                }
            }
        }
    }

    diff.added = after_by_code
        .keys()
        .filter(|code| !before_by_code.contains_key(*code))
        .map(|code| code.to_string())
        .collect();

    diff
}
