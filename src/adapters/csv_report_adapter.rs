//! CSV scan report: one row per classified stock, in scan order.

use std::fs;
use std::path::Path;

use crate::domain::band::{FlowTier, MomentumBand, PriceTier};
use crate::domain::board::Board;
use crate::domain::decision::{DecisionTag, Tier};
use crate::domain::error::FlowbandError;
use crate::domain::scanner::{ScanReport, ScanResult};
use crate::ports::report_port::ReportPort;
use serde::Serialize;

#[derive(Serialize)]
struct ReportRow<'a> {
    code: &'a str,
    name: &'a str,
    board: Board,
    trade_date: String,
    time: String,
    price: f64,
    change_pct: f64,
    normalized_change: f64,
    amount: f64,
    main_net_inflow: f64,
    flow_ratio: Option<f64>,
    flow_rank: f64,
    incremental_ratio: Option<f64>,
    baseline: &'a str,
    price_tier: PriceTier,
    flow_tier: FlowTier,
    band: MomentumBand,
    traps: String,
    decision: DecisionTag,
    tier: Tier,
}

impl<'a> From<&'a ScanResult> for ReportRow<'a> {
    fn from(r: &'a ScanResult) -> Self {
        Self {
            code: &r.code,
            name: &r.name,
            board: r.board,
            trade_date: r.trade_date.to_string(),
            time: r
                .time
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default(),
            price: r.price,
            change_pct: r.change_pct,
            normalized_change: r.normalized_change,
            amount: r.amount,
            main_net_inflow: r.main_net_inflow,
            flow_ratio: r.flow_ratio,
            flow_rank: r.flow_rank,
            incremental_ratio: r.incremental_ratio,
            baseline: &r.baseline,
            price_tier: r.price_tier,
            flow_tier: r.flow_tier,
            band: r.band,
            traps: r.trap_labels(),
            decision: r.decision,
            tier: r.tier,
        }
    }
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &ScanReport, output_path: &Path) -> Result<(), FlowbandError> {
        let write_err = |reason: String| FlowbandError::ReportWrite {
            path: output_path.display().to_string(),
            reason,
        };

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| write_err(e.to_string()))?;
        for result in &report.results {
            wtr.serialize(ReportRow::from(result))
                .map_err(|e| write_err(e.to_string()))?;
        }
        wtr.flush()?;

        tracing::info!(path = %output_path.display(), rows = report.results.len(), "wrote CSV report");
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}
