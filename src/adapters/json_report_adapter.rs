//! JSON scan report: market summary, classified rows and skipped codes.

use std::fs;
use std::path::Path;

use crate::domain::error::FlowbandError;
use crate::domain::market::MarketSummary;
use crate::domain::scanner::{ScanReport, ScanResult};
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize)]
struct SkippedEntry {
    code: String,
    reason: String,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    trade_date: Option<NaiveDate>,
    market: &'a MarketSummary,
    results: &'a [ScanResult],
    skipped: Vec<SkippedEntry>,
}

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn render(&self, report: &ScanReport) -> Result<String, serde_json::Error> {
        let doc = ReportDocument {
            trade_date: report.results.first().map(|r| r.trade_date),
            market: &report.market,
            results: &report.results,
            skipped: report
                .skipped
                .iter()
                .map(|s| SkippedEntry {
                    code: s.code.clone(),
                    reason: s.reason.to_string(),
                })
                .collect(),
        };
        if self.pretty {
            serde_json::to_string_pretty(&doc)
        } else {
            serde_json::to_string(&doc)
        }
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &ScanReport, output_path: &Path) -> Result<(), FlowbandError> {
        let json = self
            .render(report)
            .map_err(|e| FlowbandError::ReportWrite {
                path: output_path.display().to_string(),
                reason: e.to_string(),
            })?;

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json)?;

        tracing::info!(path = %output_path.display(), rows = report.results.len(), "wrote JSON report");
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
