//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::snapshot_file::read_snapshot_file;
use crate::domain::calendar::TradingCalendar;
use crate::domain::config::{parse_holidays, ClassifierConfig};
use crate::domain::config_validation::validate_classifier_config;
use crate::domain::decision::DecisionTag;
use crate::domain::diff::{diff_reports, ScanDiff};
use crate::domain::error::FlowbandError;
use crate::domain::market::MarketSummary;
use crate::domain::scanner::{scan, ScanReport, ScanResult};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "flowband",
    about = "Intraday capital-flow momentum classifier for A-shares"
)]
pub struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify every stock in a snapshot
    Scan {
        /// Snapshot file (.json or .csv)
        #[arg(short, long, required_unless_present = "date", conflicts_with = "date")]
        input: Option<PathBuf>,
        /// Earlier snapshot used as the flow baseline
        #[arg(long, conflicts_with = "date")]
        previous: Option<PathBuf>,
        /// Scan a stored snapshot instead of a file (needs [sqlite] path)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the full report here; the format's extension is added when missing
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Report format; inferred from the output extension when omitted
        #[arg(long, value_enum)]
        format: Option<ReportFormat>,
        /// Rows to print (0 prints none)
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
    /// Market breadth and regime for a snapshot
    Market {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Band and decision changes between two snapshots
    Diff {
        #[arg(long)]
        before: PathBuf,
        #[arg(long)]
        after: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Store a snapshot file in the SQLite store
    Import {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate classifier configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            input,
            previous,
            date,
            config,
            output,
            format,
            top,
        } => run_scan(
            input.as_deref(),
            previous.as_deref(),
            date,
            config.as_deref(),
            output.as_deref(),
            format,
            top,
        ),
        Command::Market { input, config } => run_market(&input, config.as_deref()),
        Command::Diff {
            before,
            after,
            config,
        } => run_diff(&before, &after, config.as_deref()),
        Command::Import { input, config } => run_import(&input, &config),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FlowbandError> {
    eprintln!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Classifier settings and trading calendar. Without a config file the
/// built-in defaults apply and the calendar knows only weekends.
pub fn load_classifier(
    config_path: Option<&Path>,
) -> Result<(ClassifierConfig, TradingCalendar), FlowbandError> {
    let Some(path) = config_path else {
        return Ok((ClassifierConfig::default(), TradingCalendar::default()));
    };
    let adapter = load_config(path)?;
    validate_classifier_config(&adapter)?;
    let config = ClassifierConfig::from_config(&adapter)?;
    let calendar = TradingCalendar::new(parse_holidays(&adapter)?);
    tracing::debug!(holidays = calendar.holiday_count(), "classifier configured");
    Ok((config, calendar))
}

/// Scan a snapshot file, optionally against an earlier one.
pub fn scan_files(
    input: &Path,
    previous: Option<&Path>,
    config: &ClassifierConfig,
    calendar: &TradingCalendar,
) -> Result<ScanReport, FlowbandError> {
    let current = read_snapshot_file(input)?;
    let previous = previous.map(read_snapshot_file).transpose()?;
    scan(current, previous.as_deref(), config, calendar)
}

/// Format from the flag, else from the output extension, else CSV.
pub fn resolve_format(format: Option<ReportFormat>, output: &Path) -> ReportFormat {
    format.unwrap_or_else(|| match output.extension().and_then(|e| e.to_str()) {
        Some("json") => ReportFormat::Json,
        _ => ReportFormat::Csv,
    })
}

/// Output path with the writer's extension appended when it has none.
pub fn report_path(output: &Path, writer: &dyn ReportPort) -> PathBuf {
    if output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.with_extension(writer.extension())
    }
}

fn report_writer(format: ReportFormat) -> Box<dyn ReportPort> {
    match format {
        ReportFormat::Csv => Box::new(CsvReportAdapter::new()),
        ReportFormat::Json => Box::new(JsonReportAdapter::new()),
    }
}

fn run_scan(
    input: Option<&Path>,
    previous: Option<&Path>,
    date: Option<NaiveDate>,
    config_path: Option<&Path>,
    output: Option<&Path>,
    format: Option<ReportFormat>,
    top: usize,
) -> Result<(), FlowbandError> {
    let (config, calendar) = load_classifier(config_path)?;

    let report = match (input, date) {
        (Some(input), _) => {
            eprintln!("Scanning {}", input.display());
            scan_files(input, previous, &config, &calendar)?
        }
        (None, Some(date)) => scan_stored(date, config_path, &config, &calendar)?,
        (None, None) => {
            return Err(FlowbandError::ConfigMissing {
                section: "scan".into(),
                key: "input".into(),
            });
        }
    };

    print_market(&report.market);
    print_decisions(&report);
    print_results(&report.results, top);

    if let Some(output) = output {
        let writer = report_writer(resolve_format(format, output));
        let output = report_path(output, writer.as_ref());
        writer.write(&report, &output)?;
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn scan_stored(
    date: NaiveDate,
    config_path: Option<&Path>,
    config: &ClassifierConfig,
    calendar: &TradingCalendar,
) -> Result<ScanReport, FlowbandError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::ports::snapshot_port::SnapshotPort;

    let path = config_path.ok_or_else(|| FlowbandError::ConfigMissing {
        section: "sqlite".into(),
        key: "path".into(),
    })?;
    let store = SqliteAdapter::from_config(&load_config(path)?)?;
    store.initialize_schema()?;

    let current = store.load_snapshot(date)?;
    let previous = match store.previous_date(date)? {
        Some(prev_date) => {
            eprintln!("Scanning stored snapshot {date} against {prev_date}");
            Some(store.load_snapshot(prev_date)?)
        }
        None => {
            eprintln!("Scanning stored snapshot {date} (no earlier snapshot)");
            None
        }
    };
    scan(current, previous.as_deref(), config, calendar)
}

#[cfg(not(feature = "sqlite"))]
fn scan_stored(
    _date: NaiveDate,
    _config_path: Option<&Path>,
    _config: &ClassifierConfig,
    _calendar: &TradingCalendar,
) -> Result<ScanReport, FlowbandError> {
    Err(FlowbandError::Storage {
        reason: "built without the sqlite feature".into(),
    })
}

fn run_market(input: &Path, config_path: Option<&Path>) -> Result<(), FlowbandError> {
    let (config, calendar) = load_classifier(config_path)?;
    let report = scan_files(input, None, &config, &calendar)?;

    print_market(&report.market);
    println!();
    println!(
        "{:<8} {:>6} {:>6} {:>6} {:>5} {:>5} {:>9} {:>9}",
        "board", "count", "up", "down", "LU", "LD", "avg chg", "flow"
    );
    for b in &report.market.boards {
        println!(
            "{:<8} {:>6} {:>6} {:>6} {:>5} {:>5} {:>8.2}% {:>9}",
            b.board.as_str(),
            b.count,
            b.up,
            b.down,
            b.limit_up,
            b.limit_down,
            b.avg_change,
            fmt_ratio(b.flow_ratio),
        );
    }
    Ok(())
}

fn run_diff(before: &Path, after: &Path, config_path: Option<&Path>) -> Result<(), FlowbandError> {
    let (config, calendar) = load_classifier(config_path)?;
    let before_report = scan_files(before, None, &config, &calendar)?;
    let after_report = scan_files(after, Some(before), &config, &calendar)?;
    let diff = diff_reports(&before_report, &after_report);
    print_diff(&diff);
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_import(input: &Path, config_path: &Path) -> Result<(), FlowbandError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = load_config(config_path)?;
    let store = SqliteAdapter::from_config(&adapter)?;
    store.initialize_schema()?;

    let quotes = read_snapshot_file(input)?;
    if quotes.is_empty() {
        return Err(FlowbandError::SnapshotParse {
            source_name: input.display().to_string(),
            reason: "no rows".into(),
        });
    }
    let written = store.insert_quotes(&quotes)?;
    eprintln!("Imported {written} rows from {}", input.display());

    if let Some((first, last, days)) = store.date_range()? {
        eprintln!("Store holds {days} trading days, {first} to {last}");
    }
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_input: &Path, _config_path: &Path) -> Result<(), FlowbandError> {
    Err(FlowbandError::Storage {
        reason: "built without the sqlite feature".into(),
    })
}

fn run_validate(config_path: &Path) -> Result<(), FlowbandError> {
    let adapter = load_config(config_path)?;
    validate_classifier_config(&adapter)?;
    let config = ClassifierConfig::from_config(&adapter)?;
    let holidays = parse_holidays(&adapter)?;

    eprintln!("Config validated successfully");
    eprintln!(
        "  bands:    surge {} / rise {} (limit units), inflow {} / strong {}",
        config.bands.surge, config.bands.rise, config.bands.inflow, config.bands.strong_inflow
    );
    eprintln!(
        "  traps:    min turnover {:.0}, reversal after {} min",
        config.traps.min_amount, config.traps.min_elapsed_minutes
    );
    eprintln!("  decision: attack rank >= {}", config.decision.attack_rank);
    let boards = if config.filter.boards.is_empty() {
        "all".to_string()
    } else {
        config
            .filter
            .boards
            .iter()
            .map(|b| b.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };
    eprintln!(
        "  scan:     boards {boards}, exclude ST {}, min turnover {:.0}",
        config.filter.exclude_st, config.filter.min_amount
    );
    eprintln!("  calendar: {} holidays", holidays.len());
    Ok(())
}

fn fmt_ratio(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:+.2}%", r * 100.0),
        None => "-".to_string(),
    }
}

fn print_market(m: &MarketSummary) {
    println!("=== Market ===");
    println!("Regime:        {}", m.regime);
    println!(
        "Breadth:       {} up / {} down / {} flat of {}",
        m.up, m.down, m.flat, m.total
    );
    println!(
        "Limits:        {} limit-up, {} limit-down, {} broken",
        m.limit_up, m.limit_down, m.broken_limit
    );
    if let Some(seal) = m.seal_rate {
        println!("Seal rate:     {:.1}%", seal * 100.0);
    }
    println!("Median change: {:+.2}%", m.median_change);
    println!(
        "Flow ratio:    {} aggregate, {} p90",
        fmt_ratio(m.aggregate_flow_ratio),
        fmt_ratio(m.p90_flow_ratio)
    );
}

const DECISION_ORDER: [DecisionTag; 5] = [
    DecisionTag::Attack,
    DecisionTag::Watch,
    DecisionTag::Neutral,
    DecisionTag::Avoid,
    DecisionTag::Trap,
];

fn print_decisions(report: &ScanReport) {
    let counts: Vec<String> = DECISION_ORDER
        .iter()
        .map(|&tag| format!("{tag} {}", report.count_by_decision(tag)))
        .collect();
    println!("Decisions:     {}", counts.join(", "));
    if !report.skipped.is_empty() {
        println!("Skipped:       {} rows", report.skipped.len());
    }
}

fn print_results(results: &[ScanResult], top: usize) {
    if top == 0 || results.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<10} {:<10} {:<8} {:>9} {:>8} {:>9} {:>6} {:<13} {:<8} traps",
        "code", "name", "board", "price", "chg", "flow", "rank", "band", "decision"
    );
    for r in results.iter().take(top) {
        println!(
            "{:<10} {:<10} {:<8} {:>9.2} {:>+7.2}% {:>9} {:>6.2} {:<13} {:<8} {}",
            r.code,
            r.name,
            r.board.as_str(),
            r.price,
            r.change_pct,
            fmt_ratio(r.flow_ratio),
            r.flow_rank,
            r.band.as_str(),
            r.decision.as_str(),
            r.trap_labels(),
        );
    }
    if results.len() > top {
        println!("... {} more", results.len() - top);
    }
}

fn print_diff(diff: &ScanDiff) {
    println!(
        "{} changed, {} unchanged, {} added, {} removed",
        diff.transitions.len(),
        diff.unchanged,
        diff.added.len(),
        diff.removed.len()
    );
    for t in &diff.transitions {
        let arrow = if t.is_upgrade() {
            "▲"
        } else if t.decision_changed() {
            "▼"
        } else {
            " "
        };
        println!(
            "{arrow} {:<10} {:<10} {} -> {}  {} -> {}  flow {} -> {}",
            t.code,
            t.name,
            t.band_before.as_str(),
            t.band_after.as_str(),
            t.decision_before.as_str(),
            t.decision_after.as_str(),
            fmt_ratio(t.flow_ratio_before),
            fmt_ratio(t.flow_ratio_after),
        );
    }
    if !diff.added.is_empty() {
        println!("added:   {}", diff.added.join(", "));
    }
    if !diff.removed.is_empty() {
        println!("removed: {}", diff.removed.join(", "));
    }
}
