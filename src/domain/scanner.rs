//! Full-universe scan: classify every quote of a snapshot.
//!
//! Pipeline per quote:
//! 1. resolve the flow baseline against the previous snapshot
//! 2. fill a missing previous close from a cross-day baseline
//! 3. validate, classify the board, apply the scan filter
//! 4. price tier, flow tier, momentum band, trap signals
//! 5. rank the inflow ratio against the surviving universe
//! 6. decision tag
//!
//! Results are ordered by decision priority, then inflow ratio descending.

use crate::domain::band::{FlowTier, MomentumBand, PriceTier};
use crate::domain::board::Board;
use crate::domain::calendar::TradingCalendar;
use crate::domain::config::ClassifierConfig;
use crate::domain::decision::{DecisionTag, Tier};
use crate::domain::error::FlowbandError;
use crate::domain::flow::{with_previous_close, Baseline};
use crate::domain::market::MarketSummary;
use crate::domain::percentile::PercentileTable;
use crate::domain::quote::{QuoteIssue, StockQuote};
use crate::domain::trap::{self, TrapKind, TrapSignal};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub code: String,
    pub name: String,
    pub board: Board,
    pub trade_date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub price: f64,
    pub prev_close: f64,
    pub change_pct: f64,
    pub normalized_change: f64,
    pub amount: f64,
    pub main_net_inflow: f64,
    pub flow_ratio: Option<f64>,
    pub flow_rank: f64,
    pub incremental_ratio: Option<f64>,
    pub baseline: String,
    pub price_tier: PriceTier,
    pub flow_tier: FlowTier,
    pub band: MomentumBand,
    pub traps: Vec<TrapSignal>,
    pub decision: DecisionTag,
    pub tier: Tier,
}

impl ScanResult {
    pub fn is_limit_up(&self) -> bool {
        self.price_tier == PriceTier::LimitUp
    }

    pub fn is_limit_down(&self) -> bool {
        self.price_tier == PriceTier::LimitDown
    }

    pub fn broke_limit(&self) -> bool {
        self.has_trap(TrapKind::BrokenLimit)
    }

    pub fn has_trap(&self, kind: TrapKind) -> bool {
        self.traps.iter().any(|t| t.kind == kind)
    }

    pub fn trap_labels(&self) -> String {
        self.traps
            .iter()
            .map(|t| t.kind.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Invalid(QuoteIssue),
    Duplicate,
    RiskWarning,
    BoardExcluded(Board),
    BelowMinAmount { amount: f64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Invalid(issue) => write!(f, "invalid quote: {issue}"),
            SkipReason::Duplicate => f.write_str("superseded by a later row"),
            SkipReason::RiskWarning => f.write_str("risk-warning stock excluded"),
            SkipReason::BoardExcluded(board) => write!(f, "board {board} excluded"),
            SkipReason::BelowMinAmount { amount } => {
                write!(f, "turnover {amount:.0} below minimum")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedQuote {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub results: Vec<ScanResult>,
    pub skipped: Vec<SkippedQuote>,
    pub market: MarketSummary,
}

impl ScanReport {
    pub fn count_by_decision(&self, tag: DecisionTag) -> usize {
        self.results.iter().filter(|r| r.decision == tag).count()
    }

    pub fn count_by_band(&self, band: MomentumBand) -> usize {
        self.results.iter().filter(|r| r.band == band).count()
    }

    pub fn find(&self, code: &str) -> Option<&ScanResult> {
        let key = crate::domain::quote::bare_code(code);
        self.results
            .iter()
            .find(|r| crate::domain::quote::bare_code(&r.code) == key)
    }
}

struct Candidate {
    quote: StockQuote,
    board: Board,
    baseline: Baseline,
}

pub fn scan(
    current: Vec<StockQuote>,
    previous: Option<&[StockQuote]>,
    config: &ClassifierConfig,
    calendar: &TradingCalendar,
) -> Result<ScanReport, FlowbandError> {
    let total = current.len();
    let mut skipped = Vec::new();

    let mut rows: Vec<StockQuote> = Vec::with_capacity(total);
    let mut index: HashMap<String, usize> = HashMap::with_capacity(total);
    for quote in current {
        let key = quote.bare_code().to_string();
        match index.get(&key) {
            Some(&i) => {
                tracing::warn!(code = %key, "duplicate quote row, keeping the later one");
                skipped.push(SkippedQuote {
                    code: rows[i].code.clone(),
                    reason: SkipReason::Duplicate,
                });
                rows[i] = quote;
            }
            None => {
                index.insert(key, rows.len());
                rows.push(quote);
            }
        }
    }

    let previous_by_code: HashMap<&str, &StockQuote> = previous
        .unwrap_or_default()
        .iter()
        .map(|q| (q.bare_code(), q))
        .collect();

    let mut candidates = Vec::with_capacity(rows.len());
    for quote in rows {
        let prev = previous_by_code.get(quote.bare_code()).copied();
        let baseline = Baseline::resolve(&quote, prev, calendar);
        let quote = with_previous_close(quote, &baseline);

        if let Err(issue) = quote.validate() {
            tracing::debug!(code = %quote.code, %issue, "skipping quote");
            skipped.push(SkippedQuote {
                code: quote.code,
                reason: SkipReason::Invalid(issue),
            });
            continue;
        }

        let board = Board::classify(&quote.code, &quote.name);
        if let Some(reason) = filter_reason(&quote, board, config) {
            skipped.push(SkippedQuote {
                code: quote.code,
                reason,
            });
            continue;
        }

        candidates.push(Candidate {
            quote,
            board,
            baseline,
        });
    }

    if candidates.is_empty() {
        return Err(FlowbandError::EmptyUniverse { total });
    }

    let ranks = PercentileTable::new(candidates.iter().filter_map(|c| c.quote.flow_ratio()));

    let mut results: Vec<ScanResult> = candidates
        .into_iter()
        .map(|c| classify(c, &ranks, config))
        .collect();

    results.sort_by(compare_results);

    if !skipped.is_empty() {
        tracing::info!(
            classified = results.len(),
            skipped = skipped.len(),
            "scan finished with skipped rows"
        );
    }

    let market = MarketSummary::compute(&results);
    Ok(ScanReport {
        results,
        skipped,
        market,
    })
}

fn filter_reason(quote: &StockQuote, board: Board, config: &ClassifierConfig) -> Option<SkipReason> {
    let filter = &config.filter;
    if filter.exclude_st && quote.is_st() {
        return Some(SkipReason::RiskWarning);
    }
    if !filter.allows_board(board) {
        return Some(SkipReason::BoardExcluded(board));
    }
    if quote.amount < filter.min_amount {
        return Some(SkipReason::BelowMinAmount {
            amount: quote.amount,
        });
    }
    None
}

fn classify(candidate: Candidate, ranks: &PercentileTable, config: &ClassifierConfig) -> ScanResult {
    let Candidate {
        quote,
        board,
        baseline,
    } = candidate;

    let change_pct = quote.change_pct();
    let ratio = quote.flow_ratio();
    let flow_rank = ratio.map(|r| ranks.rank(r)).unwrap_or(0.0);

    let price_tier = PriceTier::classify(
        board,
        quote.price,
        quote.prev_close,
        change_pct,
        &config.bands,
    );
    let flow_tier = FlowTier::classify(ratio, &config.bands);
    let band = MomentumBand::combine(price_tier, flow_tier);
    let traps = trap::detect(board, &quote, &baseline, &config.traps);
    let decision = DecisionTag::decide(band, &traps, flow_rank, &config.decision);

    let incremental_ratio = match &baseline {
        Baseline::Intraday(delta) => delta.incremental_ratio,
        Baseline::CrossDay { delta, .. } => delta.incremental_ratio,
        _ => None,
    };

    ScanResult {
        code: quote.code,
        name: quote.name,
        board,
        trade_date: quote.trade_date,
        time: quote.time,
        price: quote.price,
        prev_close: quote.prev_close,
        change_pct,
        normalized_change: board.normalized_change(change_pct),
        amount: quote.amount,
        main_net_inflow: quote.main_net_inflow,
        flow_ratio: ratio,
        flow_rank,
        incremental_ratio,
        baseline: baseline.label().to_string(),
        price_tier,
        flow_tier,
        band,
        traps,
        decision,
        tier: decision.tier(),
    }
}

fn compare_results(a: &ScanResult, b: &ScanResult) -> Ordering {
    let ra = a.flow_ratio.unwrap_or(f64::NEG_INFINITY);
    let rb = b.flow_ratio.unwrap_or(f64::NEG_INFINITY);
    a.decision
        .priority()
        .cmp(&b.decision.priority())
        .then_with(|| rb.total_cmp(&ra))
        .then_with(|| a.code.cmp(&b.code))
}
