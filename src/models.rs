// src/models.rs
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One historical dividend payment. Records arrive from the data feed in
/// chronological order with strictly increasing dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendRecord {
    pub date: DateTime<Utc>,
    pub amount: f64,
}

/// Payment cadence inferred from the trailing 12 months of dividend history.
#[derive(Debug, Clone, Serialize)]
pub struct CadenceEstimate {
    /// Number of payments observed in the trailing year, floored at 1.
    pub frequency: u32,
    /// Sum of trailing-year payment amounts; 0.0 when there is no history.
    pub yearly_dividend: f64,
    pub average_interval_days: f64,
    pub last_payment: Option<DateTime<Utc>>,
    /// Display-only estimate of the next payment date.
    pub next_payment: Option<DateTime<Utc>>,
}

impl CadenceEstimate {
    /// Per-payment amount. `frequency >= 1` is guaranteed by the estimator.
    pub fn single_dividend(&self) -> f64 {
        self.yearly_dividend / self.frequency as f64
    }
}

/// A call contract from one expiration's chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionCandidate {
    pub strike: f64,
    pub bid: f64,
    pub ask: f64,
    pub open_interest: u64,
    pub expiration: DateTime<Utc>,
}

impl OptionCandidate {
    pub fn mid_price(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }

    /// Cost basis per share after the premium received.
    pub fn net_debit(&self, stock_price: f64) -> f64 {
        stock_price - self.mid_price()
    }

    /// Profit per share if assigned at the strike.
    pub fn option_premium(&self, stock_price: f64) -> f64 {
        self.strike + self.mid_price() - stock_price
    }
}

/// Outcome of one holding scenario (hold to expiration, or called early).
/// Percentages stay raw floats; formatting happens at the presentation edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub payments_received: usize,
    pub cash_flow: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
}

/// One screened (expiration, strike) candidate with both scenarios attached.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRow {
    pub symbol: String,
    pub purchase_date: NaiveDate,
    pub stock_price: f64,
    pub yearly_dividend: f64,
    pub forward_dividend_pct: f64,
    pub dividend_frequency: u32,
    pub next_dividend_date: Option<NaiveDate>,
    pub expiration: NaiveDate,
    pub strike: f64,
    pub option_price: f64,
    pub net_debit: f64,
    pub option_premium: f64,
    pub premium_less_single_dividend: f64,
    pub dividend_at_strike_pct: f64,
    /// Absent for what-if rows, which have no live quote behind them.
    pub open_interest: Option<u64>,
    pub days_held: i64,
    pub hold: ScenarioResult,
    pub called_early: ScenarioResult,
    pub meets_criteria: bool,
}

impl EvaluationRow {
    /// Raw ranking key used by the frontend: hold-scenario total return.
    pub fn sort_key(&self) -> f64 {
        self.hold.total_return_pct
    }
}

/// Full result of one evaluation run. Built fresh per request, never cached.
#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub symbol: String,
    pub purchase_date: NaiveDate,
    pub stock_price: f64,
    pub shares: f64,
    pub yearly_dividend: f64,
    pub dividend_frequency: u32,
    pub rows: Vec<EvaluationRow>,
    /// Index into `rows` of the best hold-scenario total return, ties going
    /// to the earlier row.
    pub best_index: Option<usize>,
    /// Per-expiration skip reasons accumulated during the run.
    pub warnings: Vec<String>,
}

/// Midnight UTC of a calendar date. All day-count arithmetic in the engine
/// runs on these anchors so that date differences are exact whole days.
pub fn to_utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
}
