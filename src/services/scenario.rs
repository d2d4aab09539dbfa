// src/services/scenario.rs
//
// Cash-flow and yield outcomes for one candidate contract under the two
// holding scenarios: held to expiration, or called away early.
use chrono::{DateTime, Utc};

use crate::models::ScenarioResult;

/// Per-contract figures shared by both scenarios.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioInputs {
    pub shares: f64,
    pub purchase: DateTime<Utc>,
    pub expiration: DateTime<Utc>,
    pub net_debit: f64,
    pub option_premium: f64,
    pub single_dividend: f64,
}

/// Whole days between two instants, floored at 1 so same-day expirations
/// never divide by zero.
pub fn days_held(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days().max(1)
}

fn returns(inputs: &ScenarioInputs, payments: usize, days: i64) -> ScenarioResult {
    let cash_flow =
        inputs.shares * (inputs.option_premium + payments as f64 * inputs.single_dividend);
    // No guard on net_debit <= 0; a degenerate quote (bid+ask >= 2x the
    // stock price) surfaces as an extreme percentage rather than an error.
    let total_return_pct = cash_flow / (inputs.shares * inputs.net_debit) * 100.0;
    let annualized_return_pct = total_return_pct * 365.0 / days as f64;

    ScenarioResult {
        payments_received: payments,
        cash_flow,
        total_return_pct,
        annualized_return_pct,
    }
}

/// Compute (hold, called-early) outcomes from the projected payment dates.
///
/// Hold counts every projected date inside the holding window. Called-early
/// models assignment exactly on the last in-window date, so only payments
/// strictly before it are collected; with no dates in window it collapses to
/// the hold scenario's day count and zero payments.
pub fn compute_scenarios(
    inputs: &ScenarioInputs,
    projected: &[DateTime<Utc>],
) -> (ScenarioResult, ScenarioResult) {
    let in_window: Vec<DateTime<Utc>> = projected
        .iter()
        .copied()
        .filter(|d| *d > inputs.purchase && *d <= inputs.expiration)
        .collect();

    let hold = returns(
        inputs,
        in_window.len(),
        days_held(inputs.purchase, inputs.expiration),
    );

    let early = match in_window.last() {
        Some(&call_date) => {
            let paid_before = in_window.iter().filter(|d| **d < call_date).count();
            returns(inputs, paid_before, days_held(inputs.purchase, call_date))
        }
        None => returns(inputs, 0, days_held(inputs.purchase, inputs.expiration)),
    };

    (hold, early)
}
