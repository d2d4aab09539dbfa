// src/services/evaluate.rs
//
// Candidate screening and evaluation. `run_evaluation` pulls live data and
// hands it to the synchronous screener, so everything below the fetch layer
// stays pure and testable.
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::Deserialize;

use crate::models::{
    to_utc_midnight, CadenceEstimate, DividendRecord, EvaluationReport, EvaluationRow,
    OptionCandidate, ScenarioResult,
};

use super::dividends::{estimate_cadence, project_payment_dates};
use super::scenario::{compute_scenarios, days_held, ScenarioInputs};
use super::yahoo;

// Expiration window: roughly 6 to 18 months out.
pub const MIN_DAYS_OUT: i64 = 6 * 30;
pub const MAX_DAYS_OUT: i64 = 18 * 30;

// ITM band: strikes 10-40% below the stock price.
pub const STRIKE_BAND_LOW: f64 = 0.6;
pub const STRIKE_BAND_HIGH: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub symbol: String,
    pub shares: f64,
    pub purchase_date: NaiveDate,
    /// When set, only rows meeting the criteria predicate are returned.
    pub filter_criteria: bool,
}

/// Ad-hoc scenario with user-supplied quote fields instead of a live chain.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatIfScenario {
    pub symbol: String,
    pub shares: f64,
    pub purchase_date: NaiveDate,
    pub stock_price: f64,
    pub strike: f64,
    pub expiration: NaiveDate,
    /// Stands in for (bid + ask) / 2.
    pub option_price: f64,
}

pub fn expirations_in_window(
    expirations: &[DateTime<Utc>],
    purchase: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    expirations
        .iter()
        .copied()
        .filter(|exp| {
            let days = (*exp - purchase).num_days();
            (MIN_DAYS_OUT..=MAX_DAYS_OUT).contains(&days)
        })
        .collect()
}

pub fn strikes_in_band(chain: Vec<OptionCandidate>, stock_price: f64) -> Vec<OptionCandidate> {
    let lower = stock_price * STRIKE_BAND_LOW;
    let upper = stock_price * STRIKE_BAND_HIGH;
    chain
        .into_iter()
        .filter(|c| c.strike >= lower && c.strike <= upper)
        .collect()
}

pub fn meets_criteria(option_premium: f64, hold: &ScenarioResult) -> bool {
    option_premium > 0.0 && hold.total_return_pct > 10.0 && hold.annualized_return_pct > 10.0
}

struct RowContext<'a> {
    symbol: &'a str,
    purchase: DateTime<Utc>,
    stock_price: f64,
    shares: f64,
    cadence: &'a CadenceEstimate,
}

fn assemble_row(
    ctx: &RowContext<'_>,
    projected: &[DateTime<Utc>],
    expiration: DateTime<Utc>,
    strike: f64,
    option_price: f64,
    open_interest: Option<u64>,
) -> EvaluationRow {
    let net_debit = ctx.stock_price - option_price;
    let option_premium = strike + option_price - ctx.stock_price;
    let single_dividend = ctx.cadence.single_dividend();

    let inputs = ScenarioInputs {
        shares: ctx.shares,
        purchase: ctx.purchase,
        expiration,
        net_debit,
        option_premium,
        single_dividend,
    };
    let (hold, called_early) = compute_scenarios(&inputs, projected);

    EvaluationRow {
        symbol: ctx.symbol.to_string(),
        purchase_date: ctx.purchase.date_naive(),
        stock_price: ctx.stock_price,
        yearly_dividend: ctx.cadence.yearly_dividend,
        forward_dividend_pct: ctx.cadence.yearly_dividend / ctx.stock_price * 100.0,
        dividend_frequency: ctx.cadence.frequency,
        next_dividend_date: ctx.cadence.next_payment.map(|d| d.date_naive()),
        expiration: expiration.date_naive(),
        strike,
        option_price,
        net_debit,
        option_premium,
        premium_less_single_dividend: option_premium - single_dividend,
        dividend_at_strike_pct: ctx.cadence.yearly_dividend / strike * 100.0,
        open_interest,
        days_held: days_held(ctx.purchase, expiration),
        meets_criteria: meets_criteria(option_premium, &hold),
        hold,
        called_early,
    }
}

/// Index of the row with the highest hold-scenario total return. Ties keep
/// the earlier row, preserving the original iteration order.
pub fn best_row_index(rows: &[EvaluationRow]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, row) in rows.iter().enumerate() {
        match best {
            Some(j) if row.sort_key() <= rows[j].sort_key() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Screen pre-fetched chains into an evaluation report.
///
/// Per-expiration emptiness is recoverable and recorded as a warning; only a
/// globally empty result set is an error.
pub fn evaluate_snapshot(
    request: &EvaluationRequest,
    stock_price: f64,
    dividends: &[DividendRecord],
    chains: &[(DateTime<Utc>, Vec<OptionCandidate>)],
    mut warnings: Vec<String>,
) -> Result<EvaluationReport> {
    let purchase = to_utc_midnight(request.purchase_date);
    let cadence = estimate_cadence(dividends, purchase);
    let ctx = RowContext {
        symbol: &request.symbol,
        purchase,
        stock_price,
        shares: request.shares,
        cadence: &cadence,
    };

    let mut rows = Vec::new();
    for (expiration, chain) in chains {
        if chain.is_empty() {
            let msg = format!("no call options for expiration {}", expiration.date_naive());
            warn!("{}", msg);
            warnings.push(msg);
            continue;
        }

        let candidates = strikes_in_band(chain.clone(), stock_price);
        if candidates.is_empty() {
            let msg = format!(
                "no ITM options 10-40% below stock price for expiration {}",
                expiration.date_naive()
            );
            warn!("{}", msg);
            warnings.push(msg);
            continue;
        }

        // Fresh projection per expiration; each one is a different horizon.
        let projected = match cadence.last_payment {
            Some(last) => {
                project_payment_dates(last, cadence.average_interval_days, *expiration)
            }
            None => Vec::new(),
        };

        for candidate in &candidates {
            rows.push(assemble_row(
                &ctx,
                &projected,
                *expiration,
                candidate.strike,
                candidate.mid_price(),
                Some(candidate.open_interest),
            ));
        }
    }

    if rows.is_empty() {
        bail!(
            "no ITM options 10-40% below stock price found in the 6-18 month window"
        );
    }

    if request.filter_criteria {
        rows.retain(|row| row.meets_criteria);
        if rows.is_empty() {
            bail!("no options meet the criteria");
        }
    }

    let best_index = best_row_index(&rows);
    info!(
        "evaluated {} candidate(s) for {}, {} warning(s)",
        rows.len(),
        request.symbol,
        warnings.len()
    );

    Ok(EvaluationReport {
        symbol: request.symbol.clone(),
        purchase_date: request.purchase_date,
        stock_price,
        shares: request.shares,
        yearly_dividend: cadence.yearly_dividend,
        dividend_frequency: cadence.frequency,
        rows,
        best_index,
        warnings,
    })
}

/// Fetch live data for the request and evaluate it.
pub async fn run_evaluation(request: &EvaluationRequest) -> Result<EvaluationReport> {
    let purchase = to_utc_midnight(request.purchase_date);

    let stock_price = yahoo::fetch_close_on_or_before(&request.symbol, request.purchase_date)
        .await
        .context("no stock price data available for the selected purchase date")?;
    info!(
        "{} close on or before {}: {:.2}",
        request.symbol, request.purchase_date, stock_price
    );

    // A missing dividend history is not fatal: the cadence estimator treats
    // it as a non-payer.
    let dividends = match yahoo::fetch_dividend_history(&request.symbol).await {
        Ok(records) => records,
        Err(e) => {
            warn!("failed to fetch dividend history for {}: {:#}", request.symbol, e);
            Vec::new()
        }
    };

    let expirations = yahoo::fetch_expirations(&request.symbol)
        .await
        .context("failed to list option expirations")?;
    let in_window = expirations_in_window(&expirations, purchase);
    if in_window.is_empty() {
        bail!("no expirations available between 6 and 18 months from purchase date");
    }

    let mut warnings = Vec::new();
    let mut chains = Vec::new();
    for expiration in in_window {
        match yahoo::fetch_call_chain(&request.symbol, expiration).await {
            Ok(chain) => chains.push((expiration, chain)),
            Err(e) => {
                let msg = format!(
                    "error fetching option chain for {}: {:#}",
                    expiration.date_naive(),
                    e
                );
                warn!("{}", msg);
                warnings.push(msg);
            }
        }
    }

    evaluate_snapshot(request, stock_price, &dividends, &chains, warnings)
}

/// Evaluate a single synthetic candidate with the same calculator the
/// screener uses. The projection is re-derived from the same cadence, so a
/// what-if sharing an expiration with a screened row sees the same payment
/// dates.
pub fn evaluate_what_if(
    scenario: &WhatIfScenario,
    dividends: &[DividendRecord],
) -> EvaluationRow {
    let purchase = to_utc_midnight(scenario.purchase_date);
    let expiration = to_utc_midnight(scenario.expiration);
    let cadence = estimate_cadence(dividends, purchase);

    let projected = match cadence.last_payment {
        Some(last) => project_payment_dates(last, cadence.average_interval_days, expiration),
        None => Vec::new(),
    };

    let ctx = RowContext {
        symbol: &scenario.symbol,
        purchase,
        stock_price: scenario.stock_price,
        shares: scenario.shares,
        cadence: &cadence,
    };
    assemble_row(
        &ctx,
        &projected,
        expiration,
        scenario.strike,
        scenario.option_price,
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        to_utc_midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn naive(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request() -> EvaluationRequest {
        EvaluationRequest {
            symbol: "OKE".to_string(),
            shares: 100.0,
            purchase_date: naive(2024, 1, 1),
            filter_criteria: false,
        }
    }

    fn quarterly_dividends() -> Vec<DividendRecord> {
        vec![
            DividendRecord { date: day(2023, 3, 17), amount: 0.80 },
            DividendRecord { date: day(2023, 6, 16), amount: 0.80 },
            DividendRecord { date: day(2023, 9, 15), amount: 0.80 },
            DividendRecord { date: day(2023, 12, 15), amount: 0.80 },
        ]
    }

    fn candidate(strike: f64, bid: f64, ask: f64, expiration: DateTime<Utc>) -> OptionCandidate {
        OptionCandidate { strike, bid, ask, open_interest: 250, expiration }
    }

    #[test]
    fn expiration_window_keeps_6_to_18_months() {
        let purchase = day(2024, 1, 1);
        let expirations = vec![
            purchase + chrono::Duration::days(179),
            purchase + chrono::Duration::days(180),
            purchase + chrono::Duration::days(360),
            purchase + chrono::Duration::days(540),
            purchase + chrono::Duration::days(541),
        ];
        let kept = expirations_in_window(&expirations, purchase);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0], expirations[1]);
        assert_eq!(kept[2], expirations[3]);
    }

    #[test]
    fn strike_band_is_60_to_90_percent_of_price() {
        let exp = day(2024, 10, 1);
        let chain = vec![
            candidate(40.0, 1.0, 1.2, exp),  // below band
            candidate(48.0, 1.0, 1.2, exp),  // lower edge
            candidate(72.0, 1.0, 1.2, exp),  // upper edge
            candidate(80.0, 1.0, 1.2, exp),  // at the money, excluded
        ];
        let kept = strikes_in_band(chain, 80.0);
        let strikes: Vec<f64> = kept.iter().map(|c| c.strike).collect();
        assert_eq!(strikes, vec![48.0, 72.0]);
    }

    #[test]
    fn criteria_requires_positive_premium_and_double_digit_returns() {
        let hold = ScenarioResult {
            payments_received: 3,
            cash_flow: 440.0,
            total_return_pct: 12.0,
            annualized_return_pct: 15.0,
        };
        assert!(meets_criteria(2.0, &hold));
        assert!(!meets_criteria(0.0, &hold));
        assert!(!meets_criteria(2.0, &ScenarioResult { total_return_pct: 10.0, ..hold }));
        assert!(!meets_criteria(2.0, &ScenarioResult { annualized_return_pct: 9.9, ..hold }));
    }

    #[test]
    fn snapshot_builds_rows_and_flags_criteria() {
        let exp = day(2024, 10, 1);
        let chains = vec![(exp, vec![candidate(60.0, 21.5, 22.5, exp)])];
        let report =
            evaluate_snapshot(&request(), 80.0, &quarterly_dividends(), &chains, Vec::new())
                .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.dividend_frequency, 4);
        let row = &report.rows[0];
        assert_eq!(row.hold.payments_received, 3);
        assert_eq!(row.called_early.payments_received, 2);
        assert_eq!(row.days_held, 274);
        assert!((row.option_premium - 2.0).abs() < 1e-9);
        // 440 / 5800 * 100 is under 10%, so the criteria flag stays off.
        assert!(!row.meets_criteria);
        assert_eq!(report.best_index, Some(0));
    }

    #[test]
    fn empty_chain_and_empty_band_become_warnings() {
        let exp_a = day(2024, 8, 16);
        let exp_b = day(2024, 10, 18);
        let exp_c = day(2024, 12, 20);
        let chains = vec![
            (exp_a, Vec::new()),
            (exp_b, vec![candidate(79.0, 1.0, 1.4, exp_b)]), // outside the band
            (exp_c, vec![candidate(65.0, 17.0, 18.0, exp_c)]),
        ];
        let report =
            evaluate_snapshot(&request(), 80.0, &quarterly_dividends(), &chains, Vec::new())
                .unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("no call options"));
        assert!(report.warnings[1].contains("no ITM options"));
    }

    #[test]
    fn globally_empty_result_is_terminal() {
        let exp = day(2024, 10, 1);
        let chains = vec![(exp, Vec::new())];
        let err = evaluate_snapshot(&request(), 80.0, &quarterly_dividends(), &chains, Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("6-18 month window"));
    }

    #[test]
    fn criteria_filter_can_empty_the_result() {
        let exp = day(2024, 10, 1);
        // Thin premium: every row fails the criteria.
        let chains = vec![(exp, vec![candidate(60.0, 19.9, 20.1, exp)])];
        let mut req = request();
        req.filter_criteria = true;
        let err = evaluate_snapshot(&req, 80.0, &quarterly_dividends(), &chains, Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("no options meet the criteria"));
    }

    #[test]
    fn best_row_keeps_the_earlier_of_tied_rows() {
        let exp = day(2024, 10, 1);
        let chains = vec![(
            exp,
            vec![
                candidate(60.0, 21.5, 22.5, exp),
                candidate(60.0, 21.5, 22.5, exp), // identical economics
                candidate(72.0, 11.5, 12.5, exp),
            ],
        )];
        let report =
            evaluate_snapshot(&request(), 80.0, &quarterly_dividends(), &chains, Vec::new())
                .unwrap();

        // Strike 72 has a better hold return; among ties the first wins.
        assert_eq!(report.rows.len(), 3);
        let best = best_row_index(&report.rows).unwrap();
        assert_eq!(best, 2);
        let tied = best_row_index(&report.rows[..2].to_vec()).unwrap();
        assert_eq!(tied, 0);
    }

    #[test]
    fn what_if_reuses_the_projection_for_a_shared_expiration() {
        let exp = day(2024, 10, 1);
        let chains = vec![(exp, vec![candidate(60.0, 21.5, 22.5, exp)])];
        let dividends = quarterly_dividends();
        let report =
            evaluate_snapshot(&request(), 80.0, &dividends, &chains, Vec::new()).unwrap();

        let scenario = WhatIfScenario {
            symbol: "OKE".to_string(),
            shares: 100.0,
            purchase_date: naive(2024, 1, 1),
            stock_price: 80.0,
            strike: 65.0,
            expiration: naive(2024, 10, 1),
            option_price: 18.0,
        };
        let row = evaluate_what_if(&scenario, &dividends);

        assert_eq!(
            row.hold.payments_received,
            report.rows[0].hold.payments_received
        );
        assert!(row.open_interest.is_none());
        assert!((row.option_premium - 3.0).abs() < 1e-9);
    }

    #[test]
    fn what_if_without_history_projects_nothing() {
        let scenario = WhatIfScenario {
            symbol: "ZRO".to_string(),
            shares: 100.0,
            purchase_date: naive(2024, 1, 1),
            stock_price: 80.0,
            strike: 65.0,
            expiration: naive(2024, 10, 1),
            option_price: 18.0,
        };
        let row = evaluate_what_if(&scenario, &[]);
        assert_eq!(row.hold.payments_received, 0);
        assert_eq!(row.hold, row.called_early);
        assert_eq!(row.dividend_frequency, 1);
        assert_eq!(row.yearly_dividend, 0.0);
    }
}
