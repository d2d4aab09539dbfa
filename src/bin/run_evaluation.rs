use buywrite_dashboard::services::evaluate::{run_evaluation, EvaluationRequest};
use buywrite_dashboard::services::export::rows_to_csv;
use chrono::{NaiveDate, Utc};
use chrono_tz::America::New_York;
use log::info;
use std::env;
use std::fs;

/// One-shot evaluation from the command line:
/// `run_evaluation <SYMBOL> [SHARES] [PURCHASE_DATE]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let mut args = env::args().skip(1);
    let symbol = args.next().unwrap_or_else(|| "OKE".to_string());
    let shares: f64 = match args.next() {
        Some(raw) => raw.parse()?,
        None => 100.0,
    };
    let purchase_date = match args.next() {
        Some(raw) => raw.parse::<NaiveDate>()?,
        None => Utc::now().with_timezone(&New_York).date_naive(),
    };

    let request = EvaluationRequest {
        symbol: symbol.to_uppercase(),
        shares,
        purchase_date,
        filter_criteria: false,
    };
    info!(
        "Evaluating {} x{} purchased {}",
        request.symbol, request.shares, request.purchase_date
    );

    let report = run_evaluation(&request).await?;

    println!(
        "{} @ {:.2} — {} candidate(s), yearly dividend {:.2} ({}x/yr)",
        report.symbol,
        report.stock_price,
        report.rows.len(),
        report.yearly_dividend,
        report.dividend_frequency
    );
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for (i, row) in report.rows.iter().enumerate() {
        let marker = if report.best_index == Some(i) { "*" } else { " " };
        println!(
            "{} {}  strike {:6.2}  premium {:6.2}  hold {:6.2}% ({:6.2}%/yr)  early {:6.2}% ({:6.2}%/yr)",
            marker,
            row.expiration,
            row.strike,
            row.option_premium,
            row.hold.total_return_pct,
            row.hold.annualized_return_pct,
            row.called_early.total_return_pct,
            row.called_early.annualized_return_pct
        );
    }

    let csv = rows_to_csv(&report.rows)?;
    fs::write("options_data.csv", csv)?;
    println!("wrote options_data.csv");

    Ok(())
}
