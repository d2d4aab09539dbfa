use buywrite_dashboard::services::yahoo;
use chrono::Utc;
use chrono_tz::America::New_York;
use log::info;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let symbol = env::args().nth(1).unwrap_or_else(|| "OKE".to_string());
    info!("Debugging Yahoo Finance feeds for {}...", symbol);

    let today = Utc::now().with_timezone(&New_York).date_naive();

    let price = yahoo::fetch_close_on_or_before(&symbol, today).await?;
    println!("{} last close on or before {}: {:.2}", symbol, today, price);

    let dividends = yahoo::fetch_dividend_history(&symbol).await?;
    println!("{} dividend records: {}", symbol, dividends.len());
    for record in dividends.iter().rev().take(8) {
        println!("  {}  {:.4}", record.date.date_naive(), record.amount);
    }

    let expirations = yahoo::fetch_expirations(&symbol).await?;
    println!("{} listed expirations: {}", symbol, expirations.len());

    if let Some(first) = expirations.first() {
        let chain = yahoo::fetch_call_chain(&symbol, *first).await?;
        println!("calls for {}: {}", first.date_naive(), chain.len());
        for call in chain.iter().take(5) {
            println!(
                "  strike {:.2}  bid {:.2}  ask {:.2}  oi {}",
                call.strike, call.bid, call.ask, call.open_interest
            );
        }
    }

    Ok(())
}
