// src/services/yahoo.rs
//
// Market data via the Yahoo Finance JSON endpoints: daily candles and
// dividend events from the v8 chart API, option chains from the v7 options
// API. Base URL is overridable so the service can run against a fixture
// server.
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::America::New_York;
use log::info;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

use crate::models::{to_utc_midnight, DividendRecord, OptionCandidate};

const DEFAULT_BASE: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

fn base_url() -> String {
    env::var("YAHOO_API_BASE").unwrap_or_else(|_| DEFAULT_BASE.to_string())
}

fn client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")
}

/// Calendar date of the US trading session a candle/event timestamp belongs
/// to. Feed timestamps are epoch seconds during Eastern market hours.
fn session_date(epoch: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|dt| dt.with_timezone(&New_York).date_naive())
}

// --- v8 chart API -----------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartOutcome,
}

#[derive(Debug, Deserialize)]
struct ChartOutcome {
    result: Option<Vec<ChartData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    events: Option<ChartEvents>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

async fn fetch_chart(url: &str) -> Result<ChartData> {
    info!("Fetching chart data from URL: {}", url);
    let envelope: ChartEnvelope = client()?
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(err) = envelope.chart.error {
        if !err.is_null() {
            return Err(anyhow!("chart API error: {}", err));
        }
    }
    envelope
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| anyhow!("empty chart API result"))
}

/// Last daily close at or before the given date. Looks back 30 calendar days
/// to bridge weekends and holidays.
pub async fn fetch_close_on_or_before(symbol: &str, date: NaiveDate) -> Result<f64> {
    let end = to_utc_midnight(date) + Duration::days(1);
    let start = end - Duration::days(30);
    let url = format!(
        "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
        base_url(),
        symbol,
        start.timestamp(),
        end.timestamp()
    );
    let chart = fetch_chart(&url).await?;

    let closes = chart
        .indicators
        .quote
        .first()
        .ok_or_else(|| anyhow!("no quote block in chart response"))?;

    let mut last_close = None;
    for (ts, close) in chart.timestamp.iter().zip(closes.close.iter()) {
        let session = match session_date(*ts) {
            Some(d) => d,
            None => continue,
        };
        if session > date {
            continue;
        }
        if let Some(price) = close {
            last_close = Some(*price);
        }
    }

    last_close.ok_or_else(|| anyhow!("no close for {} on or before {}", symbol, date))
}

/// Full dividend history in chronological order, one record per session date.
pub async fn fetch_dividend_history(symbol: &str) -> Result<Vec<DividendRecord>> {
    let url = format!(
        "{}/v8/finance/chart/{}?period1=0&period2={}&interval=1d&events=div",
        base_url(),
        symbol,
        Utc::now().timestamp()
    );
    let chart = fetch_chart(&url).await?;

    let mut records: Vec<DividendRecord> = chart
        .events
        .map(|events| events.dividends)
        .unwrap_or_default()
        .into_values()
        .filter_map(|event| {
            session_date(event.date).map(|d| DividendRecord {
                date: to_utc_midnight(d),
                amount: event.amount,
            })
        })
        .collect();

    records.sort_by_key(|r| r.date);
    records.dedup_by_key(|r| r.date);
    info!("{}: {} dividend record(s)", symbol, records.len());
    Ok(records)
}

// --- v7 options API ---------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: OptionsOutcome,
}

#[derive(Debug, Deserialize)]
struct OptionsOutcome {
    result: Option<Vec<OptionsData>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OptionsData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Deserialize)]
struct OptionsBlock {
    #[serde(default)]
    calls: Vec<CallQuote>,
}

#[derive(Debug, Deserialize)]
struct CallQuote {
    strike: f64,
    #[serde(default)]
    bid: f64,
    #[serde(default)]
    ask: f64,
    #[serde(rename = "openInterest", default)]
    open_interest: u64,
}

async fn fetch_options(url: &str) -> Result<OptionsData> {
    info!("Fetching option data from URL: {}", url);
    let envelope: OptionsEnvelope = client()?
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(err) = envelope.option_chain.error {
        if !err.is_null() {
            return Err(anyhow!("options API error: {}", err));
        }
    }
    envelope
        .option_chain
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| anyhow!("empty options API result"))
}

/// All listed option expirations for the symbol, as midnight-UTC anchors.
/// The feed quotes expirations as midnight-UTC epochs already, so the UTC
/// calendar date is the contract date.
pub async fn fetch_expirations(symbol: &str) -> Result<Vec<DateTime<Utc>>> {
    let url = format!("{}/v7/finance/options/{}", base_url(), symbol);
    let data = fetch_options(&url).await?;

    let expirations: Vec<DateTime<Utc>> = data
        .expiration_dates
        .iter()
        .filter_map(|epoch| DateTime::<Utc>::from_timestamp(*epoch, 0))
        .map(|dt| to_utc_midnight(dt.date_naive()))
        .collect();
    info!("{}: {} listed expiration(s)", symbol, expirations.len());
    Ok(expirations)
}

/// Call side of the chain for one expiration.
pub async fn fetch_call_chain(
    symbol: &str,
    expiration: DateTime<Utc>,
) -> Result<Vec<OptionCandidate>> {
    let url = format!(
        "{}/v7/finance/options/{}?date={}",
        base_url(),
        symbol,
        expiration.timestamp()
    );
    let data = fetch_options(&url).await?;

    let calls = data
        .options
        .first()
        .map(|block| block.calls.as_slice())
        .unwrap_or(&[]);

    Ok(calls
        .iter()
        .map(|quote| OptionCandidate {
            strike: quote.strike,
            bid: quote.bid,
            ask: quote.ask,
            open_interest: quote.open_interest,
            expiration,
        })
        .collect())
}
