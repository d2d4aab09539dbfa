// src/services/export.rs
//
// Tabular export of evaluation rows. Pure serialization; percentages are
// formatted here and nowhere earlier.
use anyhow::Result;
use csv::Writer;

use crate::models::EvaluationRow;

const HEADERS: [&str; 25] = [
    "Meets Criteria",
    "Date Purchased",
    "Stock",
    "Stock Price",
    "Forward Dividend $",
    "Forward Dividend %",
    "Dividend Frequency",
    "Next Dividend Date",
    "Option Expiration",
    "Strike",
    "Option Price",
    "Net Debit",
    "Option Premium",
    "Premium - Single Dividend",
    "Dividend at Strike %",
    "Open Interest",
    "Days Held",
    "Hold: # of Payments",
    "Hold: Dividend + Premium",
    "Hold: Total %",
    "Hold: Annualized %",
    "Called Early: # of Payments",
    "Called Early: Dividend + Premium",
    "Called Early: Total %",
    "Called Early: Annualized %",
];

fn pct(value: f64) -> String {
    format!("{:.2}%", value)
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn record(row: &EvaluationRow) -> Vec<String> {
    vec![
        row.meets_criteria.to_string(),
        row.purchase_date.to_string(),
        row.symbol.clone(),
        money(row.stock_price),
        money(row.yearly_dividend),
        pct(row.forward_dividend_pct),
        row.dividend_frequency.to_string(),
        row.next_dividend_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        row.expiration.to_string(),
        money(row.strike),
        money(row.option_price),
        money(row.net_debit),
        money(row.option_premium),
        money(row.premium_less_single_dividend),
        pct(row.dividend_at_strike_pct),
        row.open_interest
            .map(|oi| oi.to_string())
            .unwrap_or_default(),
        row.days_held.to_string(),
        row.hold.payments_received.to_string(),
        money(row.hold.cash_flow),
        pct(row.hold.total_return_pct),
        pct(row.hold.annualized_return_pct),
        row.called_early.payments_received.to_string(),
        money(row.called_early.cash_flow),
        pct(row.called_early.total_return_pct),
        pct(row.called_early.annualized_return_pct),
    ]
}

/// Serialize rows to a CSV document with a header line.
pub fn rows_to_csv(rows: &[EvaluationRow]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(record(row))?;
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}
