// src/handlers/evaluate.rs
use chrono::{NaiveDate, Utc};
use chrono_tz::America::New_York;
use log::{error, info};
use serde::Deserialize;
use warp::Rejection;

use crate::services::evaluate::{run_evaluation, EvaluationRequest};
use crate::services::export::rows_to_csv;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct EvaluateQuery {
    pub symbol: String,
    #[serde(default = "default_shares")]
    pub shares: f64,
    /// Defaults to today's Eastern session date.
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub filter: bool,
}

fn default_shares() -> f64 {
    100.0
}

fn today_eastern() -> NaiveDate {
    Utc::now().with_timezone(&New_York).date_naive()
}

fn to_request(query: EvaluateQuery) -> Result<EvaluationRequest, Rejection> {
    if query.symbol.trim().is_empty() {
        return Err(warp::reject::custom(ApiError::bad_request(
            "symbol must not be empty",
        )));
    }
    Ok(EvaluationRequest {
        symbol: query.symbol.trim().to_uppercase(),
        shares: query.shares,
        purchase_date: query.purchase_date.unwrap_or_else(today_eastern),
        filter_criteria: query.filter,
    })
}

pub async fn get_evaluation(query: EvaluateQuery) -> Result<impl warp::Reply, Rejection> {
    let request = to_request(query)?;
    info!(
        "Handling evaluation request: {} x{} purchased {}",
        request.symbol, request.shares, request.purchase_date
    );

    match run_evaluation(&request).await {
        Ok(report) => Ok(warp::reply::json(&report)),
        Err(e) => {
            error!("Evaluation failed for {}: {:#}", request.symbol, e);
            Err(warp::reject::custom(ApiError::no_data(e.to_string())))
        }
    }
}

pub async fn get_evaluation_csv(query: EvaluateQuery) -> Result<impl warp::Reply, Rejection> {
    let request = to_request(query)?;
    info!("Handling CSV export request for {}", request.symbol);

    let report = run_evaluation(&request).await.map_err(|e| {
        error!("Evaluation failed for {}: {:#}", request.symbol, e);
        warp::reject::custom(ApiError::no_data(e.to_string()))
    })?;

    let csv = rows_to_csv(&report.rows).map_err(|e| {
        error!("CSV serialization failed: {:#}", e);
        warp::reject::custom(ApiError::new(e.to_string()))
    })?;

    Ok(warp::reply::with_header(
        csv,
        "content-type",
        "text/csv; charset=utf-8",
    ))
}
