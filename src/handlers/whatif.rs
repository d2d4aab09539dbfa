// src/handlers/whatif.rs
use log::{error, info, warn};
use warp::reply::Json;
use warp::Rejection;

use crate::services::evaluate::{evaluate_what_if, WhatIfScenario};
use crate::services::yahoo;

use super::error::ApiError;

pub async fn post_what_if(scenario: WhatIfScenario) -> Result<Json, Rejection> {
    info!(
        "Handling what-if request: {} strike {} exp {}",
        scenario.symbol, scenario.strike, scenario.expiration
    );

    if scenario.symbol.trim().is_empty() {
        return Err(warp::reject::custom(ApiError::bad_request(
            "symbol must not be empty",
        )));
    }
    if scenario.shares <= 0.0 {
        error!("rejecting what-if with non-positive share count");
        return Err(warp::reject::custom(ApiError::bad_request(
            "shares must be positive",
        )));
    }

    // The scenario supplies its own quote; only the dividend cadence comes
    // from the feed, and a missing history degrades to a non-payer.
    let dividends = match yahoo::fetch_dividend_history(scenario.symbol.trim()).await {
        Ok(records) => records,
        Err(e) => {
            warn!(
                "failed to fetch dividend history for {}: {:#}",
                scenario.symbol, e
            );
            Vec::new()
        }
    };

    let row = evaluate_what_if(&scenario, &dividends);
    Ok(warp::reply::json(&row))
}
