// src/routes.rs
use crate::handlers::evaluate::{get_evaluation, get_evaluation_csv, EvaluateQuery};
use crate::handlers::whatif::post_what_if;
use log::info;

use crate::handlers::error::ApiError;
use std::convert::Infallible;
use warp::reject::Rejection;
use warp::{Filter, Reply};

// Add recovery handling for our custom errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes() -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let evaluate_route = warp::path!("api" / "v1" / "evaluate")
        .and(warp::get())
        .and(warp::query::<EvaluateQuery>())
        .and_then(get_evaluation);

    let evaluate_csv_route = warp::path!("api" / "v1" / "evaluate" / "csv")
        .and(warp::get())
        .and(warp::query::<EvaluateQuery>())
        .and_then(get_evaluation_csv);

    let whatif_route = warp::path!("api" / "v1" / "whatif")
        .and(warp::post())
        .and(warp::body::json())
        .and_then(post_what_if);

    info!("All routes configured successfully.");

    evaluate_route
        .or(evaluate_csv_route)
        .or(whatif_route)
        .recover(handle_rejection)
}
