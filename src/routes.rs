// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::{ApiError, ApiErrorKind};
use crate::handlers::polls::{get_poll_updates, get_polls};
use crate::handlers::series::{get_series, get_series_latest, SeriesQuery};
use crate::state::AppState;

// Add recovery handling for our custom errors
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = match api_error.kind {
            ApiErrorKind::BadRequest => warp::http::StatusCode::BAD_REQUEST,
            ApiErrorKind::Upstream => warp::http::StatusCode::BAD_GATEWAY,
            ApiErrorKind::Configuration | ApiErrorKind::Internal => {
                warp::http::StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        message = api_error.message.clone();
    } else if let Some(query_error) = err.find::<warp::reject::InvalidQuery>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = query_error.to_string();
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

pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let series_route = warp::path!("api" / "v1" / "series" / String)
        .and(warp::get())
        .and(warp::query::<SeriesQuery>())
        .and(state_filter.clone())
        .and_then(get_series);

    let series_latest_route = warp::path!("api" / "v1" / "series" / String / "latest")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_series_latest);

    let polls_route = warp::path!("api" / "v1" / "polls")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_polls);

    let poll_updates_route = warp::path!("api" / "v1" / "polls" / "updates")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_poll_updates);

    info!("All routes configured successfully.");

    series_latest_route
        .or(series_route)
        .or(poll_updates_route)
        .or(polls_route)
        .recover(handle_rejection)
}
