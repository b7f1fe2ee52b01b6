// src/handlers/series.rs
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, error, info};
use serde::Deserialize;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SeriesQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub async fn get_series(
    series_id: String,
    query: SeriesQuery,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    info!(
        "Handling request for series {} ({} to {})",
        series_id, query.start, query.end
    );

    if query.start > query.end {
        return Err(warp::reject::custom(ApiError::bad_request(
            "start must not be after end",
        )));
    }

    let key = (series_id.clone(), query.start, query.end);
    if let Some(series) = state.series_cache.get(&key).await {
        debug!("Serving series {} from cache", series_id);
        return Ok(warp::reply::json(&series));
    }

    let series = state
        .fred
        .fetch_series(&series_id, query.start, query.end)
        .await
        .map_err(|e| {
            error!("Failed to fetch series {}: {}", series_id, e);
            warp::reject::custom(ApiError::from(e))
        })?;

    state.series_cache.put(key, series.clone()).await;
    Ok(warp::reply::json(&series))
}

pub async fn get_series_latest(
    series_id: String,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    info!("Handling request for latest observation of {}", series_id);

    let latest = state.fred.fetch_latest(&series_id).await.map_err(|e| {
        error!("Failed to fetch latest observation for {}: {}", series_id, e);
        warp::reject::custom(ApiError::from(e))
    })?;

    Ok(warp::reply::json(&latest))
}
