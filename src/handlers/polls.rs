// src/handlers/polls.rs
use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, error, info};
use serde::Serialize;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::{PollRecord, PollSnapshot};
use crate::state::AppState;

#[derive(Serialize)]
struct PollsResponse {
    records: Vec<PollRecord>,
    latest: Option<LatestPoll>,
}

#[derive(Serialize)]
struct LatestPoll {
    end_date: NaiveDate,
    pollster: String,
    sponsors: String,
    approval: Option<f64>,
}

#[derive(Serialize)]
struct PollUpdatesResponse {
    total: usize,
    new: usize,
    records: Vec<PollRecord>,
}

/// Net approval is presentation-derived, never stored on the record.
fn latest_summary(snapshot: &PollSnapshot) -> Option<LatestPoll> {
    snapshot.latest().map(|record| LatestPoll {
        end_date: record.end_date,
        pollster: record.pollster.clone(),
        sponsors: record.sponsors.clone(),
        approval: match (record.yes, record.no) {
            (Some(yes), Some(no)) => Some(yes - no),
            _ => None,
        },
    })
}

pub async fn get_polls(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for the poll table");

    let key = state.poll_source.export_url().map_err(|e| {
        error!("Poll source is misconfigured: {}", e);
        warp::reject::custom(ApiError::from(e))
    })?;

    let snapshot = match state.polls_cache.get(&key).await {
        Some(snapshot) => {
            debug!("Serving poll table from cache");
            snapshot
        }
        None => {
            let snapshot = state.polls.fetch_polls(&state.poll_source).await.map_err(|e| {
                error!("Failed to fetch poll table: {}", e);
                warp::reject::custom(ApiError::from(e))
            })?;
            state.polls_cache.put(key, snapshot.clone()).await;
            snapshot
        }
    };

    let response = PollsResponse {
        latest: latest_summary(&snapshot),
        records: snapshot.records,
    };
    Ok(warp::reply::json(&response))
}

/// Legacy diff variant: fetch fresh, report only the rows not seen in the
/// previous fetch, then remember the new snapshot for next time.
pub async fn get_poll_updates(state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for poll table updates");

    let previous = state.last_snapshot.lock().await.clone();
    let (snapshot, delta) = state
        .polls
        .fetch_polls_with_delta(&state.poll_source, previous.as_ref())
        .await
        .map_err(|e| {
            error!("Failed to fetch poll table: {}", e);
            warp::reject::custom(ApiError::from(e))
        })?;

    info!(
        "Poll table has {} rows, {} new since last fetch",
        snapshot.len(),
        delta.records.len()
    );
    *state.last_snapshot.lock().await = Some(snapshot.clone());

    let response = PollUpdatesResponse {
        total: snapshot.len(),
        new: delta.records.len(),
        records: delta.records,
    };
    Ok(warp::reply::json(&response))
}
