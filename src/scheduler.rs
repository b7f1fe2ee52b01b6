// src/scheduler.rs
use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::error::FetchError;
use crate::state::AppState;

/// Hourly background refresh, kept outside the fetch layer itself.
///
/// Re-fetches the poll table at the top of every hour, warms the cache and
/// advances the last-seen snapshot. A failed run is logged and the job
/// simply fires again next hour; the fetchers never retry on their own.
pub async fn start(state: Arc<AppState>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job_state = state.clone();
    let job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            match refresh_polls(&state).await {
                Ok((total, fresh)) => {
                    info!("Scheduled poll refresh: {} rows, {} new", total, fresh)
                }
                Err(e) => error!("Scheduled poll refresh failed: {}", e),
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Hourly poll refresh scheduled");
    Ok(scheduler)
}

async fn refresh_polls(state: &Arc<AppState>) -> Result<(usize, usize), FetchError> {
    let key = state.poll_source.export_url()?;

    let previous = state.last_snapshot.lock().await.clone();
    let (snapshot, delta) = state
        .polls
        .fetch_polls_with_delta(&state.poll_source, previous.as_ref())
        .await?;

    state.polls_cache.put(key, snapshot.clone()).await;
    let counts = (snapshot.len(), delta.records.len());
    *state.last_snapshot.lock().await = Some(snapshot);
    Ok(counts)
}
