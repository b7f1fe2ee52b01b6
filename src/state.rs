// src/state.rs
use chrono::{Duration, NaiveDate};
use tokio::sync::Mutex;

use crate::models::{ObservationSeries, PollSnapshot};
use crate::services::cache::TtlCache;
use crate::services::fred::{FredClient, FredConfig};
use crate::services::polls::{PollSource, PollsClient};

/// Cache key for a series fetch: the full set of call arguments.
pub type SeriesKey = (String, NaiveDate, NaiveDate);

/// Shared state handed to every handler behind an `Arc`.
///
/// The fetch clients are stateless; the caches and the last-seen poll
/// snapshot are the only mutable pieces, and both sit behind their own
/// locks so overlapping requests stay safe.
pub struct AppState {
    pub fred: FredClient,
    pub polls: PollsClient,
    pub poll_source: PollSource,
    pub series_cache: TtlCache<SeriesKey, ObservationSeries>,
    pub polls_cache: TtlCache<String, PollSnapshot>,
    pub last_snapshot: Mutex<Option<PollSnapshot>>,
}

impl AppState {
    pub fn new(fred_config: FredConfig, poll_source: PollSource) -> Self {
        AppState {
            fred: FredClient::new(fred_config),
            polls: PollsClient::new(),
            poll_source,
            series_cache: TtlCache::new(Duration::minutes(15)),
            polls_cache: TtlCache::new(Duration::hours(1)),
            last_snapshot: Mutex::new(None),
        }
    }
}
