// src/services/fred.rs
use chrono::NaiveDate;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

use super::error::FetchError;
use crate::models::{Observation, ObservationSeries};

const FRED_OBSERVATIONS_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// FRED credential, read once at startup and injected into every client.
///
/// Nothing below this point touches the process environment, so tests can
/// hand in a fake key.
#[derive(Debug, Clone, Default)]
pub struct FredConfig {
    pub api_key: Option<String>,
}

impl FredConfig {
    pub fn from_env() -> Self {
        FredConfig {
            api_key: std::env::var("FRED_API_KEY").ok(),
        }
    }

    pub fn with_key(api_key: impl Into<String>) -> Self {
        FredConfig {
            api_key: Some(api_key.into()),
        }
    }
}

pub struct FredClient {
    client: Client,
    config: FredConfig,
}

impl FredClient {
    pub fn new(config: FredConfig) -> Self {
        FredClient {
            client: Client::new(),
            config,
        }
    }

    /// Download observations for `series_id` over `[start_date, end_date]`,
    /// both endpoints inclusive, as the upstream API defines the range.
    ///
    /// An empty result is not an error: a series with no data in range (or
    /// an unknown series) comes back as an empty `ObservationSeries`.
    pub async fn fetch_series(
        &self,
        series_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ObservationSeries, FetchError> {
        let api_key = self.require_key()?;

        info!(
            "Fetching FRED series {} from {} to {}",
            series_id, start_date, end_date
        );
        let response = self
            .client
            .get(FRED_OBSERVATIONS_URL)
            .query(&[
                ("series_id", series_id),
                ("api_key", api_key),
                ("file_type", "json"),
                ("observation_start", &start_date.to_string()),
                ("observation_end", &end_date.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ObservationsResponse = response.json().await?;
        let series = build_series(series_id, start_date, end_date, body);
        info!(
            "Fetched {} usable observations for {}",
            series.len(),
            series_id
        );
        Ok(series)
    }

    /// Most recent observation for `series_id`, regardless of date.
    ///
    /// `None` when the series has no parseable observations at all.
    pub async fn fetch_latest(&self, series_id: &str) -> Result<Option<Observation>, FetchError> {
        let api_key = self.require_key()?;

        info!("Fetching latest FRED observation for {}", series_id);
        let response = self
            .client
            .get(FRED_OBSERVATIONS_URL)
            .query(&[
                ("series_id", series_id),
                ("api_key", api_key),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", "1"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ObservationsResponse = response.json().await?;
        Ok(body
            .observations
            .into_iter()
            .find_map(|raw| normalize_observation(&raw)))
    }

    fn require_key(&self) -> Result<&str, FetchError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::unconfigured("FRED access not configured"))
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

/// Normalize the raw observation list, keeping upstream (ascending) order.
/// Rows that fail to parse are dropped rather than failing the whole fetch.
fn build_series(
    series_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    body: ObservationsResponse,
) -> ObservationSeries {
    let mut observations = Vec::with_capacity(body.observations.len());
    for raw in &body.observations {
        match normalize_observation(raw) {
            Some(obs) => observations.push(obs),
            None => warn!(
                "Dropping observation for {} at '{}' with value '{}'",
                series_id, raw.date, raw.value
            ),
        }
    }
    ObservationSeries {
        series_id: series_id.to_string(),
        observation_start: start_date,
        observation_end: end_date,
        observations,
    }
}

fn normalize_observation(raw: &RawObservation) -> Option<Observation> {
    let value = parse_value(&raw.value)?;
    let date = NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d").ok()?;
    Some(Observation { date, value })
}

/// FRED marks missing data with a bare "." value.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}
