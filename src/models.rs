// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One (date, value) data point of a statistical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// An ordered run of observations for one series over one requested range.
///
/// Dates are unique and non-decreasing: upstream returns them ascending and
/// normalization only drops rows, never reorders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    pub series_id: String,
    pub observation_start: NaiveDate,
    pub observation_end: NaiveDate,
    pub observations: Vec<Observation>,
}

impl ObservationSeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// Observations with `start <= date < end`. The requested range on the
    /// series itself is inclusive of both endpoints; this window is the
    /// half-open variant some callers slice with.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Vec<&Observation> {
        self.observations
            .iter()
            .filter(|obs| obs.date >= start && obs.date < end)
            .collect()
    }
}

/// One row of the polling table.
///
/// `extra` carries source columns this layer does not interpret, so two
/// records compare equal only when the source rows matched cell for cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollRecord {
    pub pollster: String,
    pub sponsors: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub yes: Option<f64>,
    pub no: Option<f64>,
    pub sample_size: Option<f64>,
    pub url_article: Option<String>,
    pub extra: BTreeMap<String, String>,
}

/// The full poll table as of one fetch, sorted ascending by end date.
///
/// The ordering is load-bearing: the presentation layer treats the last row
/// as the most recent poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub records: Vec<PollRecord>,
}

impl PollSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent poll, by the ascending end-date ordering.
    pub fn latest(&self) -> Option<&PollRecord> {
        self.records.last()
    }

    /// Rows of `self` with no identical counterpart in `previous`.
    ///
    /// Matching is full-row equality, not a keyed join: a row that changed
    /// in a single column (a late sample-size correction, say) counts as
    /// new. Without a previous snapshot the delta is the whole table.
    pub fn delta_from(&self, previous: Option<&PollSnapshot>) -> PollDelta {
        let records = match previous {
            Some(prev) => self
                .records
                .iter()
                .filter(|record| !prev.records.contains(record))
                .cloned()
                .collect(),
            None => self.records.clone(),
        };
        PollDelta { records }
    }
}

/// Rows new to a snapshot relative to a prior one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollDelta {
    pub records: Vec<PollRecord>,
}
