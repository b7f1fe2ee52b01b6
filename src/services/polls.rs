// src/services/polls.rs
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use csv::Reader;
use log::{info, warn};
use reqwest::Client;

use super::error::FetchError;
use crate::models::{PollDelta, PollRecord, PollSnapshot};

const SHEETS_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// Columns this layer interprets; everything else is passed through opaquely.
const KNOWN_COLUMNS: &[&str] = &[
    "pollster",
    "sponsors",
    "start_date",
    "end_date",
    "yes",
    "no",
    "sample_size",
    "url_article",
];

/// Date layouts seen in the source table. The sheet is hand-curated and not
/// consistent row to row; ambiguous numeric dates are month-first.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Where the poll table comes from: a ready-made CSV export URL, or a
/// spreadsheet id plus sheet name the export URL is composed from.
#[derive(Debug, Clone, Default)]
pub struct PollSource {
    pub url: Option<String>,
    pub sheet_id: Option<String>,
    pub sheet_name: Option<String>,
}

impl PollSource {
    pub fn from_url(url: impl Into<String>) -> Self {
        PollSource {
            url: Some(url.into()),
            ..PollSource::default()
        }
    }

    pub fn from_sheet(sheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        PollSource {
            url: None,
            sheet_id: Some(sheet_id.into()),
            sheet_name: Some(sheet_name.into()),
        }
    }

    /// Resolve the single export URL this source stands for. Exactly one of
    /// the two forms must be present; anything else is a configuration
    /// error, reported before any network access.
    pub fn export_url(&self) -> Result<String, FetchError> {
        match (&self.url, &self.sheet_id, &self.sheet_name) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(FetchError::invalid_source(
                "supply either an export URL or a sheet id and name, not both",
            )),
            (Some(url), None, None) => Ok(url.clone()),
            (None, Some(sheet_id), Some(sheet_name)) => Ok(format!(
                "{}/{}/gviz/tq?tqx=out:csv&sheet={}",
                SHEETS_EXPORT_BASE, sheet_id, sheet_name
            )),
            (None, None, None) => Err(FetchError::invalid_source(
                "either an export URL or a sheet id and name must be supplied",
            )),
            (None, _, _) => Err(FetchError::invalid_source(
                "sheet id and sheet name must be supplied together",
            )),
        }
    }
}

pub struct PollsClient {
    client: Client,
}

impl PollsClient {
    pub fn new() -> Self {
        PollsClient {
            client: Client::new(),
        }
    }

    /// Fetch the poll table and normalize it into a sorted snapshot.
    pub async fn fetch_polls(&self, source: &PollSource) -> Result<PollSnapshot, FetchError> {
        let url = source.export_url()?;
        info!("Fetching poll table from {}", url);

        let csv_text = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let snapshot = parse_snapshot(&csv_text)?;
        info!("Fetched poll table with {} rows", snapshot.len());
        Ok(snapshot)
    }

    /// Diff-capable variant: fetch the table and also report which rows are
    /// new relative to `previous`. With no previous snapshot the delta is
    /// the whole table.
    pub async fn fetch_polls_with_delta(
        &self,
        source: &PollSource,
        previous: Option<&PollSnapshot>,
    ) -> Result<(PollSnapshot, PollDelta), FetchError> {
        let snapshot = self.fetch_polls(source).await?;
        let delta = snapshot.delta_from(previous);
        Ok((snapshot, delta))
    }
}

impl Default for PollsClient {
    fn default() -> Self {
        PollsClient::new()
    }
}

/// Parse the delimited export into a snapshot sorted ascending by end date.
///
/// Rows without an end date are incomplete entries in the source and are
/// dropped here; a missing `end_date` column or malformed CSV fails the
/// whole call instead — no partial table is ever returned.
pub fn parse_snapshot(csv_text: &str) -> Result<PollSnapshot, FetchError> {
    let mut reader = Reader::from_reader(csv_text.as_bytes());
    let headers = reader.headers()?.clone();

    let position = |name: &str| headers.iter().position(|header| header.trim() == name);
    let idx_end = position("end_date")
        .ok_or_else(|| FetchError::upstream("no 'end_date' column in poll table"))?;
    let idx_pollster = position("pollster");
    let idx_sponsors = position("sponsors");
    let idx_start = position("start_date");
    let idx_yes = position("yes");
    let idx_no = position("no");
    let idx_sample = position("sample_size");
    let idx_url = position("url_article");

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("").trim();

        let end_raw = cell(Some(idx_end));
        if end_raw.is_empty() {
            continue;
        }
        let end_date = match parse_mixed_date(end_raw) {
            Some(date) => date,
            None => {
                warn!("Dropping poll row with unparseable end date '{}'", end_raw);
                continue;
            }
        };

        let start_date = parse_mixed_date(cell(idx_start));
        if let Some(start) = start_date {
            // Data-quality issue in the source, not a reason to fail.
            if start > end_date {
                warn!(
                    "Poll row has start date {} after end date {}",
                    start, end_date
                );
            }
        }

        let url_article = match cell(idx_url) {
            "" => None,
            value => Some(value.to_string()),
        };

        let mut extra = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            let name = header.trim();
            if KNOWN_COLUMNS.contains(&name) {
                continue;
            }
            if let Some(value) = row.get(i) {
                extra.insert(name.to_string(), value.trim().to_string());
            }
        }

        records.push(PollRecord {
            pollster: cell(idx_pollster).to_string(),
            sponsors: cell(idx_sponsors).to_string(),
            start_date,
            end_date,
            yes: parse_number(cell(idx_yes)),
            no: parse_number(cell(idx_no)),
            sample_size: parse_number(cell(idx_sample)),
            url_article,
            extra,
        });
    }

    records.sort_by_key(|record| record.end_date);
    Ok(PollSnapshot { records })
}

/// Try each known layout in turn; the source mixes them freely.
fn parse_mixed_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            // `%Y` also matches two-digit years; those must fall through to
            // the `%y` layout instead of becoming first-century dates.
            if date.year() >= 100 {
                return Some(date);
            }
        }
    }
    None
}

/// Lenient numeric cell parser: tolerates thousands separators and a percent
/// suffix, which both show up in the sheet.
fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "").replace('%', "");
    if cleaned.is_empty() {
        return None;
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn export_url_from_explicit_url() {
        let source = PollSource::from_url("https://example.com/polls.csv");
        assert_eq!(source.export_url().unwrap(), "https://example.com/polls.csv");
    }

    #[test]
    fn export_url_is_composed_from_sheet_id_and_name() {
        let source = PollSource::from_sheet("abc123", "president_approval_polls");
        assert_eq!(
            source.export_url().unwrap(),
            "https://docs.google.com/spreadsheets/d/abc123/gviz/tq?tqx=out:csv&sheet=president_approval_polls"
        );
    }

    #[test]
    fn ambiguous_or_partial_sources_are_rejected() {
        let neither = PollSource::default();
        assert!(matches!(
            neither.export_url(),
            Err(FetchError::InvalidSource(_))
        ));

        let id_only = PollSource {
            sheet_id: Some("abc123".to_string()),
            ..PollSource::default()
        };
        assert!(matches!(
            id_only.export_url(),
            Err(FetchError::InvalidSource(_))
        ));

        let name_only = PollSource {
            sheet_name: Some("polls".to_string()),
            ..PollSource::default()
        };
        assert!(matches!(
            name_only.export_url(),
            Err(FetchError::InvalidSource(_))
        ));

        let both = PollSource {
            url: Some("https://example.com/polls.csv".to_string()),
            sheet_id: Some("abc123".to_string()),
            sheet_name: Some("polls".to_string()),
        };
        assert!(matches!(
            both.export_url(),
            Err(FetchError::InvalidSource(_))
        ));
    }

    #[test]
    fn rows_without_end_date_are_dropped_and_result_is_sorted() {
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size
Acme,Daily Bugle,2025-01-08,2025-01-10,50,40,1000
Beta,,2025-01-01,,10,5,500
Gamma,Tribune,2025-01-03,2025-01-05,48,42,800
";
        let snapshot = parse_snapshot(csv_text).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records[0].end_date, date("2025-01-05"));
        assert_eq!(snapshot.records[1].end_date, date("2025-01-10"));
        assert_eq!(snapshot.latest().unwrap().pollster, "Acme");
    }

    #[test]
    fn mixed_date_formats_parse_month_first() {
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size
Acme,,1/2/2025,1/5/2025,50,40,1000
Beta,,2025-01-06,Jan 8 2025,47,43,900
";
        let snapshot = parse_snapshot(csv_text).unwrap();
        // 1/5/2025 is January 5th, not May 1st.
        assert_eq!(snapshot.records[0].start_date, Some(date("2025-01-02")));
        assert_eq!(snapshot.records[0].end_date, date("2025-01-05"));
        // The unknown "Jan 8 2025" layout drops the row, not the table.
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn two_digit_years_land_in_the_current_century() {
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size
Acme,,1/2/25,1/5/25,50,40,1000
";
        let snapshot = parse_snapshot(csv_text).unwrap();
        assert_eq!(snapshot.records[0].start_date, Some(date("2025-01-02")));
        assert_eq!(snapshot.records[0].end_date, date("2025-01-05"));
    }

    #[test]
    fn comma_style_dates_parse_too() {
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size
Acme,,\"Jan 2, 2025\",\"Jan 5, 2025\",50,40,1000
";
        let snapshot = parse_snapshot(csv_text).unwrap();
        assert_eq!(snapshot.records[0].start_date, Some(date("2025-01-02")));
        assert_eq!(snapshot.records[0].end_date, date("2025-01-05"));
    }

    #[test]
    fn numeric_cells_parse_leniently() {
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size
Acme,,2025-01-03,2025-01-05,47%,43%,\"1,022\"
Beta,,2025-01-04,2025-01-06,unknown,41,
";
        let snapshot = parse_snapshot(csv_text).unwrap();
        assert_eq!(snapshot.records[0].yes, Some(47.0));
        assert_eq!(snapshot.records[0].no, Some(43.0));
        assert_eq!(snapshot.records[0].sample_size, Some(1022.0));
        assert_eq!(snapshot.records[1].yes, None);
        assert_eq!(snapshot.records[1].no, Some(41.0));
        assert_eq!(snapshot.records[1].sample_size, None);
    }

    #[test]
    fn unknown_columns_are_preserved_opaquely() {
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size,population,url_article
Acme,Bugle,2025-01-03,2025-01-05,48,42,800,rv,https://example.com/a
";
        let snapshot = parse_snapshot(csv_text).unwrap();
        let record = &snapshot.records[0];
        assert_eq!(record.extra.get("population").map(String::as_str), Some("rv"));
        assert_eq!(
            record.url_article.as_deref(),
            Some("https://example.com/a")
        );
    }

    #[test]
    fn missing_end_date_column_fails_the_whole_call() {
        let csv_text = "\
pollster,sponsors,start_date,yes,no
Acme,,2025-01-03,48,42
";
        let err = parse_snapshot(csv_text).unwrap_err();
        assert!(matches!(err, FetchError::Upstream(_)));
    }

    #[test]
    fn malformed_rows_fail_the_whole_call() {
        // Second row has a stray quote, which the CSV reader rejects.
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size
Acme,,2025-01-03,2025-01-05,48,42,800
Beta,\"broken,2025-01-04,2025-01-06,47,43
";
        assert!(parse_snapshot(csv_text).is_err());
    }

    #[test]
    fn sparse_rows_still_filter_and_sort() {
        let csv_text = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size
A,,,2025-01-10,50,40,
B,,,,10,5,
C,,,2025-01-05,48,42,
";
        let snapshot = parse_snapshot(csv_text).unwrap();
        let end_dates: Vec<NaiveDate> =
            snapshot.records.iter().map(|r| r.end_date).collect();
        assert_eq!(end_dates, vec![date("2025-01-05"), date("2025-01-10")]);
    }
}
