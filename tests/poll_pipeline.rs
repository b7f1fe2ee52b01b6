// tests/poll_pipeline.rs
//
// Drives the poll-table pipeline through the public API: parse, sort,
// filter, then diff against a prior snapshot.

use approval_dashboard::models::PollSnapshot;
use approval_dashboard::services::polls::parse_snapshot;
use chrono::NaiveDate;

const EXPORT: &str = "\
pollster,sponsors,start_date,end_date,yes,no,sample_size,url_article
YouGov,Economist,1/6/2025,1/8/2025,47,49,\"1,500\",https://example.com/econ
Quinnipiac,,2025-01-02,2025-01-06,45,51,1200,
Emerson,The Hill,1/9/2025,,48,47,1000,
Morning Consult,,2025-01-01,2025-01-03,50,44,2200,https://example.com/mc
";

fn parsed() -> PollSnapshot {
    parse_snapshot(EXPORT).expect("export must parse")
}

#[test]
fn snapshot_is_complete_and_sorted() {
    let snapshot = parsed();

    // The Emerson row has no end date and must not survive loading.
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot
        .records
        .iter()
        .all(|record| record.pollster != "Emerson"));

    let end_dates: Vec<NaiveDate> = snapshot.records.iter().map(|r| r.end_date).collect();
    let mut sorted = end_dates.clone();
    sorted.sort();
    assert_eq!(end_dates, sorted);

    let latest = snapshot.latest().expect("snapshot is non-empty");
    assert_eq!(latest.pollster, "YouGov");
    assert_eq!(latest.sample_size, Some(1500.0));
    assert_eq!(latest.url_article.as_deref(), Some("https://example.com/econ"));
}

#[test]
fn delta_reports_only_unseen_rows() {
    let snapshot = parsed();

    // No prior snapshot: everything is new.
    let delta = snapshot.delta_from(None);
    assert_eq!(delta.records, snapshot.records);

    // Identical prior snapshot: nothing is new.
    let delta = snapshot.delta_from(Some(&snapshot.clone()));
    assert!(delta.records.is_empty());

    // Prior snapshot missing the newest row: exactly that row is new.
    let mut previous = snapshot.clone();
    previous.records.pop();
    let delta = snapshot.delta_from(Some(&previous));
    assert_eq!(delta.records.len(), 1);
    assert_eq!(delta.records[0].pollster, "YouGov");
}
