// src/bin/test_polls.rs
use approval_dashboard::services::polls::{PollSource, PollsClient};
use approval_dashboard::BoxError;
use dotenv::dotenv;

const SHEET_ID: &str = "1_y0_LJmSY6sNx8qd51T70n0oa_ugN50AVFKuJmXO1-s";
const SHEET_NAME: &str = "president_approval_polls";

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    env_logger::init();

    let client = PollsClient::new();
    let source = PollSource::from_sheet(SHEET_ID, SHEET_NAME);

    let (snapshot, delta) = client.fetch_polls_with_delta(&source, None).await?;
    println!("{} rows ({} new)", snapshot.len(), delta.records.len());

    if let Some(last) = snapshot.latest() {
        println!(
            "Last poll: {} by {} ({})",
            last.end_date, last.pollster, last.sponsors
        );
    }

    // Fetching again against the fresh snapshot should report nothing new.
    let (_, delta) = client
        .fetch_polls_with_delta(&source, Some(&snapshot))
        .await?;
    println!("Second fetch: {} new rows", delta.records.len());
    Ok(())
}
