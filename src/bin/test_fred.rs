// src/bin/test_fred.rs
use approval_dashboard::services::fred::{FredClient, FredConfig};
use approval_dashboard::BoxError;
use chrono::NaiveDate;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    env_logger::init();

    let client = FredClient::new(FredConfig::from_env());

    let start = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 4, 20).unwrap();
    let series = client.fetch_series("USEPUINDXD", start, end).await?;

    println!(
        "{} observations for {} ({} to {})",
        series.len(),
        series.series_id,
        series.observation_start,
        series.observation_end
    );
    for obs in &series.observations {
        println!("{}  {}", obs.date, obs.value);
    }

    println!("Latest: {:?}", client.fetch_latest("USEPUINDXD").await?);
    Ok(())
}
