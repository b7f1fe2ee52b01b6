use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use log::{info, warn};
use warp::Filter;

use approval_dashboard::routes;
use approval_dashboard::scheduler;
use approval_dashboard::services::fred::FredConfig;
use approval_dashboard::services::polls::PollSource;
use approval_dashboard::state::AppState;

// Mary Radcliffe's public database of presidential approval polls.
const DEFAULT_SHEET_ID: &str = "1_y0_LJmSY6sNx8qd51T70n0oa_ugN50AVFKuJmXO1-s";
const DEFAULT_SHEET_NAME: &str = "president_approval_polls";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    // Credentials and sources are read once here and injected; nothing
    // below main touches the environment.
    let fred_config = FredConfig::from_env();
    if fred_config.api_key.is_none() {
        warn!("FRED_API_KEY not set; series requests will fail until it is configured");
    }

    let poll_source = match env::var("POLL_EXPORT_URL") {
        Ok(url) => PollSource::from_url(url),
        Err(_) => PollSource::from_sheet(
            env::var("POLL_SHEET_ID").unwrap_or_else(|_| DEFAULT_SHEET_ID.to_string()),
            env::var("POLL_SHEET_NAME").unwrap_or_else(|_| DEFAULT_SHEET_NAME.to_string()),
        ),
    };

    let state = Arc::new(AppState::new(fred_config, poll_source));

    // Keep the scheduler handle alive for the lifetime of the server.
    let _scheduler = scheduler::start(state.clone()).await?;

    // Get port from the environment, default to 3030
    let port_str = env::var("PORT").unwrap_or_else(|_| {
        warn!("$PORT not set, defaulting to 3030");
        "3030".to_string()
    });

    let port: u16 = port_str.parse().expect("PORT must be a number");
    info!("Using PORT: {}", port);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!("Will bind to: {}", addr);

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    // Set up routes
    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    // Start the server
    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;

    Ok(())
}
