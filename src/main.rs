//! # Daily News LINE
//!
//! A once-a-day batch job that scrapes DMM Eikaiwa Daily News, summarizes
//! each article, picks advanced English phrases from it, and pushes the
//! result to a LINE user.
//!
//! ## Usage
//!
//! ```sh
//! LINE_CHANNEL_ACCESS_TOKEN=... LINE_USER_ID=... ENRICH_API_URL=https://... daily_news_line
//! ```
//!
//! ## Architecture
//!
//! The application is a single sequential pipeline:
//! 1. **Fetching**: discover articles on the index page and download their bodies
//! 2. **Enriching**: summary, then phrases, from the enrichment endpoint or local fallbacks
//! 3. **Dispatching**: render, chunk and push each article to LINE, one second apart
//!
//! The process exits with 0 when every message was delivered and 1 otherwise.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::Config;
use pipeline::{Pipeline, exit_status};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(started_at = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"), "daily_news_line starting up");

    if let Err(e) = dotenv::dotenv() {
        debug!(error = %e, "No .env file loaded");
    }

    let args = Cli::parse();
    debug!(?args.config, dry_run = args.dry_run, "Parsed CLI arguments");

    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::from(exit_status(false));
        }
    };
    config.warn_on_gaps();

    let success = match Pipeline::new(&config) {
        // A panic inside the run surfaces as a JoinError instead of aborting the process.
        Ok(pipeline) => match tokio::spawn(async move { pipeline.run().await }).await {
            Ok(success) => success,
            Err(e) => {
                error!(error = %e, error_debug = ?e, "Pipeline aborted unexpectedly");
                false
            }
        },
        Err(e) => {
            error!(error = %e, error_debug = ?e, "Unexpected error while setting up the pipeline");
            false
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        success,
        "Execution complete"
    );

    ExitCode::from(exit_status(success))
}
