//! Command-line interface definitions for Daily News LINE.
//!
//! Every option can also be supplied through an environment variable (and
//! therefore through a `.env` file), which is how the scheduled job is
//! normally configured. Options left unset fall back to the YAML config file
//! given with `--config`, then to built-in defaults. See [`crate::config`].

use clap::Parser;

/// Command-line arguments for the Daily News LINE job.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment / .env
/// daily_news_line
///
/// # Render messages to stdout without talking to LINE
/// daily_news_line --dry-run -n 1
///
/// # Settings from a YAML file
/// daily_news_line --config ./daily_news.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Base URL of the summarize/phrases endpoint (unset = local fallbacks only)
    #[arg(long, env = "ENRICH_API_URL")]
    pub enrich_api_url: Option<String>,

    /// LINE channel access token
    #[arg(long, env = "LINE_CHANNEL_ACCESS_TOKEN", hide_env_values = true)]
    pub line_token: Option<String>,

    /// LINE user id that receives the push messages
    #[arg(long, env = "LINE_USER_ID", hide_env_values = true)]
    pub line_user_id: Option<String>,

    /// Maximum number of articles to process
    #[arg(short = 'n', long, env = "MAX_NEWS_COUNT")]
    pub max_news: Option<usize>,

    /// Number of phrases to generate per article
    #[arg(short, long, env = "PHRASES_PER_NEWS")]
    pub phrases: Option<usize>,

    /// News index page to scrape
    #[arg(long, env = "DAILY_NEWS_URL")]
    pub news_url: Option<String>,

    /// LINE push endpoint
    #[arg(long, env = "LINE_API_URL", hide = true)]
    pub line_api_url: Option<String>,

    /// Print messages to stdout instead of pushing them to LINE
    #[arg(long)]
    pub dry_run: bool,
}
