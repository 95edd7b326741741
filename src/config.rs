//! Runtime configuration.
//!
//! A single [`Config`] value is assembled in `main` and handed to each
//! component's constructor. Sources, highest precedence first:
//!
//! 1. command-line flags / environment variables ([`Cli`])
//! 2. the optional YAML file passed with `--config`
//! 3. built-in defaults
//!
//! ```yaml
//! enrich_api_url: https://your-project.vercel.app
//! line_channel_access_token: "..."
//! line_user_id: "U0123..."
//! max_news_count: 3
//! phrases_per_news: 10
//! ```

use crate::cli::Cli;
use crate::error::{DailyNewsError, Result};
use serde::Deserialize;
use std::fs;
use tracing::{info, instrument, warn};

pub const DEFAULT_NEWS_URL: &str = "https://eikaiwa.dmm.com/app/daily-news/";
pub const DEFAULT_LINE_API_URL: &str = "https://api.line.me/v2/bot/message/push";
pub const DEFAULT_MAX_NEWS_COUNT: usize = 3;
pub const DEFAULT_PHRASES_PER_NEWS: usize = 10;

/// Legacy name of the enrichment base URL variable, still honoured.
const LEGACY_ENRICH_ENV: &str = "VERCEL_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// News index page scraped for candidate articles.
    pub news_url: String,
    /// Base URL of the summarize/phrases endpoint. `None` means local fallbacks only.
    pub enrich_api_url: Option<String>,
    /// LINE push endpoint.
    pub line_api_url: String,
    pub line_channel_access_token: Option<String>,
    pub line_user_id: Option<String>,
    pub max_news_count: usize,
    pub phrases_per_news: usize,
    /// Print messages instead of pushing them.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            news_url: DEFAULT_NEWS_URL.to_string(),
            enrich_api_url: None,
            line_api_url: DEFAULT_LINE_API_URL.to_string(),
            line_channel_access_token: None,
            line_user_id: None,
            max_news_count: DEFAULT_MAX_NEWS_COUNT,
            phrases_per_news: DEFAULT_PHRASES_PER_NEWS,
            dry_run: false,
        }
    }
}

impl Config {
    /// Parse a YAML document into a config, filling missing keys with defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[instrument(level = "info")]
    pub fn from_file(path: &str) -> Result<Self> {
        let yaml = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(path, "Loaded configuration file");
        Ok(config)
    }

    /// Build the effective configuration from CLI/env over file over defaults.
    ///
    /// # Errors
    ///
    /// Fails if the config file cannot be read or parsed, or if the result
    /// does not pass [`Config::validate`].
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let base = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let legacy_enrich = std::env::var(LEGACY_ENRICH_ENV).ok();
        let config = base.merge_cli(cli, legacy_enrich).normalized();
        config.validate()?;
        Ok(config)
    }

    fn merge_cli(mut self, cli: &Cli, legacy_enrich: Option<String>) -> Self {
        if let Some(url) = cli.enrich_api_url.clone().or(legacy_enrich) {
            self.enrich_api_url = Some(url);
        }
        if let Some(token) = &cli.line_token {
            self.line_channel_access_token = Some(token.clone());
        }
        if let Some(user) = &cli.line_user_id {
            self.line_user_id = Some(user.clone());
        }
        if let Some(n) = cli.max_news {
            self.max_news_count = n;
        }
        if let Some(p) = cli.phrases {
            self.phrases_per_news = p;
        }
        if let Some(url) = &cli.news_url {
            self.news_url = url.clone();
        }
        if let Some(url) = &cli.line_api_url {
            self.line_api_url = url.clone();
        }
        self.dry_run |= cli.dry_run;
        self
    }

    /// Blank optional values become `None`; the enrichment base loses any trailing `/`.
    fn normalized(mut self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.enrich_api_url = clean(self.enrich_api_url).map(|s| s.trim_end_matches('/').to_string());
        self.line_channel_access_token = clean(self.line_channel_access_token);
        self.line_user_id = clean(self.line_user_id);
        self
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.max_news_count == 0 {
            return Err(DailyNewsError::config("max_news_count must be at least 1"));
        }
        if self.phrases_per_news == 0 {
            return Err(DailyNewsError::config("phrases_per_news must be at least 1"));
        }
        url::Url::parse(&self.news_url)?;
        url::Url::parse(&self.line_api_url)?;
        if let Some(base) = &self.enrich_api_url {
            url::Url::parse(base)?;
        }
        Ok(())
    }

    /// Log a warning for every optional setting whose absence degrades a component.
    pub fn warn_on_gaps(&self) {
        if self.enrich_api_url.is_none() {
            warn!("No enrichment endpoint configured; summaries and phrases will use local fallbacks");
        }
        if !self.dry_run && !self.has_line_credentials() {
            warn!("LINE_CHANNEL_ACCESS_TOKEN or LINE_USER_ID is not set; message sends will fail");
        }
    }

    pub fn has_line_credentials(&self) -> bool {
        self.line_channel_access_token.is_some() && self.line_user_id.is_some()
    }
}
