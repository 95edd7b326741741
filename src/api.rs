//! Client for the external summarize/phrases endpoint, with local fallbacks.
//!
//! The endpoint is a black box that takes article text as JSON and returns
//! JSON:
//!
//! | Route | Request | Response |
//! |-------|---------|----------|
//! | `POST {base}/api/summarize` | `{title, content}` | `{summary}` |
//! | `POST {base}/api/phrases` | `{title, summary, count}` | `{phrases: [..]}` |
//!
//! It can never fail the batch. When no base URL is configured, or the call
//! times out, fails, returns a non-2xx status, returns malformed JSON, or
//! returns an empty result, the [`Enricher`] uses [`simple_summary`] and
//! [`sample_phrases`] instead.

use crate::config::Config;
use crate::error::{DailyNewsError, Result};
use crate::models::Article;
use crate::utils::{truncate_chars, truncate_for_log};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub const ENRICH_TIMEOUT: Duration = Duration::from_secs(30);

/// Article content sent to the summarize route is cut to this many characters.
pub const MAX_REQUEST_CONTENT_CHARS: usize = 3000;

const FALLBACK_SUMMARY_WORDS: usize = 50;

/// Built-in phrases used whenever the endpoint cannot supply any.
pub const SAMPLE_PHRASES: [&str; 10] = [
    "From my perspective - 私の見解では",
    "It is worth noting that - 注目すべきは",
    "This raises the question of - これは～という疑問を提起する",
    "To put it differently - 言い換えれば",
    "This underscores the importance of - これは～の重要性を強調している",
    "A compelling argument - 説得力のある議論",
    "To delve deeper into - より深く掘り下げる",
    "This phenomenon can be attributed to - この現象は～に起因すると考えられる",
    "It is imperative that - ～することが不可欠である",
    "This warrants further investigation - これはさらなる調査が必要である",
];

/// Leading list markers such as `1.`, `2)`, `-` or `•`.
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:\d+\s*[.)]|[-•*])\s*").unwrap());

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Serialize)]
struct PhrasesRequest<'a> {
    title: &'a str,
    summary: &'a str,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct PhrasesResponse {
    #[serde(default)]
    phrases: Vec<String>,
}

/// Summarize content locally by keeping its first 50 words.
///
/// # Arguments
///
/// * `content` - Article body text
///
/// # Returns
///
/// The first 50 whitespace-delimited words joined by single spaces, with
/// `"..."` appended if the content had more.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(simple_summary("Short   text"), "Short text");
/// ```
pub fn simple_summary(content: &str) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let mut summary = words
        .iter()
        .take(FALLBACK_SUMMARY_WORDS)
        .join(" ");
    if words.len() > FALLBACK_SUMMARY_WORDS {
        summary.push_str("...");
    }
    summary
}

/// The first `min(count, 10)` built-in phrases.
pub fn sample_phrases(count: usize) -> Vec<String> {
    SAMPLE_PHRASES
        .iter()
        .take(count)
        .map(|p| p.to_string())
        .collect()
}

/// Clean up phrases returned by the endpoint.
///
/// Strips list markers the model may have added (the formatter numbers the
/// list itself), drops blanks and exact duplicates while keeping order, and
/// caps the result at `count`.
pub fn normalize_phrases(raw: Vec<String>, count: usize) -> Vec<String> {
    raw.into_iter()
        .map(|p| LIST_MARKER.replace(p.trim(), "").trim().to_string())
        .filter(|p| !p.is_empty())
        .unique()
        .take(count)
        .collect()
}

/// Produces a summary and a phrase list per article.
#[derive(Debug, Clone)]
pub struct Enricher {
    client: Client,
    base_url: Option<String>,
    timeout: Duration,
}

impl Enricher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: config.enrich_api_url.clone(),
            timeout: ENRICH_TIMEOUT,
        })
    }

    /// Override the per-request timeout (30s by default).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Summarize an article through the endpoint, or locally if that is not possible.
    #[instrument(level = "info", skip_all, fields(url = article.url()))]
    pub async fn summarize(&self, article: &Article) -> String {
        let request = SummarizeRequest {
            title: article.title(),
            content: truncate_chars(article.content(), MAX_REQUEST_CONTENT_CHARS),
        };

        match self.post_json::<_, SummarizeResponse>("api/summarize", &request).await {
            Ok(Some(response)) if !response.summary.trim().is_empty() => {
                let summary = response.summary.trim().to_string();
                info!(chars = summary.chars().count(), "Generated summary");
                return summary;
            }
            Ok(Some(_)) => warn!("Summary was empty; using local summary"),
            Ok(None) => debug!("No enrichment endpoint; using local summary"),
            Err(e) => warn!(error = %e, "Summary request failed; using local summary"),
        }
        simple_summary(article.content())
    }

    /// Generate advanced English phrases for an article.
    ///
    /// The summary produced by [`Enricher::summarize`] is sent along with the
    /// title, so this must be called after it.
    ///
    /// # Arguments
    ///
    /// * `article` - The article the phrases should come from
    /// * `summary` - That article's summary
    /// * `count` - Maximum number of phrases wanted
    ///
    /// # Returns
    ///
    /// At most `count` phrases. When the endpoint is missing, fails, or
    /// returns nothing usable, the first `min(count, 10)` built-in phrases.
    #[instrument(level = "info", skip(self, article, summary), fields(url = article.url()))]
    pub async fn generate_phrases(&self, article: &Article, summary: &str, count: usize) -> Vec<String> {
        let request = PhrasesRequest {
            title: article.title(),
            summary,
            count,
        };

        match self.post_json::<_, PhrasesResponse>("api/phrases", &request).await {
            Ok(Some(response)) => {
                let phrases = normalize_phrases(response.phrases, count);
                if !phrases.is_empty() {
                    info!(count = phrases.len(), "Generated phrases");
                    return phrases;
                }
                warn!("Phrase list was empty; using sample phrases");
            }
            Ok(None) => debug!("No enrichment endpoint; using sample phrases"),
            Err(e) => warn!(error = %e, "Phrase request failed; using sample phrases"),
        }
        sample_phrases(count)
    }

    /// POST `body` to `{base}/{path}`. `Ok(None)` when no endpoint is configured.
    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Option<Resp>>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let Some(base) = &self.base_url else {
            return Ok(None);
        };
        let url = format!("{}/{}", base.trim_end_matches('/'), path);

        let t0 = Instant::now();
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%url, status = status.as_u16(), elapsed_ms = t0.elapsed().as_millis() as u64, "Enrichment call finished");

        if !status.is_success() {
            return Err(DailyNewsError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&text, 300),
            });
        }

        serde_json::from_str(&text).map(Some).map_err(|e| {
            warn!(body = %truncate_for_log(&text, 300), "Enrichment endpoint returned malformed JSON");
            e.into()
        })
    }
}
