//! LINE Messaging API push transport.
//!
//! Each chunk is sent as one push request:
//!
//! ```text
//! POST https://api.line.me/v2/bot/message/push
//! Authorization: Bearer <channel access token>
//! {"to": "<user id>", "messages": [{"type": "text", "text": "<chunk>"}]}
//! ```
//!
//! A failed push is logged and reported as `false`, and sending moves on to
//! the next chunk or article. Articles in a batch are paced
//! [`MESSAGE_INTERVAL`] apart.

use super::message::{message_chunks, render_article};
use crate::config::Config;
use crate::error::{DailyNewsError, Result};
use crate::models::EnrichedArticle;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between consecutive articles of a batch.
pub const MESSAGE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Clone)]
pub struct LineSender {
    client: Client,
    endpoint: String,
    token: Option<String>,
    user_id: Option<String>,
    timeout: Duration,
    interval: Duration,
    dry_run: bool,
}

impl LineSender {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: config.line_api_url.clone(),
            token: config.line_channel_access_token.clone(),
            user_id: config.line_user_id.clone(),
            timeout: SEND_TIMEOUT,
            interval: MESSAGE_INTERVAL,
            dry_run: config.dry_run,
        })
    }

    /// Override the pause between articles (1s by default).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Push one text message as-is. Returns `true` on a 2xx response.
    ///
    /// Without a token or user id this fails immediately and makes no call.
    pub async fn send_message(&self, text: &str) -> bool {
        if self.dry_run {
            println!("{text}\n");
            return true;
        }
        let (Some(token), Some(user_id)) = (&self.token, &self.user_id) else {
            error!("LINE_CHANNEL_ACCESS_TOKEN or LINE_USER_ID is not set");
            return false;
        };

        match self.push(token, user_id, text).await {
            Ok(()) => {
                info!(chars = text.chars().count(), "LINE message sent");
                true
            }
            Err(e) => {
                error!(error = %e, "LINE message send failed");
                false
            }
        }
    }

    async fn push(&self, token: &str, user_id: &str, text: &str) -> Result<()> {
        let body = PushRequest {
            to: user_id,
            messages: vec![TextMessage { kind: "text", text }],
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(DailyNewsError::Status {
            status: status.as_u16(),
            body: truncate_for_log(&text, 300),
        })
    }

    /// Render an article and push it, split into chunks if it is too long.
    ///
    /// Every chunk is attempted. The result is `true` only if all of them were sent.
    pub async fn send(&self, article: &EnrichedArticle) -> bool {
        self.send_rendered(&render_article(article.title(), article)).await
    }

    async fn send_rendered(&self, message: &str) -> bool {
        let chunks = message_chunks(message);
        if chunks.len() > 1 {
            info!(chunks = chunks.len(), chars = message.chars().count(), "Message split into chunks");
        }
        let mut success = true;
        for chunk in &chunks {
            if !self.send_message(chunk).await {
                success = false;
            }
        }
        success
    }

    /// Send a batch of articles to the configured LINE user.
    ///
    /// Articles go out in order with their titles prefixed `News i: `, and
    /// the sender sleeps for the configured interval between two articles
    /// (not after the last one). A failed article does not stop the batch.
    ///
    /// # Arguments
    ///
    /// * `articles` - Enriched articles in the order they were fetched
    ///
    /// # Returns
    ///
    /// `true` only if every chunk of every article was accepted by LINE.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn send_batch(&self, articles: &[EnrichedArticle]) -> bool {
        let total = articles.len();
        let mut success = true;

        for (i, article) in articles.iter().enumerate() {
            let position = i + 1;
            info!(position, total, "Sending article");

            let title = format!("News {position}: {}", article.title());
            if !self.send_rendered(&render_article(&title, article)).await {
                success = false;
                warn!(position, url = article.url(), "Failed to send article");
            }

            if position < total {
                sleep(self.interval).await;
            }
        }
        success
    }
}
