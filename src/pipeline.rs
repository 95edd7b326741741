//! The daily batch: fetch → enrich → announce → dispatch.
//!
//! Everything runs strictly in order on one task. For each article the
//! summary is produced before the phrases, because phrase generation is
//! given the summary. Articles are sent in the order they were fetched.

use crate::api::Enricher;
use crate::config::Config;
use crate::error::Result;
use crate::models::EnrichedArticle;
use crate::outputs::line::LineSender;
use crate::outputs::message::render_intro;
use crate::scrapers::dmm::DailyNewsScraper;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Process exit status for a finished run: 0 on full success, 1 otherwise.
pub fn exit_status(success: bool) -> u8 {
    if success { 0 } else { 1 }
}

#[derive(Debug)]
pub struct Pipeline {
    scraper: DailyNewsScraper,
    enricher: Enricher,
    sender: LineSender,
    max_news: usize,
    phrases_per_news: usize,
}

impl Pipeline {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::from_parts(
            DailyNewsScraper::new(config)?,
            Enricher::new(config)?,
            LineSender::new(config)?,
            config,
        ))
    }

    pub fn from_parts(
        scraper: DailyNewsScraper,
        enricher: Enricher,
        sender: LineSender,
        config: &Config,
    ) -> Self {
        Self {
            scraper,
            enricher,
            sender,
            max_news: config.max_news_count,
            phrases_per_news: config.phrases_per_news,
        }
    }

    /// Run one batch. Returns `true` only if articles were fetched and every article was sent.
    #[instrument(level = "info", skip_all, fields(max_news = self.max_news))]
    pub async fn run(&self) -> bool {
        let t0 = Instant::now();

        info!("Step 1: fetching news");
        let articles = self.scraper.fetch(self.max_news).await;
        let Some(first) = articles.first() else {
            error!("Failed to fetch any news");
            return false;
        };
        let date = first.date();
        info!(count = articles.len(), "Fetched news");

        info!("Step 2: summarizing and generating phrases");
        let total = articles.len();
        let mut enriched = Vec::with_capacity(total);
        for (i, article) in articles.into_iter().enumerate() {
            info!(position = i + 1, total, title = article.title(), "Processing article");
            let summary = self.enricher.summarize(&article).await;
            let phrases = self
                .enricher
                .generate_phrases(&article, &summary, self.phrases_per_news)
                .await;
            enriched.push(EnrichedArticle::new(article, summary, phrases));
        }

        info!("Step 3: sending to LINE");
        // The intro is informational; only article delivery decides the outcome.
        if !self.sender.send_message(&render_intro(enriched.len(), date)).await {
            warn!("Failed to send the introductory message");
        }
        let success = self.sender.send_batch(&enriched).await;

        let elapsed = t0.elapsed();
        if success {
            info!(articles = enriched.len(), secs = elapsed.as_secs(), "All articles delivered");
        } else {
            warn!(articles = enriched.len(), secs = elapsed.as_secs(), "Some messages failed to send");
        }
        success
    }
}
