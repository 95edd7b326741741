//! Data models for scraped and enriched articles.
//!
//! - [`Article`]: a validated record produced by the fetcher
//! - [`EnrichedArticle`]: an article plus its summary and phrase list
//!
//! Both are immutable once built. Fields are private and exposed through
//! accessors so that a record which passed validation stays valid.

use crate::error::{DailyNewsError, Result};
use crate::utils::truncate_chars;
use chrono::NaiveDate;
use url::Url;

/// Shortest title accepted from the source site, in characters.
pub const MIN_TITLE_CHARS: usize = 10;

/// Article bodies are cut to this many characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

/// A news article scraped from the source site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    title: String,
    url: String,
    content: String,
    date: NaiveDate,
}

impl Article {
    /// Build an article, rejecting records that would be useless downstream.
    ///
    /// # Errors
    ///
    /// Returns [`DailyNewsError::InvalidArticle`] if the title is shorter than
    /// [`MIN_TITLE_CHARS`], the URL is not absolute, or the content is blank.
    /// Content longer than [`MAX_CONTENT_CHARS`] is truncated, not rejected.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self> {
        let title = title.into().trim().to_string();
        let url = url.into();
        let content = content.into();

        if title.chars().count() < MIN_TITLE_CHARS {
            return Err(DailyNewsError::invalid_article(format!(
                "title {title:?} shorter than {MIN_TITLE_CHARS} characters"
            )));
        }
        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                return Err(DailyNewsError::invalid_article(format!(
                    "url {url:?} is not an absolute http(s) URL"
                )));
            }
        }
        if content.trim().is_empty() {
            return Err(DailyNewsError::invalid_article(format!(
                "article {url} has no content"
            )));
        }

        Ok(Self {
            title,
            url,
            content: truncate_chars(&content, MAX_CONTENT_CHARS).to_string(),
            date,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// An [`Article`] after summarization and phrase generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedArticle {
    article: Article,
    summary: String,
    phrases: Vec<String>,
}

impl EnrichedArticle {
    pub fn new(article: Article, summary: impl Into<String>, phrases: Vec<String>) -> Self {
        Self {
            article,
            summary: summary.into(),
            phrases,
        }
    }

    pub fn title(&self) -> &str {
        self.article.title()
    }

    pub fn url(&self) -> &str {
        self.article.url()
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}
