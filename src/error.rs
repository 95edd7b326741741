//! Crate-wide error type.
//!
//! Most operations in this crate fail soft: the fetcher falls back to
//! placeholder articles, the enricher to local heuristics, and the sender
//! reports `false`. [`DailyNewsError`] is what flows *inside* those
//! components before being converted at their boundary, and what reaches
//! `main` when something unexpected escapes the pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DailyNewsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("invalid article: {message}")]
    InvalidArticle { message: String },
}

pub type Result<T> = std::result::Result<T, DailyNewsError>;

impl DailyNewsError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_article(message: impl Into<String>) -> Self {
        Self::InvalidArticle {
            message: message.into(),
        }
    }
}
