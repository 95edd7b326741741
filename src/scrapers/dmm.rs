//! DMM Eikaiwa Daily News scraper.
//!
//! The site has no API and its markup has changed before, so both index
//! parsing and body extraction are expressed as ordered lists of strategies.
//! The first strategy that produces something wins, and the last tier is a
//! deliberately loose heuristic.
//!
//! # URL Pattern
//!
//! Articles are linked from the index with relative URLs such as
//! `/app/daily-news/article/<slug>/`, resolved against the index page's
//! origin. Links to any other origin are ignored.

use crate::config::Config;
use crate::error::Result;
use crate::models::{Article, MAX_CONTENT_CHARS, MIN_TITLE_CHARS};
use crate::utils::{squash_whitespace, today, truncate_chars};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Desktop browser user agent; the site rejects obvious bots.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A content selector only wins if its text reaches this many characters.
const MIN_SELECTOR_CONTENT_CHARS: usize = 100;

/// Paragraphs at or below this length are dropped by the fallback extractor.
const MIN_PARAGRAPH_CHARS: usize = 20;

const PLACEHOLDER_TITLE: &str = "Sample News Article 1";
const PLACEHOLDER_PATH: &str = "sample1";
const PLACEHOLDER_CONTENT: &str = "This is a sample news article for testing purposes. It contains information about current events and can be used to practice English conversation skills.";

/// One way of locating article entries on the index page.
struct CandidateStrategy {
    name: &'static str,
    selector: Selector,
    /// Keep only elements whose href looks like an article path.
    needs_article_href: bool,
}

static CANDIDATE_STRATEGIES: Lazy<Vec<CandidateStrategy>> = Lazy::new(|| {
    [
        ("semantic", "article", false),
        ("known-class", ".news-item, .daily-news-item", false),
        ("link-pattern", "a[href]", true),
    ]
    .into_iter()
    .map(|(name, css, needs_article_href)| CandidateStrategy {
        name,
        selector: Selector::parse(css).unwrap(),
        needs_article_href,
    })
    .collect()
});

static ARTICLE_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"/daily-news/[^?#\s]+").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, .title, .news-title").unwrap());
static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

static CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        ".article-content",
        ".news-content",
        ".content",
        "article p",
        ".text-content",
        "main p",
    ]
    .iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect()
});

/// An index entry before validation: whatever href and title text it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub href: Option<String>,
    pub title: String,
}

/// Whitespace-normalized text of an element and all its descendants.
fn element_text(element: ElementRef<'_>) -> String {
    squash_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn candidate_href(element: ElementRef<'_>) -> Option<String> {
    let href = if element.value().name() == "a" {
        element.value().attr("href")
    } else {
        element
            .select(&LINK_SELECTOR)
            .next()
            .and_then(|link| link.value().attr("href"))
    };
    href.map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

fn candidate_title(element: ElementRef<'_>) -> String {
    let heading = element.select(&TITLE_SELECTOR).next().unwrap_or(element);
    element_text(heading)
}

/// Parse the index page into candidates using the first strategy that matches anything.
///
/// Returns an empty list if no strategy matches.
pub fn find_candidates(html: &str) -> Vec<RawCandidate> {
    let document = Html::parse_document(html);

    for strategy in CANDIDATE_STRATEGIES.iter() {
        let candidates: Vec<RawCandidate> = document
            .select(&strategy.selector)
            .map(|element| RawCandidate {
                href: candidate_href(element),
                title: candidate_title(element),
            })
            .filter(|c| {
                !strategy.needs_article_href
                    || c.href.as_deref().is_some_and(|h| ARTICLE_HREF.is_match(h))
            })
            .collect();

        if !candidates.is_empty() {
            debug!(strategy = strategy.name, count = candidates.len(), "Index strategy matched");
            return candidates;
        }
    }

    debug!("No index strategy matched");
    Vec::new()
}

/// Resolve an href against the site origin, rejecting off-site and non-http links.
///
/// Fragments are dropped so `#comments` variants dedupe onto the same article.
pub fn resolve_article_url(href: &str, site: &Url) -> Option<Url> {
    let mut url = site.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.origin() != site.origin() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Pull the article body out of a detail page.
///
/// Content selectors are tried in order and the first whose joined text
/// reaches 100 characters wins. Otherwise every paragraph longer than 20
/// characters is used. The result is capped at 5000 characters and may be
/// empty.
pub fn extract_content(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector in CONTENT_SELECTORS.iter() {
        let text = document
            .select(selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.chars().count() >= MIN_SELECTOR_CONTENT_CHARS {
            return truncate_chars(&text, MAX_CONTENT_CHARS).to_string();
        }
    }

    let text = document
        .select(&PARAGRAPH_SELECTOR)
        .map(element_text)
        .filter(|t| t.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect::<Vec<_>>()
        .join(" ");
    truncate_chars(&text, MAX_CONTENT_CHARS).to_string()
}

/// Build the batch used when live scraping produced nothing.
///
/// # Arguments
///
/// * `site` - The index URL; the placeholder link is resolved against it
/// * `count` - How many copies to return
/// * `date` - Date stamped on the placeholder
///
/// # Returns
///
/// `count` identical copies of one sample article, or an error if the sample
/// article fails validation.
pub fn fallback_articles(site: &Url, count: usize, date: NaiveDate) -> Result<Vec<Article>> {
    let url = site
        .join(PLACEHOLDER_PATH)
        .unwrap_or_else(|_| site.clone())
        .to_string();
    let article = Article::new(PLACEHOLDER_TITLE, url, PLACEHOLDER_CONTENT, date)?;
    info!(count, "Using placeholder articles");
    Ok(std::iter::repeat_n(article, count).collect())
}

/// Scraper for the Daily News index and its detail pages.
#[derive(Debug, Clone)]
pub struct DailyNewsScraper {
    client: Client,
    index_url: Url,
    timeout: Duration,
}

impl DailyNewsScraper {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            index_url: Url::parse(&config.news_url)?,
            timeout: FETCH_TIMEOUT,
        })
    }

    /// Override the per-request timeout (30s by default).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch up to `max_count` articles. Never fails.
    ///
    /// If nothing usable comes back (network failure, selector drift), the
    /// result is `max_count` placeholder articles instead.
    #[instrument(level = "info", skip(self), fields(index = %self.index_url))]
    pub async fn fetch(&self, max_count: usize) -> Vec<Article> {
        let articles = match self.fetch_live(max_count).await {
            Ok(articles) => articles,
            Err(e) => {
                error!(error = %e, "Failed to fetch news index");
                Vec::new()
            }
        };

        if articles.is_empty() {
            warn!("No articles found; the page structure may have changed");
            return fallback_articles(&self.index_url, max_count, today()).unwrap_or_else(|e| {
                error!(error = %e, "Failed to build placeholder articles");
                Vec::new()
            });
        }

        info!(count = articles.len(), "Fetched Daily News articles");
        articles
    }

    async fn fetch_live(&self, max_count: usize) -> Result<Vec<Article>> {
        let html = self.get_html(&self.index_url).await?;
        let candidates = find_candidates(&html);
        info!(count = candidates.len(), "Indexed candidate articles");

        let date = today();
        let mut seen = HashSet::new();
        let mut articles = Vec::with_capacity(max_count);

        for candidate in candidates.into_iter().take(max_count * 2) {
            match self.try_candidate(candidate, &mut seen, date).await {
                Ok(Some(article)) => {
                    debug!(url = article.url(), title = article.title(), "Accepted article");
                    articles.push(article);
                    if articles.len() >= max_count {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Error while processing news item"),
            }
        }

        Ok(articles)
    }

    /// Validate one candidate and fetch its body. `Ok(None)` means "skip quietly".
    ///
    /// A URL only enters `seen` once its article is accepted, so a rejected
    /// link (say, a thumbnail with no title text) does not shadow a later
    /// link to the same page.
    async fn try_candidate(
        &self,
        candidate: RawCandidate,
        seen: &mut HashSet<String>,
        date: NaiveDate,
    ) -> Result<Option<Article>> {
        let Some(href) = candidate.href else {
            debug!(title = %candidate.title, "Candidate has no link");
            return Ok(None);
        };
        let Some(url) = resolve_article_url(&href, &self.index_url) else {
            debug!(%href, "Rejected off-site or unsupported link");
            return Ok(None);
        };
        if seen.contains(url.as_str()) {
            debug!(%url, "Duplicate article link");
            return Ok(None);
        }
        if candidate.title.chars().count() < MIN_TITLE_CHARS {
            debug!(%url, title = %candidate.title, "Title too short");
            return Ok(None);
        }

        let content = self.fetch_content(&url).await?;
        if content.is_empty() {
            warn!(%url, "Article page produced no content");
            return Ok(None);
        }

        let article = Article::new(candidate.title, url.to_string(), content, date)?;
        seen.insert(url.into());
        Ok(Some(article))
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_content(&self, url: &Url) -> Result<String> {
        let html = self.get_html(url).await?;
        let content = extract_content(&html);
        debug!(chars = content.chars().count(), "Parsed article body");
        Ok(content)
    }

    async fn get_html(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.as_str())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn site() -> Url {
        Url::parse("https://eikaiwa.dmm.com/app/daily-news/").unwrap()
    }

    fn long_paragraph(topic: &str) -> String {
        format!(
            "{topic} is the subject of this article, which explains the background in plain English \
             and gives learners plenty of vocabulary to discuss in their next lesson."
        )
    }

    #[test]
    fn test_find_candidates_prefers_article_elements() {
        let html = r#"
            <article><h2>Scientists find water on the moon</h2><a href="/app/daily-news/article/1">Read</a></article>
            <div class="news-item"><a href="/app/daily-news/article/2">Ignored because articles matched</a></div>
        "#;
        let candidates = find_candidates(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Scientists find water on the moon");
        assert_eq!(candidates[0].href.as_deref(), Some("/app/daily-news/article/1"));
    }

    #[test]
    fn test_find_candidates_falls_back_to_known_classes() {
        let html = r#"
            <ul>
              <li class="daily-news-item"><a href="/app/daily-news/article/7"><span class="title">Rail fares rise across Japan</span></a></li>
            </ul>
        "#;
        let candidates = find_candidates(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Rail fares rise across Japan");
    }

    #[test]
    fn test_find_candidates_link_pattern_filters_other_links() {
        let html = r#"
            <nav><a href="/app/">Home</a><a href="/app/daily-news/">All news</a></nav>
            <a href="/app/daily-news/article/11"> Tokyo opens a new
               public library </a>
            <a href="https://example.com/elsewhere">Unrelated link text here</a>
        "#;
        let candidates = find_candidates(html);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Tokyo opens a new public library");
    }

    #[test]
    fn test_find_candidates_empty_page() {
        assert!(find_candidates("<html><body><p>Maintenance</p></body></html>").is_empty());
    }

    #[test]
    fn test_resolve_article_url() {
        let site = site();
        assert_eq!(
            resolve_article_url("/app/daily-news/article/1#top", &site).unwrap().as_str(),
            "https://eikaiwa.dmm.com/app/daily-news/article/1"
        );
        assert_eq!(
            resolve_article_url("article/2", &site).unwrap().as_str(),
            "https://eikaiwa.dmm.com/app/daily-news/article/2"
        );
        assert!(resolve_article_url("https://evil.example.com/app/daily-news/1", &site).is_none());
        assert!(resolve_article_url("mailto:news@dmm.com", &site).is_none());
        assert!(resolve_article_url("javascript:void(0)", &site).is_none());
    }

    #[test]
    fn test_extract_content_uses_first_sufficient_selector() {
        let body = long_paragraph("Remote work");
        let html = format!(
            r#"<div class="article-content">Too short.</div>
               <div class="news-content">{body}</div>
               <main><p>{}</p></main>"#,
            long_paragraph("Something else")
        );
        assert_eq!(extract_content(&html), body);
    }

    #[test]
    fn test_extract_content_paragraph_fallback() {
        let html = format!(
            "<div><p>Short line.</p><p>{}</p><p>Another tiny one</p></div>",
            long_paragraph("Ocean plastic")
        );
        assert_eq!(extract_content(&html), long_paragraph("Ocean plastic"));
    }

    #[test]
    fn test_extract_content_truncates() {
        let html = format!("<div class=\"content\">{}</div>", "word ".repeat(3000));
        assert_eq!(extract_content(&html).chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_extract_content_nothing_usable() {
        assert_eq!(extract_content("<p>Hi</p><p>Subscribe now</p>"), "");
    }

    #[test]
    fn test_fallback_articles() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 6).unwrap();
        let batch = fallback_articles(&site(), 3, date).unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|a| a == &batch[0]));
        assert_eq!(batch[0].url(), "https://eikaiwa.dmm.com/app/daily-news/sample1");
        assert!(batch[0].title().chars().count() >= MIN_TITLE_CHARS);
    }

    fn scraper_for(server: &MockServer) -> DailyNewsScraper {
        let config = Config {
            news_url: server.url("/app/daily-news/"),
            ..Config::default()
        };
        DailyNewsScraper::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_collects_dedupes_and_caps() {
        let server = MockServer::start_async().await;
        let index = r#"
            <a href="/app/daily-news/article/1">Cherry blossoms bloom early this year</a>
            <a href="/app/daily-news/article/1#again">Cherry blossoms bloom early this year</a>
            <a href="/app/daily-news/article/2">Short</a>
            <a href="/app/daily-news/article/3">New rules for electric scooters</a>
            <a href="/app/daily-news/article/4">A robot chef opens a restaurant</a>
        "#;
        let index_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/app/daily-news/");
                then.status(200).body(index);
            })
            .await;
        for (id, topic) in [("1", "Cherry blossoms"), ("3", "Scooters"), ("4", "Robot chefs")] {
            let body = format!("<div class=\"article-content\">{}</div>", long_paragraph(topic));
            server
                .mock_async(move |when, then| {
                    when.method(GET).path(format!("/app/daily-news/article/{id}"));
                    then.status(200).body(body);
                })
                .await;
        }

        let articles = scraper_for(&server).fetch(2).await;

        index_mock.assert_async().await;
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title(), "Cherry blossoms bloom early this year");
        assert_eq!(articles[1].title(), "New rules for electric scooters");
        assert_ne!(articles[0].url(), articles[1].url());
        assert!(articles[0].content().starts_with("Cherry blossoms"));
    }

    #[tokio::test]
    async fn test_fetch_untitled_thumbnail_link_does_not_shadow_titled_link() {
        let server = MockServer::start_async().await;
        let index = r#"
            <div class="card">
              <a href="/app/daily-news/article/1"><img src="/thumb/1.jpg"></a>
              <a href="/app/daily-news/article/1">Cherry blossoms bloom early this year</a>
            </div>
            <div class="card">
              <a href="/app/daily-news/article/2"><img src="/thumb/2.jpg"></a>
              <a href="/app/daily-news/article/2">New rules for electric scooters</a>
            </div>
        "#;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/app/daily-news/");
                then.status(200).body(index);
            })
            .await;
        for (id, topic) in [("1", "Cherry blossoms"), ("2", "Scooters")] {
            let body = format!("<div class=\"article-content\">{}</div>", long_paragraph(topic));
            server
                .mock_async(move |when, then| {
                    when.method(GET).path(format!("/app/daily-news/article/{id}"));
                    then.status(200).body(body);
                })
                .await;
        }

        let articles = scraper_for(&server).fetch(2).await;
        let titles: Vec<&str> = articles.iter().map(Article::title).collect();
        assert_eq!(
            titles,
            ["Cherry blossoms bloom early this year", "New rules for electric scooters"]
        );
        assert_eq!(articles[0].url(), server.url("/app/daily-news/article/1"));
    }

    #[tokio::test]
    async fn test_fetch_skips_failing_detail_pages() {
        let server = MockServer::start_async().await;
        let index = r#"
            <a href="/app/daily-news/article/1">Detail page for this one is broken</a>
            <a href="/app/daily-news/article/2">This one has a proper article body</a>
        "#;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/app/daily-news/");
                then.status(200).body(index);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/app/daily-news/article/1");
                then.status(500);
            })
            .await;
        let body = format!("<main><p>{}</p></main>", long_paragraph("Good news"));
        server
            .mock_async(move |when, then| {
                when.method(GET).path("/app/daily-news/article/2");
                then.status(200).body(body);
            })
            .await;

        let articles = scraper_for(&server).fetch(3).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title(), "This one has a proper article body");
    }

    #[tokio::test]
    async fn test_fetch_falls_back_on_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/app/daily-news/");
                then.status(503);
            })
            .await;

        let articles = scraper_for(&server).fetch(3).await;
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].title(), PLACEHOLDER_TITLE);
    }

    #[tokio::test]
    async fn test_fetch_falls_back_on_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/app/daily-news/");
                then.status(200).delay(Duration::from_secs(2)).body("<article></article>");
            })
            .await;

        let articles = scraper_for(&server)
            .with_timeout(Duration::from_millis(200))
            .fetch(2)
            .await;
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.title() == PLACEHOLDER_TITLE));
    }

    #[tokio::test]
    async fn test_fetch_falls_back_on_selector_drift() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/app/daily-news/");
                then.status(200).body("<div id=\"app\"></div>");
            })
            .await;

        let articles = scraper_for(&server).fetch(1).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title(), PLACEHOLDER_TITLE);
    }
}
