//! News source scrapers.
//!
//! Only one source is supported, the [DMM Eikaiwa Daily News](https://eikaiwa.dmm.com/app/daily-news/)
//! index, implemented in [`dmm`]. The scraper works in two phases:
//!
//! 1. **Indexing**: parse the index page into an ordered list of candidates
//!    using prioritized extraction strategies
//! 2. **Fetching**: download each candidate's detail page and pull the body
//!    text with prioritized content selectors
//!
//! Both parsing steps are pure functions over HTML text so they can be
//! tested without the network. The network-facing [`dmm::DailyNewsScraper`]
//! never fails: a scraping miss yields a placeholder batch instead.

pub mod dmm;
