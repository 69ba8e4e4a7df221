//! News source adapters.
//!
//! Every source implements [`SourceAdapter`]: one `fetch()` that returns a
//! [`FetchResult`] and never fails outright. Failures are logged and recorded
//! in the result, so one source's outage never blocks the others.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Ben's Bites | [`html`] | HTML scraping | Post/article/card containers |
//! | The AI Rundown | [`html`] | HTML scraping | Links under `/p/` |
//! | Reddit | [`reddit`] | JSON listing API | One request per subreddit |
//!
//! [`Adapter`] tags the two implementation kinds so the aggregator can hold
//! a homogeneous, ordered list.

use crate::config::{Config, SourceConfig};
use crate::error::ConfigError;
use crate::models::{FetchResult, Source};
use reqwest::Client;

pub mod html;
pub mod reddit;

pub use html::HtmlScraper;
pub use reddit::RedditFeed;

/// A source-specific fetch-and-normalize unit.
pub trait SourceAdapter {
    /// The source every article from this adapter is attributed to.
    fn source(&self) -> Source;

    /// Fetch and normalize the source's current articles.
    ///
    /// Must not propagate network, parse or validation failures: they end up
    /// in [`FetchResult::errors`] (or are silently dropped, for validation).
    async fn fetch(&self) -> FetchResult;
}

/// The configured adapters, one variant per implementation kind.
#[derive(Debug)]
pub enum Adapter {
    Html(HtmlScraper),
    Feed(RedditFeed),
}

impl SourceAdapter for Adapter {
    fn source(&self) -> Source {
        match self {
            Adapter::Html(scraper) => scraper.source(),
            Adapter::Feed(feed) => feed.source(),
        }
    }

    async fn fetch(&self) -> FetchResult {
        match self {
            Adapter::Html(scraper) => scraper.fetch().await,
            Adapter::Feed(feed) => feed.fetch().await,
        }
    }
}

/// Build adapters for every configured source, in configuration order.
///
/// Selectors, patterns and base URLs are compiled here so a bad config fails
/// before the first request.
pub fn build_adapters(config: &Config, client: &Client) -> Result<Vec<Adapter>, ConfigError> {
    config
        .sources
        .iter()
        .map(|source| {
            Ok(match source {
                SourceConfig::Html(cfg) => {
                    Adapter::Html(HtmlScraper::new(cfg, client.clone(), config.delay())?)
                }
                SourceConfig::Feed(cfg) => {
                    Adapter::Feed(RedditFeed::new(cfg, client.clone(), config.delay())?)
                }
            })
        })
        .collect()
}
