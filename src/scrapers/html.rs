//! Heuristic HTML scraper for newsletter landing pages.
//!
//! One implementation serves both [Ben's Bites](https://www.bensbites.co) and
//! [The AI Rundown](https://www.therundown.ai); only the configuration differs.
//!
//! # Extraction
//!
//! 1. Select candidates with the configured selector, keeping the first
//!    `max_candidates`. A candidate is an anchor, or a block containing one.
//! 2. Title: anchor text, or the first `h1`-`h3` in the enclosing block when
//!    the anchor text is shorter than 10 characters. Byline counts and author
//!    suffixes are stripped; titles under 5 characters are dropped.
//! 3. Summary: first summary element in the block with more than 20
//!    characters, falling back to the title.
//! 4. URL: the anchor's `href` resolved against the base URL.
//!
//! Items are deduplicated by URL before being returned.

use crate::config::HtmlSourceConfig;
use crate::error::{ConfigError, SourceError};
use crate::http::get_text;
use crate::models::{FetchResult, Metadata, ScrapedArticle, Source};
use crate::scrapers::SourceAdapter;
use crate::utils::{clean_title, collapse_whitespace};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3").unwrap());

/// Anchor text shorter than this triggers the heading fallback.
const MIN_ANCHOR_TITLE_CHARS: usize = 10;

/// Summary candidates must be longer than this.
const MIN_SUMMARY_CHARS: usize = 20;

#[derive(Debug)]
pub struct HtmlScraper {
    source: Source,
    page_url: String,
    base_url: Url,
    candidates: Selector,
    max_candidates: usize,
    summary: Selector,
    author_patterns: Vec<Regex>,
    author: String,
    tags: Vec<String>,
    client: Client,
    delay: Duration,
}

impl HtmlScraper {
    pub fn new(config: &HtmlSourceConfig, client: Client, delay: Duration) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|source| ConfigError::Url {
            url: config.base_url.clone(),
            source,
        })?;
        let author_patterns = config
            .author_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: config.source,
            page_url: config.base_url.clone(),
            base_url,
            candidates: parse_selector(&config.candidate_selector)?,
            max_candidates: config.max_candidates,
            summary: parse_selector(&config.summary_selector)?,
            author_patterns,
            author: config.author.clone(),
            tags: config.tags.clone(),
            client,
            delay,
        })
    }

    /// Extract articles from a landing page.
    ///
    /// Returns the kept articles plus one error per candidate that could not
    /// be parsed. Candidates failing validation are dropped without an error.
    pub fn parse_page(
        &self,
        html: &str,
        scraped_at: DateTime<Utc>,
    ) -> (Vec<ScrapedArticle>, Vec<SourceError>) {
        let document = Html::parse_document(html);
        let mut articles = Vec::new();
        let mut errors = Vec::new();

        for candidate in document.select(&self.candidates).take(self.max_candidates) {
            match self.parse_candidate(candidate, scraped_at) {
                Ok(Some(article)) => articles.push(article),
                Ok(None) => {}
                Err(e) => {
                    warn!(source = %self.source, error = %e, "Skipping unparsable candidate");
                    errors.push(e);
                }
            }
        }

        let articles = articles
            .into_iter()
            .unique_by(|article| article.url.clone())
            .collect::<Vec<_>>();
        (articles, errors)
    }

    fn parse_candidate(
        &self,
        candidate: ElementRef<'_>,
        scraped_at: DateTime<Utc>,
    ) -> Result<Option<ScrapedArticle>, SourceError> {
        let is_anchor = candidate.value().name() == "a" && candidate.value().attr("href").is_some();
        let (anchor, block) = if is_anchor {
            (candidate, enclosing_block(candidate))
        } else {
            let anchor = candidate.select(&ANCHOR).next().ok_or_else(|| {
                SourceError::Parse(format!("no link inside <{}>", candidate.value().name()))
            })?;
            (anchor, Some(candidate))
        };

        let href = anchor.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() {
            debug!(source = %self.source, "Dropping candidate with empty href");
            return Ok(None);
        }
        let url = self
            .base_url
            .join(href)
            .map_err(|e| SourceError::InvalidUrl {
                href: href.to_string(),
                reason: e.to_string(),
            })?;

        let mut raw_title = element_text(anchor);
        if raw_title.chars().count() < MIN_ANCHOR_TITLE_CHARS {
            if let Some(heading) = block.and_then(|b| b.select(&HEADING).next()) {
                raw_title = element_text(heading);
            }
        }
        let title = clean_title(&raw_title, &self.author_patterns);

        let summary = block
            .and_then(|b| {
                b.select(&self.summary)
                    .map(element_text)
                    .find(|text| text.chars().count() > MIN_SUMMARY_CHARS)
            })
            .unwrap_or_else(|| title.clone());

        let article =
            ScrapedArticle::validated(&title, url.as_str(), &summary, scraped_at, self.metadata());
        if article.is_none() {
            debug!(source = %self.source, raw_title = %raw_title, "Dropping candidate with short title");
        }
        Ok(article)
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("author".to_string(), Value::from(self.author.clone()));
        metadata.insert("tags".to_string(), Value::from(self.tags.clone()));
        metadata
    }
}

impl SourceAdapter for HtmlScraper {
    fn source(&self) -> Source {
        self.source
    }

    #[instrument(level = "info", skip_all, fields(source = %self.source))]
    async fn fetch(&self) -> FetchResult {
        let mut result = FetchResult::new(self.source);

        match get_text(&self.client, &self.page_url).await {
            Ok(body) => {
                let (articles, errors) = self.parse_page(&body, result.scraped_at);
                result.articles = articles;
                result.errors = errors;
                info!(
                    count = result.articles.len(),
                    skipped = result.errors.len(),
                    url = %self.page_url,
                    "Scraped landing page"
                );
            }
            Err(e) => {
                error!(error = %e, url = %self.page_url, "Landing page fetch failed");
                result.errors.push(e);
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        result
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Nearest `div`, `article` or `section` ancestor.
fn enclosing_block(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| matches!(e.value().name(), "div" | "article" | "section"))
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}
