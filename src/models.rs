//! Data models for scraped and canonical articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Source`]: The fixed set of news sources, in priority order
//! - [`ScrapedArticle`]: A normalized item emitted by one source adapter
//! - [`FetchResult`]: Everything one adapter produced during a run
//! - [`Article`]: A scraped item with its assigned identity and source
//! - [`CanonicalList`]: The deduplicated output of one run
//! - [`RunReport`]: Per-run counts reported to the caller

use crate::error::SourceError;
use crate::utils::{article_id, truncate_chars};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Titles shorter than this (in characters) are discarded.
pub const MIN_TITLE_CHARS: usize = 5;

/// Summaries are cut to this many characters.
pub const MAX_SUMMARY_CHARS: usize = 300;

/// Open, unvalidated per-article metadata (author, tags, upvotes, ...).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// The news sources known to the aggregator.
///
/// Declaration order is the default priority order, and `Ord` follows it so
/// that report maps list sources the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    BensBites,
    AiRundown,
    Reddit,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::BensBites => "bens_bites",
            Source::AiRundown => "ai_rundown",
            Source::Reddit => "reddit",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized article candidate as emitted by a source adapter.
///
/// Adapters build these through [`ScrapedArticle::validated`], which enforces
/// the title and URL checks and truncates the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedArticle {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub metadata: Metadata,
}

impl ScrapedArticle {
    /// Build a candidate, or `None` if it fails validation.
    ///
    /// The title must have at least [`MIN_TITLE_CHARS`] characters after
    /// trimming and the URL must be non-empty. The summary is truncated to
    /// [`MAX_SUMMARY_CHARS`] characters.
    pub fn validated(
        title: &str,
        url: &str,
        summary: &str,
        published_at: DateTime<Utc>,
        metadata: Metadata,
    ) -> Option<Self> {
        let title = title.trim();
        let url = url.trim();
        if title.chars().count() < MIN_TITLE_CHARS || url.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            url: url.to_string(),
            summary: truncate_chars(summary.trim(), MAX_SUMMARY_CHARS),
            published_at,
            metadata,
        })
    }
}

/// The outcome of one adapter's fetch.
///
/// Never persisted; the aggregator consumes it. `errors` records every
/// failure the adapter absorbed, so a source that produced nothing can be
/// told apart from a source that had nothing to offer.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub source: Source,
    pub scraped_at: DateTime<Utc>,
    pub articles: Vec<ScrapedArticle>,
    pub errors: Vec<SourceError>,
}

impl FetchResult {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            scraped_at: Utc::now(),
            articles: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// True when the source yielded nothing and recorded at least one error.
    pub fn failed(&self) -> bool {
        self.articles.is_empty() && !self.errors.is_empty()
    }
}

/// A canonical article as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub source: Source,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Article {
    /// Attach identity to the `index`-th article produced by `source`.
    pub fn from_scraped(source: Source, index: usize, scraped: ScrapedArticle) -> Self {
        Self {
            id: article_id(source, index, &scraped.url),
            title: scraped.title,
            url: scraped.url,
            summary: scraped.summary,
            published_at: scraped.published_at,
            source,
            metadata: scraped.metadata,
        }
    }
}

/// The deduplicated, ordered article list produced by one run.
///
/// Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalList(Vec<Article>);

impl CanonicalList {
    pub fn new(articles: Vec<Article>) -> Self {
        Self(articles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a CanonicalList {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Observability summary returned by a run.
///
/// `per_source_counts` holds what each source yielded before global
/// deduplication; a failed source reports 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub articles_found: usize,
    pub per_source_counts: BTreeMap<Source, usize>,
    pub per_source_errors: BTreeMap<Source, usize>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_validated_rejects_short_title() {
        let article = ScrapedArticle::validated(
            " Hi  ",
            "https://example.com/a",
            "summary",
            fixed_time(),
            Metadata::new(),
        );
        assert!(article.is_none());
    }

    #[test]
    fn test_validated_rejects_missing_url() {
        let article = ScrapedArticle::validated(
            "A perfectly fine title",
            "  ",
            "summary",
            fixed_time(),
            Metadata::new(),
        );
        assert!(article.is_none());
    }

    #[test]
    fn test_validated_truncates_summary() {
        let long = "é".repeat(450);
        let article = ScrapedArticle::validated(
            "GPT news of the day",
            "https://example.com/a",
            &long,
            fixed_time(),
            Metadata::new(),
        )
        .unwrap();
        assert_eq!(article.summary.chars().count(), MAX_SUMMARY_CHARS);
    }

    #[test]
    fn test_source_serialization() {
        assert_eq!(
            serde_json::to_string(&Source::BensBites).unwrap(),
            "\"bens_bites\""
        );
        let parsed: Source = serde_json::from_str("\"ai_rundown\"").unwrap();
        assert_eq!(parsed, Source::AiRundown);
        assert_eq!(Source::Reddit.to_string(), "reddit");
    }

    #[test]
    fn test_article_field_names() {
        let scraped = ScrapedArticle::validated(
            "Open weights model released",
            "https://example.com/model",
            "A new model.",
            fixed_time(),
            Metadata::new(),
        )
        .unwrap();
        let article = Article::from_scraped(Source::AiRundown, 0, scraped);
        let value = serde_json::to_value(&article).unwrap();

        for field in ["id", "title", "url", "summary", "published_at", "source", "metadata"] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(value["source"], "ai_rundown");
        assert_eq!(value["published_at"], "2025-05-06T14:30:00Z");
    }

    #[test]
    fn test_canonical_list_is_a_bare_array() {
        let list = CanonicalList::default();
        assert_eq!(serde_json::to_string(&list).unwrap(), "[]");
        assert!(list.is_empty());
    }

    #[test]
    fn test_run_report_camel_case() {
        let mut counts = BTreeMap::new();
        counts.insert(Source::Reddit, 4);
        let report = RunReport {
            articles_found: 4,
            per_source_counts: counts,
            per_source_errors: BTreeMap::new(),
            finished_at: fixed_time(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["articlesFound"], 4);
        assert_eq!(json["perSourceCounts"]["reddit"], 4);
    }

    #[test]
    fn test_fetch_result_failed() {
        let mut result = FetchResult::new(Source::BensBites);
        assert!(!result.failed());
        result.errors.push(SourceError::Status {
            url: "https://www.bensbites.co".to_string(),
            status: 500,
        });
        assert!(result.failed());
    }
}
