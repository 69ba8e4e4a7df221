//! Reddit hot-listing client.
//!
//! Reads `{base_url}/{subreddit}/hot.json?limit=N` for each configured
//! subreddit, one at a time with a delay after each request. The listing is
//! shaped as:
//!
//! ```text
//! {data: {children: [{data: {title, url, selftext, ups, created_utc,
//!                            permalink, author, stickied}}]}}
//! ```
//!
//! Stickied posts are skipped. Self posts, and links back into Reddit, are
//! attributed to their permalink.

use crate::config::FeedSourceConfig;
use crate::error::{ConfigError, SourceError};
use crate::http::get_text;
use crate::models::{FetchResult, Metadata, ScrapedArticle, Source};
use crate::scrapers::SourceAdapter;
use crate::utils::{looks_truncated, truncate_for_log};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Value>,
}

/// One post; every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Post {
    title: Option<String>,
    url: Option<String>,
    selftext: Option<String>,
    ups: Option<i64>,
    created_utc: Option<f64>,
    permalink: Option<String>,
    author: Option<String>,
    stickied: Option<bool>,
}

#[derive(Debug)]
pub struct RedditFeed {
    source: Source,
    base_url: String,
    permalink_base: String,
    /// Host suffix that marks a link as pointing back into the feed's own site.
    own_domain: String,
    subreddits: Vec<String>,
    limit: u32,
    tags: Vec<String>,
    client: Client,
    delay: Duration,
}

impl RedditFeed {
    pub fn new(config: &FeedSourceConfig, client: Client, delay: Duration) -> Result<Self, ConfigError> {
        let permalink_url = Url::parse(&config.permalink_base).map_err(|source| ConfigError::Url {
            url: config.permalink_base.clone(),
            source,
        })?;
        Url::parse(&config.base_url).map_err(|source| ConfigError::Url {
            url: config.base_url.clone(),
            source,
        })?;
        let host = permalink_url.host_str().unwrap_or_default();
        let own_domain = host.strip_prefix("www.").unwrap_or(host).to_string();

        Ok(Self {
            source: config.source,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            permalink_base: config.permalink_base.trim_end_matches('/').to_string(),
            own_domain,
            subreddits: config.subreddits.clone(),
            limit: config.limit,
            tags: config.tags.clone(),
            client,
            delay,
        })
    }

    fn listing_url(&self, subreddit: &str) -> String {
        format!(
            "{}/{}/hot.json?limit={}",
            self.base_url,
            urlencoding::encode(subreddit),
            self.limit
        )
    }

    /// Parse one subreddit listing.
    ///
    /// A body that is not a listing fails as a whole; a malformed post only
    /// costs that post.
    pub fn parse_listing(
        &self,
        subreddit: &str,
        body: &str,
        scraped_at: DateTime<Utc>,
    ) -> Result<(Vec<ScrapedArticle>, Vec<SourceError>), SourceError> {
        let listing: Listing = serde_json::from_str(body).map_err(|e| {
            warn!(
                %subreddit,
                error = %e,
                truncated = looks_truncated(&e),
                body_preview = %truncate_for_log(body, 200),
                "Listing is not valid JSON"
            );
            SourceError::Parse(format!("r/{subreddit}: {e}"))
        })?;

        let mut articles = Vec::new();
        let mut errors = Vec::new();
        for child in listing.data.children {
            let post = match child.get("data").cloned().map(serde_json::from_value::<Post>) {
                Some(Ok(post)) => post,
                Some(Err(e)) => {
                    warn!(%subreddit, error = %e, "Skipping malformed post");
                    errors.push(SourceError::Parse(format!("r/{subreddit}: {e}")));
                    continue;
                }
                None => {
                    errors.push(SourceError::Parse(format!("r/{subreddit}: post without data")));
                    continue;
                }
            };
            if post.stickied.unwrap_or(false) {
                continue;
            }
            if let Some(article) = self.to_article(subreddit, post, scraped_at) {
                articles.push(article);
            }
        }
        Ok((articles, errors))
    }

    fn to_article(&self, subreddit: &str, post: Post, scraped_at: DateTime<Utc>) -> Option<ScrapedArticle> {
        let title = post.title.unwrap_or_default();
        let url = match post.url.as_deref().map(str::trim) {
            Some(link) if !link.is_empty() && !self.is_own_link(link) => link.to_string(),
            _ => match post.permalink.as_deref() {
                Some(permalink) if !permalink.is_empty() => {
                    format!("{}{}", self.permalink_base, permalink)
                }
                _ => String::new(),
            },
        };
        let summary = match post.selftext.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => title.clone(),
        };
        let published_at = post
            .created_utc
            .filter(|secs| secs.is_finite())
            .and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, 0))
            .unwrap_or(scraped_at);

        let mut metadata = Metadata::new();
        metadata.insert(
            "author".to_string(),
            Value::from(post.author.unwrap_or_else(|| "Unknown".to_string())),
        );
        metadata.insert("tags".to_string(), Value::from(self.tags.clone()));
        metadata.insert("upvotes".to_string(), Value::from(post.ups.unwrap_or(0)));
        metadata.insert("subreddit".to_string(), Value::from(format!("r/{subreddit}")));

        let article = ScrapedArticle::validated(&title, &url, &summary, published_at, metadata);
        if article.is_none() {
            debug!(%subreddit, %title, "Dropping post that failed validation");
        }
        article
    }

    /// True for links that point back into the feed's own site, or that are
    /// not absolute URLs at all.
    fn is_own_link(&self, link: &str) -> bool {
        match Url::parse(link) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => {
                    host == self.own_domain || host.ends_with(&format!(".{}", self.own_domain))
                }
                None => true,
            },
            Err(_) => true,
        }
    }
}

impl SourceAdapter for RedditFeed {
    fn source(&self) -> Source {
        self.source
    }

    #[instrument(level = "info", skip_all, fields(source = %self.source))]
    async fn fetch(&self) -> FetchResult {
        let mut result = FetchResult::new(self.source);

        for subreddit in &self.subreddits {
            let url = self.listing_url(subreddit);
            let outcome = match get_text(&self.client, &url).await {
                Ok(body) => self.parse_listing(subreddit, &body, result.scraped_at),
                Err(e) => Err(e),
            };
            match outcome {
                Ok((articles, errors)) => {
                    info!(%subreddit, count = articles.len(), skipped = errors.len(), "Read subreddit");
                    result.articles.extend(articles);
                    result.errors.extend(errors);
                }
                Err(e) => {
                    error!(%subreddit, error = %e, "Subreddit fetch failed");
                    result.errors.push(e);
                }
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        info!(
            count = result.articles.len(),
            errors = result.errors.len(),
            "Fetched Reddit posts"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_server::{Route, serve};
    use crate::models::MAX_SUMMARY_CHARS;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap()
    }

    fn feed() -> RedditFeed {
        RedditFeed::new(&FeedSourceConfig::default(), Client::new(), Duration::ZERO).unwrap()
    }

    fn listing(posts: Vec<Value>) -> String {
        let children: Vec<Value> = posts.into_iter().map(|p| json!({ "kind": "t3", "data": p })).collect();
        json!({ "kind": "Listing", "data": { "children": children } }).to_string()
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(
            feed().listing_url("MachineLearning"),
            "https://www.reddit.com/r/MachineLearning/hot.json?limit=5"
        );
    }

    #[test]
    fn test_outbound_link_post() {
        let body = listing(vec![json!({
            "title": "New paper on sparse attention",
            "url": "https://arxiv.org/abs/2501.00001",
            "selftext": "",
            "ups": 412,
            "created_utc": 1746518400.0,
            "permalink": "/r/MachineLearning/comments/abc/new_paper/",
            "author": "researcher",
            "stickied": false
        })]);
        let (articles, errors) = feed().parse_listing("MachineLearning", &body, fixed_time()).unwrap();

        assert!(errors.is_empty());
        let article = &articles[0];
        assert_eq!(article.url, "https://arxiv.org/abs/2501.00001");
        assert_eq!(article.summary, "New paper on sparse attention");
        assert_eq!(article.published_at, Utc.with_ymd_and_hms(2025, 5, 6, 8, 0, 0).unwrap());
        assert_eq!(article.metadata["upvotes"], 412);
        assert_eq!(article.metadata["author"], "researcher");
        assert_eq!(article.metadata["subreddit"], "r/MachineLearning");
        assert_eq!(article.metadata["tags"], json!(["AI", "Reddit"]));
    }

    #[test]
    fn test_self_post_uses_permalink() {
        let body = listing(vec![
            json!({
                "title": "What are you building this week?",
                "url": "https://www.reddit.com/r/OpenAI/comments/xyz/what/",
                "selftext": "Share your projects.",
                "permalink": "/r/OpenAI/comments/xyz/what/"
            }),
            json!({
                "title": "Gallery post about robots",
                "url": "/r/OpenAI/comments/qqq/gallery/",
                "permalink": "/r/OpenAI/comments/qqq/gallery/"
            }),
        ]);
        let (articles, _) = feed().parse_listing("OpenAI", &body, fixed_time()).unwrap();

        assert_eq!(articles[0].url, "https://www.reddit.com/r/OpenAI/comments/xyz/what/");
        assert_eq!(articles[0].summary, "Share your projects.");
        assert_eq!(articles[1].url, "https://www.reddit.com/r/OpenAI/comments/qqq/gallery/");
    }

    #[test]
    fn test_stickied_and_invalid_posts_are_skipped() {
        let body = listing(vec![
            json!({ "title": "Weekly megathread", "url": "https://example.com/mega", "stickied": true }),
            json!({ "title": "Hi", "url": "https://example.com/short" }),
            json!({ "title": "No link at all here" }),
            json!({ "title": "Kept post with a real title", "url": "https://example.com/kept" }),
        ]);
        let (articles, errors) = feed().parse_listing("artificial", &body, fixed_time()).unwrap();

        assert!(errors.is_empty());
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://example.com/kept");
        // no timestamp or author on the wire
        assert_eq!(articles[0].published_at, fixed_time());
        assert_eq!(articles[0].metadata["author"], "Unknown");
        assert_eq!(articles[0].metadata["upvotes"], 0);
    }

    #[test]
    fn test_long_selftext_is_truncated() {
        let body = listing(vec![json!({
            "title": "A long discussion post",
            "selftext": "x".repeat(1000),
            "permalink": "/r/artificial/comments/long/"
        })]);
        let (articles, _) = feed().parse_listing("artificial", &body, fixed_time()).unwrap();
        assert_eq!(articles[0].summary.chars().count(), MAX_SUMMARY_CHARS);
    }

    #[test]
    fn test_malformed_post_is_isolated() {
        let body = listing(vec![
            json!({ "title": 42, "url": "https://example.com/bad" }),
            json!({ "title": "Good post survives", "url": "https://example.com/good" }),
        ]);
        let (articles, errors) = feed().parse_listing("artificial", &body, fixed_time()).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_non_listing_body_fails() {
        let err = feed()
            .parse_listing("artificial", "<html>rate limited</html>", fixed_time())
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn test_own_link_detection() {
        let feed = feed();
        assert!(feed.is_own_link("https://www.reddit.com/r/x"));
        assert!(feed.is_own_link("https://old.reddit.com/r/x"));
        assert!(feed.is_own_link("https://reddit.com/r/x"));
        assert!(feed.is_own_link("/r/x/comments/1"));
        assert!(!feed.is_own_link("https://i.redd.it/abc.png"));
        assert!(!feed.is_own_link("https://notreddit.com/article"));
    }

    #[tokio::test]
    async fn test_unreachable_feed_records_each_subreddit() {
        let config = FeedSourceConfig {
            base_url: "http://127.0.0.1:9/r".to_string(),
            ..FeedSourceConfig::default()
        };
        let client = crate::http::build_client("test-agent", Duration::from_secs(2)).unwrap();
        let feed = RedditFeed::new(&config, client, Duration::ZERO).unwrap();

        let result = feed.fetch().await;
        assert!(result.failed());
        assert_eq!(result.errors.len(), 3);
    }

    #[tokio::test]
    async fn test_rate_limited_subreddit_does_not_sink_the_feed() {
        let post = |title: &str, url: &str| {
            listing(vec![json!({
                "title": title,
                "url": url,
                "selftext": "",
                "ups": 87,
                "created_utc": 1746518400.0,
                "permalink": "/r/x/comments/1/post/",
                "author": "poster"
            })])
        };
        let base = serve(vec![
            Route::new("/r/busy/", 429, "Too Many Requests"),
            Route::new("/r/first/", 200, post("Llama weights leak onto torrent sites", "https://example.com/llama")),
            Route::new("/r/last/", 200, post("Small models beat large ones on math", "https://example.com/math")),
        ])
        .await;
        let config = FeedSourceConfig {
            base_url: format!("{base}/r"),
            subreddits: vec!["first".to_string(), "busy".to_string(), "last".to_string()],
            ..FeedSourceConfig::default()
        };
        let client = crate::http::build_client("test-agent", Duration::from_secs(5)).unwrap();
        let feed = RedditFeed::new(&config, client, Duration::ZERO).unwrap();

        let result = feed.fetch().await;

        assert!(!result.failed());
        let urls: Vec<&str> = result.articles.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/llama", "https://example.com/math"]);
        assert_eq!(
            result.errors,
            vec![SourceError::Status {
                url: format!("{base}/r/busy/hot.json?limit=5"),
                status: 429,
            }]
        );
    }
}
