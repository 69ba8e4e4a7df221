//! Source configuration.
//!
//! Defaults describe the three built-in sources. A YAML file can override any
//! of them; the order of `sources` is the aggregation priority order.
//!
//! ```yaml
//! user_agent: "my-bot/1.0"
//! delay_ms: 500
//! sources:
//!   - kind: html
//!     source: ai_rundown
//!     base_url: https://www.therundown.ai
//!     candidate_selector: 'a[href^="/p/"]'
//!     author: The AI Rundown
//!   - kind: feed
//!     subreddits: [LocalLLaMA]
//! ```

use crate::error::ConfigError;
use crate::models::Source;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Desktop browser User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Politeness delay after each request.
    pub delay_ms: u64,
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            delay_ms: 2000,
            sources: vec![
                SourceConfig::Html(HtmlSourceConfig::bens_bites()),
                SourceConfig::Html(HtmlSourceConfig::ai_rundown()),
                SourceConfig::Feed(FeedSourceConfig::default()),
            ],
        }
    }
}

impl Config {
    /// Load the config file at `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using built-in sources");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        info!(sources = config.sources.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// One configured source, tagged by adapter kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Html(HtmlSourceConfig),
    Feed(FeedSourceConfig),
}

impl SourceConfig {
    pub fn source(&self) -> Source {
        match self {
            SourceConfig::Html(cfg) => cfg.source,
            SourceConfig::Feed(cfg) => cfg.source,
        }
    }
}

/// Settings for a heuristic HTML scraper.
///
/// The selectors are data, not behaviour: they break whenever a site is
/// redesigned and are expected to be adjusted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HtmlSourceConfig {
    pub source: Source,
    pub base_url: String,
    /// Matches either anchors or the blocks that contain them.
    pub candidate_selector: String,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_summary_selector")]
    pub summary_selector: String,
    /// Regexes removed from titles after the byline count.
    #[serde(default)]
    pub author_patterns: Vec<String>,
    pub author: String,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
}

impl HtmlSourceConfig {
    pub fn bens_bites() -> Self {
        Self {
            source: Source::BensBites,
            base_url: "https://www.bensbites.co".to_string(),
            candidate_selector:
                "article.post, article.article, article.card, div.post, div.article, div.card"
                    .to_string(),
            max_candidates: default_max_candidates(),
            summary_selector:
                "p.excerpt, p.summary, p.description, div.excerpt, div.summary, div.description, p"
                    .to_string(),
            author_patterns: Vec::new(),
            author: "Ben's Bites".to_string(),
            tags: default_tags(),
        }
    }

    pub fn ai_rundown() -> Self {
        Self {
            source: Source::AiRundown,
            base_url: "https://www.therundown.ai".to_string(),
            candidate_selector: r#"a[href^="/p/"]"#.to_string(),
            max_candidates: default_max_candidates(),
            summary_selector: default_summary_selector(),
            author_patterns: vec!["Zach Mink.*$".to_string()],
            author: "The AI Rundown".to_string(),
            tags: vec!["AI".to_string(), "News".to_string(), "Technology".to_string()],
        }
    }
}

/// Settings for the Reddit JSON feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedSourceConfig {
    pub source: Source,
    /// Listing endpoints live at `{base_url}/{subreddit}/hot.json`.
    pub base_url: String,
    /// Prefix for post permalinks.
    pub permalink_base: String,
    pub subreddits: Vec<String>,
    pub limit: u32,
    pub tags: Vec<String>,
}

impl Default for FeedSourceConfig {
    fn default() -> Self {
        Self {
            source: Source::Reddit,
            base_url: "https://www.reddit.com/r".to_string(),
            permalink_base: "https://www.reddit.com".to_string(),
            subreddits: vec![
                "artificial".to_string(),
                "MachineLearning".to_string(),
                "OpenAI".to_string(),
            ],
            limit: 5,
            tags: vec!["AI".to_string(), "Reddit".to_string()],
        }
    }
}

fn default_max_candidates() -> usize {
    10
}

fn default_summary_selector() -> String {
    "p".to_string()
}

fn default_tags() -> Vec<String> {
    vec!["AI".to_string(), "News".to_string()]
}
