//! Error taxonomy for the aggregation pipeline.
//!
//! Only [`StoreError`] ever aborts a run. [`SourceError`] values are absorbed
//! by the adapters and surfaced through [`crate::models::FetchResult::errors`],
//! and [`ConfigError`] is raised at startup before any request is made.

use thiserror::Error;

/// A failure while fetching or parsing one source.
///
/// `Request` and `Status` are network-level failures that cost the source (or
/// one of its sub-feeds) its whole contribution. `Parse` and `InvalidUrl` are
/// per-item failures: the item is skipped and the rest of the page is kept.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("cannot resolve link {href:?}: {reason}")]
    InvalidUrl { href: String, reason: String },
}

impl SourceError {
    /// True for failures that happened before any content was received.
    pub fn is_network(&self) -> bool {
        matches!(self, SourceError::Request { .. } | SourceError::Status { .. })
    }
}

/// A failure writing or reading the persisted canonical list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Invalid configuration detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid CSS selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid title pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid base URL {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("cannot build HTTP client: {0}")]
    Http(String),
}
