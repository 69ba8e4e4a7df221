//! Utility functions for text normalization, article identity, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Character-safe truncation and whitespace collapsing for scraped text
//! - Title cleanup (byline counts and author suffixes)
//! - Deterministic article ids
//! - Log-friendly truncation and JSON error classification
//! - File system validation for the output directory

use crate::models::Source;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Trailing byline counts such as `", +4"` appended to newsletter titles.
static BYLINE_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r",?\s*\+\d+$").unwrap());

/// Number of hex characters of the URL digest kept in an article id.
const ID_HASH_LEN: usize = 16;

/// Truncate a string to at most `max` characters.
///
/// Counts Unicode scalar values, so multi-byte text is never split in the
/// middle of a character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a scraped title.
///
/// Strips a trailing `+N` byline count first, then every author pattern in
/// order, and trims the result. The caller decides whether what is left is
/// long enough to keep.
///
/// # Examples
///
/// ```ignore
/// let zach = Regex::new("Zach Mink.*$").unwrap();
/// assert_eq!(clean_title("Zach Mink, +4", &[zach]), "");
/// ```
pub fn clean_title(raw: &str, author_patterns: &[Regex]) -> String {
    let mut title = BYLINE_COUNT.replace(raw.trim(), "").into_owned();
    for pattern in author_patterns {
        title = pattern.replace_all(&title, "").into_owned();
    }
    title.trim().to_string()
}

/// Derive the id of the `index`-th article a source produced.
///
/// The id is `{source}_{index}_{hash}` where `hash` is a prefix of the
/// SHA-256 digest of the URL, so the same URL from the same position maps to
/// the same id in every process.
pub fn article_id(source: Source, index: usize, url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    format!("{}_{}_{}", source.as_str(), index, &digest[..ID_HASH_LEN])
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = truncate_chars(s, max);
    if head.len() == s.len() {
        head
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A feed response cut off mid-transfer fails with an EOF error rather than
/// a syntax error; the distinction is logged to tell flaky connections apart
/// from a changed response shape.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Created and removed again by [`ensure_writable_dir`].
const WRITE_CHECK_FILE: &str = "..__write_check__";

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a marker file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let marker = path.join(WRITE_CHECK_FILE);
    match stdfs::File::create(&marker) {
        Ok(_) => {
            if let Err(e) = stdfs::remove_file(&marker) {
                warn!(marker = %marker.display(), error = %e, "Could not remove write-check file");
            }
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
