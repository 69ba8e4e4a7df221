//! Persistence of the canonical article list.
//!
//! The aggregator only knows the [`PersistenceSink`] contract; the concrete
//! medium is chosen by the caller.
//!
//! # Submodules
//!
//! - [`json`]: Atomically replaces a JSON file with the latest list
//!
//! # Output Structure
//!
//! ```text
//! data/
//! └── articles_cache.json   # the latest canonical list, a JSON array
//! ```

use crate::error::StoreError;
use crate::models::CanonicalList;

pub mod json;

pub use json::JsonFileSink;

/// Durable, atomic storage for the canonical list.
pub trait PersistenceSink {
    /// Replace the stored list with `list`.
    ///
    /// Readers must observe either the previous list or the new one in full.
    async fn store(&self, list: &CanonicalList) -> Result<(), StoreError>;
}
