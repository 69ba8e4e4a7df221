//! The aggregation pipeline.
//!
//! Fetches every adapter in priority order, assigns identity, merges the
//! per-source lists and deduplicates them by URL (first occurrence wins),
//! then hands the canonical list to the persistence sink. A source that
//! fails contributes nothing; only a failed store aborts the run.

use crate::error::StoreError;
use crate::models::{Article, CanonicalList, FetchResult, RunReport};
use crate::outputs::PersistenceSink;
use crate::scrapers::SourceAdapter;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

pub struct Aggregator<A, S> {
    /// Highest priority first.
    adapters: Vec<A>,
    sink: S,
}

impl<A, S> Aggregator<A, S>
where
    A: SourceAdapter,
    S: PersistenceSink,
{
    pub fn new(adapters: Vec<A>, sink: S) -> Self {
        Self { adapters, sink }
    }

    /// Fetch all sources and build the canonical list without persisting it.
    #[instrument(level = "info", skip_all, fields(adapters = self.adapters.len()))]
    pub async fn collect(&self) -> (CanonicalList, RunReport) {
        // `then` polls one adapter at a time, in priority order
        let results: Vec<FetchResult> = stream::iter(self.adapters.iter())
            .then(|adapter| {
                info!(source = %adapter.source(), "Fetching source");
                adapter.fetch()
            })
            .collect()
            .await;

        for result in &results {
            if result.failed() {
                let network = result.errors.iter().filter(|e| e.is_network()).count();
                warn!(
                    source = %result.source,
                    errors = result.errors.len(),
                    network,
                    "Source contributed no articles"
                );
            } else {
                info!(
                    source = %result.source,
                    count = result.articles.len(),
                    errors = result.errors.len(),
                    "Collected source"
                );
            }
        }

        let list = merge(&results);
        let report = report(&results, &list);
        (list, report)
    }

    /// Run once: collect, then replace the persisted list.
    ///
    /// The sink receives the complete list or nothing; its failure is the
    /// only error a run can return.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) -> Result<RunReport, StoreError> {
        let (list, report) = self.collect().await;
        self.sink.store(&list).await?;
        info!(
            articles = report.articles_found,
            counts = ?report.per_source_counts,
            "Run complete"
        );
        Ok(report)
    }
}

/// Merge per-source results into the canonical list.
///
/// The `i`-th article of each result gets `article_id(source, i, url)`.
/// Results are concatenated in the given order and a later article sharing a
/// URL with an earlier one is dropped.
pub fn merge(results: &[FetchResult]) -> CanonicalList {
    let total: usize = results.iter().map(|r| r.articles.len()).sum();
    let articles = results
        .iter()
        .flat_map(|result| {
            result
                .articles
                .iter()
                .cloned()
                .enumerate()
                .map(move |(index, scraped)| Article::from_scraped(result.source, index, scraped))
        })
        .unique_by(|article| article.url.clone())
        .collect::<Vec<_>>();

    info!(
        total,
        unique = articles.len(),
        dropped = total - articles.len(),
        "Merged sources"
    );
    CanonicalList::new(articles)
}

fn report(results: &[FetchResult], list: &CanonicalList) -> RunReport {
    let mut per_source_counts = BTreeMap::new();
    let mut per_source_errors = BTreeMap::new();
    for result in results {
        *per_source_counts.entry(result.source).or_insert(0) += result.articles.len();
        *per_source_errors.entry(result.source).or_insert(0) += result.errors.len();
    }
    RunReport {
        articles_found: list.len(),
        per_source_counts,
        per_source_errors,
        finished_at: Utc::now(),
    }
}
