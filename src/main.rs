//! # AI News Aggregator
//!
//! Collects short AI news items from newsletter landing pages and Reddit,
//! normalizes them, and stores one deduplicated article list per run.
//!
//! ## Features
//!
//! - Heuristic HTML scraping of Ben's Bites and The AI Rundown
//! - Reddit hot listings for a configurable set of subreddits
//! - Stable article ids derived from a content hash of the URL
//! - Atomic replacement of the stored JSON list
//!
//! ## Usage
//!
//! ```sh
//! ai_news_aggregator -o ./data/articles_cache.json run
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Each source adapter fetches and normalizes its articles;
//!    failures are absorbed per source
//! 2. **Merging**: Per-source lists are concatenated in priority order and
//!    deduplicated by URL, first occurrence winning
//! 3. **Output**: The canonical list atomically replaces the stored file and
//!    a JSON run report is printed to stdout
//!
//! Scheduling is left to the caller (cron, a systemd timer, a container
//! scheduler): one invocation is one run.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cli;
mod config;
mod error;
mod http;
mod models;
mod outputs;
mod scrapers;
mod utils;

use aggregator::Aggregator;
use cli::{Cli, Command};
use config::Config;
use outputs::JsonFileSink;
use utils::{ensure_writable_dir, truncate_chars};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout carries the report) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args.config, ?args.output, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref())?;

    match args.command() {
        Command::Run { no_delay } => {
            if no_delay {
                config.delay_ms = 0;
            }
            run(&config, &args.output).await
        }
        Command::Show { json } => show(&args.output, json).await,
        Command::Sources => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

/// One aggregation run: fetch, merge, store, report.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
async fn run(config: &Config, output: &Path) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("Aggregation run starting");

    // Early check: fail before fetching anything if the output can't be written
    if let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_writable_dir(dir).await?;
    }

    let client = http::build_client(&config.user_agent, config.timeout())?;
    let adapters = scrapers::build_adapters(config, &client)?;
    let sink = JsonFileSink::new(output);
    info!(path = %sink.path().display(), sources = adapters.len(), "Pipeline ready");
    let aggregator = Aggregator::new(adapters, sink);

    let report = aggregator.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = report.articles_found,
        "Execution complete"
    );
    Ok(())
}

/// Print the stored list, the read side of the persisted document.
async fn show(output: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let list = JsonFileSink::new(output).load().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }
    if list.is_empty() {
        info!(path = %output.display(), "No stored articles; run the aggregator first");
    }
    for article in list.iter() {
        println!(
            "[{}] {}  {}\n    {}",
            article.source,
            article.published_at.format("%Y-%m-%d %H:%M"),
            article.title,
            article.url
        );
        debug!(id = %article.id, summary = %truncate_chars(&article.summary, 80), "Article");
    }
    info!(count = list.len(), "Listed stored articles");
    Ok(())
}
