//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Global options can also be provided via environment variables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the AI news aggregator.
///
/// # Examples
///
/// ```sh
/// # One aggregation run with the built-in sources
/// ai_news_aggregator run
///
/// # Custom sources and output location, no politeness delay
/// ai_news_aggregator -c sources.yaml -o /data/articles_cache.json run --no-delay
///
/// # Print what the last run stored
/// ai_news_aggregator show
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML source configuration
    #[arg(short, long, env = "AI_NEWS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Where the canonical article list is stored
    #[arg(
        short,
        long,
        env = "AI_NEWS_OUTPUT",
        default_value = "data/articles_cache.json",
        global = true
    )]
    pub output: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch every source, deduplicate, and replace the stored list (default)
    Run {
        /// Skip the politeness delay between requests
        #[arg(long)]
        no_delay: bool,
    },
    /// Print the stored article list
    Show {
        /// Print raw JSON instead of one line per article
        #[arg(long)]
        json: bool,
    },
    /// Print the effective source configuration as YAML
    Sources,
}

impl Cli {
    /// The requested command; a bare invocation means `run`.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Run { no_delay: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::parse_from(["ai_news_aggregator"]);
        assert_eq!(cli.command(), Command::Run { no_delay: false });
        assert_eq!(cli.output, PathBuf::from("data/articles_cache.json"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_run_flags() {
        let cli = Cli::parse_from([
            "ai_news_aggregator",
            "--config",
            "sources.yaml",
            "run",
            "--no-delay",
            "-o",
            "/tmp/articles.json",
        ]);
        assert_eq!(cli.command(), Command::Run { no_delay: true });
        assert_eq!(cli.config, Some(PathBuf::from("sources.yaml")));
        assert_eq!(cli.output, PathBuf::from("/tmp/articles.json"));
    }

    #[test]
    fn test_cli_show_json() {
        let cli = Cli::parse_from(["ai_news_aggregator", "show", "--json"]);
        assert_eq!(cli.command(), Command::Show { json: true });
    }
}
