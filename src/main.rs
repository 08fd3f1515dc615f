//! Leafcutter main entry point
//!
//! This is the command-line interface for the Leafcutter content harvester.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use leafcutter::config::{load_config, validate, Config};
use leafcutter::crawler::{build_http_client, Coordinator, CrawlOptions};
use leafcutter::feed::{resolve_seeds, SeedSource};
use leafcutter::output::print_summary;
use leafcutter::storage::FsStorage;
use leafcutter::{ArgumentError, HarvestError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Leafcutter: a concurrent content harvester
///
/// Leafcutter saves the main content of web pages as Markdown, downloads the
/// documents they link to, and can follow in-content links up to a bounded
/// depth. Seeds come from URLs, an RSS/Atom feed, or a file of feed URLs.
#[derive(Parser, Debug)]
#[command(name = "leafcutter")]
#[command(version = "1.0.0")]
#[command(about = "Harvest web pages as Markdown and download linked documents", long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .multiple(false)
        .args(["urls", "feed_url", "feed_file"])
))]
struct Cli {
    /// Page URLs to harvest
    #[arg(value_name = "URL")]
    urls: Vec<String>,

    /// RSS or Atom feed whose entries are harvested
    #[arg(long, value_name = "URL")]
    feed_url: Option<String>,

    /// File listing one feed URL per line
    #[arg(long, value_name = "PATH")]
    feed_file: Option<PathBuf>,

    /// Root directory for saved pages and documents [default: output]
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Follow links found in the content of seed pages
    #[arg(long)]
    crawl: bool,

    /// Maximum link depth from the seeds, only used with --crawl [default: 1]
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Only follow links on the same domain, only used with --crawl
    #[arg(long)]
    same_domain: bool,

    /// Number of concurrent workers [default: available parallelism]
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn seed_source(&self) -> SeedSource {
        if let Some(feed) = &self.feed_url {
            SeedSource::FeedUrl(feed.clone())
        } else if let Some(path) = &self.feed_file {
            SeedSource::FeedFile(path.clone())
        } else {
            SeedSource::Urls(self.urls.clone())
        }
    }

    /// Loads the optional config file and applies command-line overrides
    fn build_config(&self) -> Result<Config, HarvestError> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                load_config(path)?
            }
            None => Config::default(),
        };

        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.display().to_string();
        }
        if let Some(user_agent) = &self.user_agent {
            config.http.user_agent = user_agent.clone();
        }
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
        if self.same_domain {
            config.crawler.same_domain = true;
        }
        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(ArgumentError::InvalidValue {
                    flag: "--workers",
                    message: "must be at least 1".to_string(),
                }
                .into());
            }
            config.crawler.workers = workers;
        }

        validate(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = cli.build_config().context("Invalid configuration")?;
    let source = cli.seed_source();

    let crawl_enabled = cli.crawl && !source.is_feed();
    if cli.crawl && source.is_feed() {
        tracing::warn!("--crawl is ignored for feed sources; feed entries are harvested without following links");
    }
    if !cli.crawl && (cli.max_depth.is_some() || cli.same_domain) {
        tracing::warn!("--max-depth and --same-domain have no effect without --crawl");
    }

    let client = build_http_client(&config.http).context("Failed to build HTTP client")?;
    let seeds = resolve_seeds(&source, &client)
        .await
        .context("Could not resolve any seed URL")?;

    tracing::info!("Saving output under: {}", config.output.directory);
    let storage = Arc::new(FsStorage::new(&config.output.directory));
    let options = CrawlOptions::from_config(&config, crawl_enabled);
    let coordinator = Arc::new(Coordinator::new(options, client, storage)?);

    let interrupt = Arc::clone(&coordinator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing queued work");
            interrupt.shutdown();
        }
    });

    let summary = coordinator.run(&seeds).await;
    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("leafcutter=info,warn"),
            1 => EnvFilter::new("leafcutter=debug,info"),
            2 => EnvFilter::new("leafcutter=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
