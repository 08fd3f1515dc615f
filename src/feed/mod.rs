//! Seed resolution
//!
//! A run is seeded from exactly one source: URLs given directly, a single
//! RSS/Atom feed, or a file listing feed URLs. Whatever the source, the result
//! is a de-duplicated, ordered list of normalized seed URLs.

mod parser;

pub use parser::parse_feed;

use crate::crawler::fetch_text;
use crate::url::normalize_url;
use crate::{ArgumentError, HarvestError};
use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

/// Where the seed URLs of a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// URLs given on the command line
    Urls(Vec<String>),
    /// A single RSS or Atom feed
    FeedUrl(String),
    /// A text file with one feed URL per line; blank lines and `#` comments are skipped
    FeedFile(PathBuf),
}

impl SeedSource {
    pub fn is_feed(&self) -> bool {
        !matches!(self, Self::Urls(_))
    }
}

/// Resolves a seed source into normalized, de-duplicated seed URLs
///
/// Unparseable URLs and unreachable or malformed feeds are logged and
/// skipped. An empty result is an error, since there is nothing to do.
pub async fn resolve_seeds(source: &SeedSource, client: &Client) -> Result<Vec<Url>, HarvestError> {
    let candidates = match source {
        SeedSource::Urls(urls) => urls.clone(),
        SeedSource::FeedUrl(feed) => links_from_feed(client, feed).await,
        SeedSource::FeedFile(path) => {
            let content = tokio::fs::read_to_string(path).await.map_err(|source| {
                ArgumentError::FeedFile {
                    path: path.display().to_string(),
                    source,
                }
            })?;

            let mut links = Vec::new();
            for feed in feed_file_entries(&content) {
                links.extend(links_from_feed(client, feed).await);
            }
            links
        }
    };

    let seeds = dedupe_seeds(&candidates);
    if seeds.is_empty() {
        return Err(ArgumentError::NoSeeds.into());
    }

    tracing::info!("Resolved {} seed URL(s)", seeds.len());
    Ok(seeds)
}

/// Feed URLs listed in a feed file
pub fn feed_file_entries(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Normalizes candidates, dropping invalid ones and later duplicates
pub fn dedupe_seeds(candidates: &[String]) -> Vec<Url> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for candidate in candidates {
        match normalize_url(candidate) {
            Ok(url) => {
                if seen.insert(url.to_string()) {
                    seeds.push(url);
                }
            }
            Err(e) => tracing::warn!("Skipping invalid seed URL '{}': {}", candidate, e),
        }
    }

    seeds
}

/// Fetches and parses one feed; failures yield no links
async fn links_from_feed(client: &Client, feed: &str) -> Vec<String> {
    match fetch_feed(client, feed).await {
        Ok(links) => {
            tracing::info!("Found {} entries in feed {}", links.len(), feed);
            links
        }
        Err(e) => {
            tracing::error!("{}", e);
            Vec::new()
        }
    }
}

async fn fetch_feed(client: &Client, feed: &str) -> Result<Vec<String>, HarvestError> {
    let url = normalize_url(feed)?;
    tracing::info!("Parsing feed: {}", url);

    let body = fetch_text(client, &url).await?;
    parse_feed(&body).map_err(|e| HarvestError::Feed {
        url: url.to_string(),
        message: e.to_string(),
    })
}
