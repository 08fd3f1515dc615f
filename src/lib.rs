//! Leafcutter: a concurrent content harvester
//!
//! This crate fetches web pages (given directly or discovered through RSS/Atom
//! feeds), extracts their primary content into Markdown, downloads linked
//! documents, and optionally follows in-content links up to a bounded depth.

pub mod config;
pub mod crawler;
pub mod feed;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Leafcutter operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Argument error: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Feed error for {url}: {message}")]
    Feed { url: String, message: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TaskState,
        to: state::TaskState,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid or conflicting command-line input; always fatal before any work starts
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Failed to read feed file {path}: {source}")]
    FeedFile {
        path: String,
        source: std::io::Error,
    },

    #[error("No seed URLs could be resolved")]
    NoSeeds,

    #[error("Invalid value for {flag}: {message}")]
    InvalidValue { flag: &'static str, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Per-task fetch failures; recorded and counted, never fatal to a run
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, CrawlOptions};
pub use output::CrawlSummary;
pub use state::TaskState;
pub use self::url::{classify, normalize_url, registrable_domain, Classification};
