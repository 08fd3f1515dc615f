use serde::Deserialize;

/// User agent sent when neither the config file nor the CLI provides one
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; MyScraperBot/1.0; +http://example.com/bot)";

/// Root directory for saved pages and documents
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Maximum crawl depth when `--crawl` is given without `--max-depth`
pub const DEFAULT_MAX_DEPTH: u32 = 1;

/// Worker count used when available parallelism cannot be determined
pub const DEFAULT_WORKERS: usize = 4;

/// Returns the default worker count, derived from available parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_WORKERS)
}

/// Main configuration structure for Leafcutter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub http: HttpConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from seed URLs (seeds are depth 0)
    pub max_depth: u32,

    /// Number of concurrent workers
    pub workers: usize,

    /// Only follow links whose domain matches the page they were found on
    pub same_domain: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            workers: default_workers(),
            same_domain: false,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header value
    pub user_agent: String,

    /// Timeout for HTML pages and feeds (seconds)
    pub request_timeout_secs: u64,

    /// Timeout for document downloads (seconds)
    pub download_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 20,
            download_timeout_secs: 60,
        }
    }
}

/// Ordered CSS selector chains; within each list the first match wins
///
/// The defaults target gov.uk page structure and fall back to more generic
/// patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    pub title: Vec<String>,
    pub content: Vec<String>,
    pub lead_paragraph: Vec<String>,
    pub metadata: Vec<String>,
    pub attachment: Vec<String>,
    pub attachment_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        Self {
            title: owned(&["title", "h1"]),
            content: owned(&["main#content .govuk-govspeak", "main#content", "article", "main"]),
            lead_paragraph: owned(&["p.gem-c-lead-paragraph", "p.govuk-body-l"]),
            metadata: owned(&[".gem-c-metadata", ".govuk-body-s"]),
            attachment: owned(&["section.gem-c-attachment", "div.gem-c-attachment"]),
            attachment_link: ".gem-c-attachment__link".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory; pages and documents land in one subdirectory per domain
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}
