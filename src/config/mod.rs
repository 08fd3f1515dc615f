//! Configuration module for Leafcutter
//!
//! Every setting has a built-in default (see [`Config::default`]). An optional
//! TOML file can override any of them, and command-line flags override the file.
//!
//! # Example
//!
//! ```no_run
//! use leafcutter::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("leafcutter.toml")).unwrap();
//! println!("Content selectors: {:?}", config.selectors.content);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_workers, Config, CrawlerConfig, HttpConfig, OutputConfig, SelectorConfig,
    DEFAULT_MAX_DEPTH, DEFAULT_OUTPUT_DIR, DEFAULT_USER_AGENT, DEFAULT_WORKERS,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
