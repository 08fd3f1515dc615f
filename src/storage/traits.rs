//! Storage traits and error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid file name: {0}")]
    InvalidName(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for output backends
///
/// Implementations are shared by every worker, so they must be thread-safe.
/// A write either completes or fails without leaving a partial file behind.
pub trait Storage: Send + Sync {
    /// Writes a text file to `<domain>/<name>` and returns the final path
    fn write_text_file(&self, domain: &str, name: &str, content: &str) -> StorageResult<PathBuf>;

    /// Writes a binary file to `<domain>/<name>` and returns the final path
    fn write_binary_file(&self, domain: &str, name: &str, bytes: &[u8])
        -> StorageResult<PathBuf>;
}
