//! Storage module for persisting harvested pages and documents
//!
//! This module handles:
//! - Deterministic filename generation from a URL and an optional date
//! - Filename sanitization
//! - Atomic file writes into one subdirectory per domain

mod fs;
mod naming;
mod traits;

pub use fs::FsStorage;
pub use naming::{
    date_from_path, document_filename, generate_filename, sanitize_filename, StoragePath,
    MAX_FILENAME_LEN,
};
pub use traits::{Storage, StorageError, StorageResult};
