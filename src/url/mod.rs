//! URL handling module for Leafcutter
//!
//! This module provides URL normalization, domain extraction, and the link
//! classifier that decides whether a discovered link is crawled, downloaded
//! as a document, or dropped.

mod classify;
mod domain;
mod normalize;

pub use classify::{
    classify, classify_on_site, is_document_link, path_extension, Classification, LinkOrigin,
    LinkScope, RejectReason, DOCUMENT_EXTENSIONS,
};
pub use domain::registrable_domain;
pub use normalize::{normalize_parsed, normalize_url};
