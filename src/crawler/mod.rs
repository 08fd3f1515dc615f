//! Crawler module for fetching and processing pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of pages, feeds and documents
//! - Content extraction with ordered selector chains
//! - The visited-set guard and the shared work queue
//! - Document dispatch and download
//! - Overall crawl coordination

mod coordinator;
mod dispatcher;
mod extractor;
mod fetcher;
mod scheduler;
mod visited;

pub use coordinator::{run_crawl, Coordinator, CrawlOptions};
pub use dispatcher::{Dispatcher, DocumentOutcome};
pub use extractor::{
    parse_published_date, CandidateLink, ContentRegion, Degradation, DocumentLink,
    ExtractionResult, Extractor, PageMetadata, SelectorChain,
};
pub use fetcher::{
    build_http_client, fetch_document, fetch_page, fetch_text, FetchedDocument, FetchedPage,
};
pub use scheduler::{CrawlTask, DocumentTask, Scheduler, WorkItem};
pub use visited::VisitedSet;
