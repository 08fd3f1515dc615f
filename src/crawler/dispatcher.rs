//! Document dispatcher
//!
//! Documents get their own claim namespace, so a PDF linked from many pages
//! is downloaded once, and a document URL never competes with a page URL.

use crate::crawler::fetcher::fetch_document;
use crate::crawler::scheduler::{DocumentTask, Scheduler, WorkItem};
use crate::crawler::visited::VisitedSet;
use crate::storage::{document_filename, Storage};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Result of one document download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Saved(PathBuf),
    Failed(String),
}

/// Claims, queues and downloads documents
pub struct Dispatcher {
    claimed: VisitedSet,
    client: Client,
    storage: Arc<dyn Storage>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(client: Client, storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self {
            claimed: VisitedSet::new(),
            client,
            storage,
            timeout,
        }
    }

    /// Queues `url` for download unless it was already claimed this run
    ///
    /// Returns `true` when this call claimed and enqueued the document.
    pub fn dispatch(&self, scheduler: &Scheduler, url: Url, source_url: &Url) -> bool {
        if !self.claimed.try_claim(url.as_str()) {
            tracing::trace!("Document already dispatched: {}", url);
            return false;
        }

        tracing::debug!("Dispatching document {} (from {})", url, source_url);
        scheduler.enqueue(WorkItem::Document(DocumentTask {
            url,
            source_url: source_url.clone(),
        }))
    }

    /// Downloads a document and writes it below the output root
    pub async fn download(&self, task: &DocumentTask) -> DocumentOutcome {
        let document = match fetch_document(&self.client, &task.url, self.timeout).await {
            Ok(document) => document,
            Err(e) => return DocumentOutcome::Failed(e.to_string()),
        };

        let target = document_filename(
            &task.url,
            document.content_disposition.as_deref(),
            document.content_type.as_deref(),
        );

        let storage = Arc::clone(&self.storage);
        let write = tokio::task::spawn_blocking(move || {
            storage.write_binary_file(&target.domain, &target.filename, &document.bytes)
        })
        .await;

        match write {
            Ok(Ok(path)) => DocumentOutcome::Saved(path),
            Ok(Err(e)) => DocumentOutcome::Failed(e.to_string()),
            Err(e) => DocumentOutcome::Failed(format!("write task failed: {}", e)),
        }
    }

    /// Number of distinct documents claimed so far
    pub fn claimed(&self) -> usize {
        self.claimed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::crawler::fetcher::build_http_client;
    use crate::storage::FsStorage;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(root: &std::path::Path) -> Dispatcher {
        Dispatcher::new(
            build_http_client(&HttpConfig::default()).unwrap(),
            Arc::new(FsStorage::new(root)),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_dispatch_claims_once() {
        let dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(dir.path());
        let scheduler = Scheduler::new();

        let doc = Url::parse("https://example.com/report.pdf").unwrap();
        let page_a = Url::parse("https://example.com/a").unwrap();
        let page_b = Url::parse("https://example.com/b").unwrap();

        assert!(dispatcher.dispatch(&scheduler, doc.clone(), &page_a));
        assert!(!dispatcher.dispatch(&scheduler, doc, &page_b));
        assert_eq!(scheduler.live(), 1);
        assert_eq!(dispatcher.claimed(), 1);
    }

    #[tokio::test]
    async fn test_download_saves_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/media/2024/05/01/report.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(dir.path());
        let task = DocumentTask {
            url: Url::parse(&format!("{}/media/2024/05/01/report.pdf", server.uri())).unwrap(),
            source_url: Url::parse(&format!("{}/page", server.uri())).unwrap(),
        };

        match dispatcher.download(&task).await {
            DocumentOutcome::Saved(path) => {
                assert_eq!(
                    path.file_name().unwrap().to_string_lossy(),
                    "2024-05-01_report.pdf"
                );
                assert_eq!(std::fs::read(path).unwrap(), b"%PDF");
            }
            other => panic!("expected Saved, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(dir.path());
        let task = DocumentTask {
            url: Url::parse(&format!("{}/gone.pdf", server.uri())).unwrap(),
            source_url: Url::parse(&format!("{}/page", server.uri())).unwrap(),
        };

        assert!(matches!(
            dispatcher.download(&task).await,
            DocumentOutcome::Failed(_)
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
