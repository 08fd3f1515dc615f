//! Work queue and termination tracking
//!
//! This module handles:
//! - The single unbounded queue shared by all workers
//! - Page and document work items flowing through the same queue
//! - The live-task counter that decides when a run is finished
//! - Stopping admission of new work on shutdown

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{mpsc, watch, Mutex};
use url::Url;

/// A page waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized URL, already claimed in the page namespace
    pub url: Url,

    /// Link distance from the seed (seeds are 0)
    pub depth: u32,

    /// Registrable domain of the page this task was discovered on, or its own
    /// for seeds. Under same-domain scoping the task's links are only followed
    /// while its final URL stays on this domain.
    pub origin_domain: String,
}

/// A document waiting to be downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTask {
    /// Normalized URL, already claimed in the document namespace
    pub url: Url,

    /// Page on which the link was found
    pub source_url: Url,
}

/// Unit of work pulled by workers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Page(CrawlTask),
    Document(DocumentTask),
}

impl WorkItem {
    pub fn url(&self) -> &Url {
        match self {
            Self::Page(task) => &task.url,
            Self::Document(task) => &task.url,
        }
    }
}

/// Scheduler owns the queue and the live-task counter
///
/// The counter is incremented before an item becomes visible in the queue and
/// decremented by [`Scheduler::complete`] once the item reached a terminal
/// state and all of its children were enqueued. It therefore only reaches
/// zero when no work is queued or in flight, at which point the queue is
/// closed and idle workers receive `None`.
pub struct Scheduler {
    sender: mpsc::UnboundedSender<WorkItem>,
    receiver: Mutex<mpsc::UnboundedReceiver<WorkItem>>,
    live: AtomicUsize,
    admitting: AtomicBool,
    closed: watch::Sender<bool>,
}

impl Scheduler {
    /// Creates an empty, open scheduler
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (closed, _) = watch::channel(false);

        Self {
            sender,
            receiver: Mutex::new(receiver),
            live: AtomicUsize::new(0),
            admitting: AtomicBool::new(true),
            closed,
        }
    }

    /// Enqueues a work item
    ///
    /// Returns `false` without enqueuing once admission has stopped or the
    /// queue is closed.
    pub fn enqueue(&self, item: WorkItem) -> bool {
        if !self.is_admitting() || self.is_closed() {
            tracing::debug!("Not admitting {}", item.url());
            return false;
        }

        self.live.fetch_add(1, Ordering::AcqRel);
        if self.sender.send(item).is_err() {
            self.complete();
            return false;
        }

        true
    }

    /// Waits for the next work item
    ///
    /// Returns `None` once the queue is closed.
    pub async fn next(&self) -> Option<WorkItem> {
        let mut closed = self.closed.subscribe();
        let mut receiver = self.receiver.lock().await;

        tokio::select! {
            item = receiver.recv() => item,
            _ = closed.wait_for(|closed| *closed) => None,
        }
    }

    /// Marks one item as finished; closes the queue when none remain
    pub fn complete(&self) {
        let previous = self.live.fetch_sub(1, Ordering::AcqRel);
        if previous == 1 {
            self.close();
        }
    }

    /// Closes the queue if nothing was ever admitted
    pub fn close_if_idle(&self) {
        if self.live.load(Ordering::Acquire) == 0 {
            self.close();
        }
    }

    /// Stops accepting new work; queued and in-flight items still drain
    pub fn stop_admitting(&self) {
        if self.admitting.swap(false, Ordering::AcqRel) {
            tracing::info!(
                "Stopped admitting new work, draining {} remaining item(s)",
                self.live()
            );
        }
        self.close_if_idle();
    }

    pub fn is_admitting(&self) -> bool {
        self.admitting.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Number of items queued or in flight
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    fn close(&self) {
        if !self.closed.send_replace(true) {
            tracing::debug!("Work queue closed");
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn page(path: &str, depth: u32) -> WorkItem {
        WorkItem::Page(CrawlTask {
            url: Url::parse(&format!("https://example.com{}", path)).unwrap(),
            depth,
            origin_domain: "example.com".to_string(),
        })
    }

    #[tokio::test]
    async fn test_enqueue_and_next() {
        let scheduler = Scheduler::new();
        assert!(scheduler.enqueue(page("/a", 0)));
        assert_eq!(scheduler.live(), 1);

        let item = scheduler.next().await.unwrap();
        assert_eq!(item.url().path(), "/a");

        scheduler.complete();
        assert_eq!(scheduler.live(), 0);
        assert!(scheduler.is_closed());
        assert!(scheduler.next().await.is_none());
    }

    #[tokio::test]
    async fn test_children_keep_queue_open() {
        let scheduler = Scheduler::new();
        scheduler.enqueue(page("/seed", 0));

        let _seed = scheduler.next().await.unwrap();
        // Children are enqueued before the parent completes
        scheduler.enqueue(page("/child", 1));
        scheduler.complete();
        assert!(!scheduler.is_closed());

        let child = scheduler.next().await.unwrap();
        assert_eq!(child, page("/child", 1));
        scheduler.complete();
        assert!(scheduler.is_closed());
    }

    #[tokio::test]
    async fn test_close_if_idle_with_no_seeds() {
        let scheduler = Scheduler::new();
        scheduler.close_if_idle();
        assert!(scheduler.next().await.is_none());
        assert!(!scheduler.enqueue(page("/late", 0)));
    }

    #[tokio::test]
    async fn test_stop_admitting_drains_queued_items() {
        let scheduler = Scheduler::new();
        scheduler.enqueue(page("/a", 0));
        scheduler.enqueue(page("/b", 0));

        scheduler.stop_admitting();
        assert!(!scheduler.enqueue(page("/c", 0)));

        assert!(scheduler.next().await.is_some());
        scheduler.complete();
        assert!(scheduler.next().await.is_some());
        scheduler.complete();
        assert!(scheduler.next().await.is_none());
    }

    #[tokio::test]
    async fn test_idle_workers_wake_on_close() {
        let scheduler = Arc::new(Scheduler::new());
        scheduler.enqueue(page("/only", 0));
        let item = scheduler.next().await;
        assert!(item.is_some());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let scheduler = Arc::clone(&scheduler);
                tokio::spawn(async move { scheduler.next().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        scheduler.complete();

        for waiter in waiters {
            let result = tokio::time::timeout(Duration::from_secs(5), waiter)
                .await
                .unwrap()
                .unwrap();
            assert!(result.is_none());
        }
    }
}
