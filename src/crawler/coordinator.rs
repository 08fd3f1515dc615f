//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives a run, including:
//! - Seeding the queue from the resolved seed URLs
//! - The per-page pipeline (fetch, extract, classify, save, enqueue)
//! - Document downloads flowing through the same queue
//! - Termination once no work is queued or in flight
//! - Clean shutdown on interrupt

use crate::config::{Config, HttpConfig, SelectorConfig};
use crate::crawler::dispatcher::{Dispatcher, DocumentOutcome};
use crate::crawler::extractor::{Degradation, ExtractionResult, Extractor};
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::scheduler::{CrawlTask, DocumentTask, Scheduler, WorkItem};
use crate::crawler::visited::VisitedSet;
use crate::output::{render_page, CrawlSummary, RunStats};
use crate::state::TaskState;
use crate::storage::{generate_filename, Storage};
use crate::url::{
    classify_on_site, normalize_parsed, registrable_domain, Classification, LinkScope,
};
use crate::HarvestError;
use reqwest::Client;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Progress is logged every this many processed pages
const PROGRESS_INTERVAL: usize = 10;

/// Run-level settings
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Follow admitted links at all
    pub crawl_enabled: bool,
    /// Deepest level that is fetched; seeds are depth 0
    pub max_depth: u32,
    /// Only follow links on the domain of the page they were found on
    pub same_domain: bool,
    pub workers: usize,
    pub http: HttpConfig,
    pub selectors: SelectorConfig,
}

impl CrawlOptions {
    /// Builds options from a loaded configuration
    pub fn from_config(config: &Config, crawl_enabled: bool) -> Self {
        Self {
            crawl_enabled,
            max_depth: config.crawler.max_depth,
            same_domain: config.crawler.same_domain,
            workers: config.crawler.workers,
            http: config.http.clone(),
            selectors: config.selectors.clone(),
        }
    }

    /// Depth limit actually applied; no link is followed when crawling is off
    pub fn effective_max_depth(&self) -> u32 {
        if self.crawl_enabled {
            self.max_depth
        } else {
            0
        }
    }
}

/// Main crawler coordinator structure
///
/// One coordinator serves one run. It is shared by all workers behind an
/// `Arc`; every piece of mutable state inside is synchronized.
pub struct Coordinator {
    options: CrawlOptions,
    scope: LinkScope,
    scheduler: Scheduler,
    pages: VisitedSet,
    dispatcher: Dispatcher,
    extractor: Extractor,
    client: Client,
    storage: Arc<dyn Storage>,
    stats: RunStats,
}

impl Coordinator {
    /// Creates a coordinator fetching with `client` and writing through `storage`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - A selector did not compile
    pub fn new(
        options: CrawlOptions,
        client: Client,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, HarvestError> {
        let extractor = Extractor::new(&options.selectors)?;
        let dispatcher = Dispatcher::new(
            client.clone(),
            Arc::clone(&storage),
            Duration::from_secs(options.http.download_timeout_secs),
        );
        let scope = LinkScope {
            crawl_enabled: options.crawl_enabled,
            same_domain_only: options.same_domain,
        };

        Ok(Self {
            options,
            scope,
            scheduler: Scheduler::new(),
            pages: VisitedSet::new(),
            dispatcher,
            extractor,
            client,
            storage,
            stats: RunStats::new(),
        })
    }

    /// Runs the crawl until no work remains
    ///
    /// This method:
    /// 1. Normalizes, claims and enqueues the seeds at depth 0
    /// 2. Spawns the worker pool
    /// 3. Waits for every worker to exit after the queue closes
    pub async fn run(self: &Arc<Self>, seeds: &[Url]) -> CrawlSummary {
        let started = Instant::now();
        let seeded = self.seed(seeds);
        tracing::info!(
            "Starting run with {} seed(s), {} worker(s), max depth {}",
            seeded,
            self.options.workers,
            self.options.effective_max_depth()
        );
        self.scheduler.close_if_idle();

        let handles: Vec<_> = (0..self.options.workers.max(1))
            .map(|id| {
                let coordinator = Arc::clone(self);
                tokio::spawn(async move { coordinator.worker(id).await })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task ended abnormally: {}", e);
            }
        }

        let summary = self.stats.snapshot(started.elapsed());
        tracing::info!(
            "Run finished: {} page(s) saved, {} failed, {} document(s) saved in {:?}",
            summary.pages_saved,
            summary.page_failures,
            summary.documents_saved,
            summary.elapsed
        );
        summary
    }

    /// Stops admitting new work; queued and in-flight items still finish
    pub fn shutdown(&self) {
        self.scheduler.stop_admitting();
    }

    fn seed(&self, seeds: &[Url]) -> usize {
        let mut seeded = 0;

        for seed in seeds {
            let url = match normalize_parsed(seed.clone()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", seed, e);
                    continue;
                }
            };

            if !self.pages.try_claim(url.as_str()) {
                tracing::debug!("Duplicate seed skipped: {}", url);
                continue;
            }

            let origin_domain = registrable_domain(&url).unwrap_or_default();
            if self.scheduler.enqueue(WorkItem::Page(CrawlTask {
                url,
                depth: 0,
                origin_domain,
            })) {
                seeded += 1;
            }
        }

        seeded
    }

    async fn worker(self: Arc<Self>, id: usize) {
        tracing::debug!("Worker {} started", id);

        while let Some(item) = self.scheduler.next().await {
            let _completion = Completion(&self.scheduler);
            match item {
                WorkItem::Page(task) => self.process_page(task).await,
                WorkItem::Document(task) => self.process_document(task).await,
            }
        }

        tracing::debug!("Worker {} finished", id);
    }

    /// Processes a single page
    ///
    /// This method:
    /// 1. Fetches the page
    /// 2. Extracts content, metadata and links
    /// 3. Saves the page as Markdown
    /// 4. Hands document links to the dispatcher
    /// 5. Claims and enqueues admitted links one level deeper
    async fn process_page(&self, task: CrawlTask) {
        let mut state = TaskState::Scheduled;
        tracing::debug!("Processing {} (depth {})", task.url, task.depth);

        advance(&mut state, TaskState::Fetching, &task.url);
        let page = match fetch_page(&self.client, &task.url).await {
            Ok(page) => page,
            Err(e) => {
                self.fail_page(&mut state, &task, &e);
                return;
            }
        };

        advance(&mut state, TaskState::Extracting, &task.url);
        let extraction = self.extractor.extract(&page.body, &page.final_url);
        log_degradations(&task, &extraction);

        advance(&mut state, TaskState::Saving, &task.url);
        match self.save_page(&task, &extraction).await {
            Ok(path) => {
                advance(&mut state, TaskState::Done, &task.url);
                tracing::info!("Saved {} to {}", task.url, path.display());
                let processed = self
                    .stats
                    .record_page_saved(task.depth, extraction.is_degraded());
                self.report_progress(processed);
            }
            Err(e) => self.fail_page(&mut state, &task, &e),
        }

        self.follow_links(&task, &page.final_url, extraction);
    }

    async fn save_page(
        &self,
        task: &CrawlTask,
        extraction: &ExtractionResult,
    ) -> Result<std::path::PathBuf, HarvestError> {
        let markdown = render_page(&task.url, extraction);
        let target = generate_filename(&task.url, extraction.metadata.published_on, ".md");

        let storage = Arc::clone(&self.storage);
        let path = tokio::task::spawn_blocking(move || {
            storage.write_text_file(&target.domain, &target.filename, &markdown)
        })
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;

        Ok(path)
    }

    /// Dispatches documents and enqueues admitted links found on a page
    ///
    /// Links are scoped against the site of `base`, the page's final URL. Under
    /// same-domain scoping a page whose final URL left its origin site through
    /// a redirect still has its documents downloaded, but its links are not
    /// followed.
    fn follow_links(&self, task: &CrawlTask, base: &Url, extraction: ExtractionResult) {
        for link in extraction.document_links {
            self.dispatcher.dispatch(&self.scheduler, link.url, &task.url);
        }

        let site = registrable_domain(base).unwrap_or_default();
        if self.scope.same_domain_only && site != task.origin_domain {
            tracing::info!(
                "Not following links on {}: redirected from {} to {}",
                task.url,
                task.origin_domain,
                site
            );
            return;
        }

        for link in &extraction.candidate_links {
            match classify_on_site(&link.href, base, &site, link.origin, &self.scope) {
                Classification::AdmitForCrawl(url) => self.admit(task, url, &site),
                other => {
                    tracing::trace!("Not following {} on {}: {:?}", link.href, task.url, other);
                }
            }
        }
    }

    /// Depth check first, then claim, then enqueue
    ///
    /// `site` is the domain of the page the link was found on and becomes the
    /// child's origin domain.
    fn admit(&self, parent: &CrawlTask, url: Url, site: &str) {
        if parent.depth >= self.options.effective_max_depth() {
            tracing::trace!("Not following {}: depth limit reached", url);
            return;
        }

        if !self.pages.try_claim(url.as_str()) {
            return;
        }

        tracing::debug!("Queued {} (depth {})", url, parent.depth + 1);
        self.scheduler.enqueue(WorkItem::Page(CrawlTask {
            url,
            depth: parent.depth + 1,
            origin_domain: site.to_string(),
        }));
    }

    async fn process_document(&self, task: DocumentTask) {
        match self.dispatcher.download(&task).await {
            DocumentOutcome::Saved(path) => {
                tracing::info!("Saved document {} to {}", task.url, path.display());
                self.stats.record_document_saved();
            }
            DocumentOutcome::Failed(reason) => {
                tracing::warn!(
                    "Failed to download document {} (linked from {}): {}",
                    task.url,
                    task.source_url,
                    reason
                );
                self.stats.record_document_failed();
            }
        }
    }

    fn fail_page(&self, state: &mut TaskState, task: &CrawlTask, reason: &dyn Display) {
        advance(state, TaskState::Failed, &task.url);
        tracing::warn!("Failed {} (depth {}): {}", task.url, task.depth, reason);
        let processed = self.stats.record_page_failed();
        self.report_progress(processed);
    }

    fn report_progress(&self, processed: usize) {
        if processed % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} page(s) processed, {} item(s) pending, {} URL(s) claimed",
                processed,
                self.scheduler.live(),
                self.pages.len()
            );
        }
    }
}

/// Marks a dequeued item finished when dropped, even if processing panicked
struct Completion<'a>(&'a Scheduler);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

fn advance(state: &mut TaskState, next: TaskState, url: &Url) {
    if let Err(e) = state.transition(next) {
        tracing::error!("{} for {}", e, url);
    }
}

fn log_degradations(task: &CrawlTask, extraction: &ExtractionResult) {
    for degradation in &extraction.degraded {
        match degradation {
            Degradation::WholeBody => {
                tracing::warn!(
                    "No content region matched on {} (depth {}), saved whole body",
                    task.url,
                    task.depth
                );
            }
            Degradation::MissingField(field) => {
                tracing::debug!("No {} found on {}", field, task.url);
            }
            Degradation::UnparsedDate => {
                tracing::debug!("Unparsed published date on {}", task.url);
            }
        }
    }
}

/// Runs a complete crawl over `seeds`
///
/// # Arguments
///
/// * `seeds` - Resolved seed URLs; duplicates are dropped
/// * `options` - Run settings
/// * `storage` - Where pages and documents are written
///
/// # Example
///
/// ```no_run
/// use leafcutter::config::Config;
/// use leafcutter::crawler::{run_crawl, CrawlOptions};
/// use leafcutter::storage::FsStorage;
/// use std::sync::Arc;
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = CrawlOptions::from_config(&Config::default(), true);
/// let seeds = vec![Url::parse("https://www.gov.uk/guidance/example")?];
/// let summary = run_crawl(&seeds, options, Arc::new(FsStorage::new("output"))).await?;
/// println!("{} pages saved", summary.pages_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    seeds: &[Url],
    options: CrawlOptions,
    storage: Arc<dyn Storage>,
) -> Result<CrawlSummary, HarvestError> {
    let client = build_http_client(&options.http)?;
    let coordinator = Arc::new(Coordinator::new(options, client, storage)?);
    Ok(coordinator.run(seeds).await)
}
