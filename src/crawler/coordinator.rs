//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of the
//! crawling process, including:
//! - Validating configuration and seeding the frontier
//! - Running a bounded pool of worker tasks over the frontier
//! - Claiming, fetching, parsing and storing each page
//! - Enqueueing child links one level deeper
//! - Observing cancellation and reporting progress

use crate::config::{validate, Config};
use crate::crawler::cancel::{CancelHandle, CancelSignal};
use crate::crawler::events::{CrawlEvent, EventBus};
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::parser::parse_html;
use crate::crawler::visited::VisitedSet;
use crate::state::{CrawlState, PageRecord};
use crate::storage::{MemoryStorage, PageStore};
use crate::url::{normalize_url, LinkFilter};
use crate::FolioError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use url::Url;

/// Summary of a finished crawl run
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    /// Terminal state of the run
    pub state: CrawlState,
    /// Records stored (successful and placeholder)
    pub pages_processed: usize,
    /// Placeholder records among them
    pub pages_failed: usize,
    /// Unique URLs ever enqueued, including the start URL
    pub urls_discovered: usize,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// State shared by every worker task
struct WorkerContext {
    max_depth: u32,
    filter: LinkFilter,
    fetcher: Fetcher,
    frontier: Arc<Frontier>,
    visited: VisitedSet,
    storage: Arc<Mutex<MemoryStorage>>,
    known: Mutex<HashSet<String>>,
    processed: AtomicUsize,
    failed: AtomicUsize,
    events: EventBus,
}

impl WorkerContext {
    fn known(&self) -> MutexGuard<'_, HashSet<String>> {
        self.known.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn storage(&self) -> MutexGuard<'_, MemoryStorage> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    start_url: Url,
    state: CrawlState,
    context: Arc<WorkerContext>,
    cancel: CancelHandle,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Validates the configuration, builds the HTTP client and seeds the
    /// frontier with the start URL at depth 0. Any error here is fatal and
    /// the crawl never starts.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, in the `Idle` state
    /// * `Err(FolioError)` - Invalid configuration or client setup failure
    pub fn new(config: Config) -> Result<Self, FolioError> {
        validate(&config)?;

        let start_url = normalize_url(&config.crawler.start_url)?;
        let filter = LinkFilter::new(start_url.clone(), config.crawler.same_domain_only);

        let events = EventBus::new();
        let client = build_http_client(&config.fetcher)?;
        let mut fetcher = Fetcher::new(&config.crawler, &config.fetcher, client, events.clone())?;
        if config.crawler.same_domain_only {
            fetcher = fetcher.with_host_scope(start_url.clone());
        }

        let frontier = Arc::new(Frontier::new());
        frontier.push(FrontierEntry::new(start_url.clone(), 0));

        let mut known = HashSet::new();
        known.insert(start_url.as_str().to_string());

        let context = Arc::new(WorkerContext {
            max_depth: config.crawler.max_depth,
            filter,
            fetcher,
            frontier,
            visited: VisitedSet::new(),
            storage: Arc::new(Mutex::new(MemoryStorage::new())),
            known: Mutex::new(known),
            processed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            events,
        });

        Ok(Self {
            config: Arc::new(config),
            start_url,
            state: CrawlState::Idle,
            context,
            cancel: CancelHandle::new(),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Normalized start URL
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle that stops the crawl when cancelled
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Subscribes to crawl events; subscribe before `run` to see them all
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.context.events.subscribe()
    }

    /// Copies the page store as it currently stands
    pub fn storage(&self) -> MemoryStorage {
        self.context.storage().clone()
    }

    fn transition(&mut self, to: CrawlState) -> Result<(), FolioError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(FolioError::InvalidTransition { from, to });
        }
        self.state = to;
        self.context
            .events
            .emit(CrawlEvent::StateChanged { from, to });
        Ok(())
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// Spawns `concurrency` workers that share the frontier. The run ends
    /// `Completed` when the frontier is empty with nothing in flight,
    /// `Stopped` when cancellation was requested, and `Failed` if a worker
    /// task aborted. Records gathered before a stop or failure are kept.
    pub async fn run(&mut self) -> Result<CrawlReport, FolioError> {
        let started = Instant::now();

        if self.cancel.is_cancelled() {
            self.context.frontier.drain();
            self.transition(CrawlState::Stopped)?;
            return Ok(self.report(started.elapsed()));
        }

        self.transition(CrawlState::Running)?;
        tracing::info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            self.start_url,
            self.config.crawler.max_depth,
            self.config.crawler.concurrency
        );

        let mut handles = Vec::new();
        for worker_id in 0..self.config.crawler.concurrency {
            let context = Arc::clone(&self.context);
            let signal = self.cancel.signal();
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, context, signal).await;
            }));
        }

        let mut worker_failed = false;
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
                worker_failed = true;
            }
        }

        let final_state = if worker_failed {
            CrawlState::Failed
        } else if self.cancel.is_cancelled() {
            CrawlState::Stopped
        } else {
            CrawlState::Completed
        };

        if final_state != CrawlState::Completed {
            let dropped = self.context.frontier.drain();
            if dropped > 0 {
                tracing::info!("Dropped {} queued URLs without fetching", dropped);
            }
        }

        self.transition(final_state)?;

        let report = self.report(started.elapsed());
        tracing::info!(
            "Crawl {}: {} pages ({} failed) in {:?}",
            report.state,
            report.pages_processed,
            report.pages_failed,
            report.elapsed
        );

        Ok(report)
    }

    fn report(&self, elapsed: Duration) -> CrawlReport {
        CrawlReport {
            state: self.state,
            pages_processed: self.context.processed.load(Ordering::SeqCst),
            pages_failed: self.context.failed.load(Ordering::SeqCst),
            urls_discovered: self.context.known().len(),
            elapsed,
        }
    }
}

/// One worker: pull, process, repeat until the frontier reports done
async fn worker_loop(worker_id: u32, context: Arc<WorkerContext>, cancel: CancelSignal) {
    tracing::debug!("Worker {} started", worker_id);

    while let Some((entry, _in_flight)) = context.frontier.next(&cancel).await {
        process_entry(&context, entry, &cancel).await;
    }

    tracing::debug!("Worker {} finished", worker_id);
}

/// Processes a single frontier entry
///
/// This function:
/// 1. Drops entries deeper than `max_depth`
/// 2. Stops dispatching once cancellation is observed
/// 3. Claims the URL in the visited set (drops it if already claimed)
/// 4. Fetches, parses and stores the page, or stores a placeholder
/// 5. Enqueues eligible child links at `depth + 1`
async fn process_entry(context: &WorkerContext, entry: FrontierEntry, cancel: &CancelSignal) {
    let url_str = entry.url.as_str().to_string();

    if entry.depth > context.max_depth {
        tracing::debug!("Skipping {}: depth {} exceeds limit", url_str, entry.depth);
        return;
    }

    if cancel.is_cancelled() {
        return;
    }

    if !context.visited.try_claim(&url_str) {
        tracing::debug!("Skipping {}: already claimed", url_str);
        return;
    }

    context.events.emit(CrawlEvent::PageStarted {
        url: url_str.clone(),
        depth: entry.depth,
    });

    let record = match context.fetcher.fetch(&entry.url, cancel).await {
        FetchOutcome::Fetched(raw) => {
            match parse_html(&raw.body, &raw.final_url, &context.filter) {
                Ok(parsed) => {
                    enqueue_children(context, &url_str, entry.depth, &parsed.links);
                    PageRecord::fetched(
                        url_str.clone(),
                        entry.depth,
                        parsed.title,
                        parsed.content,
                        raw.status_code,
                    )
                }
                Err(e) => PageRecord::placeholder(
                    url_str.clone(),
                    entry.depth,
                    format!("Parse error: {}", e),
                )
                .with_status(Some(raw.status_code)),
            }
        }
        FetchOutcome::Failed(failure) => {
            PageRecord::placeholder(url_str.clone(), entry.depth, failure.to_string())
                .with_status(failure.status_code)
        }
    };

    let error = record.fetch_error.clone();
    if let Err(e) = context.storage().insert(record) {
        tracing::warn!("Failed to store {}: {}", url_str, e);
        return;
    }

    if error.is_some() {
        context.failed.fetch_add(1, Ordering::SeqCst);
    }
    let processed = context.processed.fetch_add(1, Ordering::SeqCst) + 1;
    let total_known = context.known().len();

    context.events.emit(CrawlEvent::PageCompleted {
        url: url_str,
        depth: entry.depth,
        error,
    });
    context.events.emit(CrawlEvent::Progress {
        processed,
        total_known,
    });
}

/// Pushes child links one level deeper, if that level is within bounds
fn enqueue_children(context: &WorkerContext, url: &str, depth: u32, links: &[Url]) {
    let child_depth = depth + 1;

    let enqueued = if child_depth > context.max_depth {
        0
    } else {
        let children: Vec<FrontierEntry> = {
            let mut known = context.known();
            links
                .iter()
                // Already-claimed links would be dropped at claim time anyway
                .filter(|link| !context.visited.contains(link.as_str()))
                .inspect(|link| {
                    known.insert(link.as_str().to_string());
                })
                .map(|link| FrontierEntry::new(link.clone(), child_depth))
                .collect()
        };
        let count = children.len();
        context.frontier.push_all(children);
        count
    };

    context.events.emit(CrawlEvent::LinksDiscovered {
        url: url.to_string(),
        found: links.len(),
        enqueued,
    });
}

/// Runs a complete crawl and returns the report with the collected pages
///
/// # Example
///
/// ```no_run
/// use sumi_folio::config::Config;
/// use sumi_folio::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.crawler.start_url = "https://example.com/".to_string();
/// let (report, pages) = run_crawl(config).await?;
/// println!("{} pages, state {}", report.pages_processed, report.state);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<(CrawlReport, MemoryStorage), FolioError> {
    let mut coordinator = Coordinator::new(config)?;
    let report = coordinator.run().await?;
    Ok((report, coordinator.storage()))
}
