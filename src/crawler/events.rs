//! Crawl events
//!
//! The coordinator and fetcher publish typed events on a broadcast channel.
//! Any number of observers (a CLI progress line, a GUI progress bar, a test)
//! can subscribe; nothing in the crawl depends on whether anyone listens.
//! Every event is also written to the `tracing` log.

use crate::state::CrawlState;
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 1024;

/// Something observable that happened during a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// The run moved between lifecycle states
    StateChanged { from: CrawlState, to: CrawlState },

    /// A claimed URL was dispatched to the fetcher
    PageStarted { url: String, depth: u32 },

    /// A transient failure will be retried after `delay`
    RetryScheduled {
        url: String,
        attempt: u32,
        max_attempts: u32,
        error: String,
        delay: Duration,
    },

    /// Links were extracted from a fetched page
    LinksDiscovered {
        url: String,
        found: usize,
        enqueued: usize,
    },

    /// A page record was stored
    PageCompleted {
        url: String,
        depth: u32,
        error: Option<String>,
    },

    /// Pages processed so far versus unique URLs known
    Progress { processed: usize, total_known: usize },
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateChanged { from, to } => write!(f, "Crawl state: {} -> {}", from, to),
            Self::PageStarted { url, depth } => write!(f, "Crawling: {} (depth {})", url, depth),
            Self::RetryScheduled {
                url,
                attempt,
                max_attempts,
                error,
                delay,
            } => write!(
                f,
                "Attempt {}/{} failed for {}: {} (retrying in {:.1}s)",
                attempt,
                max_attempts,
                url,
                error,
                delay.as_secs_f64()
            ),
            Self::LinksDiscovered {
                url,
                found,
                enqueued,
            } => write!(f, "Found {} links on {} ({} new)", found, url, enqueued),
            Self::PageCompleted { url, error, .. } => match error {
                Some(error) => write!(f, "Failed: {} ({})", url, error),
                None => write!(f, "Completed: {}", url),
            },
            Self::Progress {
                processed,
                total_known,
            } => write!(f, "Progress: {}/{} pages", processed, total_known),
        }
    }
}

/// Publisher side of the event channel
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CrawlEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribes a new observer; it sees events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.tx.subscribe()
    }

    /// Logs and publishes an event
    pub fn emit(&self, event: CrawlEvent) {
        match &event {
            CrawlEvent::RetryScheduled { .. } => tracing::warn!("{}", event),
            CrawlEvent::PageCompleted { error: Some(_), .. } => tracing::warn!("{}", event),
            CrawlEvent::LinksDiscovered { .. } | CrawlEvent::Progress { .. } => {
                tracing::debug!("{}", event)
            }
            _ => tracing::info!("{}", event),
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
