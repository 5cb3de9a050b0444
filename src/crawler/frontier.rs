//! Breadth-first crawl frontier
//!
//! A FIFO queue of `(url, depth)` entries shared by all workers. Entries come
//! out in the order they went in, which gives level-order traversal: every
//! depth-d entry is pushed before any depth-(d+1) child of it. The frontier
//! does no de-duplication; that is the visited set's job at claim time.
//!
//! Besides the queue, the frontier counts entries that have been handed out
//! and not yet finished, so an idle worker can tell "empty for now" (another
//! worker may still push children) from "crawl finished".

use crate::crawler::cancel::CancelSignal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use url::Url;

/// A URL waiting to be fetched, with its distance from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<FrontierEntry>,
    in_flight: usize,
}

/// Shared FIFO work queue
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    notify: Notify,
}

/// Marks an entry handed out by [`Frontier::next`] as in progress until dropped
#[derive(Debug)]
pub struct InFlight {
    frontier: Arc<Frontier>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // Critical sections never panic midway, so a poisoned lock is still consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends an entry to the back of the queue
    pub fn push(&self, entry: FrontierEntry) {
        self.lock().queue.push_back(entry);
        self.notify.notify_waiters();
    }

    /// Appends several entries, keeping their relative order
    pub fn push_all(&self, entries: impl IntoIterator<Item = FrontierEntry>) {
        let pushed = {
            let mut inner = self.lock();
            let before = inner.queue.len();
            inner.queue.extend(entries);
            inner.queue.len() - before
        };
        if pushed > 0 {
            self.notify.notify_waiters();
        }
    }

    /// Removes the front entry, if any, without tracking it as in flight
    pub fn pop(&self) -> Option<FrontierEntry> {
        self.lock().queue.pop_front()
    }

    /// Waits for the next entry to process
    ///
    /// # Returns
    ///
    /// * `Some((entry, guard))` - Work to do; the entry counts as in flight
    ///   until `guard` is dropped
    /// * `None` - The queue is empty and nothing is in flight, or the run
    ///   was cancelled
    pub async fn next(self: &Arc<Self>, cancel: &CancelSignal) -> Option<(FrontierEntry, InFlight)> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            // Registered before inspecting the queue so a push between the
            // check and the await still wakes us
            let notified = self.notify.notified();

            {
                let mut inner = self.lock();
                if let Some(entry) = inner.queue.pop_front() {
                    inner.in_flight += 1;
                    let guard = InFlight {
                        frontier: Arc::clone(self),
                    };
                    return Some((entry, guard));
                }
                if inner.in_flight == 0 {
                    return None;
                }
            }

            tokio::select! {
                _ = notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Records that one handed-out entry has finished
    fn complete(&self) {
        {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Empties the queue without processing it, returning how many entries
    /// were dropped
    pub fn drain(&self) -> usize {
        let drained = {
            let mut inner = self.lock();
            let count = inner.queue.len();
            inner.queue.clear();
            count
        };
        self.notify.notify_waiters();
        drained
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    /// Number of entries handed out and not yet finished
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }
}
