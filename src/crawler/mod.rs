//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with politeness delays, retries and backoff
//! - HTML parsing, main-content extraction and link discovery
//! - The shared frontier and visited set
//! - Overall crawl coordination and cancellation

mod backoff;
mod cancel;
mod coordinator;
mod events;
mod fetcher;
mod frontier;
mod parser;
mod visited;

pub use backoff::ExponentialBackoff;
pub use cancel::{CancelHandle, CancelSignal};
pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use events::{CrawlEvent, EventBus};
pub use fetcher::{build_http_client, FailureKind, FetchFailure, FetchOutcome, Fetcher, RawPage};
pub use frontier::{Frontier, FrontierEntry, InFlight};
pub use parser::{parse_html, ParsedPage};
pub use visited::VisitedSet;
