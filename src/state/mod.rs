//! State module for tracking crawl progress
//!
//! This module provides the state types shared by the crawler and the document
//! assembler.
//!
//! # Components
//!
//! - `CrawlState`: Lifecycle of a crawl run (idle, running, completed, stopped, failed)
//! - `PageRecord`: The immutable result of processing one claimed URL

mod crawl_state;
mod page_record;

// Re-export main types
pub use crawl_state::CrawlState;
pub use page_record::{PageContent, PageRecord, DEFAULT_TITLE};
