//! Storage module for completed page records
//!
//! Crawl state lives only for the duration of one run, so the store is held in
//! memory. The `PageStore` trait is what the document assembler reads from.

mod memory;
mod traits;

pub use memory::MemoryStorage;
pub use traits::{PageStore, StorageError, StorageResult};
