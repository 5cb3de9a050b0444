//! Storage traits and error types
//!
//! This module defines the trait interface for page stores and the associated
//! error type.

use crate::state::PageRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Duplicate page record: {0}")]
    Duplicate(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page store implementations
///
/// A page store holds at most one record per URL. Insertion order carries no
/// meaning; consumers that need a stable order sort the snapshot themselves.
/// Implementations are not internally synchronized; the coordinator wraps
/// them in a mutex.
pub trait PageStore {
    /// Inserts a record
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The record was stored
    /// * `Err(StorageError::Duplicate)` - A record for this URL already exists
    fn insert(&mut self, record: PageRecord) -> StorageResult<()>;

    /// Gets the record for a URL
    fn get(&self, url: &str) -> StorageResult<&PageRecord>;

    /// Returns true if a record exists for the URL
    fn contains(&self, url: &str) -> bool;

    /// Number of stored records
    fn len(&self) -> usize;

    /// Returns true if no records are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies all records out, in no particular order
    fn snapshot(&self) -> Vec<PageRecord>;
}
