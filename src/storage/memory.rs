//! In-memory page store

use crate::state::PageRecord;
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use std::collections::HashMap;

/// Page store backed by a hash map keyed on normalized URL
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    pages: HashMap<String, PageRecord>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored placeholder records
    pub fn failed_count(&self) -> usize {
        self.pages.values().filter(|p| p.is_placeholder()).count()
    }
}

impl PageStore for MemoryStorage {
    fn insert(&mut self, record: PageRecord) -> StorageResult<()> {
        if self.pages.contains_key(&record.url) {
            return Err(StorageError::Duplicate(record.url));
        }
        self.pages.insert(record.url.clone(), record);
        Ok(())
    }

    fn get(&self, url: &str) -> StorageResult<&PageRecord> {
        self.pages
            .get(url)
            .ok_or_else(|| StorageError::PageNotFound(url.to_string()))
    }

    fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    fn len(&self) -> usize {
        self.pages.len()
    }

    fn snapshot(&self) -> Vec<PageRecord> {
        self.pages.values().cloned().collect()
    }
}

impl FromIterator<PageRecord> for MemoryStorage {
    /// Builds a store, keeping the first record seen for each URL
    fn from_iter<I: IntoIterator<Item = PageRecord>>(iter: I) -> Self {
        let mut storage = Self::new();
        for record in iter {
            let _ = storage.insert(record);
        }
        storage
    }
}
