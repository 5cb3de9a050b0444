//! Visited set: the single point that guarantees at-most-one fetch per URL

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// URLs already claimed for fetching during this run
///
/// Membership only grows. Workers claim a URL right before dispatching it, so
/// when the same link is discovered by several pages only the first claim
/// wins.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims `url` for fetching
    ///
    /// Returns `true` exactly once per URL; every later call for the same URL
    /// returns `false`. Check and insert happen under one lock.
    pub fn try_claim(&self, url: &str) -> bool {
        self.lock().insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_claim_once() {
        let visited = VisitedSet::new();
        assert!(visited.try_claim("https://ex.test/a"));
        assert!(!visited.try_claim("https://ex.test/a"));
        assert!(!visited.try_claim("https://ex.test/a"));
        assert!(visited.try_claim("https://ex.test/b"));
        assert_eq!(visited.len(), 2);
        assert!(visited.contains("https://ex.test/a"));
    }

    #[tokio::test]
    async fn test_concurrent_claims_are_exclusive() {
        let visited = Arc::new(VisitedSet::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let visited = Arc::clone(&visited);
            handles.push(tokio::spawn(async move {
                (0..50)
                    .filter(|i| visited.try_claim(&format!("https://ex.test/{}", i)))
                    .count()
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, 50);
        assert_eq!(visited.len(), 50);
    }
}
