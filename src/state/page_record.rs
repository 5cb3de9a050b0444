//! Completed page records
//!
//! A `PageRecord` is created exactly once for every URL the coordinator claims,
//! whether the fetch succeeded or not. Records are never mutated afterwards.

use chrono::{DateTime, Utc};

/// Title used when a document does not declare one
pub const DEFAULT_TITLE: &str = "No Title";

/// Extracted main content of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    /// Serialized HTML of the main content region
    pub markup: String,

    /// Plain text of the same region, whitespace collapsed
    pub text: String,
}

/// A single completed page, successful or placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Normalized URL of the page
    pub url: String,

    /// Document title, or an error-flagged title for placeholders
    pub title: String,

    /// Extracted content (empty for placeholders)
    pub content: PageContent,

    /// Distance from the start URL
    pub depth: u32,

    /// Error text when the page could not be fetched or parsed
    pub fetch_error: Option<String>,

    /// HTTP status of the final response, when one was received
    pub status_code: Option<u16>,

    /// When the record was created
    pub fetched_at: DateTime<Utc>,
}

impl PageRecord {
    /// Creates a record for a successfully fetched and parsed page
    pub fn fetched(
        url: impl Into<String>,
        depth: u32,
        title: impl Into<String>,
        content: PageContent,
        status_code: u16,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content,
            depth,
            fetch_error: None,
            status_code: Some(status_code),
            fetched_at: Utc::now(),
        }
    }

    /// Creates a placeholder record for a page that failed
    pub fn placeholder(url: impl Into<String>, depth: u32, error: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            title: format!("Error: {}", url),
            url,
            content: PageContent::default(),
            depth,
            fetch_error: Some(error.into()),
            status_code: None,
            fetched_at: Utc::now(),
        }
    }

    /// Attaches the HTTP status that accompanied a failure
    pub fn with_status(mut self, status_code: Option<u16>) -> Self {
        self.status_code = status_code;
        self
    }

    /// Returns true if this record stands in for a failed page
    pub fn is_placeholder(&self) -> bool {
        self.fetch_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetched_record() {
        let content = PageContent {
            markup: "<p>Hello</p>".to_string(),
            text: "Hello".to_string(),
        };
        let record = PageRecord::fetched("https://example.com/", 0, "Home", content.clone(), 200);

        assert_eq!(record.title, "Home");
        assert_eq!(record.content, content);
        assert_eq!(record.status_code, Some(200));
        assert!(!record.is_placeholder());
    }

    #[test]
    fn test_placeholder_record() {
        let record = PageRecord::placeholder("https://example.com/x", 2, "HTTP 500")
            .with_status(Some(500));

        assert_eq!(record.title, "Error: https://example.com/x");
        assert_eq!(record.depth, 2);
        assert_eq!(record.fetch_error.as_deref(), Some("HTTP 500"));
        assert_eq!(record.status_code, Some(500));
        assert!(record.content.markup.is_empty());
        assert!(record.is_placeholder());
    }
}
