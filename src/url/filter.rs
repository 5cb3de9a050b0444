use crate::url::domain::same_host;
use crate::url::normalize::normalize_parsed;
use url::Url;

/// Path suffixes that never lead to an HTML document
const NON_DOCUMENT_EXTENSIONS: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "tif", "tiff",
    // Archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar",
    // Audio
    "mp3", "wav", "ogg", "flac", "aac", "m4a",
    // Video
    "mp4", "avi", "mov", "mkv", "webm", "wmv", "flv",
    // Binary documents and executables
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "exe", "dmg", "iso", "apk",
];

/// Pseudo-schemes that cannot be fetched
const NON_FETCHABLE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Decides which discovered links are eligible for the frontier
///
/// The filter carries the start URL so that same-host restriction can be
/// applied; it holds no mutable state and can be shared freely.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    start_url: Url,
    same_domain_only: bool,
}

impl LinkFilter {
    /// Creates a filter anchored at the crawl's start URL
    pub fn new(start_url: Url, same_domain_only: bool) -> Self {
        Self {
            start_url,
            same_domain_only,
        }
    }

    /// Returns the start URL this filter compares hosts against
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// Resolves `candidate` against `base`, normalizes it, and applies the
    /// eligibility rules
    ///
    /// # Returns
    ///
    /// * `Some(Url)` - Normalized absolute URL that may be enqueued
    /// * `None` - The link is rejected
    pub fn resolve(&self, candidate: &str, base: &Url) -> Option<Url> {
        let candidate = candidate.trim();

        if candidate.is_empty() {
            return None;
        }

        let lower = candidate.to_ascii_lowercase();
        if NON_FETCHABLE_SCHEMES
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            return None;
        }

        let absolute = base.join(candidate).ok()?;
        let normalized = normalize_parsed(absolute).ok()?;

        if has_non_document_extension(&normalized) {
            return None;
        }

        if self.same_domain_only && !same_host(&normalized, &self.start_url) {
            return None;
        }

        Some(normalized)
    }
}

/// Returns true if `candidate`, resolved against `base`, may be enqueued
///
/// Rejects empty or unparseable links, non-fetchable schemes, links to binary
/// resources, and (when `same_domain_only` is set) links off the start host.
///
/// # Example
///
/// ```
/// use sumi_folio::url::{is_eligible, LinkFilter};
/// use url::Url;
///
/// let start = Url::parse("https://ex.test/a").unwrap();
/// let filter = LinkFilter::new(start.clone(), true);
///
/// assert!(is_eligible("/b", &start, &filter));
/// assert!(!is_eligible("https://other.test/c", &start, &filter));
/// assert!(!is_eligible("logo.PNG", &start, &filter));
/// ```
pub fn is_eligible(candidate: &str, base: &Url, filter: &LinkFilter) -> bool {
    filter.resolve(candidate, base).is_some()
}

/// Checks the last path segment's extension, case-insensitively
fn has_non_document_extension(url: &Url) -> bool {
    let last_segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match last_segment.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            NON_DOCUMENT_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}
