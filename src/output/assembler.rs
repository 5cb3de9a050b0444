//! Document assembly
//!
//! Turns the unordered page store into one ordered, cross-referenced
//! document. Pages are ordered by (depth, URL), each gets a stable anchor,
//! and links between collected pages are rewritten to point at those
//! anchors. Assembly never fails as a whole: a page whose content cannot be
//! carried into the output gets a placeholder section instead.

use crate::output::traits::{OutputError, OutputResult};
use crate::state::PageRecord;
use crate::storage::PageStore;
use crate::url::normalize_parsed;
use chrono::{DateTime, Utc};
use lol_html::{element, rewrite_str, RewriteStrSettings};
use std::collections::HashMap;
use url::Url;

/// Normalized page URL to anchor identifier
pub type AnchorMap = HashMap<String, String>;

/// Document-level metadata shown in the title block
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMeta {
    pub title: String,
    pub start_url: String,
    pub max_depth: u32,
    pub generated_at: DateTime<Utc>,
}

impl DocumentMeta {
    /// Creates metadata with the default title and the current time
    pub fn new(start_url: impl Into<String>, max_depth: u32) -> Self {
        let start_url = start_url.into();
        Self {
            title: format!("Scraped Data from {}", start_url),
            start_url,
            max_depth,
            generated_at: Utc::now(),
        }
    }

    /// Overrides the title when one is given
    pub fn with_title(mut self, title: Option<String>) -> Self {
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            self.title = title;
        }
        self
    }
}

/// One table-of-contents line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// 1-based position in document order
    pub index: usize,
    pub title: String,
    pub depth: u32,
    pub anchor: String,
    pub url: String,
}

/// What a section shows under its heading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    /// Page content with internal links already rewritten
    Content { markup: String, text: String },
    /// The page could not be fetched or parsed
    FetchFailed { error: String },
    /// The page was fetched but its content could not be assembled
    AssemblyFailed { error: String },
}

/// A page's section in the combined document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub entry: TocEntry,
    pub body: SectionBody,
}

/// Counts shown in the document's summary block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSummary {
    pub page_count: usize,
    pub failed_count: usize,
    pub max_depth: u32,
}

/// The assembled document, independent of output format
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedDocument {
    pub meta: DocumentMeta,
    pub summary: DocumentSummary,
    pub toc: Vec<TocEntry>,
    pub sections: Vec<Section>,
}

/// Sorts pages by depth, then URL
pub fn order_pages(mut pages: Vec<PageRecord>) -> Vec<PageRecord> {
    pages.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));
    pages
}

/// Assigns `page-1`, `page-2`, ... to already ordered pages
pub fn build_anchor_map(ordered: &[PageRecord]) -> AnchorMap {
    ordered
        .iter()
        .enumerate()
        .map(|(i, page)| (page.url.clone(), anchor_id(i + 1)))
        .collect()
}

fn anchor_id(index: usize) -> String {
    format!("page-{}", index)
}

/// Looks up the anchor for a link target
///
/// The target is resolved against `page_url` and normalized the same way
/// page URLs were, so `/b/`, `b#top` and `https://HOST/b` all find page `/b`.
fn anchor_for<'a>(href: &str, page_url: Option<&Url>, anchors: &'a AnchorMap) -> Option<&'a str> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = match page_url {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    let normalized = normalize_parsed(resolved).ok()?;

    anchors.get(normalized.as_str()).map(String::as_str)
}

/// Rejects characters that have no representation in the output formats
fn check_representable(content: &str) -> OutputResult<()> {
    match content
        .chars()
        .find(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        Some(c) => Err(OutputError::Format(format!(
            "content contains unrepresentable character U+{:04X}",
            c as u32
        ))),
        None => Ok(()),
    }
}

/// Rewrites `a[href]` targets that are collected pages to `#anchor`
///
/// Links to pages outside the document are left exactly as they were, and
/// so is everything else in the markup.
pub fn rewrite_links(markup: &str, page_url: &str, anchors: &AnchorMap) -> OutputResult<String> {
    check_representable(markup)?;

    let base = Url::parse(page_url).ok();

    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href") {
                    // Stored markup escapes `&` inside attribute values
                    let href = href.replace("&amp;", "&");
                    if let Some(anchor) = anchor_for(&href, base.as_ref(), anchors) {
                        el.set_attribute("href", &format!("#{}", anchor))?;
                    }
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| OutputError::Format(format!("link rewrite failed: {}", e)))
}

fn build_section(page: &PageRecord, entry: TocEntry, anchors: &AnchorMap) -> Section {
    if let Some(error) = &page.fetch_error {
        return Section {
            entry,
            body: SectionBody::FetchFailed {
                error: error.clone(),
            },
        };
    }

    let body = check_representable(&page.content.text)
        .and_then(|_| rewrite_links(&page.content.markup, &page.url, anchors))
        .map(|markup| SectionBody::Content {
            markup,
            text: page.content.text.clone(),
        })
        .unwrap_or_else(|e| {
            tracing::warn!("Could not assemble section for {}: {}", page.url, e);
            SectionBody::AssemblyFailed {
                error: e.to_string(),
            }
        });

    Section { entry, body }
}

/// Assembles every stored page into one document
///
/// The result depends only on the stored records and `meta`: the same
/// records always produce the same document regardless of crawl order.
pub fn assemble(store: &dyn PageStore, meta: DocumentMeta) -> CombinedDocument {
    let ordered = order_pages(store.snapshot());
    let anchors = build_anchor_map(&ordered);

    let toc: Vec<TocEntry> = ordered
        .iter()
        .enumerate()
        .map(|(i, page)| TocEntry {
            index: i + 1,
            title: page.title.clone(),
            depth: page.depth,
            anchor: anchor_id(i + 1),
            url: page.url.clone(),
        })
        .collect();

    let sections: Vec<Section> = ordered
        .iter()
        .zip(toc.iter().cloned())
        .map(|(page, entry)| build_section(page, entry, &anchors))
        .collect();

    let summary = DocumentSummary {
        page_count: ordered.len(),
        failed_count: ordered.iter().filter(|p| p.is_placeholder()).count(),
        max_depth: meta.max_depth,
    };

    tracing::debug!(
        "Assembled {} sections ({} failed)",
        summary.page_count,
        summary.failed_count
    );

    CombinedDocument {
        meta,
        summary,
        toc,
        sections,
    }
}
