//! HTML parser for extracting links, title and main content
//!
//! This module handles parsing fetched HTML to extract:
//! - The page title (defaulting to a placeholder)
//! - Outbound links that pass the link filter
//! - The main content region, as sanitized markup and plain text

use crate::markup::{clean_text, collect_text, write_children, write_element, WriteOptions};
use crate::state::{PageContent, DEFAULT_TITLE};
use crate::url::LinkFilter;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Semantic containers tried, in document order, for the main content
const CONTENT_SELECTORS: &str = "main, article, .content, #content, .post, .section, .doc";

/// Navigation and boilerplate stripped when falling back to the whole body
const BOILERPLATE_SELECTORS: &str =
    "script, style, noscript, header, footer, nav, aside, .sidebar";

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title>), or the placeholder title
    pub title: String,

    /// Eligible outbound links, normalized, de-duplicated, in document order
    pub links: Vec<Url>,

    /// Main content of the page
    pub content: PageContent,
}

/// Parses HTML content and extracts title, links and main content
///
/// # Link Extraction Rules
///
/// - Every `<a href="...">` is resolved against `page_url`
/// - `<a ... download>` anchors are skipped
/// - The resolved URL must pass `filter` (scheme, extension, host rules)
/// - Duplicates are dropped, first occurrence wins
///
/// # Content Extraction Rules
///
/// The outermost matches of `main, article, .content, #content, .post,
/// .section, .doc` are concatenated in document order. When none match, the
/// `<body>` is used with navigation and boilerplate elements removed. Relative
/// `href`/`src` values in the content are made absolute so the markup stays
/// valid outside its page.
///
/// # Example
///
/// ```
/// use sumi_folio::crawler::parse_html;
/// use sumi_folio::url::LinkFilter;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let filter = LinkFilter::new(base_url.clone(), true);
/// let parsed = parse_html(html, &base_url, &filter).unwrap();
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, page_url: &Url, filter: &LinkFilter) -> Result<ParsedPage, String> {
    let document = Html::parse_document(html);

    let title = extract_title(&document)?;
    let links = extract_links(&document, page_url, filter)?;
    let content = extract_content(&document, page_url)?;

    Ok(ParsedPage {
        title,
        links,
        content,
    })
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{}': {:?}", css, e))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Result<String, String> {
    let title_selector = selector("title")?;

    Ok(document
        .select(&title_selector)
        .next()
        .map(|element| clean_text(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string()))
}

/// Extracts all eligible links from the HTML document
fn extract_links(document: &Html, page_url: &Url, filter: &LinkFilter) -> Result<Vec<Url>, String> {
    let a_selector = selector("a[href]")?;
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(url) = filter.resolve(href, page_url) {
            if seen.insert(url.as_str().to_string()) {
                links.push(url);
            }
        }
    }

    Ok(links)
}

/// Extracts the main content region as markup and text
fn extract_content(document: &Html, page_url: &Url) -> Result<PageContent, String> {
    let content_selector = selector(CONTENT_SELECTORS)?;
    let boilerplate_selector = selector(BOILERPLATE_SELECTORS)?;

    let absolutize = |_: &str, _: &str, value: &str| -> Option<String> {
        page_url.join(value.trim()).ok().map(|url| url.to_string())
    };

    let containers = outermost_matches(document, &content_selector);

    let mut markup = String::new();
    let mut text = String::new();

    if !containers.is_empty() {
        let options = WriteOptions {
            skip: None,
            rewrite_url: Some(&absolutize),
        };
        for container in containers {
            write_element(container, &options, &mut markup);
            collect_text(container, &options, &mut text);
        }
    } else {
        let body_selector = selector("body")?;
        let options = WriteOptions {
            skip: Some(&boilerplate_selector),
            rewrite_url: Some(&absolutize),
        };
        if let Some(body) = document.select(&body_selector).next() {
            write_children(body, &options, &mut markup);
            collect_text(body, &options, &mut text);
        }
    }

    Ok(PageContent {
        markup,
        text: clean_text(&text),
    })
}

/// Returns matches of `selector` that are not nested inside another match
fn outermost_matches<'a>(document: &'a Html, selector: &Selector) -> Vec<ElementRef<'a>> {
    let mut taken = HashSet::new();
    let mut result = Vec::new();

    // select() yields in document order, so ancestors are seen first
    for element in document.select(selector) {
        if element.ancestors().any(|ancestor| taken.contains(&ancestor.id())) {
            continue;
        }
        taken.insert(element.id());
        result.push(element);
    }

    result
}
