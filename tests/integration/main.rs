//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from the start URL to the written
//! document.

mod crawl_tests;
mod document_tests;

use sumi_folio::config::Config;
use wiremock::ResponseTemplate;

/// Creates a test configuration with all delays disabled
pub fn create_test_config(start_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.start_url = start_url.to_string();
    config.crawler.max_depth = 2;
    config.crawler.retry_count = 0;
    config.crawler.concurrency = 2;
    config.fetcher.politeness_min_ms = 0;
    config.fetcher.politeness_max_ms = 0;
    config.fetcher.backoff_base_ms = 0;
    config.fetcher.backoff_max_ms = 0;
    config.fetcher.timeout_secs = 5;
    config
}

/// An HTML response with the given body
pub fn html_page(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

/// A minimal HTML document with a title and some body markup
pub fn document(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><main>{}</main></body></html>",
        title, body
    )
}
