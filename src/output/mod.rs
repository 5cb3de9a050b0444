//! Output module for assembling and writing the combined document
//!
//! This module handles:
//! - Ordering collected pages and assigning anchors
//! - Rewriting inter-page links to those anchors
//! - Rendering the document as HTML or Markdown and writing it out

mod assembler;
mod html;
mod markdown;
mod traits;

pub use assembler::{
    assemble, build_anchor_map, order_pages, rewrite_links, AnchorMap, CombinedDocument,
    DocumentMeta, DocumentSummary, Section, SectionBody, TocEntry,
};
pub use html::{format_html_document, HtmlRenderer};
pub use markdown::{format_markdown_document, markup_to_markdown, MarkdownRenderer};
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Returns the renderer for an output format
pub fn renderer_for(format: OutputFormat) -> Box<dyn OutputHandler> {
    match format {
        OutputFormat::Html => Box::new(HtmlRenderer::new()),
        OutputFormat::Markdown => Box::new(MarkdownRenderer::new()),
    }
}

/// Writes the document to the configured path in the configured format
///
/// # Arguments
///
/// * `document` - The assembled document
/// * `config` - Output configuration (path and optional explicit format)
///
/// # Returns
///
/// * `Ok(())` - Document written
/// * `Err(OutputError)` - Failed to create or write the file
pub fn write_document(document: &CombinedDocument, config: &OutputConfig) -> OutputResult<()> {
    if config.path.trim().is_empty() {
        return Err(OutputError::Write("output path is empty".to_string()));
    }

    renderer_for(config.effective_format()).write_to(document, Path::new(&config.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_write_document_infers_format() {
        let dir = tempfile::tempdir().unwrap();
        let document = assemble(
            &MemoryStorage::new(),
            DocumentMeta::new("https://s.test/", 2),
        );

        let md_path = dir.path().join("out.md");
        let config = OutputConfig {
            path: md_path.to_string_lossy().into_owned(),
            ..OutputConfig::default()
        };
        write_document(&document, &config).unwrap();
        let written = std::fs::read_to_string(&md_path).unwrap();
        assert!(written.starts_with("# Scraped Data from https://s.test/"));

        let html_path = dir.path().join("out.txt");
        let config = OutputConfig {
            path: html_path.to_string_lossy().into_owned(),
            format: Some(OutputFormat::Html),
            title: None,
        };
        write_document(&document, &config).unwrap();
        let written = std::fs::read_to_string(&html_path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_write_document_empty_path() {
        let document = assemble(&MemoryStorage::new(), DocumentMeta::new("https://s.test/", 0));
        let config = OutputConfig {
            path: "  ".to_string(),
            ..OutputConfig::default()
        };
        assert!(matches!(
            write_document(&document, &config),
            Err(OutputError::Write(_))
        ));
    }
}
