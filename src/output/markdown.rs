//! Markdown document renderer
//!
//! Section content is converted from the sanitized markup, so links that the
//! assembler rewrote to `#page-N` keep working. Every section is preceded by
//! an HTML anchor tag that those links target.

use crate::output::assembler::{CombinedDocument, Section, SectionBody};
use crate::output::traits::{OutputHandler, OutputResult};
use std::fmt::Write;

/// Renders a combined document as Markdown
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl OutputHandler for MarkdownRenderer {
    fn name(&self) -> &'static str {
        "Markdown"
    }

    fn render(&self, document: &CombinedDocument) -> OutputResult<String> {
        Ok(format_markdown_document(document))
    }
}

/// Formats a combined document as markdown
///
/// # Arguments
///
/// * `document` - The assembled document
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_document(document: &CombinedDocument) -> String {
    let mut md = String::new();

    // Title
    let _ = writeln!(md, "# {}\n", escape_inline(&document.meta.title));

    // Summary
    let summary = &document.summary;
    md.push_str("## Summary\n\n");
    let _ = writeln!(md, "- **Start URL**: <{}>", document.meta.start_url);
    let _ = writeln!(md, "- **Total pages scraped**: {}", summary.page_count);
    let _ = writeln!(md, "- **Maximum depth**: {}", summary.max_depth);
    let _ = writeln!(md, "- **Failed pages**: {}", summary.failed_count);
    let _ = writeln!(
        md,
        "- **Generated**: {}\n",
        document.meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    // Table of contents
    md.push_str("## Table of Contents\n\n");
    for entry in &document.toc {
        let _ = writeln!(
            md,
            "{}. [{}](#{}) (Depth: {})",
            entry.index,
            escape_inline(&entry.title),
            entry.anchor,
            entry.depth
        );
    }
    md.push('\n');

    for section in &document.sections {
        format_section(section, &mut md);
    }

    md
}

fn format_section(section: &Section, md: &mut String) {
    let entry = &section.entry;

    md.push_str("---\n\n");
    let _ = writeln!(md, "<a id=\"{}\"></a>\n", entry.anchor);
    let _ = writeln!(md, "## {}. {}\n", entry.index, escape_inline(&entry.title));
    let _ = writeln!(md, "*URL: <{}>*  ", entry.url);
    let _ = writeln!(md, "*Depth: {}*\n", entry.depth);

    match &section.body {
        SectionBody::Content { markup, text } => {
            let converted = markup_to_markdown(markup);
            if converted.is_empty() {
                md.push_str(&escape_inline(text));
            } else {
                md.push_str(&converted);
            }
            md.push_str("\n\n");
        }
        SectionBody::FetchFailed { error } => {
            let _ = writeln!(md, "> **Error:** {}\n", escape_inline(error));
        }
        SectionBody::AssemblyFailed { error } => {
            let _ = writeln!(
                md,
                "> [Error displaying content: {}]\n",
                escape_inline(error)
            );
        }
    }
}

/// Escapes characters that Markdown would otherwise interpret inline
fn escape_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Converts sanitized HTML markup to Markdown
///
/// Returns an empty string when the markup cannot be converted, so the
/// caller falls back to the plain text.
pub fn markup_to_markdown(markup: &str) -> String {
    match htmd::convert(markup) {
        Ok(md) => md.trim().to_string(),
        Err(e) => {
            tracing::warn!("Markdown conversion failed: {}", e);
            String::new()
        }
    }
}
