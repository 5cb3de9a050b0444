//! HTML document renderer

use crate::markup::escape;
use crate::output::assembler::{CombinedDocument, Section, SectionBody};
use crate::output::traits::{OutputHandler, OutputResult};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;max-width:60em;margin:auto;padding:1em}\
section{border-top:1px solid #ccc;margin-top:2em}\
.meta{color:#666;font-style:italic}\
.error{color:#a00}";

/// Renders a combined document as a single self-contained HTML page
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl OutputHandler for HtmlRenderer {
    fn name(&self) -> &'static str {
        "HTML"
    }

    fn render(&self, document: &CombinedDocument) -> OutputResult<String> {
        Ok(format_html_document(document))
    }
}

/// Formats a combined document as HTML
pub fn format_html_document(document: &CombinedDocument) -> String {
    let mut html = String::new();
    let title = escape(&document.meta.title);

    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", title);
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n");

    let _ = writeln!(html, "<h1>{}</h1>", title);

    // Summary
    let summary = &document.summary;
    html.push_str("<h2>Summary</h2>\n<ul>\n");
    let _ = writeln!(
        html,
        "<li>Start URL: <a href=\"{0}\">{0}</a></li>",
        escape(&document.meta.start_url)
    );
    let _ = writeln!(html, "<li>Total pages scraped: {}</li>", summary.page_count);
    let _ = writeln!(html, "<li>Maximum depth: {}</li>", summary.max_depth);
    let _ = writeln!(html, "<li>Failed pages: {}</li>", summary.failed_count);
    let _ = writeln!(
        html,
        "<li>Generated: {}</li>",
        document.meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    html.push_str("</ul>\n");

    // Table of contents
    html.push_str("<h2>Table of Contents</h2>\n<ol>\n");
    for entry in &document.toc {
        let _ = writeln!(
            html,
            "<li><a href=\"#{}\">{}</a> (Depth: {})</li>",
            entry.anchor,
            escape(&entry.title),
            entry.depth
        );
    }
    html.push_str("</ol>\n");

    for section in &document.sections {
        format_section(section, &mut html);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn format_section(section: &Section, html: &mut String) {
    let entry = &section.entry;

    let _ = writeln!(html, "<section id=\"{}\">", entry.anchor);
    let _ = writeln!(html, "<h2>{}. {}</h2>", entry.index, escape(&entry.title));
    let _ = writeln!(
        html,
        "<p class=\"meta\">URL: <a href=\"{0}\">{0}</a><br>Depth: {1}</p>",
        escape(&entry.url),
        entry.depth
    );

    match &section.body {
        SectionBody::Content { markup, .. } => {
            html.push_str("<div class=\"content\">\n");
            html.push_str(markup);
            html.push_str("\n</div>\n");
        }
        SectionBody::FetchFailed { error } => {
            let _ = writeln!(html, "<p class=\"error\">{}</p>", escape(error));
        }
        SectionBody::AssemblyFailed { error } => {
            let _ = writeln!(
                html,
                "<p class=\"error\">[Error displaying content: {}]</p>",
                escape(error)
            );
        }
    }

    html.push_str("</section>\n");
}
