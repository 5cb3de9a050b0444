//! HTML fragment serialization
//!
//! Content extraction writes a subtree of the parsed page back out as HTML
//! while dropping some elements and rewriting some attributes. This module
//! provides that walk over `scraper`'s node tree.
//!
//! Output is a sanitized subset: script-like elements, comments and inline
//! event handlers are never emitted. Source `id` values (and `a[name]`)
//! are prefixed with `src-`.

use scraper::node::Node;
use scraper::{ElementRef, Selector};

/// Elements that are never written, regardless of options
const ALWAYS_DROPPED: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "embed",
];

/// Elements without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Attributes holding URLs that may be rewritten
const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// Prefix given to source `id` values so they cannot collide with the
/// document's own section anchors
const SOURCE_ID_PREFIX: &str = "src-";

/// Options controlling a fragment walk
#[derive(Default)]
pub struct WriteOptions<'a> {
    /// Elements matching this selector (and their subtrees) are skipped
    pub skip: Option<&'a Selector>,

    /// Called with (element name, attribute name, value) for `href`/`src`
    /// attributes; `Some` replaces the value
    pub rewrite_url: Option<&'a dyn Fn(&str, &str, &str) -> Option<String>>,
}

/// Returns true if the walk should not descend into `element`
fn is_skipped(element: &ElementRef, options: &WriteOptions) -> bool {
    let name = element.value().name();
    if ALWAYS_DROPPED.contains(&name) {
        return true;
    }
    options
        .skip
        .map(|selector| selector.matches(element))
        .unwrap_or(false)
}

/// Writes `element` and its subtree as HTML into `out`
pub fn write_element(element: ElementRef, options: &WriteOptions, out: &mut String) {
    if is_skipped(&element, options) {
        return;
    }

    let name = element.value().name();
    out.push('<');
    out.push_str(name);

    for (attr, value) in element.value().attrs() {
        if attr.starts_with("on") {
            continue;
        }

        let mut value = value.to_string();
        if attr == "id" || (attr == "name" && name == "a") {
            value = format!("{}{}", SOURCE_ID_PREFIX, value);
        }
        if URL_ATTRIBUTES.contains(&attr) {
            if value.trim_start().to_ascii_lowercase().starts_with("javascript:") {
                continue;
            }
            if let Some(rewrite) = options.rewrite_url {
                if let Some(replacement) = rewrite(name, attr, &value) {
                    value = replacement;
                }
            }
        }

        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_into(&value, true, out);
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(element, options, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Writes the children of `element` (but not the element itself) into `out`
pub fn write_children(element: ElementRef, options: &WriteOptions, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => escape_into(text, false, out),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    write_element(child_element, options, out);
                }
            }
            _ => {}
        }
    }
}

/// Collects the visible text of `element`, honoring the same skip rules
///
/// Text nodes are separated by single spaces and runs of whitespace are
/// collapsed.
pub fn collect_text(element: ElementRef, options: &WriteOptions, out: &mut String) {
    if is_skipped(&element, options) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                for word in text.split_whitespace() {
                    if !out.is_empty() && !out.ends_with(' ') {
                        out.push(' ');
                    }
                    out.push_str(word);
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, options, out);
                }
            }
            _ => {}
        }
    }
}

/// Collapses runs of whitespace and trims the result
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes text for inclusion in HTML content or a quoted attribute
pub fn escape_into(text: &str, in_attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Escapes text, returning a new string
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, true, &mut out);
    out
}
