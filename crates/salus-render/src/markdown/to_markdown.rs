//! HTML -> markdown, the lossy inverse used for round-trip editing.
//!
//! Paragraph boundaries, explicit line breaks, emphasis, headings, links,
//! lists, blockquotes, and code survive; everything else is stripped to its
//! text content. Consecutive blank lines collapse to at most one.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

use crate::sanitize::fragment_roots;

pub(crate) fn convert(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let doc = Html::parse_fragment(html);
    let mut out = String::new();
    for root in fragment_roots(&doc) {
        write_block(root, &mut out);
    }
    collapse_blank_lines(&out)
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn write_block(node: NodeRef<'_, Node>, out: &mut String) {
    let element = match node.value() {
        Node::Element(element) => element,
        Node::Text(text) => {
            out.push_str(&text.text);
            return;
        }
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_block(child, out);
            }
            return;
        }
        _ => return,
    };

    let name = element.name();
    if let Some(level) = heading_level(name) {
        let text = inline_text(node);
        if !text.is_empty() {
            ensure_block_start(out);
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(&text);
            out.push_str("\n\n");
        }
        return;
    }
    match name {
        "p" => {
            let text = inline_text(node);
            if !text.is_empty() {
                ensure_block_start(out);
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }
        "br" => out.push('\n'),
        "hr" => out.push_str("---\n\n"),
        "blockquote" => {
            ensure_block_start(out);
            let text = inline_text(node);
            for line in text.lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        "ul" | "ol" => {
            ensure_block_start(out);
            for item in node.children() {
                if let Node::Element(child) = item.value() {
                    if child.name() == "li" {
                        let text = inline_text(item);
                        if !text.is_empty() {
                            out.push_str("- ");
                            out.push_str(&text);
                            out.push('\n');
                        }
                    }
                }
            }
            out.push('\n');
        }
        "pre" => {
            ensure_block_start(out);
            let lang = code_language(node).unwrap_or_default();
            out.push_str("```");
            out.push_str(&lang);
            out.push('\n');
            let code = text_contents(node);
            out.push_str(&code);
            if !code.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n\n");
        }
        // Block containers without a markdown shape of their own.
        "div" | "section" | "article" | "main" | "header" | "footer" | "aside" | "figure"
        | "table" | "tbody" | "thead" | "tr" => {
            for child in node.children() {
                write_block(child, out);
            }
        }
        // Inline content appearing at block level.
        _ => append_inline(node, out),
    }
}

fn append_inline(node: NodeRef<'_, Node>, out: &mut String) {
    let element = match node.value() {
        Node::Element(element) => element,
        Node::Text(text) => {
            out.push_str(&text.text);
            return;
        }
        _ => return,
    };

    match element.name() {
        "br" => out.push('\n'),
        "strong" | "b" => wrap_inline(node, out, "**", "**"),
        "em" | "i" => wrap_inline(node, out, "_", "_"),
        "code" => wrap_inline(node, out, "`", "`"),
        "a" => {
            let label = collect_inline(node);
            let href = element.attr("href").unwrap_or_default();
            if href.is_empty() {
                out.push_str(&label);
            } else {
                out.push('[');
                out.push_str(&label);
                out.push_str("](");
                out.push_str(href);
                out.push(')');
            }
        }
        "img" => {
            out.push_str("![");
            out.push_str(element.attr("alt").unwrap_or_default());
            out.push_str("](");
            out.push_str(element.attr("src").unwrap_or_default());
            out.push(')');
        }
        _ => {
            for child in node.children() {
                append_inline(child, out);
            }
        }
    }
}

fn wrap_inline(node: NodeRef<'_, Node>, out: &mut String, prefix: &str, suffix: &str) {
    let inner = collect_inline(node);
    if inner.is_empty() {
        return;
    }
    out.push_str(prefix);
    out.push_str(&inner);
    out.push_str(suffix);
}

fn collect_inline(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    for child in node.children() {
        append_inline(child, &mut out);
    }
    out
}

fn inline_text(node: NodeRef<'_, Node>) -> String {
    collect_inline(node).trim().to_owned()
}

fn text_contents(node: NodeRef<'_, Node>) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    if let Node::Text(text) = node.value() {
        out.push_str(&text.text);
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

/// Block output starts on its own line.
fn ensure_block_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Fence language from `<pre><code class="language-x">`.
fn code_language(pre: NodeRef<'_, Node>) -> Option<String> {
    for child in pre.children() {
        if let Node::Element(element) = child.value() {
            if element.name() == "code" {
                return element
                    .attr("class")
                    .and_then(|class| class.split_whitespace().next())
                    .and_then(|class| class.strip_prefix("language-"))
                    .map(str::to_owned);
            }
        }
    }
    None
}

/// Collapse runs of blank lines to a single blank line and trim the edges.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(line.trim_end());
    }
    out
}
