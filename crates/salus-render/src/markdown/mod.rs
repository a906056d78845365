//! Bidirectional markdown <-> HTML conversion for stored blocks.
//!
//! `to_html` is the storage/display path: markdown in, safe HTML out. Raw
//! HTML embedded in the markdown is escaped rather than interpreted, unsafe
//! link targets are rendered inert, and nesting depth is bounded. These
//! rules are not configurable.
//!
//! `to_markdown` is the best-effort lossy inverse used for round-trip
//! editing of legacy HTML content.

use pulldown_cmark::{Options, Parser};
use salus_common::config::{MarkdownExt, MarkdownOptions};

mod html_writer;
mod to_markdown;

/// Convert authoring markdown to HTML for storage or display.
pub fn to_html(markdown: &str, options: &MarkdownOptions) -> String {
    let mut parser_options = Options::empty();
    if options.extensions.contains(MarkdownExt::TABLES) {
        parser_options.insert(Options::ENABLE_TABLES);
    }
    if options.extensions.contains(MarkdownExt::STRIKETHROUGH) {
        parser_options.insert(Options::ENABLE_STRIKETHROUGH);
    }
    if options.extensions.contains(MarkdownExt::FOOTNOTES) {
        parser_options.insert(Options::ENABLE_FOOTNOTES);
    }
    if options.extensions.contains(MarkdownExt::TASK_LISTS) {
        parser_options.insert(Options::ENABLE_TASKLISTS);
    }
    if options.extensions.contains(MarkdownExt::SMART_PUNCTUATION) {
        parser_options.insert(Options::ENABLE_SMART_PUNCTUATION);
    }

    let parser = Parser::new_ext(markdown, parser_options);
    let mut html = String::new();
    html_writer::push_html(&mut html, parser, options.max_depth);
    html
}

/// Convert stored HTML back to markdown for editing.
pub fn to_markdown(html: &str) -> String {
    to_markdown::convert(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn defaults() -> MarkdownOptions {
        MarkdownOptions::default()
    }

    #[test]
    fn test_emphasis() {
        let html = to_html("**bold** and *italic*", &defaults());
        assert_eq!(html, "<p><strong>bold</strong> and <em>italic</em></p>\n");
    }

    #[test]
    fn test_heading_and_link() {
        let html = to_html("# Visiting hours\n\n[map](https://example.com/map)", &defaults());
        assert!(html.contains("<h1>Visiting hours</h1>"));
        assert!(html.contains("<a href=\"https://example.com/map\">map</a>"));
    }

    #[test]
    fn test_javascript_link_inert() {
        let html = to_html("[x](javascript:alert(1))", &defaults());
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));
    }

    #[test]
    fn test_data_image_inert() {
        let html = to_html("![x](data:text/html,pwn)", &defaults());
        assert!(!html.contains("data:"));
        assert!(html.contains("src=\"#\""));
    }

    #[test]
    fn test_raw_html_escaped() {
        let html = to_html("before <script>alert(1)</script> after", &defaults());
        assert!(!html.contains("<script"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_raw_html_block_escaped() {
        let html = to_html("<div onclick=\"x\">block</div>\n\ntext", &defaults());
        assert!(!html.contains("<div"));
        assert!(html.contains("&lt;div"));
    }

    #[test]
    fn test_strikethrough_extension() {
        let html = to_html("~~gone~~", &defaults());
        assert_eq!(html, "<p><del>gone</del></p>\n");
    }

    #[test]
    fn test_depth_ceiling_truncates() {
        // 14 levels of blockquote nesting against a ceiling of 10.
        let mut markdown = String::new();
        for level in 1..=14 {
            markdown.push_str(&"> ".repeat(level));
            markdown.push_str("deep\n");
        }
        let options = MarkdownOptions {
            max_depth: 10,
            ..defaults()
        };
        let html = to_html(&markdown, &options);
        let opened = html.matches("<blockquote>").count();
        assert!(opened <= 10, "nesting not truncated: {opened} levels");
        assert_eq!(opened, html.matches("</blockquote>").count());
    }

    #[test]
    fn test_depth_ceiling_output_balanced() {
        let markdown = "- a\n  - b\n    - c\n      - d\n        - e\n";
        let options = MarkdownOptions {
            max_depth: 4,
            ..defaults()
        };
        let html = to_html(markdown, &options);
        assert_eq!(html.matches("<ul>").count(), html.matches("</ul>").count());
        assert_eq!(html.matches("<li>").count(), html.matches("</li>").count());
    }

    #[test]
    fn test_images_do_not_consume_depth() {
        let markdown = "![a](/1.png) ![b](/2.png) ![c](/3.png)\n\n**still bold**";
        let options = MarkdownOptions {
            max_depth: 3,
            ..defaults()
        };
        let html = to_html(markdown, &options);
        assert!(html.contains("<strong>still bold</strong>"));
    }

    #[test]
    fn test_to_markdown_minimum_contract() {
        let markdown = to_markdown("<p>first</p><p>second<br>third</p>");
        assert_eq!(markdown, "first\n\nsecond\nthird");
    }

    #[test]
    fn test_to_markdown_emphasis() {
        let markdown = to_markdown("<p><strong>b</strong> and <em>i</em> and <b>B</b> and <i>I</i></p>");
        assert_eq!(markdown, "**b** and _i_ and **B** and _I_");
    }

    #[test]
    fn test_to_markdown_strips_unknown_tags() {
        let markdown = to_markdown("<section><p>kept <span>inline</span></p></section>");
        assert_eq!(markdown, "kept inline");
    }

    #[test]
    fn test_to_markdown_collapses_blank_lines() {
        let markdown = to_markdown("<p>a</p><p></p><p></p><p>b</p>");
        assert_eq!(markdown, "a\n\nb");
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let source = "# Discharge notes\n\n**Take medication** with food.\n\n[contact](https://clinic.example/contact)";
        let back = to_markdown(&to_html(source, &defaults()));
        assert!(back.contains("# Discharge notes"));
        assert!(back.contains("**Take medication**"));
        assert!(back.contains("[contact](https://clinic.example/contact)"));
    }
}
