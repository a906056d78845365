//! Full-page assembly from stored blocks.
//!
//! Output is deterministic: the same page, blocks, and configuration
//! produce byte-identical HTML, so an external layer can cache on input
//! identity. Blocks render in position order; rendering never mutates the
//! stored block data.

use pulldown_cmark_escape::escape_html;
use salus_common::blocks::{Block, BlockData, Page};
use salus_common::config::MarkdownOptions;
use salus_common::policy::{has_blocked_scheme, NEUTRALIZED_URL};

use crate::markdown;
use crate::sanitize::Sanitizer;

/// Everything block rendering needs, borrowed from the caller for the
/// duration of one render.
pub struct PageRenderContext<'a> {
    pub markdown: MarkdownOptions,
    pub sanitizer: &'a dyn Sanitizer,
}

impl<'a> PageRenderContext<'a> {
    pub fn new(markdown: MarkdownOptions, sanitizer: &'a dyn Sanitizer) -> Self {
        Self {
            markdown,
            sanitizer,
        }
    }
}

/// Assemble the full HTML document for a page.
pub fn render_page(page: &Page, blocks: &[Block], ctx: &PageRenderContext<'_>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    if let Some(description) = &page.description {
        html.push_str("<meta name=\"description\" content=\"");
        let _ = escape_html(&mut html, description);
        html.push_str("\">\n");
    }
    html.push_str("<title>");
    let _ = escape_html(&mut html, &page.title);
    html.push_str("</title>\n</head>\n<body>\n<header><h1>");
    let _ = escape_html(&mut html, &page.title);
    html.push_str("</h1></header>\n<main class=\"page-blocks\">\n");

    let mut ordered: Vec<&Block> = blocks.iter().collect();
    ordered.sort_by_key(|block| block.position);
    for block in ordered {
        html.push_str(&render_block(block, ctx));
    }

    html.push_str("</main>\n<footer><p>Published with salus</p></footer>\n</body>\n</html>\n");
    html
}

/// Render one block to its HTML fragment.
pub fn render_block(block: &Block, ctx: &PageRenderContext<'_>) -> String {
    let mut html = String::new();

    match &block.data {
        BlockData::Text { text } => {
            let converted = markdown::to_html(text, &ctx.markdown);
            let safe = ctx.sanitizer.sanitize(&converted);
            html.push_str("<div class=\"block block-text\">");
            html.push_str(&safe);
            html.push_str("</div>\n");
        }
        BlockData::Html { html: raw } => {
            // Raw blocks are written only by the privileged authoring path;
            // they embed verbatim, structural wrapper only.
            html.push_str("<div class=\"block block-html\">");
            html.push_str(raw);
            html.push_str("</div>\n");
        }
        BlockData::Image { src, alt, caption } => {
            html.push_str("<figure class=\"block block-image\"><img src=\"");
            if has_blocked_scheme(src) {
                html.push_str(NEUTRALIZED_URL);
            } else {
                let _ = escape_html(&mut html, src);
            }
            html.push('"');
            if !alt.is_empty() {
                html.push_str(" alt=\"");
                let _ = escape_html(&mut html, alt);
                html.push('"');
            }
            html.push_str(" />");
            if let Some(caption) = caption {
                html.push_str("<figcaption>");
                let _ = escape_html(&mut html, caption);
                html.push_str("</figcaption>");
            }
            html.push_str("</figure>\n");
        }
        BlockData::Unknown(_) => {
            tracing::warn!(kind = %block.data.kind(), "skipping unknown block kind");
            html.push_str("<div class=\"block block-unknown\"><!-- unsupported block --></div>\n");
        }
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::DomSanitizer;
    use pretty_assertions::assert_eq;
    use salus_common::policy::SanitizePolicy;

    fn page() -> Page {
        Page {
            title: "Cardiology department".to_owned(),
            description: None,
        }
    }

    fn text_block(text: &str, position: i64) -> Block {
        Block::new(
            BlockData::Text {
                text: text.to_owned(),
            },
            position,
        )
    }

    #[test]
    fn test_blocks_render_in_position_order() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::baseline());
        let ctx = PageRenderContext::new(MarkdownOptions::default(), &sanitizer);
        let blocks = vec![
            text_block("third", 30),
            text_block("first", 10),
            text_block("second", 20),
        ];
        let html = render_page(&page(), &blocks, &ctx);
        let first = html.find("first").unwrap();
        let second = html.find("second").unwrap();
        let third = html.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_text_block_converted_and_wrapped() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::baseline());
        let ctx = PageRenderContext::new(MarkdownOptions::default(), &sanitizer);
        let html = render_block(&text_block("**Visiting hours** are posted", 1), &ctx);
        assert_eq!(
            html,
            "<div class=\"block block-text\"><p><strong>Visiting hours</strong> are posted</p>\n</div>\n"
        );
    }

    #[test]
    fn test_html_block_embedded_verbatim() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::baseline());
        let ctx = PageRenderContext::new(MarkdownOptions::default(), &sanitizer);
        let block = Block::new(
            BlockData::Html {
                html: "<appointment-widget clinic=\"cardio\"></appointment-widget>".to_owned(),
            },
            1,
        );
        let html = render_block(&block, &ctx);
        assert!(html.contains("<appointment-widget clinic=\"cardio\">"));
    }

    #[test]
    fn test_image_block_unsafe_src_neutralized() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::baseline());
        let ctx = PageRenderContext::new(MarkdownOptions::default(), &sanitizer);
        let block = Block::new(
            BlockData::Image {
                src: "javascript:alert(1)".to_owned(),
                alt: "x".to_owned(),
                caption: None,
            },
            1,
        );
        let html = render_block(&block, &ctx);
        assert!(html.contains("src=\"#\""));
        assert!(!html.contains("javascript"));
    }

    #[test]
    fn test_unknown_block_placeholder() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::baseline());
        let ctx = PageRenderContext::new(MarkdownOptions::default(), &sanitizer);
        let block: Block =
            serde_json::from_str(r#"{"type": "poll", "question": "?", "position": 1}"#).unwrap();
        let html = render_block(&block, &ctx);
        assert!(html.contains("block-unknown"));
        assert!(!html.contains("poll"));
    }

    #[test]
    fn test_title_escaped() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::baseline());
        let ctx = PageRenderContext::new(MarkdownOptions::default(), &sanitizer);
        let page = Page {
            title: "A&E <waiting> times".to_owned(),
            description: None,
        };
        let html = render_page(&page, &[], &ctx);
        assert!(html.contains("<title>A&amp;E &lt;waiting&gt; times</title>"));
        assert!(html.contains("<h1>A&amp;E &lt;waiting&gt; times</h1>"));
    }

    #[test]
    fn test_deterministic_output() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::baseline());
        let ctx = PageRenderContext::new(MarkdownOptions::default(), &sanitizer);
        let blocks = vec![
            text_block("# Heading\n\nbody", 1),
            Block::new(
                BlockData::Html {
                    html: "<div>static</div>".to_owned(),
                },
                2,
            ),
        ];
        let first = render_page(&page(), &blocks, &ctx);
        let second = render_page(&page(), &blocks, &ctx);
        assert_eq!(first, second);
    }
}
