//! Fallback sanitizer: a recursive DOM walk with no third-party purifier.
//!
//! Disallowed elements are unwrapped (children re-parented in place);
//! `script`/`iframe` lose their whole subtree; attributes are filtered per
//! policy; `href`/`src` with unsafe schemes are neutralized to `#`. Text
//! and attribute values are re-escaped on the way out, so output is stable
//! under repeated sanitization.

use ego_tree::NodeRef;
use pulldown_cmark_escape::{escape_html, escape_html_body_text};
use salus_common::policy::{SanitizePolicy, NEUTRALIZED_URL};
use scraper::node::Node;
use scraper::Html;

use super::{fragment_roots, Sanitizer, DROP_WITH_CONTENT, URL_ATTRIBUTES, VOID_ELEMENTS};

pub struct DomSanitizer {
    policy: SanitizePolicy,
}

impl DomSanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    fn write_node(&self, node: NodeRef<'_, Node>, out: &mut String) {
        match node.value() {
            Node::Text(text) => {
                let _ = escape_html_body_text(&mut *out, &text.text);
            }
            Node::Element(element) => {
                let name = element.name();
                if DROP_WITH_CONTENT.contains(&name) {
                    return;
                }
                if !self.policy.allows_tag(name) {
                    // Unwrap: the element goes, its children stay.
                    for child in node.children() {
                        self.write_node(child, out);
                    }
                    return;
                }
                out.push('<');
                out.push_str(name);
                for (attr, value) in element.attrs() {
                    if !self.policy.allows_attribute(name, attr) {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(attr);
                    out.push_str("=\"");
                    if URL_ATTRIBUTES.contains(&attr) && !self.policy.is_safe_url(value) {
                        out.push_str(NEUTRALIZED_URL);
                    } else {
                        let _ = escape_html(&mut *out, value);
                    }
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&name) {
                    return;
                }
                for child in node.children() {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
            Node::Document | Node::Fragment => {
                for child in node.children() {
                    self.write_node(child, out);
                }
            }
        }
    }
}

impl Sanitizer for DomSanitizer {
    fn sanitize(&self, html: &str) -> String {
        if html.is_empty() {
            return String::new();
        }
        let doc = Html::parse_fragment(html);
        if !doc.errors.is_empty() {
            tracing::debug!(count = doc.errors.len(), "suppressed HTML parse errors");
        }
        let mut out = String::new();
        for root in fragment_roots(&doc) {
            self.write_node(root, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn baseline() -> DomSanitizer {
        DomSanitizer::new(SanitizePolicy::baseline())
    }

    #[test]
    fn test_script_removed_with_content() {
        let out = baseline().sanitize("<p>before</p><script>alert(1)</script><p>after</p>");
        assert_eq!(out, "<p>before</p><p>after</p>");
    }

    #[test]
    fn test_iframe_removed_with_content() {
        let out = baseline().sanitize("<iframe src=\"https://evil.example\">x</iframe>ok");
        assert!(!out.contains("iframe"));
        assert!(out.contains("ok"));
    }

    #[test]
    fn test_event_handlers_dropped() {
        let out = baseline().sanitize("<a href=\"/x\" onclick=\"alert(1)\" ONERROR=\"y\">go</a>");
        assert_eq!(out, "<a href=\"/x\">go</a>");
    }

    #[test]
    fn test_javascript_href_neutralized() {
        let out = baseline().sanitize("<a href=\"javascript:alert(1)\">x</a>");
        assert_eq!(out, "<a href=\"#\">x</a>");
    }

    #[test]
    fn test_data_src_neutralized() {
        let out = baseline().sanitize("<img src=\" data:text/html,pwn\">");
        assert_eq!(out, "<img src=\"#\">");
    }

    #[test]
    fn test_disallowed_element_unwrapped() {
        let out = baseline().sanitize("<center><p>kept</p></center>");
        assert_eq!(out, "<p>kept</p>");
    }

    #[test]
    fn test_disallowed_attribute_stripped_tag_kept() {
        let out = baseline().sanitize("<p class=\"x\" data-track=\"y\">text</p>");
        assert_eq!(out, "<p>text</p>");
    }

    #[test]
    fn test_malformed_input_best_effort() {
        let out = baseline().sanitize("<p>unclosed <strong>nested");
        assert!(out.contains("unclosed"));
        assert!(out.contains("nested"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(baseline().sanitize(""), "");
    }

    #[test]
    fn test_text_reescaped() {
        let out = baseline().sanitize("a &amp; b &lt;c&gt;");
        assert_eq!(out, "a &amp; b &lt;c&gt;");
    }

    #[test]
    fn test_idempotent() {
        let sanitizer = baseline();
        let input = "<div class=\"x\"><a href=\"javascript:x\" onclick=\"y\">link</a>\
                     <script>bad()</script><span>ok &amp; fine</span></div>";
        let once = sanitizer.sanitize(input);
        let twice = sanitizer.sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_policy_keeps_unknown_tags() {
        let sanitizer = DomSanitizer::new(SanitizePolicy::unrestricted());
        let out = sanitizer.sanitize("<marquee onstart=\"x\">hi</marquee><script>no</script>");
        assert_eq!(out, "<marquee>hi</marquee>");
    }

    #[test]
    fn test_multiple_top_level_nodes() {
        let out = baseline().sanitize("one<p>two</p>three");
        assert_eq!(out, "one<p>two</p>three");
    }
}
