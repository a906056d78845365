//! Library-backed sanitizer: policy pre-filter, then `ammonia`.
//!
//! The pre-filter pass runs before the purifier and owns everything the
//! purifier cannot express: per-policy attribute filtering on the original
//! parse tree and `#`-neutralization of unsafe `href`/`src` values (the
//! purifier would drop the attribute instead). Tag-level removal and
//! unwrapping are left entirely to the purifier's allow-list.
//!
//! An empty policy leaves the purifier's stock allow-list in place.

use std::collections::{HashMap, HashSet};

use ego_tree::NodeRef;
use pulldown_cmark_escape::{escape_html, escape_html_body_text};
use salus_common::policy::{SanitizePolicy, NEUTRALIZED_URL};
use scraper::node::Node;
use scraper::Html;

use super::{fragment_roots, Sanitizer, DROP_WITH_CONTENT, URL_ATTRIBUTES, VOID_ELEMENTS};

pub struct PurifierSanitizer {
    policy: SanitizePolicy,
}

impl PurifierSanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    /// Re-serialize the fragment with attributes filtered per policy and
    /// unsafe URL values rewritten to `#`. Every element is kept; tag
    /// enforcement happens in the purifier afterwards.
    fn filter_attributes(&self, html: &str) -> String {
        let doc = Html::parse_fragment(html);
        if !doc.errors.is_empty() {
            tracing::debug!(count = doc.errors.len(), "suppressed HTML parse errors");
        }
        let mut out = String::new();
        for root in fragment_roots(&doc) {
            self.write_filtered(root, &mut out);
        }
        out
    }

    fn write_filtered(&self, node: NodeRef<'_, Node>, out: &mut String) {
        match node.value() {
            Node::Text(text) => {
                let _ = escape_html_body_text(&mut *out, &text.text);
            }
            Node::Element(element) => {
                let name = element.name();
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
                    self.write_filtered(child, out);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Node::Comment(_) | Node::Doctype(_) | Node::ProcessingInstruction(_) => {}
            Node::Document | Node::Fragment => {
                for child in node.children() {
                    self.write_filtered(child, out);
                }
            }
        }
    }

    fn builder(&self) -> ammonia::Builder<'_> {
        let mut builder = ammonia::Builder::default();
        if !self.policy.is_empty() {
            let tags: HashSet<&str> = self
                .policy
                .tags
                .iter()
                .map(|rule| rule.name.as_str())
                .filter(|tag| !DROP_WITH_CONTENT.contains(tag))
                .collect();
            let tag_attributes: HashMap<&str, HashSet<&str>> = self
                .policy
                .tags
                .iter()
                .map(|rule| {
                    (
                        rule.name.as_str(),
                        rule.attributes.iter().map(String::as_str).collect(),
                    )
                })
                .collect();
            builder.tags(tags);
            builder.tag_attributes(tag_attributes);
            builder.generic_attributes(HashSet::new());
        }
        if !self.policy.schemes.is_empty() {
            builder.url_schemes(self.policy.schemes.iter().map(String::as_str).collect());
        }
        builder.clean_content_tags(DROP_WITH_CONTENT.iter().copied().collect());
        builder.link_rel(None);
        builder.strip_comments(true);
        builder
    }
}

impl Sanitizer for PurifierSanitizer {
    fn sanitize(&self, html: &str) -> String {
        if html.is_empty() {
            return String::new();
        }
        let filtered = self.filter_attributes(html);
        self.builder().clean(&filtered).to_string()
    }
}
