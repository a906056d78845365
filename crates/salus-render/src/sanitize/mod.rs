//! HTML sanitization behind one trait, two strategies.
//!
//! [`PurifierSanitizer`] runs a policy pre-filter and then a third-party
//! purifier; [`DomSanitizer`] is a self-contained DOM walk. Both honor the
//! same unconditional blocklist and must stay semantically equivalent on
//! the shared corpus in `tests/sanitize_corpus.rs`.
//!
//! The strategy is chosen once at startup from [`RenderConfig`]; there is
//! no runtime capability probing.

use ego_tree::NodeRef;
use salus_common::config::{RenderConfig, SanitizerStrategy};
use scraper::node::Node;
use scraper::Html;

mod dom;
#[cfg(feature = "purifier")]
mod purifier;

pub use dom::DomSanitizer;
#[cfg(feature = "purifier")]
pub use purifier::PurifierSanitizer;

/// Elements removed together with their subtree, regardless of policy.
pub const DROP_WITH_CONTENT: &[&str] = &["script", "iframe"];

/// Attributes whose values are URLs and subject to scheme checks.
pub const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// Elements serialized without a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// A sanitizer takes untrusted HTML and returns HTML with unsafe constructs
/// removed. Implementations are pure and shareable across threads.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Construct the configured sanitizer. Selecting the purifier strategy in a
/// build without the `purifier` feature falls back to the DOM walk.
pub fn sanitizer_from_config(config: &RenderConfig) -> Box<dyn Sanitizer> {
    match config.sanitizer {
        SanitizerStrategy::Purifier => {
            #[cfg(feature = "purifier")]
            {
                Box::new(PurifierSanitizer::new(config.policy.clone()))
            }
            #[cfg(not(feature = "purifier"))]
            {
                tracing::warn!(
                    "purifier strategy requested but compiled out; using the DOM fallback"
                );
                Box::new(DomSanitizer::new(config.policy.clone()))
            }
        }
        SanitizerStrategy::Dom => Box::new(DomSanitizer::new(config.policy.clone())),
    }
}

/// The top-level nodes of a parsed fragment, with the synthetic `<html>`
/// wrapper element that fragment parsing introduces peeled away.
pub(crate) fn fragment_roots<'a>(doc: &'a Html) -> Vec<NodeRef<'a, Node>> {
    let mut roots = Vec::new();
    for child in doc.tree.root().children() {
        match child.value() {
            Node::Element(element) if element.name() == "html" => roots.extend(child.children()),
            _ => roots.push(child),
        }
    }
    roots
}
