//! salus-render: the content-safety core of the CMS.
//!
//! Four pure, synchronous transforms over in-memory strings:
//!
//! - [`sanitize`]: HTML sanitization behind one [`sanitize::Sanitizer`]
//!   trait with two interchangeable strategies (library-backed purifier and
//!   a DOM-walking fallback).
//! - [`markdown`]: bidirectional markdown <-> HTML conversion used for
//!   block storage and round-trip editing.
//! - [`inline`]: a restricted single-pass inline formatter for live-preview
//!   editing of single fields.
//! - [`page`]: assembly of a full page document from stored blocks.
//!
//! Nothing here touches the network or the filesystem, and nothing holds
//! mutable state: once a [`salus_common::RenderConfig`] is loaded, all
//! entry points may be called concurrently.

pub mod inline;
pub mod markdown;
pub mod page;
pub mod sanitize;

pub use crate::inline::{render_inline, InlineHost, PolicyHost};
pub use crate::markdown::{to_html, to_markdown};
pub use crate::page::{render_page, PageRenderContext};
pub use crate::sanitize::{sanitizer_from_config, DomSanitizer, Sanitizer};
