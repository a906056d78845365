//! Shared types for the salus content core: sanitization policy, block
//! payloads, render configuration, and error types.
//!
//! Everything here is plain data. The transforms that consume these types
//! live in `salus-render`; all I/O beyond reading a config file belongs to
//! the caller.

pub mod blocks;
pub mod config;
pub mod error;
pub mod policy;

pub use crate::blocks::{Block, BlockData, Page, PageDocument};
pub use crate::config::{MarkdownExt, MarkdownOptions, RenderConfig, SanitizerStrategy};
pub use crate::error::ConfigError;
pub use crate::policy::{SanitizePolicy, TagRule};
