//! Render configuration, loaded once per process and passed by reference.
//!
//! There is deliberately no global or lazily-initialized configuration:
//! callers construct a [`RenderConfig`] (or load one from a JSON file) and
//! hand it to the render layer. The config value is read-only after load
//! and safe to share across concurrent renders.

use std::path::Path;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::SanitizePolicy;

/// Which sanitizer implementation to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizerStrategy {
    /// Library-backed purifier with a policy pre-filter pass.
    #[default]
    Purifier,
    /// DOM-walking fallback with no third-party purifier.
    Dom,
}

bitflags! {
    /// Markdown syntax extensions enabled for the converter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MarkdownExt: u32 {
        const TABLES = 1 << 0;
        const STRIKETHROUGH = 1 << 1;
        const FOOTNOTES = 1 << 2;
        const TASK_LISTS = 1 << 3;
        const SMART_PUNCTUATION = 1 << 4;
    }
}

impl Default for MarkdownExt {
    fn default() -> Self {
        Self::TABLES | Self::STRIKETHROUGH | Self::FOOTNOTES | Self::TASK_LISTS
    }
}

impl MarkdownExt {
    /// Map config names to flags; unknown names are skipped with a warning.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut ext = MarkdownExt::empty();
        for name in names {
            match name.as_ref() {
                "tables" => ext |= Self::TABLES,
                "strikethrough" => ext |= Self::STRIKETHROUGH,
                "footnotes" => ext |= Self::FOOTNOTES,
                "task-lists" => ext |= Self::TASK_LISTS,
                "smart-punctuation" => ext |= Self::SMART_PUNCTUATION,
                other => tracing::warn!(extension = %other, "unknown markdown extension"),
            }
        }
        ext
    }
}

/// Ceiling on nested block structure during markdown parsing. Content below
/// the ceiling renders normally; anything deeper is truncated.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Runtime options handed to the markdown converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub extensions: MarkdownExt,
    pub max_depth: usize,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            extensions: MarkdownExt::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Markdown settings as they appear in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownSettings {
    pub extensions: Vec<String>,
    pub max_depth: usize,
}

impl Default for MarkdownSettings {
    fn default() -> Self {
        Self {
            extensions: vec![
                "tables".to_owned(),
                "strikethrough".to_owned(),
                "footnotes".to_owned(),
                "task-lists".to_owned(),
            ],
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Process-wide render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub sanitizer: SanitizerStrategy,
    pub policy: SanitizePolicy,
    pub markdown: MarkdownSettings,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sanitizer: SanitizerStrategy::default(),
            policy: SanitizePolicy::baseline(),
            markdown: MarkdownSettings::default(),
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file. Fields left out of the file
    /// keep their defaults; the policy is normalized after load.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: RenderConfig = serde_json::from_str(&raw)?;
        config.policy = config.policy.normalized();
        Ok(config)
    }

    /// Resolve the file-level markdown settings into converter options.
    pub fn markdown_options(&self) -> MarkdownOptions {
        MarkdownOptions {
            extensions: MarkdownExt::from_names(&self.markdown.extensions),
            max_depth: self.markdown.max_depth.max(1),
        }
    }
}
