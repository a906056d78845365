//! Error types for the salus content core.
//!
//! The transforms themselves are best-effort and infallible; errors only
//! arise at the edges, loading configuration or page documents.

use std::path::PathBuf;

use miette::Diagnostic;

/// Failure to load or parse a configuration or page document file.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(salus::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    #[diagnostic(
        code(salus::config::parse),
        help("the file must be a JSON object; see RenderConfig for the accepted fields")
    )]
    Parse(#[from] serde_json::Error),
}
