//! Source retrieval error types.

use std::path::PathBuf;

/// Errors retrieving or parsing one piece of remote or local input.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Local file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Neither direction yielded any stop
    #[error("no stops found in either direction")]
    NoStops,

    /// Client settings were rejected
    #[error("not configured: {0}")]
    NotConfigured(String),
}
