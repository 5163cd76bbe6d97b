//! Input retrieval.
//!
//! Everything the pipeline reads comes either from a local file or over
//! HTTP. Page scraping goes through the [`PageSource`] trait so the fetcher
//! can be driven by canned pages in tests.

mod error;
mod http;

use std::future::Future;
use std::path::Path;

pub use error::FetchError;
pub use http::{DEFAULT_USER_AGENT, HttpSource, HttpSourceConfig};

/// Something that can turn a URL into page text.
pub trait PageSource {
    /// Retrieve the text at `url`.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>>;
}

/// Whether a configured location is a URL rather than a file path.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read a location as bytes, downloading it if it is a URL.
pub async fn load_bytes(http: &HttpSource, location: &str) -> Result<Vec<u8>, FetchError> {
    if is_remote(location) {
        return http.get_bytes(location).await;
    }

    tokio::fs::read(location).await.map_err(|source| FetchError::Io {
        path: Path::new(location).to_path_buf(),
        source,
    })
}

/// Read a location as text, downloading it if it is a URL.
pub async fn load_text(http: &HttpSource, location: &str) -> Result<String, FetchError> {
    if is_remote(location) {
        return http.fetch(location).await;
    }

    tokio::fs::read_to_string(location)
        .await
        .map_err(|source| FetchError::Io {
            path: Path::new(location).to_path_buf(),
            source,
        })
}
