//! Errors that abort a run.

use std::path::PathBuf;

use crate::catalog::CatalogError;
use crate::fetch::CheckpointError;
use crate::geometry::GeometryError;
use crate::registry::RegistryError;
use crate::source::FetchError;

/// A failure the pipeline cannot continue past.
///
/// Per-record and per-line problems never surface here; they are counted
/// and logged where they happen.
#[derive(Debug, thiserror::Error)]
pub enum FusionError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] FetchError),

    #[error("geometry source unavailable: {0}")]
    GeometrySource(#[source] FetchError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("stop registry unavailable: {0}")]
    RegistrySource(#[source] FetchError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("no line page could be fetched")]
    NoLines,

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}
