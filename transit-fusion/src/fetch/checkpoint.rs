//! On-disk checkpoint of partially fetched lines.
//!
//! Written every few successful fetches so a crash loses at most that many
//! pages of work. The file is removed once the run completes; if it is still
//! there at startup, the previous run ended abnormally.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::FetchedLine;

/// Checkpoint file contents.
#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    /// Unix timestamp when the checkpoint was written.
    saved_at_secs: u64,
    /// Lines fetched so far, in catalog order.
    lines: Vec<FetchedLine>,
}

/// Errors writing or removing the checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Location of the checkpoint file.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default checkpoint path for an output file: `out.json` becomes
    /// `out.partial.json` next to it.
    pub fn beside(output: &Path) -> Self {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "combined-data".to_string());
        Self::new(output.with_file_name(format!("{stem}.partial.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the lines of an existing checkpoint.
    ///
    /// Returns `None` if there is no checkpoint or it cannot be parsed.
    pub async fn load(&self) -> Option<Vec<FetchedLine>> {
        let contents = tokio::fs::read_to_string(&self.path).await.ok()?;
        let file: CheckpointFile = serde_json::from_str(&contents).ok()?;
        Some(file.lines)
    }

    /// Write `lines` to the checkpoint, replacing any previous one.
    ///
    /// The file is written next to its final location and renamed into
    /// place, so readers never observe a half-written checkpoint.
    pub async fn save(&self, lines: &[FetchedLine]) -> Result<(), CheckpointError> {
        let saved_at_secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let file = CheckpointFile {
            saved_at_secs,
            lines: lines.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        Ok(())
    }

    /// Delete the checkpoint. Returns `false` if there was none.
    pub async fn remove(&self) -> Result<bool, CheckpointError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: std::io::Error) -> CheckpointError {
        CheckpointError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
