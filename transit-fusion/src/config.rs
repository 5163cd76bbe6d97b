//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::fetch::{Checkpoint, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CONCURRENCY, FetchConfig};
use crate::source::{DEFAULT_USER_AGENT, HttpSourceConfig};

/// Route geometry export of the operator's open-data portal.
pub const DEFAULT_GEOMETRY_SOURCE: &str = "https://opendata.tpg.ch/api/explore/v2.1/catalog/datasets/carto-metro-couche-lignes/exports/geojson?lang=en&timezone=Europe%2FBerlin";

/// Stop registry archive published by the cantonal geodata service.
pub const DEFAULT_STOPS_SOURCE: &str =
    "https://ge.ch/sitg/geodata/SITG/OPENDATA/1350/CSV_TPG_ARRETS.zip";

/// Line index page.
pub const DEFAULT_LINES_SOURCE: &str = "https://www.tpg.ch/en/lignes";

pub const DEFAULT_BASE_URL: &str = "https://www.tpg.ch";

pub const DEFAULT_OUTPUT: &str = "combined-data.json";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Combine the stop registry, line pages and route geometry into one
/// JSON document.
#[derive(Debug, Clone, Parser)]
#[command(name = "transit-fusion", version)]
pub struct FusionConfig {
    /// GeoJSON route geometry (path or URL)
    #[arg(long, env = "FUSION_GEOMETRY_SOURCE", default_value = DEFAULT_GEOMETRY_SOURCE)]
    pub geometry_source: String,

    /// Stop registry CSV or zip archive (path or URL)
    #[arg(long, env = "FUSION_STOPS_SOURCE", default_value = DEFAULT_STOPS_SOURCE)]
    pub stops_source: String,

    /// Line catalog: index page URL, HTML file or JSON file
    #[arg(long, env = "FUSION_LINES_SOURCE", default_value = DEFAULT_LINES_SOURCE)]
    pub lines_source: String,

    /// Base for relative line page links
    #[arg(long, env = "FUSION_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Where to write the combined document
    #[arg(long, env = "FUSION_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Checkpoint file [default: <output stem>.partial.json]
    #[arg(long, env = "FUSION_CHECKPOINT")]
    pub checkpoint: Option<PathBuf>,

    /// Line pages fetched at once
    #[arg(long, env = "FUSION_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Successful fetches between checkpoints (0 disables)
    #[arg(long, env = "FUSION_CHECKPOINT_INTERVAL", default_value_t = DEFAULT_CHECKPOINT_INTERVAL)]
    pub checkpoint_interval: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "FUSION_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[arg(long, env = "FUSION_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Reuse lines from an existing checkpoint instead of fetching them again
    #[arg(long)]
    pub resume: bool,
}

impl FusionConfig {
    pub fn checkpoint(&self) -> Checkpoint {
        match &self.checkpoint {
            Some(path) => Checkpoint::new(path),
            None => Checkpoint::beside(&self.output),
        }
    }

    pub fn http_config(&self) -> HttpSourceConfig {
        HttpSourceConfig::new()
            .with_user_agent(&self.user_agent)
            .with_timeout(self.timeout_secs)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::new()
            .with_concurrency(self.concurrency)
            .with_checkpoint_interval(self.checkpoint_interval)
    }
}
