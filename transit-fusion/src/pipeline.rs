//! The end-to-end run: load, fetch, fuse, write.

use std::path::Path;

use tracing::{info, warn};

use crate::catalog::{CatalogError, LineRef, parse_catalog};
use crate::config::FusionConfig;
use crate::error::FusionError;
use crate::fetch::{Checkpoint, FetchConfig, FetchOutcome, fetch_all_resuming};
use crate::fusion::{CombinedData, FusionSummary, assemble, build_line_records};
use crate::geometry::{GeometryIndex, GeometryStats};
use crate::registry::{RegistryStats, StopRegistry, read_registry, registry_csv};
use crate::source::{HttpSource, PageSource, load_bytes, load_text};

/// Counters from every phase of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub geometry: GeometryStats,
    pub registry: RegistryStats,
    pub catalog_lines: usize,
    pub fetched: usize,
    pub failed: usize,
    pub resumed: usize,
    pub fusion: FusionSummary,
}

/// Run the whole pipeline with real HTTP.
pub async fn run(config: &FusionConfig) -> Result<RunSummary, FusionError> {
    let http = HttpSource::new(config.http_config()).map_err(FusionError::Client)?;
    run_with(config, &http, &http).await
}

/// Run the pipeline, reading inputs through `http` and line pages through
/// `pages`.
pub async fn run_with<S: PageSource>(
    config: &FusionConfig,
    http: &HttpSource,
    pages: &S,
) -> Result<RunSummary, FusionError> {
    let mut summary = RunSummary::default();

    let (geometry, stats) = load_geometry(http, &config.geometry_source).await?;
    info!(
        features = stats.features,
        lines = geometry.len(),
        discarded = stats.discarded,
        "geometry indexed"
    );
    summary.geometry = stats;

    let (registry, stats) = load_registry(http, &config.stops_source).await?;
    info!(
        rows = stats.rows,
        stops = registry.len(),
        names = registry.name_count(),
        skipped = stats.skipped,
        warnings = stats.warnings,
        "stop registry built"
    );
    summary.registry = stats;

    let catalog = load_catalog(http, &config.lines_source, &config.base_url).await?;
    info!(lines = catalog.len(), "line catalog loaded");
    summary.catalog_lines = catalog.len();

    let checkpoint = config.checkpoint();
    let outcome = fetch_lines(
        pages,
        &catalog,
        &config.fetch_config(),
        &checkpoint,
        config.resume,
    )
    .await;
    info!(
        ok = outcome.succeeded,
        failed = outcome.failed,
        resumed = outcome.resumed,
        "line pages fetched"
    );
    summary.fetched = outcome.succeeded;
    summary.failed = outcome.failed;
    summary.resumed = outcome.resumed;

    let fetched = outcome.into_lines();
    if fetched.is_empty() {
        return Err(FusionError::NoLines);
    }

    let lines = build_line_records(&fetched, &geometry);
    let (data, fusion) = assemble(&registry, lines);
    info!(
        lines = fusion.lines,
        stops = fusion.stop_names,
        stop_codes = fusion.stop_codes,
        resolved = fusion.resolved,
        unresolved = fusion.unresolved,
        "stops fused"
    );
    summary.fusion = fusion;

    write_output(&config.output, &data).await?;
    info!(path = %config.output.display(), "combined data written");

    if checkpoint.remove().await? {
        info!(path = %checkpoint.path().display(), "checkpoint removed");
    }

    Ok(summary)
}

pub async fn load_geometry(
    http: &HttpSource,
    location: &str,
) -> Result<(GeometryIndex, GeometryStats), FusionError> {
    let text = load_text(http, location)
        .await
        .map_err(FusionError::GeometrySource)?;
    Ok(GeometryIndex::from_geojson_str(&text)?)
}

pub async fn load_registry(
    http: &HttpSource,
    location: &str,
) -> Result<(StopRegistry, RegistryStats), FusionError> {
    let bytes = load_bytes(http, location)
        .await
        .map_err(FusionError::RegistrySource)?;
    let table = registry_csv(bytes)?;
    Ok(read_registry(table.as_slice())?)
}

pub async fn load_catalog(
    http: &HttpSource,
    location: &str,
    base_url: &str,
) -> Result<Vec<LineRef>, FusionError> {
    let text = load_text(http, location).await.map_err(CatalogError::from)?;
    Ok(parse_catalog(location, &text, base_url)?)
}

/// Fetch every catalog line, optionally picking up a previous checkpoint.
pub async fn fetch_lines<S: PageSource>(
    pages: &S,
    catalog: &[LineRef],
    config: &FetchConfig,
    checkpoint: &Checkpoint,
    resume: bool,
) -> FetchOutcome {
    let resumed = if resume {
        let lines = checkpoint.load().await.unwrap_or_default();
        info!(
            lines = lines.len(),
            path = %checkpoint.path().display(),
            "resuming from checkpoint"
        );
        lines
    } else {
        if checkpoint.exists() {
            warn!(
                path = %checkpoint.path().display(),
                "found checkpoint from an unfinished run; pass --resume to reuse it"
            );
        }
        Vec::new()
    };

    fetch_all_resuming(catalog, config, pages, Some(checkpoint), resumed).await
}

/// Write the document as pretty-printed JSON, creating parent directories.
pub async fn write_output(path: &Path, data: &CombinedData) -> Result<(), FusionError> {
    let json = serde_json::to_string_pretty(data)?;
    let io_error = |source: std::io::Error| FusionError::Output {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    tokio::fs::write(path, json).await.map_err(io_error)
}
