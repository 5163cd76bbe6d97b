//! Builds the stop registry from the operator's stop table.

use std::io::{Cursor, Read};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::projection::project;

use super::direction_field::{parse_direction_field, parse_with_lines};
use super::error::{RegistryError, SourceFormatError};
use super::record::{StopRecord, StopRegistry};

/// Name of the stop table inside the published archive.
pub const REGISTRY_MEMBER: &str = "TPG_ARRETS.csv";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// One row of the stop table. Every column is optional at this level;
/// required ones are checked when the row is merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryRow {
    #[serde(rename = "NUMERIQUE_ARRET", default)]
    pub code: Option<String>,
    #[serde(rename = "NOM_ARRET", default)]
    pub name: Option<String>,
    #[serde(rename = "LETTRE_DE_QUAI", default)]
    pub platform: Option<String>,
    #[serde(rename = "E", default)]
    pub easting: Option<String>,
    #[serde(rename = "N", default)]
    pub northing: Option<String>,
    #[serde(rename = "LIGNE", default)]
    pub lines: Option<String>,
    #[serde(rename = "DIRECTION", default)]
    pub direction: Option<String>,
}

/// Counters reported after the registry is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Data rows read.
    pub rows: usize,
    /// Rows that contributed nothing.
    pub skipped: usize,
    /// Non-fatal problems, including discarded direction fields.
    pub warnings: usize,
}

/// Accumulates rows into a [`StopRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: StopRegistry,
    stats: RegistryStats,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one row, counting it as skipped if it is unusable.
    pub fn add_row(&mut self, row: &RegistryRow) {
        self.stats.rows += 1;
        if let Err(e) = self.merge_row(row) {
            self.stats.skipped += 1;
            self.stats.warnings += 1;
            debug!(code = ?row.code, name = ?row.name, error = %e, "skipping stop row");
        }
    }

    /// Count a row the CSV reader could not decode.
    pub fn add_malformed(&mut self, error: &csv::Error) {
        self.stats.rows += 1;
        self.stats.skipped += 1;
        self.stats.warnings += 1;
        let e = SourceFormatError::Row(error.to_string());
        warn!(error = %e, "skipping stop row");
    }

    pub fn finish(self) -> (StopRegistry, RegistryStats) {
        (self.registry, self.stats)
    }

    fn merge_row(&mut self, row: &RegistryRow) -> Result<(), SourceFormatError> {
        let code = required(&row.code, "NUMERIQUE_ARRET")?;
        let name = required(&row.name, "NOM_ARRET")?;
        let platform = non_empty(&row.platform).map(str::to_string);

        match self.registry.get_mut(name, code) {
            Some(existing) => {
                if existing.platform.is_none() {
                    existing.platform = platform;
                }
            }
            None => {
                let easting = number(&row.easting, "E")?;
                let northing = number(&row.northing, "N")?;
                let position = project(easting, northing)?;

                let mut record = StopRecord::new(name, code, position);
                record.platform = platform;
                self.registry.insert(record);
            }
        }

        if let Err(e) = self.declare_directions(name, code, row) {
            self.stats.warnings += 1;
            debug!(stop = name, code, error = %e, "direction field discarded");
        }

        Ok(())
    }

    fn declare_directions(
        &mut self,
        name: &str,
        code: &str,
        row: &RegistryRow,
    ) -> Result<(), SourceFormatError> {
        let field = required(&row.direction, "DIRECTION")?;
        let pairs = match non_empty(&row.lines) {
            Some(lines) => parse_with_lines(lines, field)?,
            None => parse_direction_field(field)?,
        };

        if let Some(record) = self.registry.get_mut(name, code) {
            for pair in pairs {
                record.declare(pair.line, pair.destination);
            }
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, SourceFormatError> {
    non_empty(value).ok_or(SourceFormatError::MissingField(field))
}

fn number(value: &Option<String>, field: &'static str) -> Result<f64, SourceFormatError> {
    let raw = required(value, field)?;
    raw.replace(',', ".")
        .parse::<f64>()
        .map_err(|_| SourceFormatError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Read a semicolon-delimited stop table.
///
/// Only an unreadable header is fatal; bad rows are skipped and counted.
pub fn read_registry<R: Read>(reader: R) -> Result<(StopRegistry, RegistryStats), RegistryError> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv.headers()?;

    let mut builder = RegistryBuilder::new();
    for result in csv.deserialize::<RegistryRow>() {
        match result {
            Ok(row) => builder.add_row(&row),
            Err(e) => builder.add_malformed(&e),
        }
    }

    Ok(builder.finish())
}

/// Return the stop table bytes from a download.
///
/// The operator publishes the table inside a zip archive; plain CSV is
/// accepted as well. Encoding is left to [`read_registry`], which skips
/// rows that are not valid UTF-8.
pub fn registry_csv(bytes: Vec<u8>) -> Result<Vec<u8>, RegistryError> {
    if !bytes.starts_with(ZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        RegistryError::Archive {
            message: format!("failed to open archive: {e}"),
        }
    })?;

    let member = archive
        .file_names()
        .find(|name| name.rsplit('/').next() == Some(REGISTRY_MEMBER))
        .map(str::to_string)
        .ok_or_else(|| RegistryError::Archive {
            message: format!("{REGISTRY_MEMBER} not found in archive"),
        })?;

    let mut file = archive
        .by_name(&member)
        .map_err(|e| RegistryError::Archive {
            message: format!("failed to read {member}: {e}"),
        })?;

    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| RegistryError::Archive {
            message: format!("failed to read {member}: {e}"),
        })?;

    Ok(buf)
}
