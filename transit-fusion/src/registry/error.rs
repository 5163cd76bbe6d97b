//! Stop registry error types.

use crate::projection::ConversionError;

use super::direction_field::DirectionFieldError;

/// A single registry row or field that could not be used.
///
/// Always recovered locally: the row (or field) is skipped and counted.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceFormatError {
    /// Required column is empty or absent
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Numeric column could not be parsed
    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Grid coordinates could not be converted
    #[error(transparent)]
    Projection(#[from] ConversionError),

    /// Compound direction field was discarded
    #[error("direction field discarded: {0}")]
    Direction(#[from] DirectionFieldError),

    /// Row could not be decoded at all
    #[error("malformed row: {0}")]
    Row(String),
}

/// Errors that make the whole registry unusable.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// CSV header or reader failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Archive could not be opened or lacks the expected member
    #[error("archive error: {message}")]
    Archive { message: String },
}
