//! Stop registry.
//!
//! Turns the operator's stop table into one [`StopRecord`] per physical
//! stop (name + code), with WGS84 coordinates and the destinations each line
//! declares from that stop.

mod builder;
mod direction_field;
mod error;
mod record;

pub use builder::{
    REGISTRY_MEMBER, RegistryBuilder, RegistryRow, RegistryStats, read_registry, registry_csv,
};
pub use direction_field::{
    DirectionFieldError, DirectionPair, balanced_group, parse_direction_field, parse_with_lines,
    split_entries, split_line_tokens,
};
pub use error::{RegistryError, SourceFormatError};
pub use record::{StopRecord, StopRegistry};
