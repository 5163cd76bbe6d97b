//! Stop/line fusion.
//!
//! Joins the stop registry with the fetched line sequences: every
//! destination a stop declares for a line is placed on one of the line's
//! two directions, or dropped. Stops that end up on no line are pruned
//! rather than kept with guessed positions.

mod assemble;
mod document;
mod matcher;

pub use assemble::{FusionSummary, assemble, build_line_records};
pub use document::{CombinedData, DirectionEntry, LineRecord, StopEntry, StopLine};
pub use matcher::{DirectionAssignment, resolve};
