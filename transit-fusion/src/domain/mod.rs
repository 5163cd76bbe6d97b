//! Domain types shared across the pipeline.
//!
//! These types enforce their invariants at construction time, so code that
//! receives them can trust their validity.

mod coordinate;
mod direction;
mod line_id;

pub use coordinate::{Coordinate, LatLon};
pub use direction::Direction;
pub use line_id::{InvalidLineId, LineId};
