//! Mapping a stop's free-text destination onto a line direction.
//!
//! The registry says "line 12 at this stop goes to Genève, Bout-du-Monde";
//! the line page says the outbound direction ends at "Bout-du-Monde". A
//! destination resolves to a direction when one of the two strings contains
//! the other and the stop actually appears in that direction's sequence.

use serde::Serialize;

use crate::domain::Direction;
use crate::fetch::LineDirections;

/// Where a stop sits on a line for one declared destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectionAssignment {
    /// Position of the stop's first occurrence in the direction's sequence.
    pub index: usize,
    pub direction: Direction,
}

/// Resolve `destination` for `stop_name` against a line's directions.
///
/// Tried in order, outbound before inbound at each step:
///
/// 1. the terminus contains the destination, and the stop is in the
///    sequence;
/// 2. the stop is in the sequence, and the destination contains the
///    terminus.
///
/// Comparisons are case-insensitive; the stop name must match exactly.
pub fn resolve(
    stop_name: &str,
    destination: &str,
    directions: &LineDirections,
) -> Option<DirectionAssignment> {
    let destination = destination.trim();

    let terminus_match = Direction::ALL.into_iter().find_map(|direction| {
        let last = terminus(directions, direction)?;
        if !contains_ignore_case(last, destination) {
            return None;
        }
        position(directions.get(direction), stop_name)
            .map(|index| DirectionAssignment { index, direction })
    });

    terminus_match.or_else(|| {
        Direction::ALL.into_iter().find_map(|direction| {
            let index = position(directions.get(direction), stop_name)?;
            let last = terminus(directions, direction)?;
            contains_ignore_case(destination, last)
                .then_some(DirectionAssignment { index, direction })
        })
    })
}

/// Last stop of `direction`, if it has any.
fn terminus(directions: &LineDirections, direction: Direction) -> Option<&str> {
    directions.get(direction).last().map(String::as_str)
}

fn position(stops: &[String], stop_name: &str) -> Option<usize> {
    stops.iter().position(|s| s == stop_name)
}

/// `haystack` contains `needle`, ignoring case. Empty strings never match.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !haystack.is_empty()
        && !needle.is_empty()
        && haystack.to_lowercase().contains(&needle.to_lowercase())
}
