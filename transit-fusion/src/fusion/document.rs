//! The combined output document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, Direction, LineId};
use crate::fetch::LineDirections;

/// Everything the downstream map needs: resolved stops and line shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedData {
    /// Stop name, then stop code.
    pub stops: BTreeMap<String, BTreeMap<String, StopEntry>>,
    pub lines: BTreeMap<LineId, LineRecord>,
}

impl CombinedData {
    /// Number of distinct (name, code) stop identities.
    pub fn stop_count(&self) -> usize {
        self.stops.values().map(BTreeMap::len).sum()
    }
}

/// One stop identity and the line directions it was resolved onto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopEntry {
    #[serde(rename = "stopCode")]
    pub stop_code: String,
    pub platform: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub lines: BTreeMap<LineId, StopLine>,
}

/// Resolved destinations of one line at one stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopLine {
    /// Keyed by the trimmed destination text.
    pub directions: BTreeMap<String, DirectionEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionEntry {
    pub index: usize,
    pub direction: Direction,
    pub lat: f64,
    pub lon: f64,
}

/// A line as published: catalog attributes, stop sequences and shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub colour: String,
    /// Outbound geometry followed by inbound geometry.
    pub geometry: Vec<Coordinate>,
    pub directions: LineDirections,
}
