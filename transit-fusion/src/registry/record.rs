//! Stop records and the registry that holds them.

use std::collections::BTreeMap;

use crate::domain::{LatLon, LineId};

/// One physical stop (a platform), identified by its name and code.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub name: String,
    pub code: String,
    pub platform: Option<String>,
    /// Projected once when the identity is first seen.
    pub position: LatLon,
    /// Destinations declared per line, in first-seen order, without repeats.
    pub lines: BTreeMap<LineId, Vec<String>>,
}

impl StopRecord {
    pub fn new(name: impl Into<String>, code: impl Into<String>, position: LatLon) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            platform: None,
            position,
            lines: BTreeMap::new(),
        }
    }

    /// Record that `line` serves `destination` from this stop.
    ///
    /// Returns `false` if the pair was already known.
    pub fn declare(&mut self, line: LineId, destination: impl Into<String>) -> bool {
        let destination = destination.into();
        let destinations = self.lines.entry(line).or_default();
        if destinations.contains(&destination) {
            return false;
        }
        destinations.push(destination);
        true
    }
}

/// All stop records, keyed by stop name then stop code.
#[derive(Debug, Clone, Default)]
pub struct StopRegistry {
    stops: BTreeMap<String, BTreeMap<String, StopRecord>>,
}

impl StopRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str, code: &str) -> Option<&StopRecord> {
        self.stops.get(name)?.get(code)
    }

    pub(super) fn get_mut(&mut self, name: &str, code: &str) -> Option<&mut StopRecord> {
        self.stops.get_mut(name)?.get_mut(code)
    }

    /// Add a record, replacing any record with the same identity.
    pub fn insert(&mut self, record: StopRecord) {
        self.stops
            .entry(record.name.clone())
            .or_default()
            .insert(record.code.clone(), record);
    }

    /// Iterate over every record, ordered by name then code.
    pub fn iter(&self) -> impl Iterator<Item = &StopRecord> {
        self.stops.values().flat_map(|variants| variants.values())
    }

    /// Number of distinct (name, code) identities.
    pub fn len(&self) -> usize {
        self.stops.values().map(BTreeMap::len).sum()
    }

    /// Number of distinct stop names.
    pub fn name_count(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
