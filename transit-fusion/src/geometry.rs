//! Route geometry index.
//!
//! The operator's route export is a GeoJSON feature collection with one
//! feature per line and direction, labelled like `"12 - Aller"`. This module
//! groups the features by line and flips their positions from GeoJSON's
//! `[lon, lat]` to the `[lat, lon]` order used everywhere else.

use std::collections::HashMap;
use std::sync::LazyLock;

use geojson::{Feature, FeatureCollection, GeoJson};
use regex::Regex;
use tracing::debug;

use crate::domain::{Coordinate, Direction, LatLon, LineId};

/// Feature property holding the "line - direction" label.
pub const LABEL_PROPERTY: &str = "ligne_sens";

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\S+)\s*-\s*(Aller|Retour)$").expect("valid geometry label regex")
});

/// Errors reading the geometry document.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Geometry of one line. Either direction may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineGeometry {
    pub aller: Option<Vec<Coordinate>>,
    pub retour: Option<Vec<Coordinate>>,
}

impl LineGeometry {
    /// Outbound coordinates followed by inbound coordinates.
    pub fn combined(&self) -> Vec<Coordinate> {
        self.aller
            .iter()
            .chain(self.retour.iter())
            .flatten()
            .copied()
            .collect()
    }

    fn set(&mut self, direction: Direction, coords: Vec<Coordinate>) {
        match direction {
            Direction::Outbound => self.aller = Some(coords),
            Direction::Inbound => self.retour = Some(coords),
        }
    }
}

/// Counters reported after indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryStats {
    pub features: usize,
    pub indexed: usize,
    pub discarded: usize,
}

/// Per-line, per-direction route geometry.
#[derive(Debug, Clone, Default)]
pub struct GeometryIndex {
    lines: HashMap<LineId, LineGeometry>,
}

impl GeometryIndex {
    /// Parse a GeoJSON feature collection.
    pub fn from_geojson_str(text: &str) -> Result<(Self, GeometryStats), GeometryError> {
        let geojson: GeoJson = text.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;
        Ok(Self::from_features(&collection.features))
    }

    /// Index features; unlabelled or geometry-less features are discarded.
    ///
    /// A later feature for the same line and direction replaces an earlier
    /// one.
    pub fn from_features(features: &[Feature]) -> (Self, GeometryStats) {
        let mut index = GeometryIndex::default();
        let mut stats = GeometryStats {
            features: features.len(),
            ..GeometryStats::default()
        };

        for feature in features {
            let label = feature
                .property(LABEL_PROPERTY)
                .and_then(|v| v.as_str())
                .and_then(parse_label);
            let coords = feature.geometry.as_ref().and_then(|g| coordinates(&g.value));

            match (label, coords) {
                (Some((line, direction)), Some(coords)) => {
                    let entry = index.lines.entry(line).or_default();
                    entry.set(direction, coords);
                    stats.indexed += 1;
                }
                _ => {
                    stats.discarded += 1;
                    debug!(
                        label = ?feature.property(LABEL_PROPERTY),
                        "discarding geometry feature"
                    );
                }
            }
        }

        (index, stats)
    }

    pub fn get(&self, line: &LineId) -> Option<&LineGeometry> {
        self.lines.get(line)
    }

    /// Number of lines with any geometry.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Split a `"<line> - Aller|Retour"` label.
pub fn parse_label(label: &str) -> Option<(LineId, Direction)> {
    let caps = LABEL.captures(label.trim())?;
    let line = LineId::parse(&caps[1]).ok()?;
    let direction = Direction::from_word(&caps[2])?;
    Some((line, direction))
}

/// `[lat, lon]` coordinates of a line-like geometry.
fn coordinates(value: &geojson::Value) -> Option<Vec<Coordinate>> {
    let positions: Vec<&Vec<f64>> = match value {
        geojson::Value::LineString(points) => points.iter().collect(),
        geojson::Value::MultiLineString(parts) => parts.iter().flatten().collect(),
        _ => return None,
    };

    Some(
        positions
            .into_iter()
            .filter_map(|p| LatLon::from_lon_lat(p))
            .map(LatLon::to_coordinate)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> LineId {
        LineId::parse(s).unwrap()
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"ligne_sens": "12 - Aller"},
             "geometry": {"type": "LineString", "coordinates": [[6.14, 46.20], [6.15, 46.19]]}},
            {"type": "Feature", "properties": {"ligne_sens": "12 - retour"},
             "geometry": {"type": "LineString", "coordinates": [[6.15, 46.19], [6.14, 46.20]]}},
            {"type": "Feature", "properties": {"ligne_sens": "E-ALLER"},
             "geometry": {"type": "MultiLineString", "coordinates": [[[6.1, 46.1]], [[6.2, 46.2]]]}},
            {"type": "Feature", "properties": {"ligne_sens": "12 - Aller - bis"},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0]]}},
            {"type": "Feature", "properties": {"ligne_sens": "12 and 15 - Aller"},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0]]}},
            {"type": "Feature", "properties": {"name": "depot"},
             "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0]]}},
            {"type": "Feature", "properties": {"ligne_sens": "18 - Aller"},
             "geometry": {"type": "Point", "coordinates": [6.1, 46.1]}}
        ]
    }"#;

    #[test]
    fn indexes_labelled_lines() {
        let (index, stats) = GeometryIndex::from_geojson_str(COLLECTION).unwrap();

        assert_eq!(
            stats,
            GeometryStats {
                features: 7,
                indexed: 3,
                discarded: 4
            }
        );
        assert_eq!(index.len(), 2);

        let tram = index.get(&line("12")).unwrap();
        assert_eq!(
            tram.aller.as_deref(),
            Some(&[[46.20, 6.14], [46.19, 6.15]][..])
        );
        assert_eq!(
            tram.retour.as_deref(),
            Some(&[[46.19, 6.15], [46.20, 6.14]][..])
        );
        assert_eq!(tram.combined().len(), 4);
        assert_eq!(tram.combined()[0], [46.20, 6.14]);
        assert_eq!(tram.combined()[2], [46.19, 6.15]);
    }

    #[test]
    fn multi_line_strings_are_concatenated() {
        let (index, _) = GeometryIndex::from_geojson_str(COLLECTION).unwrap();
        let express = index.get(&line("E")).unwrap();
        assert_eq!(
            express.aller.as_deref(),
            Some(&[[46.1, 6.1], [46.2, 6.2]][..])
        );
        assert!(express.retour.is_none());
        assert_eq!(express.combined().len(), 2);
    }

    #[test]
    fn label_parsing() {
        assert_eq!(
            parse_label("12 - Aller"),
            Some((line("12"), Direction::Outbound))
        );
        assert_eq!(
            parse_label("NA-RETOUR"),
            Some((line("NA"), Direction::Inbound))
        );
        assert_eq!(parse_label("12 - Ailleurs"), None);
        assert_eq!(parse_label("12 15 - Aller"), None);
        assert_eq!(parse_label("- Aller"), None);
    }

    #[test]
    fn not_a_feature_collection() {
        let point = r#"{"type": "Point", "coordinates": [6.1, 46.1]}"#;
        assert!(GeometryIndex::from_geojson_str(point).is_err());
        assert!(GeometryIndex::from_geojson_str("not json").is_err());
    }
}
