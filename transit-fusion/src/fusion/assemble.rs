//! Building the combined document from the three sources.

use std::collections::BTreeMap;

use tracing::debug;

use super::document::{CombinedData, DirectionEntry, LineRecord, StopEntry, StopLine};
use super::matcher::resolve;
use crate::domain::LineId;
use crate::fetch::FetchedLine;
use crate::geometry::GeometryIndex;
use crate::registry::{StopRecord, StopRegistry};

/// Counters reported after fusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionSummary {
    /// Lines in the document.
    pub lines: usize,
    /// Stop names left after pruning.
    pub stop_names: usize,
    /// Stop identities left after pruning.
    pub stop_codes: usize,
    /// Destinations placed on a line direction.
    pub resolved: usize,
    /// Destinations that matched no direction.
    pub unresolved: usize,
    /// Declared lines that are not in the fetched set.
    pub unknown_lines: usize,
}

/// Merge fetched lines with their geometry.
///
/// A line fetched twice keeps its last occurrence.
pub fn build_line_records(
    fetched: &[FetchedLine],
    geometry: &GeometryIndex,
) -> BTreeMap<LineId, LineRecord> {
    fetched
        .iter()
        .map(|f| {
            let shape = geometry
                .get(&f.line.number)
                .map(|g| g.combined())
                .unwrap_or_default();
            let record = LineRecord {
                name: f.line.display_name(),
                kind: f.line.kind.clone(),
                colour: f.line.colour.clone(),
                geometry: shape,
                directions: f.directions.clone(),
            };
            (f.line.number.clone(), record)
        })
        .collect()
}

/// Resolve every stop's declared destinations against `lines`.
///
/// Resolution runs over all stops first; lines, stop codes and stop names
/// left without any resolved destination are pruned afterwards.
pub fn assemble(
    registry: &StopRegistry,
    lines: BTreeMap<LineId, LineRecord>,
) -> (CombinedData, FusionSummary) {
    let mut summary = FusionSummary::default();
    let mut stops: BTreeMap<String, BTreeMap<String, StopEntry>> = BTreeMap::new();

    for stop in registry.iter() {
        let entry = resolve_stop(stop, &lines, &mut summary);
        stops
            .entry(stop.name.clone())
            .or_default()
            .insert(stop.code.clone(), entry);
    }

    prune(&mut stops);

    let data = CombinedData { stops, lines };
    summary.lines = data.lines.len();
    summary.stop_names = data.stops.len();
    summary.stop_codes = data.stop_count();
    (data, summary)
}

fn resolve_stop(
    stop: &StopRecord,
    lines: &BTreeMap<LineId, LineRecord>,
    summary: &mut FusionSummary,
) -> StopEntry {
    let mut entry = StopEntry {
        stop_code: stop.code.clone(),
        platform: stop.platform.clone(),
        lat: stop.position.lat,
        lon: stop.position.lon,
        lines: BTreeMap::new(),
    };

    for (line_id, destinations) in &stop.lines {
        let Some(line) = lines.get(line_id) else {
            summary.unknown_lines += 1;
            continue;
        };

        let stop_line = entry.lines.entry(line_id.clone()).or_default();
        for destination in destinations {
            let destination = destination.trim();
            match resolve(&stop.name, destination, &line.directions) {
                Some(assignment) => {
                    summary.resolved += 1;
                    stop_line.directions.insert(
                        destination.to_string(),
                        DirectionEntry {
                            index: assignment.index,
                            direction: assignment.direction,
                            lat: stop.position.lat,
                            lon: stop.position.lon,
                        },
                    );
                }
                None => {
                    summary.unresolved += 1;
                    debug!(
                        stop = %stop.name,
                        code = %stop.code,
                        line = %line_id,
                        destination,
                        "destination not resolved"
                    );
                }
            }
        }
    }

    entry
}

/// Drop lines with no directions, then codes with no lines, then names
/// with no codes.
fn prune(stops: &mut BTreeMap<String, BTreeMap<String, StopEntry>>) {
    for codes in stops.values_mut() {
        for entry in codes.values_mut() {
            entry.lines.retain(|_, line| !line.directions.is_empty());
        }
        codes.retain(|_, entry| !entry.lines.is_empty());
    }
    stops.retain(|_, codes| !codes.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LineRef;
    use crate::domain::{Direction, LatLon};
    use crate::fetch::LineDirections;

    fn line(s: &str) -> LineId {
        LineId::parse(s).unwrap()
    }

    fn seq(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn fetched(number: &str, aller: &[&str], retour: &[&str]) -> FetchedLine {
        FetchedLine {
            line: LineRef {
                number: line(number),
                kind: "Tram".to_string(),
                colour: "#F7A800".to_string(),
                link: format!("https://www.tpg.ch/en/lignes/{number}"),
                name: None,
            },
            directions: LineDirections {
                aller: seq(aller),
                retour: seq(retour),
            },
        }
    }

    fn stop(name: &str, code: &str, declared: &[(&str, &str)]) -> StopRecord {
        let mut record = StopRecord::new(name, code, LatLon::new(46.2, 6.14));
        for (l, dest) in declared {
            record.declare(line(l), *dest);
        }
        record
    }

    fn tram_12() -> FetchedLine {
        fetched(
            "12",
            &["Moillesulaz", "Rive", "Plainpalais", "Bout-du-Monde"],
            &["Bout-du-Monde", "Plainpalais", "Rive", "Moillesulaz"],
        )
    }

    #[test]
    fn resolvable_stop_is_placed_once() {
        let mut registry = StopRegistry::new();
        registry.insert(stop("Rive", "RIVE00", &[("12", " Bout-du-Monde ")]));

        let lines = build_line_records(&[tram_12()], &GeometryIndex::default());
        let (data, summary) = assemble(&registry, lines);

        assert_eq!(data.stops.len(), 1);
        assert_eq!(data.stop_count(), 1);
        let entry = &data.stops["Rive"]["RIVE00"];
        assert_eq!(entry.lines.len(), 1);
        let placed = &entry.lines[&line("12")].directions["Bout-du-Monde"];
        assert_eq!(placed.index, 1);
        assert_eq!(placed.direction, Direction::Outbound);
        assert_eq!((placed.lat, placed.lon), (46.2, 6.14));

        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.unresolved, 0);
        assert_eq!(summary.stop_names, 1);
    }

    #[test]
    fn unresolvable_stop_is_removed() {
        let mut registry = StopRegistry::new();
        registry.insert(stop("Rive", "RIVE00", &[("12", "Carouge")]));

        let lines = build_line_records(&[tram_12()], &GeometryIndex::default());
        let (data, summary) = assemble(&registry, lines);

        assert!(data.stops.is_empty());
        assert_eq!(data.lines.len(), 1);
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.stop_codes, 0);
    }

    #[test]
    fn pruning_is_per_level() {
        let mut registry = StopRegistry::new();
        // Keeps line 12, loses line 15 (not fetched) and the bad destination.
        registry.insert(stop(
            "Rive",
            "RIVE00",
            &[("12", "Moillesulaz"), ("12", "Nowhere"), ("15", "Lancy")],
        ));
        // Same name, other code, nothing resolves.
        registry.insert(stop("Rive", "RIVE01", &[("12", "Nowhere")]));
        // Not on the line at all.
        registry.insert(stop("Cornavin", "CVIN00", &[("12", "Bout-du-Monde")]));

        let lines = build_line_records(&[tram_12()], &GeometryIndex::default());
        let (data, summary) = assemble(&registry, lines);

        assert_eq!(data.stops.keys().collect::<Vec<_>>(), vec!["Rive"]);
        let codes = &data.stops["Rive"];
        assert_eq!(codes.keys().collect::<Vec<_>>(), vec!["RIVE00"]);
        let directions = &codes["RIVE00"].lines[&line("12")].directions;
        assert_eq!(directions.keys().collect::<Vec<_>>(), vec!["Moillesulaz"]);
        assert_eq!(directions["Moillesulaz"].direction, Direction::Inbound);
        assert_eq!(directions["Moillesulaz"].index, 2);

        assert_eq!(summary.unknown_lines, 1);
        assert_eq!(summary.resolved, 1);
        assert_eq!(summary.unresolved, 3);
    }

    #[test]
    fn line_records_take_catalog_and_geometry() {
        let geojson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"ligne_sens": "12 - Retour"},
             "geometry": {"type": "LineString", "coordinates": [[6.2, 46.3]]}},
            {"type": "Feature", "properties": {"ligne_sens": "12 - Aller"},
             "geometry": {"type": "LineString", "coordinates": [[6.1, 46.1], [6.15, 46.2]]}}
        ]}"#;
        let (geometry, _) = GeometryIndex::from_geojson_str(geojson).unwrap();

        let mut named = fetched("E", &["A"], &[]);
        named.line.name = Some("Express".to_string());

        let records = build_line_records(&[tram_12(), named], &geometry);

        let tram = &records[&line("12")];
        assert_eq!(tram.name, "Line 12");
        assert_eq!(tram.kind, "Tram");
        assert_eq!(
            tram.geometry,
            vec![[46.1, 6.1], [46.2, 6.15], [46.3, 6.2]]
        );
        assert_eq!(tram.directions.aller.len(), 4);

        let express = &records[&line("E")];
        assert_eq!(express.name, "Express");
        assert!(express.geometry.is_empty());
    }
}
