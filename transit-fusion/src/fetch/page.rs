//! Line detail page parsing.
//!
//! Detail pages embed the stop sequence as a script variable,
//! `var ligneArrets={"aller": {...}, "retour": {...}}`. When that payload is
//! missing or broken the rendered "thermometer" lists are read instead.

use std::cmp::Ordering;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::Direction;

/// Script variable holding the stop sequence payload.
pub const PAYLOAD_VAR: &str = "ligneArrets";

static OUTBOUND_STOPS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".thermometer-container.aller .thermometer li .js-container")
        .expect("valid outbound selector")
});
static INBOUND_STOPS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".thermometer-container.retour .thermometer li .js-container")
        .expect("valid inbound selector")
});
static STOP_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".stop__label").expect("valid stop label selector"));

/// Ordered stop names for both directions of a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDirections {
    pub aller: Vec<String>,
    pub retour: Vec<String>,
}

impl LineDirections {
    pub fn get(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Outbound => &self.aller,
            Direction::Inbound => &self.retour,
        }
    }

    /// Both directions have at least one stop.
    pub fn is_complete(&self) -> bool {
        !self.aller.is_empty() && !self.retour.is_empty()
    }

    /// Neither direction has any stop.
    pub fn is_empty(&self) -> bool {
        self.aller.is_empty() && self.retour.is_empty()
    }

    /// Take directions from `other` where this one has none.
    pub fn fill_missing(&mut self, other: LineDirections) {
        if self.aller.is_empty() {
            self.aller = other.aller;
        }
        if self.retour.is_empty() {
            self.retour = other.retour;
        }
    }
}

/// Parse a detail page, preferring the embedded payload.
pub fn parse_line_page(html: &str) -> LineDirections {
    parse_payload(html).unwrap_or_else(|| parse_dom(html))
}

/// URL of the page variant that opens on the inbound direction.
pub fn supplementary_url(url: &str) -> String {
    if url.ends_with('/') {
        format!("{url}retour")
    } else {
        format!("{url}/retour")
    }
}

/// Read the `ligneArrets` payload, if present and valid JSON.
pub fn parse_payload(html: &str) -> Option<LineDirections> {
    let json = extract_json_after_var(html, PAYLOAD_VAR)?;
    let payload: Value = serde_json::from_str(json).ok()?;

    Some(LineDirections {
        aller: sequence_from_payload(payload.get("aller")),
        retour: sequence_from_payload(payload.get("retour")),
    })
}

/// Read the rendered stop lists.
pub fn parse_dom(html: &str) -> LineDirections {
    let document = Html::parse_document(html);
    let labels = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .filter_map(|stop| {
                let label = stop.select(&STOP_LABEL).next()?;
                let name = label.text().collect::<String>().trim().to_string();
                (!name.is_empty()).then_some(name)
            })
            .collect()
    };

    LineDirections {
        aller: labels(&OUTBOUND_STOPS),
        retour: labels(&INBOUND_STOPS),
    }
}

#[derive(Clone, Copy)]
enum ScanState {
    Code,
    InString,
    Escape,
}

/// Return the JSON object literal assigned by `var <name>=` in `html`.
///
/// Declarations of longer names sharing the prefix are passed over. The
/// object is delimited with a brace-depth counter. Braces inside JSON
/// string literals are not counted.
pub fn extract_json_after_var<'a>(html: &'a str, var_name: &str) -> Option<&'a str> {
    let marker = format!("var {var_name}");
    let after_marker = html
        .match_indices(&marker)
        .map(|(index, _)| index + marker.len())
        .find(|&end| html[end..].trim_start().starts_with('='))?;

    let start = after_marker + html[after_marker..].find('{')?;
    let mut depth = 0usize;
    let mut state = ScanState::Code;

    for (offset, byte) in html.as_bytes()[start..].iter().enumerate() {
        state = match (state, byte) {
            (ScanState::Code, b'{') => {
                depth += 1;
                ScanState::Code
            }
            (ScanState::Code, b'}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[start..=start + offset]);
                }
                ScanState::Code
            }
            (ScanState::Code, b'"') => ScanState::InString,
            (ScanState::Code, _) => ScanState::Code,
            (ScanState::InString, b'\\') => ScanState::Escape,
            (ScanState::InString, b'"') => ScanState::Code,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::Escape, _) => ScanState::InString,
        };
    }

    None
}

/// Stop names of one direction object, ordered by travel time.
///
/// Entries are ordered by their numeric `minute` field, or by `time` when no
/// entry has a numeric `minute`. Missing values sort as zero; ties keep the
/// payload order.
fn sequence_from_payload(direction: Option<&Value>) -> Vec<String> {
    let mut entries: Vec<&Value> = match direction {
        Some(Value::Object(map)) => map.values().collect(),
        Some(Value::Array(items)) => items.iter().collect(),
        _ => return Vec::new(),
    };

    let key = if entries
        .iter()
        .any(|e| e.get("minute").is_some_and(Value::is_number))
    {
        "minute"
    } else {
        "time"
    };

    entries.sort_by(|a, b| {
        sort_value(a, key)
            .partial_cmp(&sort_value(b, key))
            .unwrap_or(Ordering::Equal)
    });

    entries
        .into_iter()
        .filter_map(|e| {
            ["name", "description"]
                .iter()
                .filter_map(|field| e.get(*field).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect()
}

fn sort_value(entry: &Value, key: &str) -> f64 {
    match entry.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
