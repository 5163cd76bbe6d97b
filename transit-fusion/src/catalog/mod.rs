//! Line catalog.
//!
//! The list of lines to fetch: identifier, mode, colour and the URL of the
//! line's detail page. Loaded from a JSON document or scraped from the
//! operator's line index page.

mod page;

use serde::{Deserialize, Serialize};

use crate::domain::LineId;
use crate::source::FetchError;

pub use page::parse_index_page;

/// Colour recorded when the index page gives none.
pub const UNKNOWN_COLOUR: &str = "N/A";

/// A line as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRef {
    pub number: LineId,
    /// Mode of transport, e.g. `Tram` or `Bus`.
    #[serde(rename = "type")]
    pub kind: String,
    pub colour: String,
    /// Absolute URL of the line's detail page.
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl LineRef {
    /// Name to show for the line, `Line <id>` unless the catalog has one.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Line {}", self.number))
    }
}

/// Errors loading the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog could not be retrieved
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// JSON catalog is malformed
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog lists no lines
    #[error("catalog contains no lines")]
    Empty,
}

/// Parse a JSON catalog: an array of [`LineRef`] objects.
pub fn parse_catalog_json(text: &str) -> Result<Vec<LineRef>, CatalogError> {
    let lines: Vec<LineRef> = serde_json::from_str(text)?;
    non_empty(lines)
}

/// Parse catalog text, choosing JSON or HTML by the location it came from.
pub fn parse_catalog(
    location: &str,
    text: &str,
    base_url: &str,
) -> Result<Vec<LineRef>, CatalogError> {
    if location.ends_with(".json") {
        parse_catalog_json(text)
    } else {
        non_empty(parse_index_page(text, base_url))
    }
}

fn non_empty(lines: Vec<LineRef>) -> Result<Vec<LineRef>, CatalogError> {
    if lines.is_empty() {
        Err(CatalogError::Empty)
    } else {
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_json_catalog() {
        let text = r##"[
            {"number": "12", "type": "Tram", "colour": "#F7A800", "link": "https://www.tpg.ch/en/lignes/12"},
            {"number": "E", "type": "Bus", "colour": "N/A", "link": "https://www.tpg.ch/en/lignes/e", "name": "Express E"}
        ]"##;

        let lines = parse_catalog_json(text).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number.as_str(), "12");
        assert_eq!(lines[0].kind, "Tram");
        assert_eq!(lines[0].display_name(), "Line 12");
        assert_eq!(lines[1].display_name(), "Express E");
    }

    #[test]
    fn empty_catalog_is_an_error() {
        assert!(matches!(parse_catalog_json("[]"), Err(CatalogError::Empty)));
        assert!(matches!(
            parse_catalog("https://www.tpg.ch/en/lignes", "<html></html>", "https://www.tpg.ch"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn invalid_line_number_rejects_json() {
        let text = r#"[{"number": "", "type": "Tram", "colour": "N/A", "link": "x"}]"#;
        assert!(matches!(
            parse_catalog_json(text),
            Err(CatalogError::Json(_))
        ));
    }
}
