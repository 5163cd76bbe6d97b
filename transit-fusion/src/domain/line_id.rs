//! Line identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid line identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line identifier {input:?}: {reason}")]
pub struct InvalidLineId {
    input: String,
    reason: &'static str,
}

/// A transit line identifier such as `12`, `07`, `E` or `NA`.
///
/// Identifiers are kept verbatim (no numeric normalisation, so `07` and `7`
/// are different lines) apart from surrounding whitespace, which is trimmed.
/// A `LineId` is never empty and never contains inner whitespace.
///
/// # Examples
///
/// ```
/// use transit_fusion::domain::LineId;
///
/// let tram = LineId::parse(" 12 ").unwrap();
/// assert_eq!(tram.as_str(), "12");
///
/// assert!(LineId::parse("").is_err());
/// assert!(LineId::parse("1 2").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineId(String);

impl LineId {
    /// Parse a line identifier, trimming surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidLineId> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidLineId {
                input: s.to_string(),
                reason: "must not be empty",
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(InvalidLineId {
                input: s.to_string(),
                reason: "must not contain whitespace",
            });
        }

        Ok(LineId(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LineId {
    type Error = InvalidLineId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LineId::parse(&value)
    }
}

impl From<LineId> for String {
    fn from(id: LineId) -> Self {
        id.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
