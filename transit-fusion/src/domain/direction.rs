//! Direction of travel along a line.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two canonical directions of a line.
///
/// Serialized with the operator's own vocabulary (`aller` / `retour`), which
/// is what downstream readers of the combined document expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "aller")]
    Outbound,
    #[serde(rename = "retour")]
    Inbound,
}

impl Direction {
    /// Both directions, outbound first.
    pub const ALL: [Direction; 2] = [Direction::Outbound, Direction::Inbound];

    /// Match a direction word (`Aller` / `Retour`), ignoring case.
    pub fn from_word(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("aller") {
            Some(Direction::Outbound)
        } else if word.eq_ignore_ascii_case("retour") {
            Some(Direction::Inbound)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outbound => "aller",
            Direction::Inbound => "retour",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
