//! Parser for the registry's compound `DIRECTION` field.
//!
//! The field lists the lines serving a stop followed by a parenthesized list
//! pairing each line with the destination it heads to from here:
//!
//! ```text
//! 07,01 (07 (Genève, Bout-du-Monde),01 (Genève, Jardin Botanique))
//! ```
//!
//! The two halves are delimited independently, so the only way to join them
//! is positionally. Any disagreement between them discards the whole field.

use crate::domain::{InvalidLineId, LineId};

/// Longest run of alphanumerics treated as a line identifier when splitting
/// the destination list.
const MAX_LINE_TOKEN_LEN: usize = 3;

/// A line together with a destination it serves from a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionPair {
    pub line: LineId,
    pub destination: String,
}

/// Why a direction field was discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectionFieldError {
    /// No parenthesized destination list
    #[error("no destination list in field")]
    MissingGroup,

    /// Parentheses never close
    #[error("unbalanced parentheses in field")]
    Unbalanced,

    /// Leading line list is empty
    #[error("no line identifiers in field")]
    NoLines,

    /// Destination list is empty
    #[error("no destination entries in field")]
    NoEntries,

    /// Line and destination lists have different lengths
    #[error("{lines} line(s) but {entries} destination entries")]
    CountMismatch { lines: usize, entries: usize },

    /// A line token is not a valid identifier
    #[error(transparent)]
    InvalidLine(#[from] InvalidLineId),
}

/// Parse a compound field using its own leading line list.
///
/// # Examples
///
/// ```
/// use transit_fusion::registry::parse_direction_field;
///
/// let pairs =
///     parse_direction_field("07,01 (07 (Genève, Bout-du-Monde),01 (Genève, Jardin Botanique))")
///         .unwrap();
/// assert_eq!(pairs[0].line.as_str(), "07");
/// assert_eq!(pairs[0].destination, "Genève, Bout-du-Monde");
/// assert_eq!(pairs[1].destination, "Genève, Jardin Botanique");
/// ```
pub fn parse_direction_field(field: &str) -> Result<Vec<DirectionPair>, DirectionFieldError> {
    let open = field.find('(').ok_or(DirectionFieldError::MissingGroup)?;
    parse_with_lines(&field[..open], field)
}

/// Parse a compound field, taking the line tokens from `line_list` instead of
/// the field's own leading list.
///
/// The registry publishes the line list in a separate column as well; that
/// column is the authoritative spelling of the identifiers.
pub fn parse_with_lines(
    line_list: &str,
    field: &str,
) -> Result<Vec<DirectionPair>, DirectionFieldError> {
    let open = field.find('(').ok_or(DirectionFieldError::MissingGroup)?;
    let inner = balanced_group(field, open).ok_or(DirectionFieldError::Unbalanced)?;

    let tokens = split_line_tokens(line_list);
    if tokens.is_empty() {
        return Err(DirectionFieldError::NoLines);
    }

    let entries = split_entries(inner);
    if entries.is_empty() {
        return Err(DirectionFieldError::NoEntries);
    }

    if tokens.len() != entries.len() {
        return Err(DirectionFieldError::CountMismatch {
            lines: tokens.len(),
            entries: entries.len(),
        });
    }

    let lines = tokens
        .iter()
        .map(|t| LineId::parse(t))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(lines
        .into_iter()
        .zip(entries)
        .filter_map(|(line, entry)| {
            let destination = entry_destination(entry)?;
            Some(DirectionPair {
                line,
                destination: destination.to_string(),
            })
        })
        .collect())
}

/// Split a comma-joined line list into trimmed tokens.
///
/// A blank list has no tokens; blank tokens inside a list are kept so that
/// they fail identifier validation instead of shifting the pairing.
pub fn split_line_tokens(list: &str) -> Vec<&str> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    list.split(',').map(str::trim).collect()
}

/// Return the text inside the parenthesized group opening at byte `open`.
///
/// Scans with a depth counter so nested groups stay inside their parent.
/// Returns `None` if `open` is not a `(` or the group never closes.
pub fn balanced_group(text: &str, open: usize) -> Option<&str> {
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }

    let mut depth = 0usize;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..open + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split the inner destination list into `identifier (destination)` entries.
///
/// A comma separates two entries only when it is followed by optional
/// whitespace, one to three ASCII alphanumerics, optional whitespace and `(`.
/// Commas inside place names ("Genève, Bout-du-Monde") are left alone. The
/// check ignores nesting depth, so a destination that itself contains
/// `, AB (` is split in the wrong place; the resulting count mismatch then
/// discards the field.
pub fn split_entries(inner: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;

    for (i, ch) in inner.char_indices() {
        if ch == ',' && starts_with_line_token(&inner[i + 1..]) {
            push_entry(&mut entries, &inner[start..i]);
            start = i + 1;
        }
    }
    push_entry(&mut entries, &inner[start..]);

    entries
}

fn push_entry<'a>(entries: &mut Vec<&'a str>, entry: &'a str) {
    let entry = entry.trim();
    if !entry.is_empty() {
        entries.push(entry);
    }
}

/// Whether `rest` begins with `\s*[A-Za-z0-9]{1,3}\s*\(`.
fn starts_with_line_token(rest: &str) -> bool {
    let rest = rest.trim_start();
    let token_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();

    if token_len == 0 || token_len > MAX_LINE_TOKEN_LEN {
        return false;
    }

    rest[token_len..].trim_start().starts_with('(')
}

/// Destination of a single `identifier (destination)` entry, trimmed.
fn entry_destination(entry: &str) -> Option<&str> {
    let open = entry.find('(')?;
    let destination = balanced_group(entry, open)?.trim();
    if destination.is_empty() {
        None
    } else {
        Some(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(result: Vec<DirectionPair>) -> Vec<(String, String)> {
        result
            .into_iter()
            .map(|p| (p.line.to_string(), p.destination))
            .collect()
    }

    #[test]
    fn destinations_with_commas() {
        let result = parse_direction_field(
            "07,01 (07 (Genève, Bout-du-Monde),01 (Genève, Jardin Botanique))",
        )
        .unwrap();

        assert_eq!(
            pairs(result),
            vec![
                ("07".to_string(), "Genève, Bout-du-Monde".to_string()),
                ("01".to_string(), "Genève, Jardin Botanique".to_string()),
            ]
        );
    }

    #[test]
    fn three_lines_in_order() {
        let result = parse_direction_field(
            "07,01,05 (07 (Genève, Bout-du-Monde),01 (Genève, Jardin Botanique),05 (Genève-Aéroport, Terminal))",
        )
        .unwrap();

        let lines: Vec<_> = result.iter().map(|p| p.line.as_str()).collect();
        assert_eq!(lines, vec!["07", "01", "05"]);
        assert_eq!(result[2].destination, "Genève-Aéroport, Terminal");
    }

    #[test]
    fn nested_parentheses_in_destination() {
        let result = parse_direction_field("01 (01 (Genève (Gare Cornavin)))").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].destination, "Genève (Gare Cornavin)");
    }

    #[test]
    fn alphanumeric_line_identifiers() {
        let result = parse_direction_field("E,NA (E (Carouge, Rondeau),NA (Gy))").unwrap();
        assert_eq!(
            pairs(result),
            vec![
                ("E".to_string(), "Carouge, Rondeau".to_string()),
                ("NA".to_string(), "Gy".to_string()),
            ]
        );
    }

    #[test]
    fn separate_line_list_is_used_for_tokens() {
        let result = parse_with_lines("7,1", "07,01 (07 (Bout-du-Monde),01 (Jardin))").unwrap();
        let lines: Vec<_> = result.iter().map(|p| p.line.as_str()).collect();
        assert_eq!(lines, vec!["7", "1"]);
    }

    #[test]
    fn count_mismatch_discards_field() {
        let err = parse_direction_field("07,01 (07 (Bout-du-Monde))").unwrap_err();
        assert_eq!(
            err,
            DirectionFieldError::CountMismatch {
                lines: 2,
                entries: 1
            }
        );
    }

    #[test]
    fn missing_group() {
        assert_eq!(
            parse_direction_field("07,01"),
            Err(DirectionFieldError::MissingGroup)
        );
    }

    #[test]
    fn unbalanced_group() {
        assert_eq!(
            parse_direction_field("07 (07 (Bout-du-Monde)"),
            Err(DirectionFieldError::Unbalanced)
        );
    }

    #[test]
    fn empty_lists() {
        assert_eq!(
            parse_direction_field("(07 (Bout-du-Monde))"),
            Err(DirectionFieldError::NoLines)
        );
        assert_eq!(
            parse_direction_field("07 ()"),
            Err(DirectionFieldError::NoEntries)
        );
    }

    #[test]
    fn blank_token_discards_field() {
        assert!(matches!(
            parse_direction_field("07,,01 (07 (A),1 (B),01 (C))"),
            Err(DirectionFieldError::InvalidLine(_))
        ));
    }

    #[test]
    fn empty_destination_drops_only_that_pair() {
        let result = parse_direction_field("07,01 (07 (  ),01 (Jardin Botanique))").unwrap();
        assert_eq!(
            pairs(result),
            vec![("01".to_string(), "Jardin Botanique".to_string())]
        );
    }

    #[test]
    fn split_entries_keeps_place_name_commas() {
        assert_eq!(
            split_entries("07 (Genève, Bout-du-Monde), 01 (Lancy, Bachet)"),
            vec!["07 (Genève, Bout-du-Monde)", "01 (Lancy, Bachet)"]
        );
    }

    #[test]
    fn split_entries_known_misfire() {
        // A short capitalised word followed by a parenthesis looks like a
        // line identifier, so the place name is cut in two.
        assert_eq!(
            split_entries("12 (Genève, GE (Gare)),15 (Lancy)"),
            vec!["12 (Genève", "GE (Gare))", "15 (Lancy)"]
        );
        assert!(matches!(
            parse_direction_field("12,15 (12 (Genève, GE (Gare)),15 (Lancy))"),
            Err(DirectionFieldError::CountMismatch {
                lines: 2,
                entries: 3
            })
        ));
    }

    #[test]
    fn balanced_group_requires_open_paren() {
        assert_eq!(balanced_group("a(b)", 0), None);
        assert_eq!(balanced_group("a(b(c))d", 1), Some("b(c)"));
        assert_eq!(balanced_group("a(b(c)", 1), None);
    }
}
