//! Typed stand-ins for the literal placeholders used in the CSV files.
//! The literals only exist at the (de)serialization boundary.

use std::fmt;

/// Attribute value meaning "this attribute was not generated".
pub const NONE: &str = "NONE";
/// Result value meaning "no comparison exists for this record".
pub const NOT_APPLICABLE: &str = "N/A";

pub fn attribute_from_cell(cell: &str) -> Option<String> {
    (cell != NONE).then(|| cell.to_string())
}

pub fn attribute_to_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NONE.to_string())
}

/// What a record was compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counterpart {
    Record(u32),
    NotApplicable,
}

impl Counterpart {
    /// `Ok(None)` for an empty cell, `Err` for anything that is neither an id nor "N/A".
    pub fn from_cell(cell: &str) -> Result<Option<Self>, String> {
        match cell.trim() {
            "" => Ok(None),
            NOT_APPLICABLE => Ok(Some(Counterpart::NotApplicable)),
            other => parse_id(other)
                .map(|id| Some(Counterpart::Record(id)))
                .ok_or_else(|| format!("'{other}' is not a record id")),
        }
    }

    pub fn to_cell(value: &Option<Self>) -> String {
        value.map(|c| c.to_string()).unwrap_or_default()
    }
}

impl fmt::Display for Counterpart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counterpart::Record(id) => write!(f, "{id}"),
            Counterpart::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

/// A judge's verdict. Tokens are kept verbatim, including anomalies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Winner {
    Token(String),
    NotApplicable,
}

impl Winner {
    pub fn from_cell(cell: &str) -> Option<Self> {
        match cell {
            "" => None,
            NOT_APPLICABLE => Some(Winner::NotApplicable),
            other => Some(Winner::Token(other.to_string())),
        }
    }

    pub fn to_cell(value: &Option<Self>) -> String {
        match value {
            None => String::new(),
            Some(Winner::NotApplicable) => NOT_APPLICABLE.to_string(),
            Some(Winner::Token(token)) => token.clone(),
        }
    }
}

/// Ids are positive integers. Spreadsheet tools sometimes write them as "12.0".
pub fn parse_id(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    let cell = cell.strip_suffix(".0").unwrap_or(cell);
    cell.parse::<u32>().ok().filter(|id| *id > 0)
}

/// Scores are integers in [0, 100]; an empty cell is an unscored record.
pub fn parse_score(cell: &str) -> Option<u32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(0);
    }
    let cell = cell.strip_suffix(".0").unwrap_or(cell);
    cell.parse::<u32>().ok().filter(|s| *s <= 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_attribute_maps_to_option() {
        assert_eq!(attribute_from_cell("NONE"), None);
        assert_eq!(attribute_from_cell(""), Some(String::new()));
        assert_eq!(attribute_to_cell(&None), "NONE");
        assert_eq!(attribute_to_cell(&Some("Buddhist".into())), "Buddhist");
    }

    #[test]
    fn test_counterpart_cells() {
        assert_eq!(Counterpart::from_cell(""), Ok(None));
        assert_eq!(
            Counterpart::from_cell("N/A"),
            Ok(Some(Counterpart::NotApplicable))
        );
        assert_eq!(Counterpart::from_cell("17"), Ok(Some(Counterpart::Record(17))));
        assert_eq!(Counterpart::from_cell("17.0"), Ok(Some(Counterpart::Record(17))));
        assert!(Counterpart::from_cell("seventeen").is_err());
        assert!(Counterpart::from_cell("0").is_err());

        assert_eq!(Counterpart::to_cell(&None), "");
        assert_eq!(Counterpart::to_cell(&Some(Counterpart::NotApplicable)), "N/A");
        assert_eq!(Counterpart::to_cell(&Some(Counterpart::Record(3))), "3");
    }

    #[test]
    fn test_winner_keeps_tokens_verbatim() {
        assert_eq!(Winner::from_cell(""), None);
        assert_eq!(Winner::from_cell("N/A"), Some(Winner::NotApplicable));
        assert_eq!(
            Winner::from_cell("CV 2"),
            Some(Winner::Token("CV 2".to_string()))
        );
        assert_eq!(Winner::to_cell(&Some(Winner::Token("1".into()))), "1");
        assert_eq!(Winner::to_cell(&None), "");
    }

    #[test]
    fn test_score_parsing() {
        assert_eq!(parse_score("87"), Some(87));
        assert_eq!(parse_score("0"), Some(0));
        assert_eq!(parse_score(""), Some(0));
        assert_eq!(parse_score("64.0"), Some(64));
        assert_eq!(parse_score("101"), None);
        assert_eq!(parse_score("high"), None);
    }
}
