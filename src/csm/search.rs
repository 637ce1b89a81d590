use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::error;

/// How a search pattern is compared against record text.
///
/// `Regex` is accepted everywhere a search type is, but matching with it is
/// not supported: every comparison logs an error and fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchType {
    /// Case-insensitive substring.
    #[default]
    Txt,
    Exact,
    Regex,
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(SearchType::Txt),
            "exact" => Ok(SearchType::Exact),
            "regex" | "regexp" => Ok(SearchType::Regex),
            other => Err(format!("unknown search type '{}'", other)),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchType::Txt => "txt",
            SearchType::Exact => "exact",
            SearchType::Regex => "regex",
        };
        f.write_str(name)
    }
}

pub fn smatch(pattern: &str, text: &str, kind: SearchType) -> bool {
    match kind {
        SearchType::Txt => text.to_uppercase().contains(&pattern.to_uppercase()),
        SearchType::Exact => text == pattern,
        SearchType::Regex => {
            error!(pattern, "Regular expression search is not supported");
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountSorting {
    #[default]
    NoSort,
    ByName,
    ByDate,
}
