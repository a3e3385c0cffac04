//! Tie-break rules
//!
//! Decide which candidate replaces a parameter value that is no longer
//! allowed by its filters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Smallest remaining candidate value
    #[default]
    SmallestValue,

    /// Earliest remaining candidate in catalog declaration order
    FirstDeclared,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SmallestValue => "smallest_value",
            Self::FirstDeclared => "first_declared",
        }
    }
}

impl FromStr for TieBreak {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "smallest_value" => Ok(Self::SmallestValue),
            "first_declared" => Ok(Self::FirstDeclared),
            _ => Err(ConfigError::UnknownTieBreak(s.to_string())),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            "smallest_value".parse::<TieBreak>().unwrap(),
            TieBreak::SmallestValue
        );
        assert_eq!(
            "First-Declared".parse::<TieBreak>().unwrap(),
            TieBreak::FirstDeclared
        );
        assert!(matches!(
            "random".parse::<TieBreak>(),
            Err(ConfigError::UnknownTieBreak(_))
        ));
    }

    #[test]
    fn test_default_and_display() {
        assert_eq!(TieBreak::default(), TieBreak::SmallestValue);
        assert_eq!(TieBreak::FirstDeclared.to_string(), "first_declared");
    }
}
