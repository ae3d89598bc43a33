//! Reference month - the `YYYY-MM` key every control and upload hangs off

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when a reference month string is malformed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid reference month '{0}': expected YYYY-MM")]
pub struct MonthFormatError(String);

/// A validated reference month in `YYYY-MM` form
///
/// Month directories, control keys and deterministic filenames all embed
/// this value, so it is validated once at the boundary and passed around
/// as a type from then on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceMonth(String);

impl ReferenceMonth {
    /// Parse and validate a `YYYY-MM` string
    pub fn parse(s: &str) -> Result<Self, MonthFormatError> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 7
            && bytes[4] == b'-'
            && bytes[..4].iter().all(u8::is_ascii_digit)
            && bytes[5..].iter().all(u8::is_ascii_digit);

        if !well_formed {
            return Err(MonthFormatError(s.to_string()));
        }

        let month: u8 = s[5..].parse().map_err(|_| MonthFormatError(s.to_string()))?;
        if !(1..=12).contains(&month) {
            return Err(MonthFormatError(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// The raw `YYYY-MM` string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The month number (1-12)
    pub fn month_number(&self) -> u8 {
        self.0[5..].parse().unwrap_or(0)
    }

    /// Human-readable name in Portuguese, e.g. "Março de 2025"
    pub fn display_name(&self) -> String {
        const MONTH_NAMES: [&str; 12] = [
            "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho", "Julho", "Agosto",
            "Setembro", "Outubro", "Novembro", "Dezembro",
        ];
        let year = &self.0[..4];
        let name = MONTH_NAMES[(self.month_number() - 1) as usize];
        format!("{} de {}", name, year)
    }
}

impl FromStr for ReferenceMonth {
    type Err = MonthFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceMonth {
    type Error = MonthFormatError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ReferenceMonth> for String {
    fn from(m: ReferenceMonth) -> String {
        m.0
    }
}

impl fmt::Display for ReferenceMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
