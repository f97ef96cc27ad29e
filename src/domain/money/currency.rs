//! Currency units

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// ISO 4217 codes this crate knows the minor-unit scale of
const KNOWN_CURRENCIES: &[(&str, u32)] = &[
    ("TWD", 2),
    ("USD", 2),
    ("EUR", 2),
    ("GBP", 2),
    ("CNY", 2),
    ("HKD", 2),
    ("JPY", 0),
    ("KRW", 0),
];

/// A currency unit: a three-letter code plus the number of decimal places
/// a minor unit represents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency {
    code: String,
    scale: u32,
}

impl Currency {
    /// Looks up a known currency by its ISO code
    pub fn of(code: &str) -> Result<Self, DomainError> {
        let upper = code.trim().to_ascii_uppercase();

        KNOWN_CURRENCIES
            .iter()
            .find(|(known, _)| *known == upper)
            .map(|(known, scale)| Self {
                code: (*known).to_string(),
                scale: *scale,
            })
            .ok_or_else(|| DomainError::validation(format!("Unknown currency code: {}", code)))
    }

    /// Creates a currency with an explicit scale
    pub fn with_scale(code: impl Into<String>, scale: u32) -> Result<Self, DomainError> {
        let code = code.into();

        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "Currency code must be three uppercase letters, got '{}'",
                code
            )));
        }

        if scale > 6 {
            return Err(DomainError::validation(format!(
                "Currency scale {} is out of range (max 6)",
                scale
            )));
        }

        Ok(Self { code, scale })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of decimal places of one minor unit
    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::of(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::of(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.code
    }
}
