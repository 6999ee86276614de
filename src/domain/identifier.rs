//! Business tax identifier (INN) value object
//!
//! An identifier is accepted only when, after stripping spaces and hyphens,
//! it consists of exactly 10 (legal entity) or 12 (sole proprietor) ASCII
//! digits. Nothing that fails this gate is ever sent to the registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lengths accepted by the registry search
pub const VALID_LENGTHS: [usize; 2] = [10, 12];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier is empty")]
    Empty,

    #[error("Identifier '{raw}' must contain 10 or 12 digits after removing spaces and hyphens")]
    InvalidFormat { raw: String },
}

/// Normalized INN
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Strip spaces and hyphens, then validate the remaining digits
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if raw.trim().is_empty() {
            return Err(IdentifierError::Empty);
        }

        let normalized: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();

        let digits_only = normalized.chars().all(|c| c.is_ascii_digit());
        if !digits_only || !VALID_LENGTHS.contains(&normalized.len()) {
            return Err(IdentifierError::InvalidFormat {
                raw: raw.to_string(),
            });
        }

        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
