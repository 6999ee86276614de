//! Parsing error types for the record extractor
//!
//! Extraction ambiguity is not an error (it yields a not-found record); these
//! errors only cover broken extraction rules, reported when the extractor is
//! built.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern '{name}': {pattern} - {reason}")]
    InvalidPattern {
        name: String,
        pattern: String,
        reason: String,
    },

    #[error("No valid selectors compiled for '{rule}'. Errors: {errors:?}")]
    NoValidSelectors { rule: String, errors: Vec<String> },
}

impl ParsingError {
    pub fn invalid_selector(selector: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(name: &str, pattern: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidPattern {
            name: name.to_string(),
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
