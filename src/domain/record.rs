//! Registry lookup record
//!
//! `LookupRecord` is the immutable result of one registry query. Extraction
//! stages build it incrementally through `PartialRecord`, where a later stage
//! may only fill fields that earlier stages left empty.

use serde::{Deserialize, Serialize};

/// Canonical category labels used by the registry
pub mod labels {
    pub const MICRO: &str = "Микропредприятие";
    pub const SMALL: &str = "Малое предприятие";
    pub const MEDIUM: &str = "Среднее предприятие";
    pub const NOT_QUALIFYING: &str = "Не является субъектом МСП";
}

/// Typed view over the registry category text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryCategory {
    Micro,
    Small,
    Medium,
    NotQualifying,
    Other(String),
}

impl RegistryCategory {
    /// Classify category text, ignoring case and surrounding whitespace
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let normalized = text.trim().to_lowercase();
        match normalized.as_str() {
            s if s == labels::MICRO.to_lowercase() => Self::Micro,
            s if s == labels::SMALL.to_lowercase() => Self::Small,
            s if s == labels::MEDIUM.to_lowercase() => Self::Medium,
            s if s == labels::NOT_QUALIFYING.to_lowercase() => Self::NotQualifying,
            _ => Self::Other(text.trim().to_string()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Micro => labels::MICRO,
            Self::Small => labels::SMALL,
            Self::Medium => labels::MEDIUM,
            Self::NotQualifying => labels::NOT_QUALIFYING,
            Self::Other(text) => text,
        }
    }

    /// Only the "not a qualifying business" category carries an exclusion date
    #[must_use]
    pub const fn carries_exclusion_date(&self) -> bool {
        matches!(self, Self::NotQualifying)
    }
}

/// Result of a single registry query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub found: bool,
    pub organization_name: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub inclusion_date: Option<String>,
    pub exclusion_date: Option<String>,
    /// INN as printed on the result page, if any
    pub identifier: Option<String>,
    /// OGRN as printed on the result page, if any
    pub registration_number: Option<String>,
    pub message: Option<String>,
}

impl LookupRecord {
    /// Default record for rows that never reached the registry or failed
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            found: false,
            message: Some(message).filter(|m| !m.is_empty()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn category_kind(&self) -> Option<RegistryCategory> {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(RegistryCategory::from_text)
    }

    #[must_use]
    pub fn is_not_qualifying(&self) -> bool {
        self.category_kind()
            .is_some_and(|c| c.carries_exclusion_date())
    }
}

/// Fields produced by one extraction stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRecord {
    pub found: bool,
    pub organization_name: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub inclusion_date: Option<String>,
    pub exclusion_date: Option<String>,
    pub identifier: Option<String>,
    pub registration_number: Option<String>,
    pub message: Option<String>,
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.as_deref().is_none_or(str::is_empty) {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            *slot = Some(v);
        }
    }
}

impl PartialRecord {
    /// Merge `other` into `self`, keeping every field already set
    pub fn absorb(&mut self, other: Self) {
        self.found |= other.found;
        fill(&mut self.organization_name, other.organization_name);
        fill(&mut self.category, other.category);
        fill(&mut self.region, other.region);
        fill(&mut self.inclusion_date, other.inclusion_date);
        fill(&mut self.exclusion_date, other.exclusion_date);
        fill(&mut self.identifier, other.identifier);
        fill(&mut self.registration_number, other.registration_number);
        fill(&mut self.message, other.message);
    }

    #[must_use]
    pub fn category_kind(&self) -> Option<RegistryCategory> {
        self.category.as_deref().map(RegistryCategory::from_text)
    }

    #[must_use]
    pub fn into_record(self) -> LookupRecord {
        LookupRecord {
            found: self.found,
            organization_name: self.organization_name,
            category: self.category,
            region: self.region,
            inclusion_date: self.inclusion_date,
            exclusion_date: self.exclusion_date,
            identifier: self.identifier,
            registration_number: self.registration_number,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_classification_ignores_case_and_padding() {
        assert_eq!(RegistryCategory::from_text("  малое предприятие "), RegistryCategory::Small);
        assert_eq!(
            RegistryCategory::from_text("НЕ ЯВЛЯЕТСЯ СУБЪЕКТОМ МСП"),
            RegistryCategory::NotQualifying
        );
        assert_eq!(
            RegistryCategory::from_text("Крупное"),
            RegistryCategory::Other("Крупное".to_string())
        );
    }

    #[test]
    fn absorb_keeps_earlier_values() {
        let mut acc = PartialRecord {
            found: true,
            category: Some(labels::SMALL.to_string()),
            ..PartialRecord::default()
        };
        acc.absorb(PartialRecord {
            category: Some(labels::MICRO.to_string()),
            inclusion_date: Some("10.08.2016".to_string()),
            ..PartialRecord::default()
        });

        assert!(acc.found);
        assert_eq!(acc.category.as_deref(), Some(labels::SMALL));
        assert_eq!(acc.inclusion_date.as_deref(), Some("10.08.2016"));
    }

    #[test]
    fn absorb_replaces_empty_strings() {
        let mut acc = PartialRecord {
            region: Some(String::new()),
            ..PartialRecord::default()
        };
        acc.absorb(PartialRecord {
            region: Some("77 - г. Москва".to_string()),
            ..PartialRecord::default()
        });
        assert_eq!(acc.region.as_deref(), Some("77 - г. Москва"));
    }

    #[test]
    fn not_found_record_drops_blank_message() {
        let record = LookupRecord::not_found("");
        assert!(!record.found);
        assert!(record.message.is_none());
        assert!(!record.is_not_qualifying());
    }
}
