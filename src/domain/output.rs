//! Derived per-row output values written back to the dataset

use serde::{Deserialize, Serialize};

use super::dates::{DateValue, Discrepancy, compare_dates};
use super::record::LookupRecord;

/// Localized cell texts for the derived columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLabels {
    pub yes: String,
    pub no: String,
    /// Written to the discrepancy column when a date could not be parsed
    pub no_data: String,
    /// Extracted exclusion-date texts treated as "no date" (case-insensitive)
    pub exclusion_placeholders: Vec<String>,
}

impl Default for OutputLabels {
    fn default() -> Self {
        Self {
            yes: "да".to_string(),
            no: "нет".to_string(),
            no_data: "нет данных".to_string(),
            exclusion_placeholders: ["не указана", "не найдена", "(пусто)", "пусто"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl OutputLabels {
    #[must_use]
    pub fn discrepancy(&self, value: Discrepancy) -> &str {
        match value {
            Discrepancy::Yes => &self.yes,
            Discrepancy::No => &self.no,
            Discrepancy::NoData => &self.no_data,
        }
    }

    fn is_placeholder(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        text.is_empty()
            || self
                .exclusion_placeholders
                .iter()
                .any(|p| p.trim().to_lowercase() == text)
    }
}

/// The five derived values for one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFields {
    pub found: bool,
    pub category: String,
    pub inclusion_date: String,
    pub exclusion_date: String,
    pub discrepancy: Option<Discrepancy>,
}

impl OutputFields {
    /// Fields for a row that never produced a registry hit
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            found: false,
            category: String::new(),
            inclusion_date: String::new(),
            exclusion_date: String::new(),
            discrepancy: None,
        }
    }

    /// Merge a lookup record with the row's contract date.
    ///
    /// Non-found records yield empty fields regardless of what was extracted.
    /// The exclusion date survives only for the "not a qualifying business"
    /// category and only when it is not a known placeholder.
    #[must_use]
    pub fn from_record<'a>(
        record: &LookupRecord,
        contract_date: impl Into<DateValue<'a>>,
        labels: &OutputLabels,
    ) -> Self {
        if !record.found {
            return Self::not_found();
        }

        let category = record.category.clone().unwrap_or_default();
        let inclusion_date = record.inclusion_date.clone().unwrap_or_default();

        let exclusion_date = match record.exclusion_date.as_deref() {
            Some(text) if record.is_not_qualifying() && !labels.is_placeholder(text) => {
                text.trim().to_string()
            }
            _ => String::new(),
        };

        let discrepancy = compare_dates(contract_date, inclusion_date.as_str());

        Self {
            found: true,
            category,
            inclusion_date,
            exclusion_date,
            discrepancy: Some(discrepancy),
        }
    }

    /// Cell texts in output column order
    #[must_use]
    pub fn to_cells(&self, labels: &OutputLabels) -> [String; 5] {
        [
            if self.found { labels.yes.clone() } else { labels.no.clone() },
            self.category.clone(),
            self.inclusion_date.clone(),
            self.exclusion_date.clone(),
            self.discrepancy
                .map(|d| labels.discrepancy(d).to_string())
                .unwrap_or_default(),
        ]
    }
}
