//! Extraction configuration for registry result pages
//!
//! Centralized selectors and trigger phrases. Every list is ordered: earlier
//! entries are more precise and are tried first.

use serde::{Deserialize, Serialize};

use crate::domain::record::labels;

/// Main extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub selectors: ExtractionSelectors,
    pub phrases: RegistryPhrases,
}

/// CSS selectors used by the extraction stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSelectors {
    /// Alert/warning blocks that may carry a "nothing found" notice
    pub alert_block: Vec<String>,

    /// Results table
    pub results_table: String,

    pub table_row: String,

    pub table_cell: String,

    /// Link wrapping the organization name inside the first cell
    pub name_link: String,

    /// Fallback locators for the organization name, most precise first
    pub name_fallbacks: Vec<String>,

    /// Blocks that may hold "ИНН: ..." / "ОГРН: ..." details
    pub detail_block: String,
}

impl Default for ExtractionSelectors {
    fn default() -> Self {
        Self {
            alert_block: vec![
                "div[class*='alert']".to_string(),
                "div[class*='Alert']".to_string(),
                "div[class*='warning']".to_string(),
                "div[class*='Warning']".to_string(),
            ],
            results_table: "table".to_string(),
            table_row: "tr".to_string(),
            table_cell: "td, th".to_string(),
            name_link: "a".to_string(),
            name_fallbacks: vec![
                "a[href*='view']".to_string(),
                ".organization-name".to_string(),
                ".company-name".to_string(),
                "td:first-child a".to_string(),
            ],
            detail_block: "div".to_string(),
        }
    }
}

/// Trigger phrases and text patterns of the registry page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryPhrases {
    /// Words inside an alert block that mean "no result"
    pub alert_not_found_words: Vec<String>,

    /// Greeting that opens the registry's "nothing found" banner
    pub dear_user: String,

    /// Wording inside the banner that confirms the empty result
    pub nothing_found: String,

    /// Result counter; a captured zero means "no result"
    pub found_count_pattern: String,

    /// Category phrases recognized in free text, in priority order
    pub category_keywords: Vec<String>,

    /// Script variable that marks a rendered category
    pub category_marker: String,

    /// Categories accepted when the marker is present
    pub marker_categories: Vec<String>,

    pub row_identifier_pattern: String,
    pub row_registration_pattern: String,
    pub detail_identifier_pattern: String,
    pub detail_registration_pattern: String,

    /// Shape of a registry date inside free text
    pub date_pattern: String,

    /// "excluded on <date>" variants; group 1 is the date
    pub exclusion_patterns: Vec<String>,

    /// Cell texts meaning "no value"
    pub placeholder_dashes: Vec<String>,
}

impl Default for RegistryPhrases {
    fn default() -> Self {
        Self {
            alert_not_found_words: vec![
                "не найдено".to_string(),
                "не найден".to_string(),
                "отсутствует".to_string(),
            ],
            dear_user: "Уважаемый пользователь".to_string(),
            nothing_found: "не найдено сведений".to_string(),
            found_count_pattern: r"Найдено записей:\s*(\d+)".to_string(),
            category_keywords: vec![
                labels::MICRO.to_string(),
                labels::SMALL.to_string(),
                labels::MEDIUM.to_string(),
            ],
            category_marker: "RSMP_CATEGORY".to_string(),
            marker_categories: vec![
                labels::MICRO.to_string(),
                labels::SMALL.to_string(),
                labels::MEDIUM.to_string(),
                labels::NOT_QUALIFYING.to_string(),
            ],
            row_identifier_pattern: r"ИНН[:\s]*(\d{10,12})".to_string(),
            row_registration_pattern: r"ОГРН[:\s]*(\d{13,15})".to_string(),
            detail_identifier_pattern: r"ИНН:\s*(\d{10,12})".to_string(),
            detail_registration_pattern: r"ОГРН:\s*(\d{13,15})".to_string(),
            date_pattern: r"\d{2}\.\d{2}\.\d{4}".to_string(),
            exclusion_patterns: vec![
                r"(?i)дата\s+исключения\s+из\s+реестра[:\s]*(\d{2}\.\d{2}\.\d{4})".to_string(),
                r"(?i)дата\s+исключения[:\s]*(\d{2}\.\d{2}\.\d{4})".to_string(),
                r"(?i)исключен[аоы]?\s+из\s+реестра[:\s]*(\d{2}\.\d{2}\.\d{4})".to_string(),
                r"(?i)исключен[аоы]?[:\s]+(\d{2}\.\d{2}\.\d{4})".to_string(),
                r"(?i)удален[аоы]?(?:\s+из\s+реестра)?[:\s]+(\d{2}\.\d{2}\.\d{4})".to_string(),
            ],
            placeholder_dashes: vec!["-".to_string(), "—".to_string(), "–".to_string()],
        }
    }
}
