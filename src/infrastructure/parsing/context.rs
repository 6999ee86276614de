//! Compiled extraction rules and the per-document extraction context

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use super::config::ExtractionConfig;
use super::{ParsingError, ParsingResult};

/// Elements whose text never reaches the rendered page
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Selectors and patterns compiled once per extractor
#[derive(Debug)]
pub struct CompiledRules {
    pub alert_blocks: Vec<Selector>,
    pub results_table: Selector,
    pub table_row: Selector,
    pub table_cell: Selector,
    pub data_cell: Selector,
    pub name_link: Selector,
    pub name_fallbacks: Vec<Selector>,
    pub detail_block: Selector,

    pub alert_not_found_words: Vec<String>,
    pub dear_user: String,
    pub nothing_found: String,
    pub found_count: Regex,
    pub category_keywords: Vec<String>,
    pub category_marker: String,
    pub marker_categories: Vec<String>,
    pub row_identifier: Regex,
    pub row_registration: Regex,
    pub detail_identifier: Regex,
    pub detail_registration: Regex,
    pub date: Regex,
    pub exclusion_patterns: Vec<Regex>,
    pub placeholder_dashes: Vec<String>,
}

impl CompiledRules {
    pub fn compile(config: &ExtractionConfig) -> ParsingResult<Self> {
        let selectors = &config.selectors;
        let phrases = &config.phrases;

        Ok(Self {
            alert_blocks: compile_selectors("alert_block", &selectors.alert_block)?,
            results_table: compile_selector(&selectors.results_table)?,
            table_row: compile_selector(&selectors.table_row)?,
            table_cell: compile_selector(&selectors.table_cell)?,
            data_cell: compile_selector("td")?,
            name_link: compile_selector(&selectors.name_link)?,
            name_fallbacks: compile_selectors("name_fallbacks", &selectors.name_fallbacks)?,
            detail_block: compile_selector(&selectors.detail_block)?,

            alert_not_found_words: phrases
                .alert_not_found_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
            dear_user: phrases.dear_user.clone(),
            nothing_found: phrases.nothing_found.to_lowercase(),
            found_count: compile_pattern("found_count", &phrases.found_count_pattern)?,
            category_keywords: phrases.category_keywords.clone(),
            category_marker: phrases.category_marker.clone(),
            marker_categories: phrases.marker_categories.clone(),
            row_identifier: compile_pattern("row_identifier", &phrases.row_identifier_pattern)?,
            row_registration: compile_pattern(
                "row_registration",
                &phrases.row_registration_pattern,
            )?,
            detail_identifier: compile_pattern(
                "detail_identifier",
                &phrases.detail_identifier_pattern,
            )?,
            detail_registration: compile_pattern(
                "detail_registration",
                &phrases.detail_registration_pattern,
            )?,
            date: compile_pattern("date", &phrases.date_pattern)?,
            exclusion_patterns: phrases
                .exclusion_patterns
                .iter()
                .map(|p| compile_pattern("exclusion", p))
                .collect::<ParsingResult<Vec<_>>>()?,
            placeholder_dashes: phrases.placeholder_dashes.clone(),
        })
    }

    /// True for cell texts that stand for "no value"
    pub fn is_placeholder(&self, text: &str) -> bool {
        let text = text.trim();
        text.is_empty() || self.placeholder_dashes.iter().any(|d| d == text)
    }
}

fn compile_selector(selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(selector, e))
}

/// Compile an ordered selector list, skipping broken entries as long as at
/// least one survives
fn compile_selectors(rule: &str, selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile selector '{}': {}", selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() && !selector_strings.is_empty() {
        return Err(ParsingError::NoValidSelectors {
            rule: rule.to_string(),
            errors,
        });
    }

    if !errors.is_empty() {
        debug!("Some '{}' selectors failed to compile: {}", rule, errors.join(", "));
    }

    Ok(selectors)
}

fn compile_pattern(name: &str, pattern: &str) -> ParsingResult<Regex> {
    Regex::new(pattern).map_err(|e| ParsingError::invalid_pattern(name, pattern, e))
}

/// Collapse whitespace runs (including non-breaking spaces) into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the element's direct text children only
pub fn own_text(element: ElementRef<'_>) -> String {
    let pieces: Vec<&str> = element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| &**t))
        .collect();
    normalize_whitespace(&pieces.join(" "))
}

fn document_text(document: &Html, include_hidden: bool) -> String {
    let pieces: Vec<&str> = document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| HIDDEN_ELEMENTS.contains(&el.value().name()));
            (include_hidden || !hidden).then_some(&**text)
        })
        .collect();
    normalize_whitespace(&pieces.join(" "))
}

/// Everything a stage may look at for one document
pub struct ExtractionContext<'a> {
    pub document: &'a Html,
    pub rules: &'a CompiledRules,
    /// Rendered text, script and style contents excluded
    pub visible_text: String,
    /// All text nodes, script contents included
    pub full_text: String,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(document: &'a Html, rules: &'a CompiledRules) -> Self {
        Self {
            document,
            rules,
            visible_text: document_text(document, false),
            full_text: document_text(document, true),
        }
    }

    /// First body row of the first table with enough cells to carry a record
    pub fn primary_row(&self) -> Option<ElementRef<'a>> {
        let table = self.document.select(&self.rules.results_table).next()?;
        let rows: Vec<ElementRef<'a>> = table.select(&self.rules.table_row).collect();
        if rows.len() <= 1 {
            return None;
        }

        rows.into_iter()
            .skip(1)
            .find(|row| row.select(&self.rules.table_cell).count() >= super::MIN_RECORD_CELLS)
    }
}
