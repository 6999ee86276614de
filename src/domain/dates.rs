//! Date parsing and contract/registry date reconciliation

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A date as it arrives from a spreadsheet cell or from scraped text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue<'a> {
    Structured(NaiveDate),
    Text(&'a str),
    Missing,
}

impl<'a> From<&'a str> for DateValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<Option<&'a str>> for DateValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map_or(Self::Missing, Self::Text)
    }
}

impl From<NaiveDate> for DateValue<'_> {
    fn from(value: NaiveDate) -> Self {
        Self::Structured(value)
    }
}

impl From<NaiveDateTime> for DateValue<'_> {
    fn from(value: NaiveDateTime) -> Self {
        Self::Structured(value.date())
    }
}

/// Outcome of comparing a contract date with a registry inclusion date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discrepancy {
    /// Contract predates registry inclusion
    Yes,
    No,
    /// At least one date could not be parsed
    NoData,
}

/// Textual formats in the order they are tried. The shape guard keeps a
/// four-digit pattern from swallowing a two-digit year.
static DATE_FORMATS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^\d{1,2}\.\d{1,2}\.\d{4}$", "%d.%m.%Y"),
        (r"^\d{1,2}/\d{1,2}/\d{4}$", "%d/%m/%Y"),
        (r"^\d{4}-\d{1,2}-\d{1,2}$", "%Y-%m-%d"),
        (r"^\d{1,2}-\d{1,2}-\d{4}$", "%d-%m-%Y"),
        (r"^\d{1,2}\.\d{1,2}\.\d{2}$", "%d.%m.%y"),
        (r"^\d{1,2}/\d{1,2}/\d{2}$", "%d/%m/%y"),
    ]
    .into_iter()
    .map(|(shape, format)| (Regex::new(shape).expect("static date shape"), format))
    .collect()
});

/// Parse a date from a structured value or one of the known text formats.
/// Blank and unrecognized input yields `None`.
#[must_use]
pub fn parse_date<'a>(value: impl Into<DateValue<'a>>) -> Option<NaiveDate> {
    match value.into() {
        DateValue::Structured(date) => Some(date),
        DateValue::Missing => None,
        DateValue::Text(text) => parse_date_text(text),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .filter(|(shape, _)| shape.is_match(text))
        .find_map(|(_, format)| NaiveDate::parse_from_str(text, format).ok())
}

/// Flag a contract signed before the counterparty entered the registry
#[must_use]
pub fn compare_dates<'a, 'b>(
    contract_date: impl Into<DateValue<'a>>,
    inclusion_date: impl Into<DateValue<'b>>,
) -> Discrepancy {
    match (parse_date(contract_date), parse_date(inclusion_date)) {
        (Some(contract), Some(inclusion)) if contract < inclusion => Discrepancy::Yes,
        (Some(_), Some(_)) => Discrepancy::No,
        _ => Discrepancy::NoData,
    }
}
