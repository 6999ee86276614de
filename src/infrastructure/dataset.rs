//! Tabular dataset loaded from a spreadsheet
//!
//! The first sheet's header row names the columns; every following row is
//! one record. Rows keep their order from read to write.

pub mod xlsx;

pub use xlsx::{derive_output_path, read_workbook, write_workbook};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DateValue;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Missing required columns {missing:?}; available columns: {available:?}")]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Failed to read {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Unsupported spreadsheet format: {path:?}")]
    UnsupportedFormat { path: PathBuf },
}

/// One spreadsheet cell
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// Build a date cell, dropping a midnight time component
    pub fn from_datetime(value: NaiveDateTime) -> Self {
        if value.time().num_seconds_from_midnight() == 0 && value.time().nanosecond() == 0 {
            Self::Date(value.date())
        } else {
            Self::DateTime(value)
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Cell content as text; integral numbers are rendered without a fraction
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{n:.0}")),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Date(d) => Some(d.format("%d.%m.%Y").to_string()),
            Self::DateTime(dt) => Some(dt.format("%d.%m.%Y %H:%M:%S").to_string()),
        }
    }

    /// View for date parsing: structured cells stay structured
    pub fn as_date_value(&self) -> DateValue<'_> {
        match self {
            Self::Date(d) => DateValue::Structured(*d),
            Self::DateTime(dt) => DateValue::Structured(dt.date()),
            Self::Text(text) => DateValue::Text(text),
            _ => DateValue::Missing,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }
}

/// Header plus rows of cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        if row.len() < self.headers.len() {
            row.resize(self.headers.len(), CellValue::Empty);
        }
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Indices of the named columns, or the full list of missing ones
    pub fn require_columns(&self, names: &[&str]) -> Result<Vec<usize>, DatasetError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(ToString::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(DatasetError::MissingColumns {
                missing,
                available: self.headers.clone(),
            });
        }

        Ok(names.iter().filter_map(|name| self.column_index(name)).collect())
    }

    /// Index of the named column, appending it when absent
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        self.headers.len() - 1
    }

    pub fn get(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn set(&mut self, row: usize, column: usize, value: CellValue) {
        let Some(cells) = self.rows.get_mut(row) else {
            return;
        };
        if cells.len() <= column {
            cells.resize(column + 1, CellValue::Empty);
        }
        cells[column] = value;
    }
}
