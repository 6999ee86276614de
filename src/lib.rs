//! rmsp-lookup - SME registry lookup by INN
//!
//! Looks up businesses in the Russian SME registry search page through a
//! rendering browser session, extracts the registry record from the result
//! page and reconciles the inclusion date with contract dates from a
//! spreadsheet.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{BatchProcessor, BatchSummary, RegistryLookup};
pub use domain::{Discrepancy, Identifier, LookupRecord, OutputFields};
pub use infrastructure::{AppConfig, DocumentSource, RecordExtractor};
