//! Domain module - identifiers, lookup records, date reconciliation
//!
//! Everything here is pure: no network, no file system. The application
//! layer wires these types to the browser driver and the dataset store.

pub mod dates;
pub mod identifier;
pub mod output;
pub mod record;

pub use dates::{DateValue, Discrepancy, compare_dates, parse_date};
pub use identifier::{Identifier, IdentifierError};
pub use output::{OutputFields, OutputLabels};
pub use record::{LookupRecord, PartialRecord, RegistryCategory};
