//! Application layer module
//!
//! Use cases that wire the domain to the browser transports and the
//! spreadsheet store.

pub mod batch_processor;
pub mod lookup_service;

pub use batch_processor::{BatchProcessor, BatchSummary};
pub use lookup_service::{QueryError, RegistryLookup};
