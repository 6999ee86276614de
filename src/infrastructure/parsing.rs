//! HTML extraction for registry result pages
//!
//! A result page is turned into a `LookupRecord` by an ordered cascade of
//! extraction stages. Selector and phrase rules live in `config` and are
//! compiled once per extractor.

pub mod config;
pub mod context;
pub mod error;
pub mod record_extractor;
pub mod strategies;

// Re-export public types
pub use config::{ExtractionConfig, ExtractionSelectors, RegistryPhrases};
pub use context::{CompiledRules, ExtractionContext};
pub use error::{ParsingError, ParsingResult};
pub use record_extractor::RecordExtractor;
pub use strategies::{CASCADE, ExtractionStage, StageOutcome};

use scraper::Html;

/// Minimum number of cells for a table row to describe a registry record
pub const MIN_RECORD_CELLS: usize = 4;

/// Parser that needs information about the query alongside the document
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse a document with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output;
}
