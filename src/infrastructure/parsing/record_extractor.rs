//! Record extractor
//!
//! Runs the extraction cascade over a registry result page. Extraction never
//! fails: a page that matches nothing yields a not-found record.

use scraper::Html;
use tracing::{debug, trace};

use super::config::ExtractionConfig;
use super::context::{CompiledRules, ExtractionContext};
use super::strategies::{CASCADE, StageOutcome};
use super::{ContextualParser, ParsingResult};
use crate::domain::record::{LookupRecord, PartialRecord};
use crate::domain::Identifier;

/// Registry result page extractor
#[derive(Debug)]
pub struct RecordExtractor {
    rules: CompiledRules,
}

impl RecordExtractor {
    /// Create an extractor with the built-in selectors and phrases
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ExtractionConfig::default())
    }

    pub fn with_config(config: &ExtractionConfig) -> ParsingResult<Self> {
        Ok(Self {
            rules: CompiledRules::compile(config)?,
        })
    }

    /// Extract the lookup record for `identifier` from raw page HTML
    pub fn extract(&self, html: &str, identifier: &Identifier) -> LookupRecord {
        let document = Html::parse_document(html);
        self.parse_with_context(&document, identifier)
    }

    fn run_cascade(&self, document: &Html, identifier: &Identifier) -> PartialRecord {
        let ctx = ExtractionContext::new(document, &self.rules);
        let mut acc = PartialRecord::default();

        for stage in &CASCADE {
            match (stage.run)(&ctx, &acc) {
                StageOutcome::Skip => trace!("Stage '{}' skipped", stage.name),
                StageOutcome::Fill(partial) => {
                    debug!("Stage '{}' contributed fields for {}", stage.name, identifier);
                    acc.absorb(partial);
                }
                StageOutcome::Conclusive(record) => {
                    debug!("Stage '{}' concluded extraction for {}", stage.name, identifier);
                    return record;
                }
            }
        }

        acc
    }
}

impl ContextualParser for RecordExtractor {
    type Output = LookupRecord;
    type Context = Identifier;

    fn parse_with_context(&self, html: &Html, context: &Identifier) -> LookupRecord {
        let record = self.run_cascade(html, context).into_record();
        debug!(
            "Extracted record for {}: found={}, category={:?}",
            context, record.found, record.category
        );
        record
    }
}
