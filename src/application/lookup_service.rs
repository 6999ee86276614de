//! Single registry lookup: validate, fetch, extract

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Identifier, IdentifierError, LookupRecord};
use crate::infrastructure::browser::{DocumentSource, LookupError};
use crate::infrastructure::parsing::RecordExtractor;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    #[error(transparent)]
    Transport(#[from] LookupError),
}

/// Registry lookup over an injected document source
pub struct RegistryLookup<S> {
    source: S,
    extractor: RecordExtractor,
}

impl<S: DocumentSource> RegistryLookup<S> {
    pub fn new(source: S, extractor: RecordExtractor) -> Self {
        Self { source, extractor }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query the registry for an already validated identifier
    pub async fn lookup(&self, identifier: &Identifier) -> Result<LookupRecord, LookupError> {
        debug!("Querying registry for {} via {}", identifier, self.source.name());
        let html = self.source.fetch(identifier).await?;
        let record = self.extractor.extract(&html, identifier);
        info!(
            "Lookup {}: found={}, category={}",
            identifier,
            record.found,
            record.category.as_deref().unwrap_or("-")
        );
        Ok(record)
    }

    /// Validate raw input first; nothing is fetched for invalid identifiers
    pub async fn lookup_raw(&self, raw: &str) -> Result<LookupRecord, QueryError> {
        let identifier = Identifier::parse(raw)?;
        Ok(self.lookup(&identifier).await?)
    }
}
