//! Registry page transports
//!
//! A `DocumentSource` submits one identifier to the registry and returns the
//! rendered page markup. Three transports are available: attaching to a
//! running Chrome DevTools endpoint, launching a local headless Chrome, and a
//! plain HTTP fetch without script execution.

pub mod chrome_session;
pub mod endpoint;
pub mod http_source;

pub use chrome_session::{ChromeSession, SessionTimings};
pub use endpoint::DevToolsEndpoint;
pub use http_source::HttpSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Identifier;
use crate::infrastructure::config::AppConfig;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error(
        "DevTools endpoint {host}:{port} is unreachable ({reason}). \
         Start Chrome with --remote-debugging-port={port} and retry"
    )]
    EndpointUnreachable {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Failed to start browser session: {0}")]
    Session(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Search field not found (tried: {})", tried.join(", "))]
    SearchFieldNotFound { tried: Vec<String> },

    #[error("Browser interaction failed: {0}")]
    Interaction(String),

    #[error("HTTP lookup failed: {0}")]
    Http(String),

    #[error("Browser task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Transport used to reach the registry
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Running Chrome with a DevTools endpoint
    #[default]
    Attach,
    /// Local headless Chrome launched per query
    Launch,
    /// Direct HTTP fetch, no script execution
    Http,
}

/// Submits a registry query and returns the resulting page markup
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, identifier: &Identifier) -> Result<String, LookupError>;

    /// Short transport name for logs
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: DocumentSource + ?Sized> DocumentSource for Box<T> {
    async fn fetch(&self, identifier: &Identifier) -> Result<String, LookupError> {
        (**self).fetch(identifier).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Build the document source selected by the configuration
pub fn build_source(config: &AppConfig) -> Result<Box<dyn DocumentSource>, LookupError> {
    let source: Box<dyn DocumentSource> = match config.browser.transport {
        Transport::Attach => Box::new(ChromeSession::attach(
            DevToolsEndpoint::new(&config.browser.host, config.browser.port),
            &config.registry,
            &config.browser,
        )),
        Transport::Launch => Box::new(ChromeSession::launch(&config.registry, &config.browser)),
        Transport::Http => Box::new(HttpSource::new(&config.registry, &config.http)?),
    };
    Ok(source)
}
