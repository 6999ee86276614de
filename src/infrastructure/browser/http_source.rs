//! Plain HTTP transport with rate limiting
//!
//! Fetches the registry page with the identifier as a query parameter, then
//! the JSON search endpoint. No script runs, so this only helps when the
//! server renders results itself.

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{DocumentSource, LookupError};
use crate::domain::Identifier;
use crate::infrastructure::config::{HttpConfig, RegistryConfig, rmsp};

/// HTTP client with rate limiting for respectful fetching
pub struct HttpSource {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    search_url: String,
}

impl HttpSource {
    pub fn new(registry: &RegistryConfig, config: &HttpConfig) -> Result<Self, LookupError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&registry.user_agent)
                .map_err(|e| LookupError::Http(format!("invalid user agent: {e}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| LookupError::Http(format!("failed to create HTTP client: {e}")))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .ok_or_else(|| LookupError::Http("rate limit must be greater than 0".to_string()))?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            search_url: registry.search_url.clone(),
        })
    }

    /// Candidate query URLs in the order they are tried
    pub fn candidate_urls(&self, identifier: &Identifier) -> Result<Vec<Url>, LookupError> {
        let mut base = Url::parse(&self.search_url)
            .map_err(|e| LookupError::Http(format!("invalid search URL: {e}")))?;
        base.set_fragment(None);

        let mut urls: Vec<Url> = rmsp::QUERY_PARAMETERS
            .iter()
            .map(|param| {
                let mut url = base.clone();
                url.query_pairs_mut().append_pair(param, identifier.as_str());
                url
            })
            .collect();

        let mut api = base
            .join(rmsp::API_SEARCH_PATH)
            .map_err(|e| LookupError::Http(format!("invalid API URL: {e}")))?;
        api.set_query(None);
        api.query_pairs_mut()
            .append_pair(rmsp::API_IDENTIFIER_PARAMETER, identifier.as_str());
        urls.push(api);

        Ok(urls)
    }

    async fn get_text(&self, url: &Url) -> Result<String, String> {
        self.rate_limiter.until_ready().await;
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP status {}", response.status()));
        }

        response.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    async fn fetch(&self, identifier: &Identifier) -> Result<String, LookupError> {
        let mut failures = Vec::new();

        for url in self.candidate_urls(identifier)? {
            match self.get_text(&url).await {
                Ok(text) => {
                    info!("Fetched {} ({} chars)", url, text.len());
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Request to {} failed: {}", url, e);
                    failures.push(format!("{url}: {e}"));
                }
            }
        }

        Err(LookupError::Http(failures.join("; ")))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_follow_parameter_order() {
        let source = HttpSource::new(&RegistryConfig::default(), &HttpConfig::default()).unwrap();
        let id = Identifier::parse("7707083893").unwrap();
        let urls: Vec<String> = source
            .candidate_urls(&id)
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            urls,
            vec![
                "https://rmsp.nalog.ru/search.html?query=7707083893",
                "https://rmsp.nalog.ru/search.html?search=7707083893",
                "https://rmsp.nalog.ru/search.html?q=7707083893",
                "https://rmsp.nalog.ru/api/search?inn=7707083893",
            ]
        );
    }

    #[test]
    fn zero_rate_is_rejected() {
        let config = HttpConfig {
            max_requests_per_second: 0,
            ..HttpConfig::default()
        };
        assert!(HttpSource::new(&RegistryConfig::default(), &config).is_err());
    }
}
