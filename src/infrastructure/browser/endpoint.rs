//! Chrome DevTools HTTP endpoint discovery

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::LookupError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Response of `GET /json/version`
#[derive(Debug, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser", default)]
    pub browser: String,

    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// A running Chrome started with `--remote-debugging-port`
#[derive(Debug, Clone)]
pub struct DevToolsEndpoint {
    host: String,
    port: u16,
    client: Client,
}

impl DevToolsEndpoint {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            client: Client::new(),
        }
    }

    pub fn version_url(&self) -> String {
        format!("http://{}:{}/json/version", self.host, self.port)
    }

    fn unreachable(&self, reason: impl ToString) -> LookupError {
        LookupError::EndpointUnreachable {
            host: self.host.clone(),
            port: self.port,
            reason: reason.to_string(),
        }
    }

    /// Query the endpoint and return its browser-level websocket URL
    pub async fn probe(&self) -> Result<VersionInfo, LookupError> {
        let url = self.version_url();
        debug!("Probing DevTools endpoint: {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !response.status().is_success() {
            return Err(self.unreachable(format!("HTTP status {}", response.status())));
        }

        let info: VersionInfo = response
            .json()
            .await
            .map_err(|e| self.unreachable(format!("unexpected /json/version payload: {e}")))?;

        info!(
            "DevTools endpoint {}:{} is available ({})",
            self.host, self.port, info.browser
        );
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_payload_parses() {
        let payload = r#"{
            "Browser": "Chrome/120.0.6099.109",
            "Protocol-Version": "1.3",
            "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/browser/abc"
        }"#;
        let info: VersionInfo = serde_json::from_str(payload).unwrap();
        assert_eq!(info.browser, "Chrome/120.0.6099.109");
        assert!(info.web_socket_debugger_url.starts_with("ws://"));
    }

    #[test]
    fn version_url_uses_host_and_port() {
        let endpoint = DevToolsEndpoint::new("localhost", 9333);
        assert_eq!(endpoint.version_url(), "http://localhost:9333/json/version");
    }

    #[tokio::test]
    async fn closed_port_is_reported_as_unreachable() {
        // Port 9 (discard) is not expected to serve DevTools.
        let endpoint = DevToolsEndpoint::new("127.0.0.1", 9);
        let err = endpoint.probe().await.unwrap_err();
        assert!(matches!(err, LookupError::EndpointUnreachable { port: 9, .. }));
    }
}
