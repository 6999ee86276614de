//! Chrome DevTools session driver
//!
//! One tab per query: navigate to the search page, fill the identifier
//! field, submit, wait for the results and capture the rendered markup.
//! `headless_chrome` is a blocking client, so every query runs inside
//! `spawn_blocking`.

use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::endpoint::DevToolsEndpoint;
use super::{DocumentSource, LookupError};
use crate::domain::Identifier;
use crate::infrastructure::config::{BrowserConfig, RegistryConfig, rmsp};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(120);

/// Waits applied while driving the search form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimings {
    pub render_settle: Duration,
    pub element_timeout: Duration,
    pub post_submit_delay: Duration,
    pub results_timeout: Duration,
    pub navigation_timeout: Duration,
}

impl SessionTimings {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            render_settle: Duration::from_millis(config.render_settle_ms),
            element_timeout: Duration::from_millis(config.element_timeout_ms),
            post_submit_delay: Duration::from_millis(config.post_submit_delay_ms),
            results_timeout: Duration::from_millis(config.results_timeout_ms),
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
        }
    }
}

#[derive(Debug, Clone)]
struct LaunchSettings {
    headless: bool,
    sandbox: bool,
    window_size: (u32, u32),
}

#[derive(Debug, Clone)]
enum SessionMode {
    Attach(DevToolsEndpoint),
    Launch(LaunchSettings),
}

/// Resolved browser to open inside the blocking task
enum BrowserTarget {
    Remote { ws_url: String },
    Local(LaunchSettings),
}

/// Browser-backed document source
#[derive(Debug, Clone)]
pub struct ChromeSession {
    mode: SessionMode,
    search_url: String,
    timings: SessionTimings,
}

impl ChromeSession {
    /// Attach to an already running Chrome; the remote browser is never closed
    pub fn attach(endpoint: DevToolsEndpoint, registry: &RegistryConfig, browser: &BrowserConfig) -> Self {
        Self {
            mode: SessionMode::Attach(endpoint),
            search_url: registry.search_url.clone(),
            timings: SessionTimings::from_config(browser),
        }
    }

    /// Launch a local Chrome for each query
    pub fn launch(registry: &RegistryConfig, browser: &BrowserConfig) -> Self {
        Self {
            mode: SessionMode::Launch(LaunchSettings {
                headless: browser.headless,
                sandbox: browser.sandbox,
                window_size: (browser.window_width, browser.window_height),
            }),
            search_url: registry.search_url.clone(),
            timings: SessionTimings::from_config(browser),
        }
    }
}

#[async_trait]
impl DocumentSource for ChromeSession {
    async fn fetch(&self, identifier: &Identifier) -> Result<String, LookupError> {
        let target = match &self.mode {
            SessionMode::Attach(endpoint) => BrowserTarget::Remote {
                ws_url: endpoint.probe().await?.web_socket_debugger_url,
            },
            SessionMode::Launch(settings) => BrowserTarget::Local(settings.clone()),
        };

        let url = self.search_url.clone();
        let query = identifier.as_str().to_string();
        let timings = self.timings.clone();

        tokio::task::spawn_blocking(move || run_query(target, &url, &query, &timings)).await?
    }

    fn name(&self) -> &'static str {
        match self.mode {
            SessionMode::Attach(_) => "attach",
            SessionMode::Launch(_) => "launch",
        }
    }
}

fn interaction(context: &str) -> impl Fn(anyhow::Error) -> LookupError + '_ {
    move |e| LookupError::Interaction(format!("{context}: {e}"))
}

fn open_browser(target: BrowserTarget) -> Result<Browser, LookupError> {
    match target {
        BrowserTarget::Remote { ws_url } => {
            debug!("Connecting to {}", ws_url);
            Browser::connect(ws_url).map_err(|e| LookupError::Session(e.to_string()))
        }
        BrowserTarget::Local(settings) => {
            let options = LaunchOptions::default_builder()
                .headless(settings.headless)
                .sandbox(settings.sandbox)
                .window_size(Some(settings.window_size))
                .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
                .build()
                .map_err(|e| LookupError::Session(e.to_string()))?;
            debug!("Launching local Chrome (headless: {})", settings.headless);
            Browser::new(options).map_err(|e| LookupError::Session(e.to_string()))
        }
    }
}

fn run_query(
    target: BrowserTarget,
    url: &str,
    query: &str,
    timings: &SessionTimings,
) -> Result<String, LookupError> {
    let browser = open_browser(target)?;
    let tab = browser
        .new_tab()
        .map_err(|e| LookupError::Session(format!("failed to open tab: {e}")))?;
    tab.set_default_timeout(timings.navigation_timeout);

    let result = drive_search(&tab, url, query, timings);

    if let Err(e) = tab.close(true) {
        warn!("Failed to close tab: {}", e);
    }
    result
}

fn drive_search(
    tab: &Tab,
    url: &str,
    query: &str,
    timings: &SessionTimings,
) -> Result<String, LookupError> {
    let navigation = |e: anyhow::Error| LookupError::Navigation {
        url: url.to_string(),
        reason: e.to_string(),
    };

    info!("Opening registry search page for {}", query);
    tab.navigate_to(url).map_err(navigation)?;
    tab.wait_until_navigated().map_err(navigation)?;
    thread::sleep(timings.render_settle);

    let input = find_search_field(tab, timings.element_timeout)?;
    input.click().map_err(interaction("focus search field"))?;
    input
        .call_js_fn("function() { this.value = ''; }", vec![], false)
        .map_err(interaction("clear search field"))?;
    input.type_into(query).map_err(interaction("type identifier"))?;

    if !click_submit(tab)? {
        debug!("No submit control found, pressing Enter");
        tab.press_key("Enter").map_err(interaction("press Enter"))?;
    }

    thread::sleep(timings.post_submit_delay);
    if !wait_for_results(tab, timings.results_timeout) {
        warn!(
            "Results for {} did not render within {:?}, capturing page as is",
            query, timings.results_timeout
        );
    }

    tab.get_content().map_err(interaction("capture page"))
}

fn find_search_field(tab: &Tab, timeout: Duration) -> Result<Element<'_>, LookupError> {
    for selector in rmsp::SEARCH_FIELD_SELECTORS {
        match tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(element) => {
                debug!("Search field located with '{}'", selector);
                return Ok(element);
            }
            Err(e) => debug!("Search field candidate '{}' not found: {}", selector, e),
        }
    }

    Err(LookupError::SearchFieldNotFound {
        tried: rmsp::SEARCH_FIELD_SELECTORS
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

fn submit_button_xpath(caption: &str) -> String {
    format!("//button[contains(normalize-space(.), '{caption}')]")
}

/// Click the first submit control found; false when there is none
fn click_submit(tab: &Tab) -> Result<bool, LookupError> {
    for caption in rmsp::SUBMIT_BUTTON_TEXTS {
        if let Ok(button) = tab.find_element_by_xpath(&submit_button_xpath(caption)) {
            debug!("Submitting with button '{}'", caption);
            button.click().map_err(interaction("click submit button"))?;
            return Ok(true);
        }
    }

    for selector in rmsp::SUBMIT_SELECTORS {
        if let Ok(control) = tab.find_element(selector) {
            debug!("Submitting with '{}'", selector);
            control.click().map_err(interaction("click submit control"))?;
            return Ok(true);
        }
    }

    Ok(false)
}

fn results_probe_script() -> String {
    format!(
        "(() => !!document.querySelector('table') || \
         Array.from(document.querySelectorAll('div')).some(d => d.textContent.includes('{}')))()",
        rmsp::DEAR_USER
    )
}

/// Poll until a results table or the registry banner appears
fn wait_for_results(tab: &Tab, timeout: Duration) -> bool {
    let script = results_probe_script();
    let deadline = Instant::now() + timeout;

    loop {
        match tab.evaluate(&script, false) {
            Ok(object) if object.value == Some(serde_json::Value::Bool(true)) => return true,
            Ok(_) => {}
            Err(e) => debug!("Results probe failed: {}", e),
        }

        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timings_follow_configuration() {
        let config = BrowserConfig {
            render_settle_ms: 100,
            results_timeout_ms: 2_000,
            ..BrowserConfig::default()
        };
        let timings = SessionTimings::from_config(&config);
        assert_eq!(timings.render_settle, Duration::from_millis(100));
        assert_eq!(timings.results_timeout, Duration::from_secs(2));
        assert_eq!(timings.post_submit_delay, Duration::from_secs(5));
    }

    #[test]
    fn submit_xpath_matches_by_caption() {
        assert_eq!(
            submit_button_xpath("Найти"),
            "//button[contains(normalize-space(.), 'Найти')]"
        );
    }

    #[test]
    fn results_probe_looks_for_table_and_banner() {
        let script = results_probe_script();
        assert!(script.contains("querySelector('table')"));
        assert!(script.contains("Уважаемый пользователь"));
    }

    // Driver outcomes against local pages. They need a Chrome binary, so run
    // them with `cargo test -- --ignored`.

    fn quick_timings() -> SessionTimings {
        SessionTimings {
            render_settle: Duration::from_millis(100),
            element_timeout: Duration::from_millis(300),
            post_submit_delay: Duration::from_millis(100),
            results_timeout: Duration::from_millis(500),
            navigation_timeout: Duration::from_secs(10),
        }
    }

    fn local_chrome() -> BrowserTarget {
        BrowserTarget::Local(LaunchSettings {
            headless: true,
            sandbox: false,
            window_size: (1280, 800),
        })
    }

    fn drive_page(html: &str) -> Result<String, LookupError> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.html");
        std::fs::write(&path, html).unwrap();
        let url = url::Url::from_file_path(&path).unwrap();
        run_query(local_chrome(), url.as_str(), "7707083893", &quick_timings())
    }

    #[test]
    #[ignore = "requires a local Chrome"]
    fn page_without_search_field_reports_every_candidate() {
        let result = drive_page("<html><body><p>Технические работы</p></body></html>");
        match result {
            Err(LookupError::SearchFieldNotFound { tried }) => {
                assert_eq!(tried.len(), rmsp::SEARCH_FIELD_SELECTORS.len());
            }
            other => panic!("expected missing search field, got {other:?}"),
        }
    }

    #[test]
    #[ignore = "requires a local Chrome"]
    fn enter_submits_when_no_button_exists() {
        let html = r#"<html><head><meta charset="utf-8"></head><body>
            <input type="text" placeholder="ИНН" onkeydown="if (event.key === 'Enter') {
                document.body.insertAdjacentHTML('beforeend',
                    '<table><tr><td>entered ' + this.value + '</td></tr></table>');
            }">
            </body></html>"#;
        let content = drive_page(html).unwrap();
        assert!(content.contains("entered 7707083893"));
    }

    #[test]
    #[ignore = "requires a local Chrome"]
    fn caption_button_is_clicked() {
        let html = r#"<html><head><meta charset="utf-8"></head><body>
            <input type="text" id="search-input">
            <button onclick="document.body.insertAdjacentHTML('beforeend',
                '<table><tr><td>clicked ' + document.getElementById('search-input').value + '</td></tr></table>')">
                Найти</button>
            </body></html>"#;
        let content = drive_page(html).unwrap();
        assert!(content.contains("clicked 7707083893"));
    }

    #[test]
    #[ignore = "requires a local Chrome"]
    fn page_is_captured_when_results_never_render() {
        let html = r#"<html><head><meta charset="utf-8"></head><body>
            <input type="text" name="searchQuery"><p>Загрузка...</p>
            </body></html>"#;
        let content = drive_page(html).unwrap();
        assert!(content.contains("Загрузка..."));
        assert!(!content.contains("<table"));
    }

    #[test]
    fn session_names_follow_mode() {
        let registry = RegistryConfig::default();
        let browser = BrowserConfig::default();
        assert_eq!(ChromeSession::launch(&registry, &browser).name(), "launch");
        let endpoint = DevToolsEndpoint::new("127.0.0.1", 9222);
        assert_eq!(ChromeSession::attach(endpoint, &registry, &browser).name(), "attach");
    }
}
