//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. Optional TOML file (explicit path, `rmsp-lookup.toml` in the working
//!    directory, or `<user config dir>/rmsp-lookup/config.toml`)
//! 3. Environment variables prefixed with `RMSP__`, e.g. `RMSP__BROWSER__PORT=9333`

#![allow(clippy::uninlined_format_args)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::OutputLabels;
use crate::infrastructure::browser::Transport;
use crate::infrastructure::parsing::ExtractionConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub browser: BrowserConfig,
    pub http: HttpConfig,
    pub batch: BatchConfig,
    pub extraction: ExtractionConfig,
    pub logging: LoggingConfig,
}

/// Target registry page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Search page URL
    pub search_url: String,

    /// User agent announced by the HTTP transport
    pub user_agent: String,
}

/// Rendering browser session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub transport: Transport,

    /// DevTools endpoint host (attach transport)
    pub host: String,

    /// DevTools endpoint port (attach transport)
    pub port: u16,

    /// Wait for the initial script-driven render after navigation
    pub render_settle_ms: u64,

    /// Bound for each search-field candidate
    pub element_timeout_ms: u64,

    /// Fixed delay after submitting the query
    pub post_submit_delay_ms: u64,

    /// Bound for the results poll after the fixed delay
    pub results_timeout_ms: u64,

    /// Navigation timeout
    pub navigation_timeout_ms: u64,

    pub window_width: u32,
    pub window_height: u32,

    /// Launch transport only
    pub headless: bool,

    /// Launch transport only
    pub sandbox: bool,
}

/// Plain HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

/// Spreadsheet column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub identifier: String,
    pub contract_date: String,
    pub found: String,
    pub category: String,
    pub inclusion_date: String,
    pub exclusion_date: String,
    pub discrepancy: String,
}

impl ColumnConfig {
    /// Derived column names in output order
    #[must_use]
    pub fn output_columns(&self) -> [&str; 5] {
        [
            &self.found,
            &self.category,
            &self.inclusion_date,
            &self.exclusion_date,
            &self.discrepancy,
        ]
    }

    #[must_use]
    pub fn required_columns(&self) -> [&str; 2] {
        [&self.identifier, &self.contract_date]
    }
}

/// Batch processing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pacing delay after each row in milliseconds
    pub row_delay_ms: u64,

    pub columns: ColumnConfig,

    pub labels: OutputLabels,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Log directory; defaults to `logs/` next to the executable
    pub directory: Option<PathBuf>,

    pub file_name: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Keep only the most recent log file (delete all others)
    pub keep_only_latest: bool,

    /// Module-specific level filters (e.g., "headless_chrome": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            search_url: rmsp::SEARCH_URL.to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            host: defaults::DEVTOOLS_HOST.to_string(),
            port: defaults::DEVTOOLS_PORT,
            render_settle_ms: defaults::RENDER_SETTLE_MS,
            element_timeout_ms: defaults::ELEMENT_TIMEOUT_MS,
            post_submit_delay_ms: defaults::POST_SUBMIT_DELAY_MS,
            results_timeout_ms: defaults::RESULTS_TIMEOUT_MS,
            navigation_timeout_ms: defaults::NAVIGATION_TIMEOUT_MS,
            window_width: defaults::WINDOW_WIDTH,
            window_height: defaults::WINDOW_HEIGHT,
            headless: true,
            sandbox: false,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::HTTP_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::HTTP_MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            identifier: rmsp::columns::IDENTIFIER.to_string(),
            contract_date: rmsp::columns::CONTRACT_DATE.to_string(),
            found: rmsp::columns::FOUND.to_string(),
            category: rmsp::columns::CATEGORY.to_string(),
            inclusion_date: rmsp::columns::INCLUSION_DATE.to_string(),
            exclusion_date: rmsp::columns::EXCLUSION_DATE.to_string(),
            discrepancy: rmsp::columns::DISCREPANCY.to_string(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            row_delay_ms: defaults::ROW_DELAY_MS,
            columns: ColumnConfig::default(),
            labels: OutputLabels::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            keep_only_latest: defaults::LOG_KEEP_ONLY_LATEST,
            module_filters: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// An explicit `path` must exist; the implicit locations are optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                builder = builder.add_source(config::File::from(path));
            }
            None => {
                for candidate in Self::implicit_config_files() {
                    debug!("Checking optional configuration file {}", candidate.display());
                    builder = builder.add_source(config::File::from(candidate).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Optional configuration files, lowest precedence first
    fn implicit_config_files() -> Vec<PathBuf> {
        let mut files = Vec::new();
        if let Some(dir) = Self::config_dir() {
            files.push(dir.join("config.toml"));
        }
        files.push(PathBuf::from(defaults::LOCAL_CONFIG_FILE));
        files
    }

    /// Per-user configuration directory
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR_NAME))
    }

    /// Validate settings that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.browser.port == 0 {
            return Err(ConfigError::Validation {
                message: "browser.port must be greater than 0".to_string(),
            });
        }

        for (name, value) in [
            ("browser.element_timeout_ms", self.browser.element_timeout_ms),
            ("browser.results_timeout_ms", self.browser.results_timeout_ms),
            ("browser.navigation_timeout_ms", self.browser.navigation_timeout_ms),
            ("http.timeout_seconds", self.http.timeout_seconds),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation {
                    message: format!("{} must be greater than 0", name),
                });
            }
        }

        if self.http.max_requests_per_second == 0 {
            return Err(ConfigError::Validation {
                message: "http.max_requests_per_second must be greater than 0".to_string(),
            });
        }

        let columns = &self.batch.columns;
        let all_columns = columns
            .required_columns()
            .into_iter()
            .chain(columns.output_columns());
        for column in all_columns {
            if column.trim().is_empty() {
                return Err(ConfigError::Validation {
                    message: "column names must not be empty".to_string(),
                });
            }
        }

        url::Url::parse(&self.registry.search_url).map_err(|e| ConfigError::Validation {
            message: format!("registry.search_url is not a valid URL: {}", e),
        })?;

        Ok(())
    }
}

/// SME registry constants
pub mod rmsp {
    /// Registry search page
    pub const SEARCH_URL: &str = "https://rmsp.nalog.ru/search.html#";

    /// Spreadsheet column names
    pub mod columns {
        pub const IDENTIFIER: &str = "ИНН";
        pub const CONTRACT_DATE: &str = "Дата заключения";
        pub const FOUND: &str = "СМСП Робот";
        pub const CATEGORY: &str = "Категория Робот";
        pub const INCLUSION_DATE: &str = "Дата включения Робот";
        pub const EXCLUSION_DATE: &str = "Дата исключения Робот";
        pub const DISCREPANCY: &str = "Расхождения в датах Робот";
    }

    /// Search field candidates, most precise first
    pub const SEARCH_FIELD_SELECTORS: [&str; 4] = [
        "input[placeholder*='ИНН']",
        "input[name*='search']",
        "input[id*='search']",
        "input[type='text']",
    ];

    /// Button captions that submit the search form
    pub const SUBMIT_BUTTON_TEXTS: [&str; 3] = ["Найти", "НАЙТИ", "Поиск"];

    pub const SUBMIT_SELECTORS: [&str; 2] = ["input[type='submit']", "button[type='submit']"];

    /// Query parameters tried by the HTTP transport, in order
    pub const QUERY_PARAMETERS: [&str; 3] = ["query", "search", "q"];

    /// JSON search endpoint, tried after the page candidates
    pub const API_SEARCH_PATH: &str = "/api/search";
    pub const API_IDENTIFIER_PARAMETER: &str = "inn";

    /// Greeting of the "nothing found" banner, also a results-ready marker
    pub const DEAR_USER: &str = "Уважаемый пользователь";
}

/// Default configuration values
pub mod defaults {
    /// Prefix of configuration environment variables
    pub const ENV_PREFIX: &str = "RMSP";

    pub const APP_DIR_NAME: &str = "rmsp-lookup";

    /// Configuration file looked up in the working directory
    pub const LOCAL_CONFIG_FILE: &str = "rmsp-lookup.toml";

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub const DEVTOOLS_HOST: &str = "127.0.0.1";

    /// Chrome `--remote-debugging-port`
    pub const DEVTOOLS_PORT: u16 = 9222;

    pub const RENDER_SETTLE_MS: u64 = 3_000;
    pub const ELEMENT_TIMEOUT_MS: u64 = 5_000;
    pub const POST_SUBMIT_DELAY_MS: u64 = 5_000;
    pub const RESULTS_TIMEOUT_MS: u64 = 10_000;
    pub const NAVIGATION_TIMEOUT_MS: u64 = 30_000;

    pub const WINDOW_WIDTH: u32 = 1920;
    pub const WINDOW_HEIGHT: u32 = 1080;

    pub const HTTP_TIMEOUT_SECONDS: u64 = 30;
    pub const HTTP_MAX_REQUESTS_PER_SECOND: u32 = 1;

    /// Pacing delay between rows in milliseconds
    pub const ROW_DELAY_MS: u64 = 1_000;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_NAME: &str = "rmsp-lookup.log";
    pub const LOG_MAX_FILES: u32 = 5;
    pub const LOG_AUTO_CLEANUP: bool = true;
    pub const LOG_KEEP_ONLY_LATEST: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.browser.port, 9222);
        assert_eq!(config.batch.row_delay_ms, 1_000);
        assert_eq!(config.batch.columns.identifier, "ИНН");
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = AppConfig::default();
        config.browser.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn blank_column_name_is_rejected() {
        let mut config = AppConfig::default();
        config.batch.columns.contract_date = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[browser]\nport = 9333\ntransport = \"http\"\n\n[batch]\nrow_delay_ms = 0\n\n[batch.columns]\nidentifier = \"INN\""
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.browser.port, 9333);
        assert_eq!(config.browser.transport, Transport::Http);
        assert_eq!(config.batch.row_delay_ms, 0);
        assert_eq!(config.batch.columns.identifier, "INN");
        assert_eq!(config.batch.columns.contract_date, "Дата заключения");
        assert_eq!(config.browser.element_timeout_ms, defaults::ELEMENT_TIMEOUT_MS);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            AppConfig::load(Some(&missing)),
            Err(ConfigError::Load { .. })
        ));
    }
}
