//! Infrastructure layer: registry transports, HTML extraction, spreadsheet
//! I/O, configuration and logging

pub mod browser;
pub mod config;
pub mod dataset;
pub mod logging;
pub mod parsing;
pub mod parsing_error;

// Re-export commonly used items
pub use browser::{DocumentSource, LookupError, Transport, build_source};
pub use config::{AppConfig, ConfigError};
pub use dataset::{CellValue, Dataset, DatasetError};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{ExtractionConfig, ParsingError, ParsingResult, RecordExtractor};
