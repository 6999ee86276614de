//! Batch enrichment of a contracts spreadsheet with SME registry data

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use rmsp_lookup::application::{BatchProcessor, RegistryLookup};
use rmsp_lookup::infrastructure::browser::{DevToolsEndpoint, Transport, build_source};
use rmsp_lookup::infrastructure::dataset::derive_output_path;
use rmsp_lookup::infrastructure::{
    AppConfig, DocumentSource, RecordExtractor, init_logging_with_config,
};

#[derive(Parser, Debug)]
#[command(name = "rmsp-lookup")]
#[command(version, about = "Look up INNs from a spreadsheet in the SME registry")]
struct Cli {
    /// Input workbook (.xlsx or .xls) with INN and contract date columns
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output workbook; defaults to <INPUT stem>_processed.xlsx
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Chrome DevTools port (attach transport)
    #[arg(short, long)]
    port: Option<u16>,

    /// How to reach the registry page
    #[arg(short, long, value_enum)]
    transport: Option<Transport>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pause after each row in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.browser.port = port;
        }
        if let Some(transport) = self.transport {
            config.browser.transport = transport;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.batch.row_delay_ms = delay_ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid command line overrides")?;

    init_logging_with_config(config.logging.clone()).context("Failed to initialize logging")?;

    if !cli.input.is_file() {
        bail!("Input file not found: {}", cli.input.display());
    }
    let output = derive_output_path(&cli.input, cli.output.as_deref());

    if config.browser.transport == Transport::Attach {
        DevToolsEndpoint::new(&config.browser.host, config.browser.port)
            .probe()
            .await
            .context("Browser endpoint check failed")?;
    }

    let extractor =
        RecordExtractor::with_config(&config.extraction).context("Invalid extraction rules")?;
    let source = build_source(&config).context("Failed to set up registry transport")?;
    info!("Using {} transport", source.name());

    let processor = BatchProcessor::new(RegistryLookup::new(source, extractor), &config.batch);
    let summary = processor
        .process_file(&cli.input, &output)
        .await
        .with_context(|| format!("Failed to process {}", cli.input.display()))?;

    println!(
        "Processed {} of {} rows, {} found. Result saved to {}",
        summary.processed,
        summary.total,
        summary.found,
        output.display()
    );
    Ok(())
}
