//! One-off registry lookup for a single INN

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rmsp_lookup::application::RegistryLookup;
use rmsp_lookup::infrastructure::browser::{Transport, build_source};
use rmsp_lookup::infrastructure::{AppConfig, RecordExtractor, init_logging_with_config};

#[derive(Parser, Debug)]
#[command(name = "rmsp-query")]
#[command(version, about = "Look up a single INN in the SME registry")]
struct Cli {
    /// INN (10 or 12 digits, spaces and hyphens ignored)
    #[arg(value_name = "INN")]
    inn: String,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long, value_enum)]
    transport: Option<Transport>,

    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the record as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.browser.port = port;
    }
    if let Some(transport) = cli.transport {
        config.browser.transport = transport;
    }
    config.validate()?;
    init_logging_with_config(config.logging.clone())?;

    let extractor = RecordExtractor::with_config(&config.extraction)?;
    let lookup = RegistryLookup::new(build_source(&config)?, extractor);
    let record = lookup
        .lookup_raw(&cli.inn)
        .await
        .with_context(|| format!("Lookup for '{}' failed", cli.inn))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    if !record.found {
        println!(
            "Not found in the registry{}",
            record.message.map(|m| format!(": {m}")).unwrap_or_default()
        );
        return Ok(());
    }

    let fields = [
        ("Name", record.organization_name),
        ("Category", record.category),
        ("Region", record.region),
        ("Included", record.inclusion_date),
        ("Excluded", record.exclusion_date),
        ("INN", record.identifier),
        ("OGRN", record.registration_number),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{label:>9}: {value}");
        }
    }
    Ok(())
}
