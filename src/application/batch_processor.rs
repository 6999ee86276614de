//! Batch orchestration over a spreadsheet dataset
//!
//! Rows are processed strictly in order, one lookup at a time. A failing row
//! degrades to the not-found output and never stops the batch.

use serde::Serialize;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::lookup_service::RegistryLookup;
use crate::domain::{Discrepancy, Identifier, OutputFields, OutputLabels};
use crate::infrastructure::browser::DocumentSource;
use crate::infrastructure::config::{BatchConfig, ColumnConfig};
use crate::infrastructure::dataset::{
    CellValue, Dataset, DatasetError, read_workbook, write_workbook,
};

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Rows sent to the registry
    pub processed: usize,
    pub found: usize,
    pub invalid_identifiers: usize,
    pub failed_lookups: usize,
    pub discrepancies: usize,
}

impl BatchSummary {
    pub fn log(&self, elapsed: Duration) {
        info!(
            "Batch finished in {:.1?}: {} rows, {} queried, {} found, {} invalid identifiers, {} failed lookups, {} date discrepancies",
            elapsed,
            self.total,
            self.processed,
            self.found,
            self.invalid_identifiers,
            self.failed_lookups,
            self.discrepancies
        );
    }
}

/// Drives lookups for every row of a dataset
pub struct BatchProcessor<S> {
    lookup: RegistryLookup<S>,
    columns: ColumnConfig,
    labels: OutputLabels,
    row_delay: Duration,
}

impl<S: DocumentSource> BatchProcessor<S> {
    pub fn new(lookup: RegistryLookup<S>, config: &BatchConfig) -> Self {
        Self {
            lookup,
            columns: config.columns.clone(),
            labels: config.labels.clone(),
            row_delay: Duration::from_millis(config.row_delay_ms),
        }
    }

    pub fn lookup(&self) -> &RegistryLookup<S> {
        &self.lookup
    }

    /// Read `input`, enrich every row and write the result to `output`
    pub async fn process_file(&self, input: &Path, output: &Path) -> Result<BatchSummary, DatasetError> {
        let mut dataset = read_workbook(input)?;
        let summary = self.process(&mut dataset).await?;
        write_workbook(&dataset, output)?;
        Ok(summary)
    }

    /// Enrich the dataset in place
    ///
    /// Fails only when required columns are missing, before any lookup.
    pub async fn process(&self, dataset: &mut Dataset) -> Result<BatchSummary, DatasetError> {
        let required = dataset.require_columns(&self.columns.required_columns())?;
        let (identifier_col, contract_col) = (required[0], required[1]);

        let output_cols: Vec<usize> = self
            .columns
            .output_columns()
            .into_iter()
            .map(|name| dataset.ensure_column(name))
            .collect();

        let started = Instant::now();
        let mut summary = BatchSummary {
            total: dataset.len(),
            ..BatchSummary::default()
        };

        for row in 0..dataset.len() {
            let identifier_cell = dataset.get(row, identifier_col).clone();
            let contract_cell = dataset.get(row, contract_col).clone();

            info!("Row {}/{}", row + 1, summary.total);
            let fields = self
                .process_row(&identifier_cell, &contract_cell, &mut summary)
                .await;

            for (col, text) in output_cols.iter().zip(fields.to_cells(&self.labels)) {
                dataset.set(row, *col, CellValue::from(text));
            }

            if !self.row_delay.is_zero() {
                tokio::time::sleep(self.row_delay).await;
            }
        }

        summary.log(started.elapsed());
        Ok(summary)
    }

    async fn process_row(
        &self,
        identifier_cell: &CellValue,
        contract_cell: &CellValue,
        summary: &mut BatchSummary,
    ) -> OutputFields {
        let Some(raw) = identifier_cell.as_text() else {
            info!("Empty identifier, row skipped");
            return OutputFields::not_found();
        };

        let identifier = match Identifier::parse(&raw) {
            Ok(identifier) => identifier,
            Err(e) => {
                warn!("Row skipped: {}", e);
                summary.invalid_identifiers += 1;
                return OutputFields::not_found();
            }
        };

        summary.processed += 1;
        let record = match self.lookup.lookup(&identifier).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Lookup for {} failed: {}", identifier, e);
                summary.failed_lookups += 1;
                return OutputFields::not_found();
            }
        };

        let fields = OutputFields::from_record(&record, contract_cell.as_date_value(), &self.labels);
        if fields.found {
            summary.found += 1;
        }
        if fields.discrepancy == Some(Discrepancy::Yes) {
            summary.discrepancies += 1;
        }
        fields
    }
}
