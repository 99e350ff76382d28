//! Runs a whole configuration against a data workbook.


use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    config::{self, SheetExtractionConfig},
    csvout,
    error::ExtractionError,
    filesio::ReadWriter,
    sheet::Workbook,
    table::Table,
    transform, validate, window,
};

/// Converts the sheets named by a configuration workbook into CSV files.
#[derive(Debug, Default)]
pub struct Extractor<'a> {
    /// Name of the configuration sheet. When absent, the configuration
    /// workbook must hold exactly one sheet.
    pub config_sheet: Option<&'a str>,
}

/// Event emitted to track the progress of [Extractor::run].
#[derive(Debug)]
pub enum BatchEvent<'e> {
    /// Indicates that one record has been processed, successfully or not.
    Progress {
        path: &'e Path,
        completed: usize,
        total: usize,
    },
    /// Indicates that a record failed. Processing continues with the next.
    RecordFailed(&'e RecordFailure),
    /// Indicates that the batch has completed and that no more events will
    /// follow.
    Completed,
}

/// Trait to implement to receive notifications about batch events.
pub trait BatchEvents {
    fn on_event(&mut self, event: BatchEvent<'_>);
}

/// Failure of a single configuration record.
#[derive(Debug)]
pub struct RecordFailure {
    /// Output path of the record that failed.
    pub path: PathBuf,
    pub err: anyhow::Error,
}

/// Result of a batch that passed validation.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Output files written, in configuration order.
    pub written: Vec<PathBuf>,
    pub failures: Vec<RecordFailure>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<'a> Extractor<'a> {
    pub fn new(config_sheet: Option<&'a str>) -> Self {
        Self { config_sheet }
    }

    /// Reads the configuration records from `config_workbook`.
    pub fn load_records(
        &self,
        config_workbook: &Workbook,
    ) -> Result<Vec<SheetExtractionConfig>, ExtractionError> {
        let table = window::extract(
            config_workbook,
            &SheetExtractionConfig::for_configuration_sheet(self.config_sheet),
        )?;
        config::load_records(&table)
    }

    /// Loads the configuration and validates the data sheets it refers to,
    /// without writing anything.
    pub fn check(
        &self,
        config_workbook: &Workbook,
        data_workbook: &Workbook,
    ) -> Result<Vec<SheetExtractionConfig>, ExtractionError> {
        let records = self.load_records(config_workbook)?;
        validate::validate(&records, data_workbook)?;
        Ok(records)
    }

    /// Extracts every configured table from `data_workbook` into
    /// `out_writer`.
    ///
    /// Configuration and validation errors are returned before anything is
    /// written. Failures of individual records are reported to `events`,
    /// collected in the returned [BatchOutcome], and do not stop the batch.
    /// Closing `out_writer` is left to the caller.
    pub fn run(
        &self,
        config_workbook: &Workbook,
        data_workbook: &Workbook,
        out_writer: &dyn ReadWriter<'_>,
        events: &mut dyn BatchEvents,
    ) -> Result<BatchOutcome, ExtractionError> {
        let records = self.check(config_workbook, data_workbook)?;
        let total = records.len();
        info!("Extracting {total} tables.");

        let mut outcome = BatchOutcome::default();
        for (i, record) in records.iter().enumerate() {
            let Some(sheet_path) = record.sheet_path.as_deref() else {
                warn!(
                    "Skipping record for sheet {:?}: no output path.",
                    record.sheet_name
                );
                continue;
            };
            let path = PathBuf::from(sheet_path);

            let result = extract_table(data_workbook, record)
                .and_then(|table| write_table(out_writer, &path, &table))
                .with_context(|| {
                    format!("processing sheet {:?} into {path:?}", record.sheet_name)
                });
            match result {
                Ok(()) => {
                    info!("Wrote {path:?}.");
                    outcome.written.push(path.clone());
                }
                Err(err) => {
                    let failure = RecordFailure {
                        path: path.clone(),
                        err,
                    };
                    events.on_event(BatchEvent::RecordFailed(&failure));
                    outcome.failures.push(failure);
                }
            }

            events.on_event(BatchEvent::Progress {
                path: &path,
                completed: i + 1,
                total,
            });
        }

        info!(
            "Extraction finished: {} written, {} failed.",
            outcome.written.len(),
            outcome.failures.len()
        );
        events.on_event(BatchEvent::Completed);
        Ok(outcome)
    }
}

/// Extracts and transforms a single configured table.
fn extract_table(data_workbook: &Workbook, record: &SheetExtractionConfig) -> Result<Table> {
    let table = window::extract(data_workbook, record)?;
    Ok(transform::apply(record, table))
}

fn write_table(out_writer: &dyn ReadWriter<'_>, path: &Path, table: &Table) -> Result<()> {
    let mut csv_file = out_writer.open_write(path)?;

    if let Err(err) = csvout::write_table(table, &mut csv_file) {
        csv_file.discard().context("discarding partial CSV file")?;
        return Err(err).context("writing CSV file");
    }

    // Check for error rather than implicitly flushing and ignoring.
    csv_file.commit().context("committing CSV file")?;
    Ok(())
}
