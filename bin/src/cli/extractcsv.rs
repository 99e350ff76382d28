use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use extraction::{
    batch::{BatchEvent, BatchEvents},
    filesio::IoType,
};

use super::workbookargs::WorkbookArgs;

/// Extracts the configured tables from a spreadsheet as CSV files.
#[derive(Args, Debug)]
pub struct Command {
    #[command(flatten)]
    workbooks: WorkbookArgs,

    /// Path to the directory or ZIP file to output the CSV files into.
    ///
    /// Whether this is a directory or ZIP file is controlled by --output-type.
    output: PathBuf,

    /// Controls how data is written to the output.
    ///
    /// By default, it guesses, based on any existing file or directory at the
    /// path or the path suffix ending in ".zip".
    #[arg(long)]
    output_type: Option<IoType>,

    /// Print the path of each table as it is processed.
    #[arg(long)]
    verbose: bool,
}

/// Runs the subcommand.
pub fn run(cmd: &Command) -> Result<()> {
    let workbooks = cmd.workbooks.load()?;

    let output_type = IoType::resolve_auto(cmd.output_type, &cmd.output);
    let out_writer = output_type
        .new_read_writer(&cmd.output)
        .with_context(|| format!("opening output path {:?} as {:?}", cmd.output, output_type))?;

    let mut events = EventDisplayer {
        verbose: cmd.verbose,
    };
    let outcome = cmd.workbooks.extractor().run(
        &workbooks.config,
        &workbooks.data,
        out_writer.as_ref(),
        &mut events,
    )?;

    out_writer.close()?;

    if !outcome.is_success() {
        bail!(
            "{} of {} tables failed to extract",
            outcome.failures.len(),
            outcome.failures.len() + outcome.written.len()
        );
    }

    Ok(())
}

struct EventDisplayer {
    verbose: bool,
}

impl BatchEvents for EventDisplayer {
    fn on_event(&mut self, event: BatchEvent<'_>) {
        match event {
            BatchEvent::Progress {
                path,
                completed,
                total,
            } => {
                if self.verbose {
                    eprintln!("[{completed}/{total}] {}", path.display());
                }
            }
            BatchEvent::RecordFailed(failure) => {
                eprintln!("Error (continuing): {:?}.", failure.err);
            }
            BatchEvent::Completed => {
                eprintln!("Extraction complete.");
            }
        }
    }
}
