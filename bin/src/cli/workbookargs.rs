use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use extraction::{batch::Extractor, sheet::Workbook};

/// Arguments naming the configuration and data workbooks.
#[derive(Args, Debug)]
pub struct WorkbookArgs {
    /// Path to the spreadsheet holding the extraction configuration.
    #[arg(long)]
    config: PathBuf,

    /// Name of the configuration sheet within --config.
    ///
    /// May be omitted when the configuration spreadsheet holds a single
    /// sheet.
    #[arg(long)]
    config_sheet: Option<String>,

    /// Path to the spreadsheet holding the data sheets.
    input: PathBuf,
}

/// Decoded workbooks, ready to hand to an [Extractor].
pub struct LoadedWorkbooks {
    pub config: Workbook,
    pub data: Workbook,
}

impl WorkbookArgs {
    pub fn load(&self) -> Result<LoadedWorkbooks> {
        let config = Workbook::open(&self.config)
            .with_context(|| format!("reading configuration workbook {:?}", self.config))?;
        let data = Workbook::open(&self.input)
            .with_context(|| format!("reading data workbook {:?}", self.input))?;
        Ok(LoadedWorkbooks { config, data })
    }

    pub fn extractor(&self) -> Extractor<'_> {
        Extractor::new(self.config_sheet.as_deref())
    }
}
