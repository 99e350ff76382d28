use anyhow::Result;
use clap::Args;

use super::workbookargs::WorkbookArgs;

/// Checks the configuration and the data sheets it refers to, without
/// writing any output.
#[derive(Args, Debug)]
pub struct Command {
    #[command(flatten)]
    workbooks: WorkbookArgs,
}

/// Runs the subcommand.
pub fn run(cmd: &Command) -> Result<()> {
    let workbooks = cmd.workbooks.load()?;
    let records = cmd
        .workbooks
        .extractor()
        .check(&workbooks.config, &workbooks.data)?;

    eprintln!("Configuration is valid: {} tables.", records.len());
    Ok(())
}
