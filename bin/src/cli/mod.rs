use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simplelog::LevelFilter;

mod extractcsv;
mod validate;
mod workbookargs;

/// Converts spreadsheet tables into CSV files, as directed by a configuration
/// sheet.
#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Logging level.
    #[arg(long, default_value = "Warn")]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum Command {
    ExtractCsv(extractcsv::Command),
    Validate(validate::Command),
}

pub fn run() -> Result<()> {
    let args = Args::parse();

    simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default())
        .with_context(|| "configuring logging")?;

    use Command::*;
    match &args.command {
        ExtractCsv(cmd) => extractcsv::run(cmd),
        Validate(cmd) => validate::run(cmd),
    }
}
