//! Configurable extraction of spreadsheet tables into CSV files.
//!
//! A configuration sheet names, per output file, the data sheet to read and
//! how to window and transform it. [batch::Extractor] loads that
//! configuration, validates the referenced sheets, and writes one CSV file
//! per record through a [filesio::ReadWriter].

pub mod batch;
pub mod config;
pub mod csvout;
pub mod error;
pub mod filesio;
pub mod range;
pub mod sheet;
pub mod table;
pub mod transform;
pub mod validate;
pub mod window;
