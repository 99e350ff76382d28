//! Per-sheet extraction configuration, as read from the configuration sheet.

use log::warn;

use crate::error::{ExtractionError, Result};
use crate::sheet::trim_cell;
use crate::table::{Row, Table};

/// Describes how to extract one table from one sheet.
///
/// Row and column indexes are 0-based. `None` for `end_row`/`end_column`
/// means "up to the last row/column the sheet holds".
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SheetExtractionConfig {
    pub start_row: usize,
    pub end_row: Option<usize>,
    pub start_column: usize,
    pub end_column: Option<usize>,
    pub sheet_name: Option<String>,
    /// Relative path of the output file. Records without one are skipped.
    pub sheet_path: Option<String>,
    pub transpose: bool,
    /// Widens the column window by one, to keep a trailing comment column.
    pub include_trailing_comment: bool,
    /// Appends a synthetic "deleted" column to the output.
    pub delete_column: bool,
    pub range_expression: Option<String>,
}

impl Default for SheetExtractionConfig {
    fn default() -> Self {
        Self {
            start_row: 0,
            end_row: None,
            start_column: 1,
            end_column: None,
            sheet_name: None,
            sheet_path: None,
            transpose: false,
            include_trailing_comment: false,
            delete_column: false,
            range_expression: None,
        }
    }
}

impl SheetExtractionConfig {
    /// The fixed window used to read the configuration sheet itself.
    pub fn for_configuration_sheet(sheet_name: Option<&str>) -> Self {
        Self {
            sheet_name: sheet_name.map(str::to_string),
            include_trailing_comment: true,
            ..Default::default()
        }
    }

    /// The non-empty range expression, if any.
    pub fn range_expression(&self) -> Option<&str> {
        self.range_expression
            .as_deref()
            .filter(|expression| !expression.is_empty())
    }
}

/// Column positions within a configuration table row, after column A of the
/// sheet has been skipped.
mod column {
    pub const SHEET_NAME: usize = 0;
    pub const SHEET_PATH: usize = 1;
    pub const TRANSPOSE: usize = 2;
    pub const TRAILING_COMMENT: usize = 3;
    pub const RANGE: usize = 4;
    pub const DELETE_COLUMN: usize = 5;
}

/// Fails if any row of the configuration table, header included, is entirely
/// empty.
pub fn check_configuration_table(table: &Table) -> Result<()> {
    for (index, row) in table.iter().enumerate() {
        if row.iter().all(|cell| trim_cell(cell).is_empty()) {
            return Err(ExtractionError::integrity(format!(
                "configuration row {} is empty",
                index + 1
            )));
        }
    }
    Ok(())
}

/// Fails if a record names a sheet without an output path, or vice versa.
pub fn check_record_presence(record: &SheetExtractionConfig) -> Result<()> {
    match (&record.sheet_name, &record.sheet_path) {
        (Some(name), None) => Err(ExtractionError::integrity(format!(
            "sheet {name:?} has no output path"
        ))),
        (None, Some(path)) => Err(ExtractionError::integrity(format!(
            "output path {path:?} has no sheet name"
        ))),
        _ => Ok(()),
    }
}

/// Materialises one record per data row of the configuration table (rows 1
/// onwards).
///
/// Rows naming neither a sheet nor an output path are skipped.
pub fn load_records(table: &Table) -> Result<Vec<SheetExtractionConfig>> {
    check_configuration_table(table)?;

    let mut records = Vec::new();
    for (index, row) in table.iter().enumerate().skip(1) {
        let line = index + 1;
        let record = parse_record(row, line)?;
        check_record_presence(&record)?;
        if record.sheet_name.is_none() && record.sheet_path.is_none() {
            warn!("Skipping configuration row {line}: no sheet name or output path.");
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

fn parse_record(row: &Row, line: usize) -> Result<SheetExtractionConfig> {
    Ok(SheetExtractionConfig {
        sheet_name: text_cell(row, column::SHEET_NAME),
        sheet_path: text_cell(row, column::SHEET_PATH),
        transpose: flag_cell(row, column::TRANSPOSE, line)?,
        include_trailing_comment: flag_cell(row, column::TRAILING_COMMENT, line)?,
        range_expression: text_cell(row, column::RANGE),
        delete_column: flag_cell(row, column::DELETE_COLUMN, line)?,
        ..Default::default()
    })
}

fn text_cell(row: &Row, col: usize) -> Option<String> {
    row.get(col)
        .map(|cell| trim_cell(cell))
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
}

fn flag_cell(row: &Row, col: usize, line: usize) -> Result<bool> {
    match text_cell(row, col) {
        None => Ok(false),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(ExtractionError::integrity(format!(
            "configuration row {line}: expected true or false, got {value:?}"
        ))),
    }
}
