//! Structural validation of the sheets a configuration refers to.

use std::fmt;

use log::{info, warn};

use crate::config::SheetExtractionConfig;
use crate::error::{ExtractionError, Result};
use crate::sheet::{SheetSnapshot, Workbook, trim_cell};

/// Position of a whitespace-only cell. Row and column are 1-based.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WhitespaceCell {
    pub sheet: String,
    pub row: usize,
    pub column: usize,
}

/// Blank rows found in one sheet. Row numbers are 1-based.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlankRows {
    pub sheet: String,
    pub rows: Vec<usize>,
}

/// Aggregated findings of [validate], across all scanned sheets.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationReport {
    pub blank_rows: Vec<BlankRows>,
    pub whitespace_cells: Vec<WhitespaceCell>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.blank_rows.is_empty() && self.whitespace_cells.is_empty()
    }

    /// Sheets with exactly one blank row.
    pub fn single_blank_rows(&self) -> impl Iterator<Item = &BlankRows> {
        self.blank_rows.iter().filter(|b| b.rows.len() == 1)
    }

    /// Sheets with more than one blank row.
    pub fn multiple_blank_rows(&self) -> impl Iterator<Item = &BlankRows> {
        self.blank_rows.iter().filter(|b| b.rows.len() > 1)
    }

    fn scan_sheet<S>(&mut self, name: &str, sheet: &S)
    where
        S: SheetSnapshot + ?Sized,
    {
        let mut blank = Vec::new();
        let last_row = sheet.last_row_index().map_or(0, |row| row + 1);
        for row in 0..last_row {
            let Some(last_col) = sheet.last_column_index(row) else {
                continue;
            };
            let mut is_blank = true;
            for col in 0..=last_col {
                let Some(raw) = sheet.cell_at(row, col) else {
                    continue;
                };
                if !trim_cell(raw).is_empty() {
                    is_blank = false;
                } else if !raw.is_empty() {
                    self.whitespace_cells.push(WhitespaceCell {
                        sheet: name.to_string(),
                        row: row + 1,
                        column: col + 1,
                    });
                }
            }
            if is_blank {
                blank.push(row + 1);
            }
        }
        if !blank.is_empty() {
            self.blank_rows.push(BlankRows {
                sheet: name.to_string(),
                rows: blank,
            });
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "structural validation failed")?;
        if self.multiple_blank_rows().next().is_some() {
            writeln!(f, "Multiple blank rows:")?;
            for blank in self.multiple_blank_rows() {
                let rows: Vec<String> = blank.rows.iter().map(usize::to_string).collect();
                writeln!(f, "  sheet {:?}: rows {}", blank.sheet, rows.join(", "))?;
            }
        }
        if self.single_blank_rows().next().is_some() {
            writeln!(f, "Single blank row:")?;
            for blank in self.single_blank_rows() {
                writeln!(f, "  sheet {:?}: row {}", blank.sheet, blank.rows[0])?;
            }
        }
        if !self.whitespace_cells.is_empty() {
            writeln!(f, "Whitespace-only cells:")?;
            for cell in &self.whitespace_cells {
                writeln!(
                    f,
                    "  sheet {:?}: row {}, column {}",
                    cell.sheet, cell.row, cell.column
                )?;
            }
        }
        Ok(())
    }
}

/// Scans every sheet referenced by `records` for blank rows and
/// whitespace-only cells.
///
/// Each distinct sheet is scanned once, in configuration order. A missing
/// sheet fails immediately with [ExtractionError::SheetNotFound]; any other
/// finding is reported as a single [ExtractionError::StructuralValidation].
/// Sheets that failed to decode are skipped.
pub fn validate(records: &[SheetExtractionConfig], workbook: &Workbook) -> Result<()> {
    let mut report = ValidationReport::default();
    let mut seen: Vec<&str> = Vec::new();

    for name in records.iter().filter_map(|r| r.sheet_name.as_deref()) {
        if seen.contains(&name) {
            continue;
        }
        seen.push(name);

        let sheet = match workbook.require_sheet(name) {
            Ok(sheet) => sheet,
            // Left for the records using this sheet to report.
            Err(err @ ExtractionError::Decode { .. }) => {
                warn!("Not validating sheet {name:?}: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };
        info!("Validating sheet {name:?}.");
        report.scan_sheet(name, sheet);
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(ExtractionError::StructuralValidation(report))
    }
}
