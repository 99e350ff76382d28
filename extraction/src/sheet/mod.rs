//! Read-only views over decoded spreadsheet data.
//!
//! The extraction engine only ever sees a [SheetSnapshot]. [Workbook::open]
//! decodes a spreadsheet file into in-memory [GridSheet]s and releases the
//! underlying reader before returning.

mod decode;

use crate::error::{ExtractionError, Result};

/// Strips leading and trailing spaces and ASCII control characters from cell
/// text. Other Unicode whitespace, such as a non-breaking space, is kept.
pub fn trim_cell(text: &str) -> &str {
    text.trim_matches(|c: char| c <= ' ')
}

/// Read-only tabular access to a single sheet.
///
/// Indexes are 0-based. A cell is "present" when the sheet physically holds
/// it, even if its text is empty. A row is "physical" when it holds at least
/// one present cell.
pub trait SheetSnapshot {
    /// Returns the decoded text of the cell, or `None` when absent.
    fn cell_at(&self, row: usize, col: usize) -> Option<&str>;

    /// Index of the last physical row, or `None` for an empty sheet.
    fn last_row_index(&self) -> Option<usize>;

    /// Index of the last present cell in `row`, or `None` when the row is not
    /// physical.
    fn last_column_index(&self, row: usize) -> Option<usize>;
}

/// In-memory [SheetSnapshot] backed by a sparse grid.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GridSheet {
    rows: Vec<Vec<Option<String>>>,
}

impl GridSheet {
    /// Creates a sheet from rows of optional cells. Trailing absent cells and
    /// trailing non-physical rows are dropped.
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        let mut sheet = Self { rows };
        for row in sheet.rows.iter_mut() {
            while matches!(row.last(), Some(None)) {
                row.pop();
            }
        }
        while matches!(sheet.rows.last(), Some(row) if row.is_empty()) {
            sheet.rows.pop();
        }
        sheet
    }

    /// Creates a sheet in which every given cell is present.
    pub fn from_texts<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
                .collect(),
        )
    }

    /// Sets the cell at (`row`, `col`), growing the grid as required.
    pub fn set(&mut self, row: usize, col: usize, value: Option<String>) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = value;
    }
}

impl SheetSnapshot for GridSheet {
    fn cell_at(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    fn last_row_index(&self) -> Option<usize> {
        self.rows.iter().rposition(|row| row.iter().any(Option::is_some))
    }

    fn last_column_index(&self, row: usize) -> Option<usize> {
        self.rows.get(row)?.iter().rposition(Option::is_some)
    }
}

/// Ordered collection of named sheets.
///
/// A sheet that could not be decoded keeps its name and its error. The error
/// surfaces only when that sheet is looked up.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<(String, Result<GridSheet>)>,
}

impl Workbook {
    pub fn new<I, S>(sheets: I) -> Self
    where
        I: IntoIterator<Item = (S, GridSheet)>,
        S: Into<String>,
    {
        Self::from_decoded(sheets.into_iter().map(|(name, sheet)| (name, Ok(sheet))))
    }

    /// Creates a workbook in which some sheets may have failed to decode.
    pub fn from_decoded<I, S>(sheets: I) -> Self
    where
        I: IntoIterator<Item = (S, Result<GridSheet>)>,
        S: Into<String>,
    {
        Self {
            sheets: sheets
                .into_iter()
                .map(|(name, sheet)| (name.into(), sheet))
                .collect(),
        }
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    /// Looks up a sheet by exact name. `None` when no sheet has that name.
    pub fn sheet(&self, name: &str) -> Option<Result<&GridSheet>> {
        self.sheets
            .iter()
            .find(|(sheet_name, _)| sheet_name == name)
            .map(|(_, sheet)| decoded(sheet))
    }

    /// Looks up a sheet by exact name, failing with
    /// [ExtractionError::SheetNotFound], or with the sheet's decode error.
    pub fn require_sheet(&self, name: &str) -> Result<&GridSheet> {
        self.sheet(name).unwrap_or_else(|| {
            Err(ExtractionError::SheetNotFound {
                sheet: name.to_string(),
            })
        })
    }

    /// Selects the sheet to operate on. A workbook with exactly one sheet
    /// always yields that sheet, whatever name was asked for.
    pub fn select_sheet(&self, name: Option<&str>) -> Result<&GridSheet> {
        if let [(_, only)] = self.sheets.as_slice() {
            return decoded(only);
        }
        match name {
            Some(name) => self.require_sheet(name),
            None => Err(ExtractionError::SheetNotFound {
                sheet: String::new(),
            }),
        }
    }
}

fn decoded(sheet: &Result<GridSheet>) -> Result<&GridSheet> {
    sheet.as_ref().map_err(Clone::clone)
}
