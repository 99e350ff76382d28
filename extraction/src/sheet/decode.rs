use std::io::{Read, Seek};
use std::path::Path;

use calamine::{Data, DataRef, Reader, Sheets, Xlsx, open_workbook_auto};
use chrono::{NaiveDateTime, Timelike};
use log::warn;

use crate::error::{DecodeFailure, ExtractionError, Result};

use super::{GridSheet, Workbook};

impl Workbook {
    /// Decodes every sheet of the spreadsheet at `path` into memory.
    ///
    /// Supports whatever formats `calamine` detects from the file extension
    /// (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`). Only a file that cannot be
    /// opened at all fails here. A sheet that fails to decode is kept with its
    /// error, which is returned when that sheet is looked up.
    pub fn open(path: &Path) -> Result<Self> {
        let location = path.display().to_string();
        let mut sheets = open_workbook_auto(path).map_err(|e| decode_error(&location, e))?;

        let mut decoded = Vec::new();
        for name in sheets.sheet_names() {
            let sheet_location = format!("{location}[{name}]");
            let sheet = decode_sheet(&mut sheets, &name, &sheet_location);
            if let Err(err) = &sheet {
                warn!("Sheet {name:?} could not be decoded: {err}");
            }
            decoded.push((name, sheet));
        }

        Ok(Workbook::from_decoded(decoded))
    }
}

fn decode_sheet<RS>(sheets: &mut Sheets<RS>, name: &str, location: &str) -> Result<GridSheet>
where
    RS: Read + Seek,
{
    let mut grid = GridSheet::default();
    match &mut *sheets {
        Sheets::Xlsx(xlsx) => read_xlsx_cells(xlsx, name, location, &mut grid)?,
        other => read_used_cells(other, name, location, &mut grid)?,
    }

    // Not every format carries formulas; values alone are still usable.
    if let Ok(formulas) = sheets.worksheet_formula(name) {
        let (row_offset, col_offset) = offset(formulas.start());
        for (row, col, formula) in formulas.used_cells() {
            if !formula.is_empty() {
                grid.set(row + row_offset, col + col_offset, Some(formula.clone()));
            }
        }
    }

    Ok(GridSheet::new(grid.rows))
}

/// Streams xlsx cells, so that cells holding only a style (no value) stay
/// present with empty text.
fn read_xlsx_cells<RS>(
    xlsx: &mut Xlsx<RS>,
    name: &str,
    location: &str,
    grid: &mut GridSheet,
) -> Result<()>
where
    RS: Read + Seek,
{
    let mut cells = xlsx
        .worksheet_cells_reader(name)
        .map_err(|e| decode_error(location, e.into()))?;
    while let Some(cell) = cells
        .next_cell()
        .map_err(|e| decode_error(location, e.into()))?
    {
        let (row, col) = cell.get_position();
        let (row, col) = (row as usize, col as usize);
        let text = match cell.get_value() {
            DataRef::Empty => Some(String::new()),
            value => decode_at(location, row, col, &Data::from(value.clone()))?,
        };
        grid.set(row, col, text);
    }
    Ok(())
}

fn read_used_cells<RS>(
    sheets: &mut Sheets<RS>,
    name: &str,
    location: &str,
    grid: &mut GridSheet,
) -> Result<()>
where
    RS: Read + Seek,
{
    let range = sheets
        .worksheet_range(name)
        .map_err(|e| decode_error(location, e))?;
    let (row_offset, col_offset) = offset(range.start());
    for (row, col, data) in range.used_cells() {
        let (row, col) = (row + row_offset, col + col_offset);
        grid.set(row, col, decode_at(location, row, col, data)?);
    }
    Ok(())
}

fn decode_at(location: &str, row: usize, col: usize, data: &Data) -> Result<Option<String>> {
    decode_cell(data).map_err(|failure| {
        ExtractionError::decode(format!("{location}!R{}C{}", row + 1, col + 1), failure)
    })
}

fn offset(start: Option<(u32, u32)>) -> (usize, usize) {
    start
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or_default()
}

fn decode_error(location: &str, err: calamine::Error) -> ExtractionError {
    ExtractionError::decode(location, DecodeFailure::Workbook(err))
}

/// Renders a single cell as display text. `None` means the cell is absent.
pub(super) fn decode_cell(data: &Data) -> std::result::Result<Option<String>, DecodeFailure> {
    Ok(Some(match data {
        Data::Empty => return Ok(None),
        Data::String(s) => s.clone(),
        Data::Float(f) => (f.trunc() as i64).to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => format_datetime(&datetime),
            None => return Err(DecodeFailure::DateOutOfRange(dt.as_f64())),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }))
}

fn format_datetime(datetime: &NaiveDateTime) -> String {
    if datetime.num_seconds_from_midnight() == 0 {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
