//! Extraction of rectangular windows of cell text from a sheet.

use std::ops::Range;

use log::debug;

use crate::config::SheetExtractionConfig;
use crate::error::{ExtractionError, Result};
use crate::range::{RowRange, parse_range_expression};
use crate::sheet::{SheetSnapshot, Workbook, trim_cell};
use crate::table::{Row, Table};

/// Bounds of a single window, with open-ended values resolved against the
/// sheet. Rows are inclusive, columns are `start_column..end_column`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct ResolvedWindow {
    start_row: usize,
    /// `None` when the window selects no rows at all.
    end_row: Option<usize>,
    start_column: usize,
    end_column: usize,
}

impl ResolvedWindow {
    fn resolve<S>(sheet: &S, config: &SheetExtractionConfig, rows: RowBounds) -> Self
    where
        S: SheetSnapshot + ?Sized,
    {
        let (start_row, end_row) = match rows {
            RowBounds::Explicit(range) => (range.start, Some(range.end)),
            RowBounds::Configured { start_row } => (
                start_row,
                config.end_row.or_else(|| sheet.last_row_index()),
            ),
        };

        let mut end_column = config.end_column.unwrap_or_else(|| match end_row {
            Some(end_row) => (start_row..=end_row)
                .filter_map(|row| sheet.last_column_index(row))
                .max()
                .unwrap_or(0),
            None => 0,
        });
        if config.include_trailing_comment {
            end_column += 1;
        }

        Self {
            start_row,
            end_row,
            start_column: config.start_column,
            end_column,
        }
    }

    fn rows(&self) -> Range<usize> {
        match self.end_row {
            Some(end_row) => self.start_row..end_row + 1,
            None => 0..0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum RowBounds {
    Configured { start_row: usize },
    Explicit(RowRange),
}

/// Selects the configured sheet from `workbook` and extracts its table.
pub fn extract(workbook: &Workbook, config: &SheetExtractionConfig) -> Result<Table> {
    let sheet = workbook.select_sheet(config.sheet_name.as_deref())?;
    extract_from_sheet(sheet, config)
}

/// Extracts the configured table from `sheet`.
///
/// Without a range expression, a single window spans the configured rows.
/// With one, each range yields its own window, with column bounds resolved
/// afresh, and the windows are concatenated in expression order. A range
/// reaching past the last row of the sheet fails with
/// [ExtractionError::MalformedRange].
pub fn extract_from_sheet<S>(sheet: &S, config: &SheetExtractionConfig) -> Result<Table>
where
    S: SheetSnapshot + ?Sized,
{
    let Some(expression) = config.range_expression() else {
        let mut start_row = config.start_row;
        // Transposed tables without explicit ranges always skip the first two
        // rows of the sheet, whatever start_row says. Configurations rely on
        // this.
        if config.transpose {
            start_row = 2;
        }
        return Ok(extract_window(
            sheet,
            ResolvedWindow::resolve(sheet, config, RowBounds::Configured { start_row }),
        ));
    };

    let ranges = parse_range_expression(expression)?;
    let last_row = sheet.last_row_index();
    if let Some(range) = ranges
        .iter()
        .find(|range| last_row.is_none_or(|last_row| range.end > last_row))
    {
        return Err(ExtractionError::malformed_range(
            expression,
            format!(
                "row {} is beyond the last row of the sheet ({})",
                range.end + 1,
                last_row.map_or(0, |last_row| last_row + 1)
            ),
        ));
    }

    Ok(Table::concatenated(ranges.into_iter().map(|range| {
        extract_window(
            sheet,
            ResolvedWindow::resolve(sheet, config, RowBounds::Explicit(range)),
        )
    })))
}

fn extract_window<S>(sheet: &S, window: ResolvedWindow) -> Table
where
    S: SheetSnapshot + ?Sized,
{
    debug!("Extracting window {window:?}.");
    window
        .rows()
        .map(|row| {
            Row((window.start_column..window.end_column)
                .filter_map(|col| sheet.cell_at(row, col))
                .map(|text| trim_cell(text).to_string())
                .collect())
        })
        .collect::<Vec<_>>()
        .into()
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use test_casing::test_casing;

    use crate::error::ErrorKind;
    use crate::sheet::GridSheet;

    use super::*;

    fn six_rows() -> GridSheet {
        GridSheet::from_texts((1..=6).map(|row| {
            [
                format!("key{row}"),
                format!("a{row}"),
                format!("b{row}"),
                format!("c{row}"),
            ]
        }))
    }

    #[gtest]
    fn open_bounds_exclude_last_column() -> googletest::Result<()> {
        let config = SheetExtractionConfig::default();
        let table = extract_from_sheet(&six_rows(), &config).or_fail()?;

        expect_that!(table.len(), eq(6));
        expect_that!(table[0], eq(&Row::from(["a1", "b1"])));
        expect_that!(table[5], eq(&Row::from(["a6", "b6"])));
        Ok(())
    }

    #[gtest]
    fn trailing_comment_widens_window() -> googletest::Result<()> {
        let config = SheetExtractionConfig {
            include_trailing_comment: true,
            ..Default::default()
        };
        let table = extract_from_sheet(&six_rows(), &config).or_fail()?;

        expect_that!(table[0], eq(&Row::from(["a1", "b1", "c1"])));
        Ok(())
    }

    #[gtest]
    fn explicit_bounds() -> googletest::Result<()> {
        let config = SheetExtractionConfig {
            start_row: 1,
            end_row: Some(2),
            start_column: 0,
            end_column: Some(2),
            ..Default::default()
        };
        let table = extract_from_sheet(&six_rows(), &config).or_fail()?;

        let expected: Table = [["key2", "a2"], ["key3", "a3"]].into();
        expect_that!(table, eq(&expected));
        Ok(())
    }

    #[gtest]
    fn range_expression_selects_rows_in_order() -> googletest::Result<()> {
        let config = SheetExtractionConfig {
            range_expression: Some("2,4-5".into()),
            include_trailing_comment: true,
            ..Default::default()
        };
        let table = extract_from_sheet(&six_rows(), &config).or_fail()?;

        let expected: Table = [
            ["a2", "b2", "c2"],
            ["a4", "b4", "c4"],
            ["a5", "b5", "c5"],
        ]
        .into();
        expect_that!(table, eq(&expected));
        Ok(())
    }

    #[gtest]
    fn range_columns_resolved_per_range() -> googletest::Result<()> {
        let sheet = GridSheet::from_texts([
            vec!["k", "a", "b", "c"],
            vec!["k", "a"],
            vec!["k", "a", "b"],
        ]);
        let config = SheetExtractionConfig {
            range_expression: Some("2,1".into()),
            ..Default::default()
        };
        let table = extract_from_sheet(&sheet, &config).or_fail()?;

        // Row 2 alone has its last used column at index 1, which the exclusive
        // bound drops.
        let expected: Table = [vec![], vec!["a", "b"]].into();
        expect_that!(table, eq(&expected));
        Ok(())
    }

    #[gtest]
    fn transpose_without_range_starts_at_third_row() -> googletest::Result<()> {
        let config = SheetExtractionConfig {
            transpose: true,
            include_trailing_comment: true,
            ..Default::default()
        };
        let table = extract_from_sheet(&six_rows(), &config).or_fail()?;

        expect_that!(table.len(), eq(4));
        expect_that!(table[0], eq(&Row::from(["a3", "b3", "c3"])));
        Ok(())
    }

    #[gtest]
    fn missing_cells_are_skipped_and_text_trimmed() -> googletest::Result<()> {
        let sheet = GridSheet::new(vec![
            vec![None, Some(" a ".into()), None, Some("c".into()), Some("d".into())],
            vec![],
            vec![None, Some("x".into())],
        ]);
        let config = SheetExtractionConfig::default();
        let table = extract_from_sheet(&sheet, &config).or_fail()?;

        let expected: Table = [vec!["a", "c"], vec![], vec!["x"]].into();
        expect_that!(table, eq(&expected));
        Ok(())
    }

    #[gtest]
    fn range_ending_on_last_row_is_allowed() -> googletest::Result<()> {
        let config = SheetExtractionConfig {
            range_expression: Some("5-6".into()),
            ..Default::default()
        };
        let table = extract_from_sheet(&six_rows(), &config).or_fail()?;

        let expected: Table = [["a5", "b5"], ["a6", "b6"]].into();
        expect_that!(table, eq(&expected));
        Ok(())
    }

    #[test_casing(4, ["6-8", "7", "1-3000000", "2,1-4000000000"])]
    fn range_beyond_sheet_fails(expression: &str) {
        let config = SheetExtractionConfig {
            range_expression: Some(expression.into()),
            ..Default::default()
        };
        assert_that!(
            extract_from_sheet(&six_rows(), &config)
                .map(|_| ())
                .map_err(|e| e.kind()),
            err(eq(ErrorKind::MalformedRange))
        );
    }

    #[gtest]
    fn range_on_empty_sheet_fails() {
        let config = SheetExtractionConfig {
            range_expression: Some("1".into()),
            ..Default::default()
        };
        expect_that!(
            extract_from_sheet(&GridSheet::default(), &config)
                .map(|_| ())
                .map_err(|e| e.kind()),
            err(eq(ErrorKind::MalformedRange))
        );
    }

    #[gtest]
    fn empty_sheet_yields_empty_table() -> googletest::Result<()> {
        let table =
            extract_from_sheet(&GridSheet::default(), &SheetExtractionConfig::default()).or_fail()?;
        expect_that!(table, eq(&Table::default()));
        Ok(())
    }

    #[gtest]
    fn malformed_range_fails() {
        let config = SheetExtractionConfig {
            range_expression: Some("3-1".into()),
            ..Default::default()
        };
        expect_that!(
            extract_from_sheet(&six_rows(), &config)
                .map(|_| ())
                .map_err(|e| e.kind()),
            err(eq(ErrorKind::MalformedRange))
        );
    }

    #[gtest]
    fn extract_selects_named_sheet() -> googletest::Result<()> {
        let workbook = Workbook::new([
            ("Other", GridSheet::from_texts([["x", "y", "z"]])),
            ("Data", six_rows()),
        ]);
        let config = SheetExtractionConfig {
            sheet_name: Some("Data".into()),
            end_row: Some(0),
            ..Default::default()
        };
        let table = extract(&workbook, &config).or_fail()?;

        let expected: Table = [["a1", "b1"]].into();
        expect_that!(table, eq(&expected));
        Ok(())
    }
}
