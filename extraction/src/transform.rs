//! Transformations applied to extracted tables before serialization.

use crate::config::SheetExtractionConfig;
use crate::table::{Row, Table};

/// Applies the transforms requested by `config` to `table`.
///
/// The delete column is always appended before transposing, so that in
/// transposed output it lands as the final column rather than the final row.
pub fn apply(config: &SheetExtractionConfig, mut table: Table) -> Table {
    if config.delete_column {
        append_delete_row(&mut table);
    }
    if config.transpose {
        table = transpose(table);
    }
    table
}

/// Appends a row `["deleted", "False", ...]` as wide as the widest row. An
/// empty table is left unchanged.
pub fn append_delete_row(table: &mut Table) {
    let width = table.max_row_len();
    if width == 0 {
        return;
    }
    let mut row = Row(Vec::with_capacity(width));
    row.push("deleted".to_string());
    row.resize(width, "False".to_string());
    table.push(row);
}

/// Swaps rows and columns. Ragged input is not padded: output row `j` only
/// holds cells from the input rows that are longer than `j`.
pub fn transpose(table: Table) -> Table {
    let orig_num_cols = table.max_row_len();
    let orig_num_rows = table.len();

    let mut out_table = Table(Vec::with_capacity(orig_num_cols));
    for _ in 0..orig_num_cols {
        out_table.push(Row(Vec::with_capacity(orig_num_rows)));
    }

    for row in table.0 {
        for (orig_col, cell) in row.0.into_iter().enumerate() {
            out_table[orig_col].push(cell);
        }
    }

    out_table
}
