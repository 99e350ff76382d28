//! Serialization of extracted tables as CSV.
//!
//! The dialect is fixed: the first row is a header whose names are normalised
//! to `snake_case`-like identifiers, fields are comma separated, rows are
//! separated by a single `\n` with no trailing terminator, and a field is
//! quoted when it contains any of `,` `\n` `'` `/` `\` or `"`.

use std::io::Write;

use lazy_regex::regex;

use crate::table::{Row, Table};

const QUOTE_TRIGGERS: &[char] = &[',', '\n', '\'', '/', '\\', '"'];

/// Normalises a header cell: removes `*`, lower-cases, replaces runs of ASCII
/// whitespace with `_` and strips trailing underscores.
pub fn normalise_header(name: &str) -> String {
    let lowered = name.replace('*', "").to_lowercase();
    let underscored = regex!(r"[ \t\n\x0B\f\r]+").replace_all(&lowered, "_");
    underscored.trim_end_matches('_').to_string()
}

/// Escapes a data field: doubles every `"`, then wraps the result in quotes
/// if it contains a character that needs quoting.
pub fn escape_field(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    if escaped.contains(QUOTE_TRIGGERS) {
        format!("\"{escaped}\"")
    } else {
        escaped
    }
}

/// Renders `table` to a string. An empty table renders as an empty string.
pub fn to_csv_string(table: &Table) -> String {
    let mut lines = Vec::with_capacity(table.len());
    for (index, row) in table.iter().enumerate() {
        lines.push(if index == 0 {
            join_row(row, normalise_header)
        } else {
            join_row(row, escape_field)
        });
    }
    lines.join("\n")
}

/// Writes `table` as CSV to `writer`.
pub fn write_table<W: Write>(table: &Table, mut writer: W) -> std::io::Result<()> {
    writer.write_all(to_csv_string(table).as_bytes())?;
    writer.flush()
}

fn join_row(row: &Row, render: fn(&str) -> String) -> String {
    row.iter()
        .map(|cell| render(cell))
        .collect::<Vec<_>>()
        .join(",")
}
