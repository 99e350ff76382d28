use crate::error::{ExtractionError, Result};

/// An inclusive span of 0-based row indexes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn single(row: usize) -> Self {
        Self {
            start: row,
            end: row,
        }
    }
}

/// Parses a range expression such as `"3,10-15,8"` into 0-based row ranges.
///
/// Each comma-separated token is either `N` or `N-M`, 1-based and inclusive.
/// Ranges are returned in token order; overlaps and repeats are kept.
pub fn parse_range_expression(expression: &str) -> Result<Vec<RowRange>> {
    expression
        .split(',')
        .map(|token| parse_token(expression, token))
        .collect()
}

fn parse_token(expression: &str, token: &str) -> Result<RowRange> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ExtractionError::malformed_range(expression, "empty token"));
    }

    let mut parts = token.split('-');
    let start = parse_row(expression, parts.next().unwrap_or_default())?;
    let end = match parts.next() {
        Some(end) => parse_row(expression, end)?,
        None => start,
    };
    if parts.next().is_some() {
        return Err(ExtractionError::malformed_range(
            expression,
            format!("token {token:?} has more than one '-'"),
        ));
    }
    if end < start {
        return Err(ExtractionError::malformed_range(
            expression,
            format!("token {token:?} ends before it starts"),
        ));
    }

    Ok(RowRange {
        start: start - 1,
        end: end - 1,
    })
}

fn parse_row(expression: &str, text: &str) -> Result<usize> {
    let text = text.trim();
    match text.parse::<usize>() {
        Ok(0) => Err(ExtractionError::malformed_range(
            expression,
            "row numbers start at 1",
        )),
        Ok(row) => Ok(row),
        Err(e) => Err(ExtractionError::malformed_range(
            expression,
            format!("{text:?} is not a row number: {e}"),
        )),
    }
}
