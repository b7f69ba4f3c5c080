//! Single-column numeric series from CSV files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, SimError};

/// Reads one numeric column of the CSV file at `path`, multiplied by `scale`.
///
/// `column = None` selects the last column of each row, which allows rows
/// of differing width.
///
/// # Errors
///
/// Returns an I/O or CSV error if the file cannot be read, or
/// `SimError::Parse` for a missing or non-numeric cell.
pub fn read_series(
    path: &Path,
    column: Option<usize>,
    has_header: bool,
    scale: f64,
) -> Result<Vec<f64>> {
    let file = File::open(path)?;
    parse_series(file, path, column, has_header, scale)
}

/// Parses a series from any reader. `path` is only used in error messages.
///
/// # Errors
///
/// See [`read_series`].
pub fn parse_series(
    reader: impl Read,
    path: &Path,
    column: Option<usize>,
    has_header: bool,
    scale: f64,
) -> Result<Vec<f64>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .flexible(true)
        .from_reader(reader);

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let idx = column.unwrap_or_else(|| record.len().saturating_sub(1));
        let cell = record.get(idx).ok_or_else(|| SimError::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("missing column {idx}"),
        })?;
        let value: f64 = cell.trim().parse().map_err(|e| SimError::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("\"{cell}\" is not a number: {e}"),
        })?;
        values.push(value * scale);
    }
    Ok(values)
}
