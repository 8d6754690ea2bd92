//! Column sampling utility
//!
//! Copies one column of the first N data rows into numbered files
//! (`0`, `1`, ...) so individual values can be fed to other tools by hand.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{EnrichError, Result};
use crate::utils::row::Row;

pub const DEFAULT_SAMPLE_LIMIT: usize = 100;

/// Write the trimmed value of `column` for up to `limit` data rows.
///
/// The header line is skipped. A row without the column fails with its
/// 1-based data line number.
/// Returns the files written, in row order.
pub fn extract_column(
    input: &Path,
    output_dir: &Path,
    column: usize,
    limit: usize,
    delimiter: char,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| EnrichError::io(output_dir, e))?;
    let reader = BufReader::new(File::open(input).map_err(|e| EnrichError::io(input, e))?);

    let mut written = Vec::with_capacity(limit.min(DEFAULT_SAMPLE_LIMIT));
    for (number, line) in reader.lines().skip(1).enumerate() {
        if written.len() == limit {
            break;
        }
        let line = line?;
        let row = Row::parse(&line, delimiter);
        let value = row.get(column).ok_or(EnrichError::MissingColumn {
            line: number + 1,
            index: column,
            len: row.len(),
        })?;

        let path = output_dir.join(written.len().to_string());
        let mut out = File::create(&path).map_err(|e| EnrichError::io(&path, e))?;
        writeln!(out, "{}", value.trim()).map_err(|e| EnrichError::io(&path, e))?;
        written.push(path);
    }

    tracing::info!("Extracted column {} from {} rows into {:?}", column, written.len(), output_dir);
    Ok(written)
}
