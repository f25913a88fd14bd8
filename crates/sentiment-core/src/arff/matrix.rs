//! Reduce a persisted table to a numeric feature matrix

use std::io::Read;
use std::path::Path;

use ndarray::Array2;

use super::error::{ConvertError, Result};
use super::ConvertOptions;

/// A 2-D `f32` matrix with the names of the columns it kept.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatrix {
    /// Retained column names, in table order.
    pub columns: Vec<String>,
    /// One row per data record, one column per retained column.
    pub values: Array2<f32>,
}

impl NumericMatrix {
    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of retained columns
    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

/// Load a comma-separated table from disk and reduce it to a [`NumericMatrix`].
pub fn to_matrix(table_path: &Path, options: &ConvertOptions) -> Result<NumericMatrix> {
    let file = std::fs::File::open(table_path).map_err(|e| ConvertError::io(table_path, e))?;
    read_matrix(file, options)
}

/// Reduce comma-separated text to a [`NumericMatrix`].
///
/// Columns named in `options.excluded_columns` are dropped when present (every
/// occurrence of a duplicated name). All remaining fields must parse as `f32`.
pub fn read_matrix<R: Read>(reader: R, options: &ConvertOptions) -> Result<NumericMatrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let kept: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !options.excluded_columns.iter().any(|ex| ex == name))
        .map(|(i, name)| (i, name.to_string()))
        .collect();

    let mut flat = Vec::new();
    let mut n_rows = 0usize;

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        for (col_idx, name) in &kept {
            let raw = record.get(*col_idx).unwrap_or("");
            let value = raw
                .trim()
                .parse::<f32>()
                .map_err(|_| ConvertError::Coercion {
                    row: row_idx + 1,
                    column: name.clone(),
                    value: raw.to_string(),
                })?;
            flat.push(value);
        }
        n_rows += 1;
    }

    let columns: Vec<String> = kept.into_iter().map(|(_, name)| name).collect();
    let values = Array2::from_shape_vec((n_rows, columns.len()), flat)?;

    Ok(NumericMatrix { columns, values })
}
