//! Attribute-relation (ARFF) to table conversion
//!
//! Reads the header section for `@attribute` declarations, writes the data
//! section as a comma-separated table next to the input, then reloads that
//! table as an `f32` matrix without the identifier and label columns.
//!
//! ```text
//!  clip.arff ──► to_table ──► clip.csv ──► to_matrix ──► NumericMatrix
//! ```

mod error;
mod matrix;
mod table;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::{ConvertError, Result};
pub use matrix::{read_matrix, to_matrix, NumericMatrix};
pub use table::{to_table, Table, ATTRIBUTE_KEYWORD, DATA_KEYWORD};

/// File extension recognised by [`convert_dir`]
pub const ARFF_EXTENSION: &str = "arff";

/// Converter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Columns dropped before numeric reduction (identifier and label)
    pub excluded_columns: Vec<String>,
    /// Extension of the table written next to the input file
    pub table_extension: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            excluded_columns: vec!["name".to_string(), "class".to_string()],
            table_extension: "csv".to_string(),
        }
    }
}

impl ConvertOptions {
    /// Path of the table written for `input_path`
    pub fn table_path(&self, input_path: &Path) -> PathBuf {
        input_path.with_extension(&self.table_extension)
    }
}

/// Convert one attribute-relation file with default options.
///
/// Writes `<input stem>.csv` next to the input (overwriting it) and returns
/// the numeric matrix built from that table.
pub fn convert(input_path: impl AsRef<Path>) -> Result<NumericMatrix> {
    convert_with(input_path, &ConvertOptions::default())
}

/// Convert one attribute-relation file.
pub fn convert_with(
    input_path: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<NumericMatrix> {
    let input_path = input_path.as_ref();
    log::info!("Converting {:?}", input_path);

    let content = fs::read_to_string(input_path).map_err(|e| ConvertError::io(input_path, e))?;
    let table = to_table(content.lines(), input_path)?;

    let table_path = options.table_path(input_path);
    table.write_to(&table_path)?;

    let matrix = to_matrix(&table_path, options)?;
    log::info!(
        "Finished converting {:?} -> {:?} ({} x {})",
        input_path,
        table_path,
        matrix.nrows(),
        matrix.ncols()
    );
    Ok(matrix)
}

/// Convert every `.arff` file directly inside `dir`, in path order.
pub fn convert_dir(
    dir: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<Vec<(PathBuf, NumericMatrix)>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| ConvertError::io(dir, e))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ConvertError::io(dir, e))?.path();
        let is_arff = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ARFF_EXTENSION));
        if path.is_file() && is_arff {
            inputs.push(path);
        }
    }
    inputs.sort();

    if inputs.is_empty() {
        log::warn!("No .{} files found in {:?}", ARFF_EXTENSION, dir);
    }

    inputs
        .into_iter()
        .map(|path| {
            let matrix = convert_with(&path, options)?;
            Ok((path, matrix))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const CLIP: &str = "\
@relation emotions
@attribute name string
@attribute a numeric
@attribute b numeric
@attribute class {pos,neg}
@data
1,0.5,0.2,\"x\"
2,0.25,0.75,\"y\"
";

    #[test]
    fn test_convert_writes_sibling_table_and_returns_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.arff");
        fs::write(&input, CLIP).unwrap();

        let matrix = convert(&input).unwrap();
        assert_eq!(matrix.columns, vec!["a", "b"]);
        assert_eq!(matrix.values, array![[0.5f32, 0.2], [0.25, 0.75]]);

        let table = fs::read_to_string(dir.path().join("clip.csv")).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "name,a,b,class");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_convert_overwrites_previous_table() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.arff");
        fs::write(&input, CLIP).unwrap();
        fs::write(dir.path().join("clip.csv"), "junk\n1\n2\n3\n4\n").unwrap();

        convert(&input).unwrap();
        let table = fs::read_to_string(dir.path().join("clip.csv")).unwrap();
        assert!(table.starts_with("name,a,b,class\n"));
        assert_eq!(table.lines().count(), 3);
    }

    #[test]
    fn test_convert_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert(dir.path().join("absent.arff")).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }

    #[test]
    fn test_convert_without_data_marker_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("header_only.arff");
        fs::write(&input, "@attribute a numeric\n").unwrap();

        let err = convert(&input).unwrap_err();
        assert!(matches!(err, ConvertError::MissingDataSection { .. }));
        assert!(!dir.path().join("header_only.csv").exists());
    }

    #[test]
    fn test_convert_with_custom_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.arff");
        fs::write(&input, CLIP).unwrap();

        let options = ConvertOptions {
            table_extension: "table".to_string(),
            ..ConvertOptions::default()
        };
        convert_with(&input, &options).unwrap();
        assert!(dir.path().join("clip.table").exists());
    }

    #[test]
    fn test_convert_dir_processes_arff_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.arff"), CLIP).unwrap();
        fs::write(dir.path().join("a.ARFF"), "@attribute x numeric\n@data\n3\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "@data\n").unwrap();

        let results = convert_dir(dir.path(), &ConvertOptions::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].0.ends_with("a.ARFF"));
        assert_eq!(results[0].1.values, array![[3.0f32]]);
        assert!(results[1].0.ends_with("b.arff"));
        assert_eq!(results[1].1.nrows(), 2);
    }
}
