//! Conversion error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while converting an attribute-relation file
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("No @data section found in {path}")]
    MissingDataSection { path: PathBuf },

    #[error("Malformed attribute declaration on line {line}: {content:?}")]
    MalformedDeclaration { line: usize, content: String },

    #[error("Row {row}, column '{column}': '{value}' is not a number")]
    Coercion {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the input's structure rather than its values
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::MissingDataSection { .. } | Self::MalformedDeclaration { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
