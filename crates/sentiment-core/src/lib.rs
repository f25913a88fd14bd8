//! Sentiment Core - attribute-relation conversion and shared configuration
//!
//! The converter turns legacy attribute-relation text files into a
//! comma-separated table plus a numeric feature matrix for model input.

pub mod arff;
pub mod config;

pub use arff::{
    convert, convert_dir, convert_with, ConvertError, ConvertOptions, NumericMatrix, Table,
};
