//! Classifier error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or adapting a model
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Failed to load model {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Model has no layer named '{layer}' (available: {})", available.join(", "))]
    UnknownLayer {
        layer: String,
        available: Vec<String>,
    },
}

/// Errors that can occur during staging, loading, prediction or evaluation
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Model download failed: {0}")]
    ModelDownloadFailed(String),

    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    #[error("Invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClassifierError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
