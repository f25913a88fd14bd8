//! Classifier configuration types

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ClassifierError;

/// Default embeddings artifact inside the staged data directory
pub const DEFAULT_EMBEDDINGS_FILE: &str = "audio-embeddings-X-openl3.json";

/// Default labels artifact inside the staged data directory
pub const DEFAULT_LABELS_FILE: &str = "audio-embeddings-Y-openl3.json";

/// Default cache key for downloaded models
pub const DEFAULT_CACHE_KEY: &str = "audio-classifier";

/// Where the pre-trained model lives
///
/// Decided once when the configuration is built; serialized as the plain
/// path or URL string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelLocation {
    /// Model file on the local filesystem
    LocalPath(PathBuf),
    /// HTTP(S) URL, downloaded into the model cache before loading
    RemoteUrl(String),
}

impl ModelLocation {
    /// Classify a location string: `http://` and `https://` prefixes are remote
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::RemoteUrl(trimmed.to_string())
        } else {
            Self::LocalPath(PathBuf::from(trimmed))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteUrl(_))
    }
}

impl FromStr for ModelLocation {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ClassifierError::InvalidConfig(
                "model location is empty".to_string(),
            ));
        }
        Ok(Self::parse(s))
    }
}

impl TryFrom<String> for ModelLocation {
    type Error = ClassifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelLocation> for String {
    fn from(location: ModelLocation) -> Self {
        location.to_string()
    }
}

impl fmt::Display for ModelLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::RemoteUrl(url) => write!(f, "{}", url),
        }
    }
}

/// How sample identifiers are paired with embedding rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampleIdSource {
    /// Identifiers are stored alongside the embeddings in the artifact
    #[default]
    Artifact,
    /// Sorted file names of `dir`, each cut at the first occurrence of `suffix`.
    /// Row `i` of the embeddings must belong to the `i`-th name.
    Listing { dir: PathBuf, suffix: String },
}

/// Configuration for an [`AudioClassifier`](super::AudioClassifier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Directory with the embedding artifacts, or a zip archive of it
    pub data_source: PathBuf,
    /// Whether `data_source` is a zip archive to extract before use
    pub source_is_archive: bool,
    /// Pre-trained model location
    pub model: ModelLocation,
    /// Test mode has no labels: `evaluate` refuses to run
    pub test_mode: bool,
    /// Samples per inference batch
    pub batch_size: usize,
    /// Return this named layer's activation instead of the model output
    pub intermediate_layer: Option<String>,
    /// Labels artifact, relative to the staged directory unless absolute
    pub label_path: Option<PathBuf>,
    /// Source of the sample identifiers returned by `predict`
    pub sample_ids: SampleIdSource,
    /// Embeddings artifact name inside the staged directory
    pub embeddings_file: String,
    /// Labels artifact name used when `label_path` is unset
    pub labels_file: String,
    /// Model cache directory (default: `~/.cache/audio-sentiment/models`)
    pub cache_dir: Option<PathBuf>,
    /// File stem under which a downloaded model is cached
    pub cache_key: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            data_source: PathBuf::from("audio-embeddings"),
            source_is_archive: false,
            model: ModelLocation::LocalPath(PathBuf::from("audio-classifier.onnx")),
            test_mode: true,
            batch_size: 32,
            intermediate_layer: None,
            label_path: None,
            sample_ids: SampleIdSource::Artifact,
            embeddings_file: DEFAULT_EMBEDDINGS_FILE.to_string(),
            labels_file: DEFAULT_LABELS_FILE.to_string(),
            cache_dir: None,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

impl ClassifierConfig {
    /// Start a configuration for `data_source` and `model`.
    ///
    /// A `.zip` data source is treated as an archive.
    pub fn new(data_source: impl Into<PathBuf>, model: ModelLocation) -> Self {
        let data_source = data_source.into();
        let source_is_archive = is_zip_path(&data_source);
        Self {
            data_source,
            source_is_archive,
            model,
            ..Self::default()
        }
    }

    pub fn with_archive(mut self, source_is_archive: bool) -> Self {
        self.source_is_archive = source_is_archive;
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_intermediate_layer(mut self, layer: impl Into<String>) -> Self {
        self.intermediate_layer = Some(layer.into());
        self
    }

    pub fn with_label_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.label_path = Some(path.into());
        self
    }

    pub fn with_sample_ids(mut self, source: SampleIdSource) -> Self {
        self.sample_ids = source;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Validate configuration values
    pub fn validate(&mut self) {
        if self.batch_size == 0 {
            log::warn!("batch_size 0 is invalid, using 1");
            self.batch_size = 1;
        }
    }

    /// Labels artifact inside a staged directory
    pub fn labels_path_in(&self, staged_root: &Path) -> PathBuf {
        match &self.label_path {
            Some(path) => staged_root.join(path),
            None => staged_root.join(&self.labels_file),
        }
    }
}

fn is_zip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}
