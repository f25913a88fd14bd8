//! Application configuration for the `audio-sentiment` tool
//!
//! Stored as YAML; see [`sentiment_core::config`] for load/save.
//! Command line flags override values read from the file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sentiment_core::ConvertOptions;

use crate::classifier::ClassifierConfig;

pub use sentiment_core::config::{default_config_path, load_config, read_config, save_config};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Inference wrapper settings
    pub classifier: ClassifierConfig,
    /// Attribute-relation converter settings
    pub converter: ConvertOptions,
}

impl AppConfig {
    /// Load the configuration for one run.
    ///
    /// An explicitly named file must exist and parse; otherwise the default
    /// location is tried and silently replaced by defaults when unusable.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => read_config(path),
            None => Ok(load_config(&default_config_path())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ModelLocation;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "classifier:\n  model: https://example.org/model.onnx\n  batch_size: 8\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.classifier.model.is_remote());
        assert_eq!(config.classifier.batch_size, 8);
        assert!(config.classifier.test_mode);
        assert_eq!(config.converter, ConvertOptions::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio-sentiment.yaml");

        let mut config = AppConfig::default();
        config.classifier = ClassifierConfig::new("clips.zip", ModelLocation::parse("model.onnx"))
            .with_test_mode(false);
        config.converter.excluded_columns = vec!["id".to_string()];

        save_config(&config, &path).unwrap();
        let loaded = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_explicit_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "classifier:\n  batch_size: [not a number\n").unwrap();

        assert!(AppConfig::load(Some(&path)).is_err());
        assert!(AppConfig::load(Some(&dir.path().join("missing.yaml"))).is_err());
    }
}
