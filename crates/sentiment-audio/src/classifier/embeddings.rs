//! Embedding and label artifacts
//!
//! Both artifacts are JSON written by the upstream extraction pipeline:
//!
//! ```text
//! audio-embeddings-X-openl3.json   {"ids": ["clip_a", ...], "samples": [[[f32; features]; frames], ...]}
//! audio-embeddings-Y-openl3.json   {"ids": [...]?, "labels": [0, [0.0, 1.0], ...]}
//! ```
//!
//! Samples are ragged: each one has its own frame count (and may even have
//! its own feature width), so they are kept as separate 2-D arrays.

use std::fs;
use std::path::Path;

use ndarray::Array2;
use serde::Deserialize;

use super::config::SampleIdSource;
use super::error::{ClassifierError, Result};

/// Per-sample 2-D embedding blocks with their identifiers
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBatch {
    /// One identifier per sample, in sample order
    pub ids: Vec<String>,
    /// `frames x features` block for each sample
    pub samples: Vec<Array2<f32>>,
}

impl EmbeddingBatch {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Target for a single sample
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Label {
    /// Class index, or binary target for single-output models
    Scalar(f32),
    /// One-hot (or soft) target vector
    Vector(Vec<f32>),
}

/// Labels parallel to an [`EmbeddingBatch`]
#[derive(Debug, Clone, PartialEq)]
pub struct LabelBatch {
    pub labels: Vec<Label>,
}

impl LabelBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Deserialize)]
struct EmbeddingFile {
    #[serde(default)]
    ids: Option<Vec<String>>,
    samples: Vec<Vec<Vec<f32>>>,
}

#[derive(Deserialize)]
struct LabelFile {
    #[serde(default)]
    ids: Option<Vec<String>>,
    labels: Vec<Label>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| ClassifierError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| ClassifierError::artifact(path, e.to_string()))
}

/// Convert one sample's frame list into a `frames x features` array.
fn sample_to_array(path: &Path, index: usize, frames: Vec<Vec<f32>>) -> Result<Array2<f32>> {
    let n_frames = frames.len();
    let width = frames.first().map_or(0, Vec::len);

    let mut flat = Vec::with_capacity(n_frames * width);
    for (frame_idx, frame) in frames.into_iter().enumerate() {
        if frame.len() != width {
            return Err(ClassifierError::artifact(
                path,
                format!(
                    "sample {index}: frame {frame_idx} has {} features, expected {width}",
                    frame.len()
                ),
            ));
        }
        flat.extend(frame);
    }

    Array2::from_shape_vec((n_frames, width), flat)
        .map_err(|e| ClassifierError::artifact(path, format!("sample {index}: {e}")))
}

/// Load the embedding artifact and pair each sample with its identifier.
pub fn load_embeddings(path: &Path, ids: &SampleIdSource) -> Result<EmbeddingBatch> {
    let file: EmbeddingFile = read_json(path)?;

    let samples = file
        .samples
        .into_iter()
        .enumerate()
        .map(|(i, frames)| sample_to_array(path, i, frames))
        .collect::<Result<Vec<_>>>()?;

    let ids = match ids {
        SampleIdSource::Artifact => file.ids.ok_or_else(|| {
            ClassifierError::artifact(
                path,
                "no \"ids\" field; configure a sample id listing instead",
            )
        })?,
        SampleIdSource::Listing { dir, suffix } => list_sample_ids(dir, suffix)?,
    };

    if ids.len() != samples.len() {
        return Err(ClassifierError::artifact(
            path,
            format!("{} samples but {} identifiers", samples.len(), ids.len()),
        ));
    }

    log::info!("Loaded {} embedding samples from {:?}", samples.len(), path);
    Ok(EmbeddingBatch { ids, samples })
}

/// Load the label artifact and check it lines up with `embeddings`.
pub fn load_labels(path: &Path, embeddings: &EmbeddingBatch) -> Result<LabelBatch> {
    let file: LabelFile = read_json(path)?;

    if file.labels.len() != embeddings.len() {
        return Err(ClassifierError::artifact(
            path,
            format!("{} labels for {} samples", file.labels.len(), embeddings.len()),
        ));
    }

    if let Some(ids) = &file.ids {
        if let Some(pos) = ids.iter().zip(&embeddings.ids).position(|(a, b)| a != b) {
            return Err(ClassifierError::artifact(
                path,
                format!(
                    "label {pos} is for '{}' but sample {pos} is '{}'",
                    ids[pos], embeddings.ids[pos]
                ),
            ));
        }
        if ids.len() != embeddings.ids.len() {
            return Err(ClassifierError::artifact(
                path,
                format!("{} label ids for {} samples", ids.len(), embeddings.ids.len()),
            ));
        }
    }

    Ok(LabelBatch { labels: file.labels })
}

/// Sorted file names in `dir`, each cut at the first occurrence of `suffix`.
pub fn list_sample_ids(dir: &Path, suffix: &str) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| ClassifierError::io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ClassifierError::io(dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| ClassifierError::io(entry.path(), e))?
            .is_file();
        if is_file {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| match name.find(suffix) {
            Some(pos) if !suffix.is_empty() => name[..pos].to_string(),
            _ => name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_load_ragged_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.json");
        fs::write(
            &path,
            r#"{"ids": ["a", "b"], "samples": [[[1, 2], [3, 4], [5, 6]], [[7, 8, 9]]]}"#,
        )
        .unwrap();

        let batch = load_embeddings(&path, &SampleIdSource::Artifact).unwrap();
        assert_eq!(batch.ids, vec!["a", "b"]);
        assert_eq!(batch.samples[0], array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(batch.samples[1], array![[7.0f32, 8.0, 9.0]]);
    }

    #[test]
    fn test_uneven_frames_within_a_sample_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.json");
        fs::write(&path, r#"{"ids": ["a"], "samples": [[[1, 2], [3]]]}"#).unwrap();

        let err = load_embeddings(&path, &SampleIdSource::Artifact).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidArtifact { .. }));
    }

    #[test]
    fn test_missing_ids_without_listing_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.json");
        fs::write(&path, r#"{"samples": [[[1]]]}"#).unwrap();

        assert!(load_embeddings(&path, &SampleIdSource::Artifact).is_err());
    }

    #[test]
    fn test_listing_ids_are_sorted_and_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let listing = dir.path().join("audio-pickle");
        fs::create_dir(&listing).unwrap();
        for name in ["video_b.mp4.pkl", "video_a.mp4.pkl", "video_c.mp4.pkl"] {
            fs::write(listing.join(name), b"").unwrap();
        }
        fs::create_dir(listing.join("subdir")).unwrap();

        let ids = list_sample_ids(&listing, ".mp4").unwrap();
        assert_eq!(ids, vec!["video_a", "video_b", "video_c"]);
    }

    #[test]
    fn test_listing_count_must_match_samples() {
        let dir = tempfile::tempdir().unwrap();
        let listing = dir.path().join("names");
        fs::create_dir(&listing).unwrap();
        fs::write(listing.join("only.mp4"), b"").unwrap();

        let path = dir.path().join("X.json");
        fs::write(&path, r#"{"samples": [[[1]], [[2]]]}"#).unwrap();

        let source = SampleIdSource::Listing {
            dir: listing,
            suffix: ".mp4".to_string(),
        };
        let err = load_embeddings(&path, &source).unwrap_err();
        assert!(err.to_string().contains("Invalid artifact"));
    }

    #[test]
    fn test_labels_accept_scalars_and_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let embeddings = EmbeddingBatch {
            ids: vec!["a".to_string(), "b".to_string()],
            samples: vec![Array2::zeros((1, 2)), Array2::zeros((1, 2))],
        };

        let path = dir.path().join("Y.json");
        fs::write(&path, r#"{"ids": ["a", "b"], "labels": [1, [0.0, 1.0]]}"#).unwrap();
        let labels = load_labels(&path, &embeddings).unwrap();
        assert_eq!(labels.labels, vec![Label::Scalar(1.0), Label::Vector(vec![0.0, 1.0])]);
    }

    #[test]
    fn test_label_ids_must_match_sample_order() {
        let dir = tempfile::tempdir().unwrap();
        let embeddings = EmbeddingBatch {
            ids: vec!["a".to_string(), "b".to_string()],
            samples: vec![Array2::zeros((1, 1)), Array2::zeros((1, 1))],
        };

        let path = dir.path().join("Y.json");
        fs::write(&path, r#"{"ids": ["b", "a"], "labels": [0, 1]}"#).unwrap();
        assert!(load_labels(&path, &embeddings).is_err());

        fs::write(&path, r#"{"labels": [0]}"#).unwrap();
        assert!(load_labels(&path, &embeddings).is_err());
    }
}
