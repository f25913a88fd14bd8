//! Audio classifier service - coordinates staging, model loading and inference
//!
//! The `AudioClassifier` is the main entry point. Every call stages the data
//! afresh and loads the model afresh; nothing is cached between calls except
//! downloaded model files.

use std::path::PathBuf;
use std::sync::Arc;

use ndarray::{Array2, Array3, Axis};

use super::config::ClassifierConfig;
use super::embeddings::{load_embeddings, load_labels, EmbeddingBatch};
use super::error::{ClassifierError, Result};
use super::metrics::{score, EvaluationScore};
use super::model::{ModelBackend, ModelSummary, OrtBackend, SentimentModel};
use super::normalize::normalize_batch;
use super::staging::{stage, StagedData};
use super::store::ModelStore;

/// Model outputs for each sample, keyed by sample identifier
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSet {
    /// Sample identifiers, row `i` of `scores` belongs to `ids[i]`
    pub ids: Vec<String>,
    /// One row of model output per sample
    pub scores: Array2<f32>,
}

impl PredictionSet {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate `(id, output row)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, ndarray::ArrayView1<'_, f32>)> {
        self.ids.iter().map(String::as_str).zip(self.scores.outer_iter())
    }
}

/// Classifies sentiment from precomputed audio embeddings
///
/// ```ignore
/// let config = ClassifierConfig::new("embeddings.zip", ModelLocation::parse("model.onnx"));
/// let classifier = AudioClassifier::new(config)?;
/// let predictions = classifier.predict()?;
/// ```
pub struct AudioClassifier {
    config: ClassifierConfig,
    store: ModelStore,
    backend: Arc<dyn ModelBackend>,
}

impl AudioClassifier {
    /// Create a classifier using the ONNX Runtime backend
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        Self::with_backend(config, Arc::new(OrtBackend::new()))
    }

    /// Create a classifier with a custom model backend
    pub fn with_backend(
        mut config: ClassifierConfig,
        backend: Arc<dyn ModelBackend>,
    ) -> Result<Self> {
        config.validate();

        let store = match &config.cache_dir {
            Some(dir) => ModelStore::with_cache_dir(dir.clone(), config.cache_key.clone()),
            None => ModelStore::new(config.cache_key.clone()),
        };

        log::info!(
            "AudioClassifier created with data_source = {:?}, test_mode = {}, model = {}, backend = {}",
            config.data_source,
            config.test_mode,
            config.model,
            backend.name()
        );

        Ok(Self {
            config,
            store,
            backend,
        })
    }

    /// Get current configuration
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Get the model store (for cache operations)
    pub fn model_store(&self) -> &ModelStore {
        &self.store
    }

    /// Make the data source available as a directory
    ///
    /// The returned value owns any temporary extraction directory.
    pub fn stage(&self) -> Result<StagedData> {
        log::info!("Staging data from {:?}", self.config.data_source);
        let staged = stage(&self.config.data_source, self.config.source_is_archive)?;
        log::info!("Data staged at {:?}", staged.root());
        Ok(staged)
    }

    /// Resolve the model location and load it, optionally rewired to `layer`
    pub fn load_model(&self, layer: Option<&str>) -> Result<Box<dyn SentimentModel>> {
        let path = self.store.resolve(&self.config.model)?;
        self.backend.load(&path, layer)
    }

    fn load_normalized_embeddings(&self, staged: &StagedData) -> Result<EmbeddingBatch> {
        let path = staged.root().join(&self.config.embeddings_file);
        let mut batch = load_embeddings(&path, &self.config.sample_ids)?;
        normalize_batch(&mut batch);
        Ok(batch)
    }

    /// Predict every sample in the data source
    ///
    /// Honours the configured intermediate layer.
    pub fn predict(&self) -> Result<PredictionSet> {
        let staged = self.stage()?;
        let batch = self.load_normalized_embeddings(&staged)?;

        let mut model = self.load_model(self.config.intermediate_layer.as_deref())?;
        let scores = run_batched(model.as_mut(), &batch.samples, self.config.batch_size)?;

        Ok(PredictionSet {
            ids: batch.ids,
            scores,
        })
    }

    /// Score the model against the labelled data source
    ///
    /// Returns `Ok(None)` without touching data or model in test mode.
    pub fn evaluate(&self) -> Result<Option<EvaluationScore>> {
        if self.config.test_mode {
            log::warn!("Evaluation cannot be done in test-mode");
            return Ok(None);
        }

        let staged = self.stage()?;
        let batch = self.load_normalized_embeddings(&staged)?;
        let labels = load_labels(&self.config.labels_path_in(staged.root()), &batch)?;

        let mut model = self.load_model(None)?;
        let predictions = run_batched(model.as_mut(), &batch.samples, self.config.batch_size)?;

        let result = score(&predictions, &labels)?;
        log::info!("Evaluation: {}", result);
        Ok(Some(result))
    }

    /// Describe the model's structure
    pub fn summary(&self) -> Result<ModelSummary> {
        let model = self.load_model(self.config.intermediate_layer.as_deref())?;
        Ok(model.summary())
    }

    /// Where a remote model would be cached, for diagnostics
    pub fn cached_model_path(&self) -> Result<PathBuf> {
        self.store.cached_path()
    }
}

/// Run `model` over `samples` in groups of at most `batch_size`.
///
/// Consecutive samples share a batch only while their shapes match; samples
/// are never padded. Output rows follow sample order.
pub fn run_batched(
    model: &mut dyn SentimentModel,
    samples: &[Array2<f32>],
    batch_size: usize,
) -> Result<Array2<f32>> {
    let batch_size = batch_size.max(1);
    let mut rows: Vec<Array2<f32>> = Vec::new();

    let mut start = 0;
    while start < samples.len() {
        let shape = samples[start].dim();
        let mut end = start + 1;
        while end < samples.len() && end - start < batch_size && samples[end].dim() == shape {
            end += 1;
        }

        let group = &samples[start..end];
        let mut input = Array3::<f32>::zeros((group.len(), shape.0, shape.1));
        for (mut slot, sample) in input.outer_iter_mut().zip(group) {
            slot.assign(sample);
        }

        log::debug!("Predicting samples {}..{} with shape {:?}", start, end, shape);
        let output = model.predict(input)?;
        if output.nrows() != group.len() {
            return Err(ClassifierError::Inference(format!(
                "model returned {} rows for a batch of {}",
                output.nrows(),
                group.len()
            )));
        }
        rows.push(output);
        start = end;
    }

    if rows.is_empty() {
        return Ok(Array2::zeros((0, 0)));
    }

    let width = rows[0].ncols();
    if let Some(bad) = rows.iter().find(|r| r.ncols() != width) {
        return Err(ClassifierError::Inference(format!(
            "model output width changed from {} to {}",
            width,
            bad.ncols()
        )));
    }

    let views: Vec<_> = rows.iter().map(|r| r.view()).collect();
    ndarray::concatenate(Axis(0), &views).map_err(|e| ClassifierError::Inference(e.to_string()))
}
