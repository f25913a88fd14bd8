//! Audio sentiment classification over precomputed embeddings
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    AudioClassifier                       │
//! │  • stages the data source (zip → scoped temp dir)       │
//! │  • loads + normalizes embeddings per sample             │
//! │  • batches inference, scores against labels             │
//! └─────────────────────────────────────────────────────────┘
//!              │                              │
//!              ▼                              ▼
//!     ┌─────────────────┐          ┌─────────────────────┐
//!     │   ModelStore    │          │ ModelBackend (trait) │
//!     │ path / URL+cache│          │   OrtBackend (ort)   │
//!     └─────────────────┘          └─────────────────────┘
//! ```

mod config;
mod embeddings;
mod error;
mod metrics;
mod model;
mod normalize;
mod service;
mod staging;
mod store;

pub use config::{
    ClassifierConfig, ModelLocation, SampleIdSource, DEFAULT_CACHE_KEY, DEFAULT_EMBEDDINGS_FILE,
    DEFAULT_LABELS_FILE,
};
pub use embeddings::{
    list_sample_ids, load_embeddings, load_labels, EmbeddingBatch, Label, LabelBatch,
};
pub use error::{ClassifierError, ModelLoadError};
pub use metrics::{score, EvaluationScore};
pub use model::{
    select_output, ModelBackend, ModelSummary, OrtBackend, OrtModel, SentimentModel, TensorInfo,
};
pub use normalize::{normalize_batch, normalize_rows};
pub use service::{run_batched, AudioClassifier, PredictionSet};
pub use staging::{stage, StagedData};
pub use store::ModelStore;
