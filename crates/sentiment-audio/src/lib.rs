//! Sentiment Audio - sentiment prediction from precomputed audio embeddings
//!
//! Loads a pre-trained ONNX classifier (from disk or a URL), L2-normalizes
//! each sample's embedding frames and runs batched prediction or evaluation.

pub mod classifier;
pub mod config;

pub use classifier::{AudioClassifier, ClassifierConfig, ClassifierError, ModelLocation};
pub use config::AppConfig;
