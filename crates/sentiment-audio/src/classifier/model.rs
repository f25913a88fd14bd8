//! Model backend trait and the ONNX Runtime implementation
//!
//! The classifier never talks to a runtime directly; it asks a
//! [`ModelBackend`] to load a file and gets back a [`SentimentModel`].
//!
//! ## Intermediate layers
//!
//! A model exported with several graph outputs (for example the class
//! probabilities plus the penultimate dense activation) can be rewired to
//! return one of the other outputs by name. The first output is the default.

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3};

use super::error::{ClassifierError, ModelLoadError, Result};

/// Name and element type of one model input or output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    pub name: String,
    pub kind: String,
}

/// Structural description of a loaded model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub backend: String,
    pub path: PathBuf,
    pub inputs: Vec<TensorInfo>,
    pub outputs: Vec<TensorInfo>,
    /// Output returned by `predict`
    pub selected_output: String,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {} ({})", self.path.display(), self.backend)?;
        writeln!(f, "{:<8} {:<32} {}", "Role", "Name", "Type")?;
        writeln!(f, "{}", "-".repeat(72))?;
        for input in &self.inputs {
            writeln!(f, "{:<8} {:<32} {}", "input", input.name, input.kind)?;
        }
        for output in &self.outputs {
            let role = if output.name == self.selected_output {
                "output*"
            } else {
                "output"
            };
            writeln!(f, "{:<8} {:<32} {}", role, output.name, output.kind)?;
        }
        write!(f, "* returned by predict")
    }
}

/// A loaded model that maps `[batch, frames, features]` to `[batch, outputs]`
pub trait SentimentModel {
    /// Run inference on one batch of equally shaped samples.
    fn predict(&mut self, batch: Array3<f32>) -> Result<Array2<f32>>;

    /// Describe the model's inputs and outputs
    fn summary(&self) -> ModelSummary;
}

/// Loads serialized models from local files
pub trait ModelBackend: Send + Sync {
    /// Load the model at `path`, returning the `layer` output instead of the
    /// default one when given.
    fn load(&self, path: &Path, layer: Option<&str>) -> Result<Box<dyn SentimentModel>>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Pick the output a model should return.
///
/// `None` selects the first output. A name not among `available` is
/// [`ModelLoadError::UnknownLayer`].
pub fn select_output(
    path: &Path,
    available: &[String],
    layer: Option<&str>,
) -> std::result::Result<String, ModelLoadError> {
    match layer {
        Some(layer) => available
            .iter()
            .find(|name| name.as_str() == layer)
            .cloned()
            .ok_or_else(|| ModelLoadError::UnknownLayer {
                layer: layer.to_string(),
                available: available.to_vec(),
            }),
        None => available
            .first()
            .cloned()
            .ok_or_else(|| ModelLoadError::Unreadable {
                path: path.to_path_buf(),
                reason: "model has no outputs".to_string(),
            }),
    }
}

/// Reshape a flat `[batch, ...]` tensor into `[batch, rest]`.
pub(crate) fn flatten_output(shape: &[i64], data: &[f32]) -> Result<Array2<f32>> {
    let batch = shape.first().copied().unwrap_or(0).max(0) as usize;
    if batch == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    let width = data.len() / batch;
    Array2::from_shape_vec((batch, width), data.to_vec())
        .map_err(|e| ClassifierError::Inference(format!("output shape {:?}: {}", shape, e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// ONNX Runtime backend
// ─────────────────────────────────────────────────────────────────────────────

/// Backend using ONNX Runtime via the `ort` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtBackend;

impl OrtBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ModelBackend for OrtBackend {
    fn load(&self, path: &Path, layer: Option<&str>) -> Result<Box<dyn SentimentModel>> {
        Ok(Box::new(OrtModel::load(path, layer)?))
    }

    fn name(&self) -> &'static str {
        "ONNX Runtime"
    }
}

/// An ONNX session bound to one input and one selected output
pub struct OrtModel {
    session: ort::session::Session,
    input_name: String,
    output_name: String,
    summary: ModelSummary,
}

impl OrtModel {
    /// Load an ONNX model, optionally returning a named intermediate output.
    pub fn load(path: &Path, layer: Option<&str>) -> std::result::Result<Self, ModelLoadError> {
        use ort::session::{builder::GraphOptimizationLevel, Session};

        let unreadable = |reason: String| ModelLoadError::Unreadable {
            path: path.to_path_buf(),
            reason,
        };

        log::info!("Loading ONNX model from {:?}", path);

        let session = Session::builder()
            .map_err(|e| unreadable(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| unreadable(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| unreadable(e.to_string()))?;

        let inputs: Vec<TensorInfo> = session
            .inputs()
            .iter()
            .map(|input| TensorInfo {
                name: input.name().to_string(),
                kind: format!("{:?}", input.dtype()),
            })
            .collect();
        let outputs: Vec<TensorInfo> = session
            .outputs()
            .iter()
            .map(|output| TensorInfo {
                name: output.name().to_string(),
                kind: format!("{:?}", output.dtype()),
            })
            .collect();

        let input_name = inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| unreadable("model has no inputs".to_string()))?;

        let output_names: Vec<String> = outputs.iter().map(|o| o.name.clone()).collect();
        let output_name = select_output(path, &output_names, layer)?;
        if layer.is_some() {
            log::info!("Customizing model by returning layer {}", output_name);
        }

        let summary = ModelSummary {
            backend: "ONNX Runtime".to_string(),
            path: path.to_path_buf(),
            inputs,
            outputs,
            selected_output: output_name.clone(),
        };

        Ok(Self {
            session,
            input_name,
            output_name,
            summary,
        })
    }
}

impl SentimentModel for OrtModel {
    fn predict(&mut self, batch: Array3<f32>) -> Result<Array2<f32>> {
        use ort::value::Tensor;

        let input_tensor = Tensor::from_array(batch).map_err(|e| {
            ClassifierError::Inference(format!("Failed to create input tensor: {}", e))
        })?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name.as_str())
            .ok_or_else(|| {
                ClassifierError::Inference(format!("No output tensor named {}", self.output_name))
            })?
            .1;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("Failed to extract output: {}", e)))?;

        let shape: Vec<i64> = shape.iter().copied().collect();
        flatten_output(&shape, data)
    }

    fn summary(&self) -> ModelSummary {
        self.summary.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_output_defaults_to_first() {
        let available = names(&["probabilities", "dense_1"]);
        assert_eq!(select_output(Path::new("m.onnx"), &available, None).unwrap(), "probabilities");
    }

    #[test]
    fn test_select_named_layer() {
        let available = names(&["probabilities", "dense_1"]);
        assert_eq!(
            select_output(Path::new("m.onnx"), &available, Some("dense_1")).unwrap(),
            "dense_1"
        );
    }

    #[test]
    fn test_unknown_layer_is_model_load_error() {
        let available = names(&["probabilities"]);
        let err = select_output(Path::new("m.onnx"), &available, Some("missing")).unwrap_err();
        match &err {
            ModelLoadError::UnknownLayer { layer, available } => {
                assert_eq!(layer, "missing");
                assert_eq!(available, &vec!["probabilities".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let wrapped: ClassifierError = err.into();
        assert!(matches!(wrapped, ClassifierError::ModelLoad(ModelLoadError::UnknownLayer { .. })));
    }

    #[test]
    fn test_model_without_outputs_is_unreadable() {
        let err = select_output(Path::new("m.onnx"), &[], None).unwrap_err();
        assert!(matches!(err, ModelLoadError::Unreadable { .. }));
    }

    #[test]
    fn test_flatten_output_keeps_batch_rows() {
        let out = flatten_output(&[2, 1, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(out.shape(), &[2, 3]);
        assert_eq!(out[[1, 0]], 4.0);
    }

    #[test]
    fn test_missing_model_file_is_unreadable() {
        let err = OrtModel::load(Path::new("/nonexistent/model.onnx"), None).err().unwrap();
        assert!(matches!(err, ModelLoadError::Unreadable { .. }));
    }

    #[test]
    fn test_summary_marks_selected_output() {
        let summary = ModelSummary {
            backend: "test".to_string(),
            path: PathBuf::from("m.onnx"),
            inputs: vec![TensorInfo {
                name: "embeddings".to_string(),
                kind: "f32".to_string(),
            }],
            outputs: vec![
                TensorInfo {
                    name: "probabilities".to_string(),
                    kind: "f32".to_string(),
                },
                TensorInfo {
                    name: "dense_1".to_string(),
                    kind: "f32".to_string(),
                },
            ],
            selected_output: "dense_1".to_string(),
        };
        let text = summary.to_string();
        assert!(text.contains("output*  dense_1"));
        assert!(text.contains("input    embeddings"));
    }
}
