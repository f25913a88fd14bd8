//! Evaluation score from predictions and labels

use std::fmt;

use ndarray::{Array2, ArrayView1};

use super::embeddings::{Label, LabelBatch};
use super::error::{ClassifierError, Result};

/// Probabilities are clamped to `[EPSILON, 1 - EPSILON]` before taking logs
const EPSILON: f32 = 1e-7;

/// Loss and accuracy of a model over a labelled batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationScore {
    /// Mean cross-entropy
    pub loss: f32,
    /// Fraction of samples classified correctly
    pub accuracy: f32,
    /// Number of samples scored
    pub samples: usize,
}

impl fmt::Display for EvaluationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loss: {:.4} - accuracy: {:.4} ({} samples)",
            self.loss, self.accuracy, self.samples
        )
    }
}

fn argmax(values: ArrayView1<f32>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, best_v), (i, &v)| {
            if v > best_v { (i, v) } else { (best, best_v) }
        })
        .0
}

fn argmax_slice(values: &[f32]) -> usize {
    argmax(ArrayView1::from(values))
}

/// Score `predictions` (`samples x outputs`) against `labels`.
///
/// A single output column is a binary probability: loss is binary
/// cross-entropy and a prediction counts as positive above 0.5. Several
/// columns are class probabilities: loss is categorical cross-entropy and
/// the predicted class is the argmax. Scalar labels are class indices (or
/// 0/1 targets for one column); vector labels are target distributions.
pub fn score(predictions: &Array2<f32>, labels: &LabelBatch) -> Result<EvaluationScore> {
    let n = predictions.nrows();
    if n != labels.len() {
        return Err(ClassifierError::Inference(format!(
            "{} predictions for {} labels",
            n,
            labels.len()
        )));
    }
    if n == 0 {
        return Ok(EvaluationScore { loss: 0.0, accuracy: 0.0, samples: 0 });
    }

    let width = predictions.ncols();
    let mut total_loss = 0.0f32;
    let mut correct = 0usize;

    for (i, (row, label)) in predictions.outer_iter().zip(&labels.labels).enumerate() {
        if width == 1 {
            let p = row[0].clamp(EPSILON, 1.0 - EPSILON);
            let target = match label {
                Label::Scalar(t) => *t,
                Label::Vector(v) if v.len() == 1 => v[0],
                Label::Vector(v) => {
                    return Err(ClassifierError::Inference(format!(
                        "sample {}: label has {} values for a single-output model",
                        i,
                        v.len()
                    )))
                }
            };
            total_loss -= target * p.ln() + (1.0 - target) * (1.0 - p).ln();
            if (p > 0.5) == (target > 0.5) {
                correct += 1;
            }
        } else {
            let target: Vec<f32> = match label {
                Label::Scalar(class) => {
                    let class = class.round();
                    if class < 0.0 || class as usize >= width {
                        return Err(ClassifierError::Inference(format!(
                            "sample {}: class {} out of range for {} outputs",
                            i, class, width
                        )));
                    }
                    let mut one_hot = vec![0.0; width];
                    one_hot[class as usize] = 1.0;
                    one_hot
                }
                Label::Vector(v) if v.len() == width => v.clone(),
                Label::Vector(v) => {
                    return Err(ClassifierError::Inference(format!(
                        "sample {}: label has {} values, model has {} outputs",
                        i,
                        v.len(),
                        width
                    )))
                }
            };
            total_loss -= row
                .iter()
                .zip(&target)
                .map(|(&p, &t)| t * p.clamp(EPSILON, 1.0 - EPSILON).ln())
                .sum::<f32>();
            if argmax(row) == argmax_slice(&target) {
                correct += 1;
            }
        }
    }

    Ok(EvaluationScore {
        loss: total_loss / n as f32,
        accuracy: correct as f32 / n as f32,
        samples: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(labels: Vec<Label>) -> LabelBatch {
        LabelBatch { labels }
    }

    #[test]
    fn test_binary_scoring() {
        let predictions = array![[0.9f32], [0.2], [0.6]];
        let batch = labels(vec![Label::Scalar(1.0), Label::Scalar(0.0), Label::Scalar(0.0)]);

        let score = score(&predictions, &batch).unwrap();
        assert_eq!(score.samples, 3);
        assert!((score.accuracy - 2.0 / 3.0).abs() < 1e-6);
        let expected = -((0.9f32).ln() + (0.8f32).ln() + (0.4f32).ln()) / 3.0;
        assert!((score.loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_categorical_with_class_indices_and_one_hot() {
        let predictions = array![[0.7f32, 0.2, 0.1], [0.1, 0.1, 0.8]];
        let batch = labels(vec![Label::Scalar(0.0), Label::Vector(vec![0.0, 1.0, 0.0])]);

        let score = score(&predictions, &batch).unwrap();
        assert!((score.accuracy - 0.5).abs() < 1e-6);
        let expected = -((0.7f32).ln() + (0.1f32).ln()) / 2.0;
        assert!((score.loss - expected).abs() < 1e-5);
    }

    #[test]
    fn test_class_index_out_of_range() {
        let predictions = array![[0.5f32, 0.5]];
        assert!(score(&predictions, &labels(vec![Label::Scalar(2.0)])).is_err());
    }

    #[test]
    fn test_count_mismatch() {
        let predictions = array![[0.5f32], [0.5]];
        assert!(score(&predictions, &labels(vec![Label::Scalar(1.0)])).is_err());
    }

    #[test]
    fn test_display() {
        let score = EvaluationScore { loss: 0.25, accuracy: 0.75, samples: 4 };
        assert_eq!(score.to_string(), "loss: 0.2500 - accuracy: 0.7500 (4 samples)");
    }
}
