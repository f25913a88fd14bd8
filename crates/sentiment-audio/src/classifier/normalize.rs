//! Per-sample L2 row normalization
//!
//! Every frame (row) of every sample is scaled to unit Euclidean norm.
//! Rows with zero norm stay zero. No statistics are shared between samples.

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use super::embeddings::EmbeddingBatch;

/// Scale each row of `block` to unit L2 norm in place.
pub fn normalize_rows(block: &mut Array2<f32>) {
    for mut row in block.axis_iter_mut(Axis(0)) {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

/// Normalize each sample of `batch` independently.
pub fn normalize_batch(batch: &mut EmbeddingBatch) {
    batch.samples.par_iter_mut().for_each(normalize_rows);
    log::debug!("Normalized {} samples", batch.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn row_norms(block: &Array2<f32>) -> Vec<f32> {
        block
            .axis_iter(Axis(0))
            .map(|row| row.iter().map(|v| v * v).sum::<f32>().sqrt())
            .collect()
    }

    #[test]
    fn test_rows_become_unit_norm() {
        let mut block = array![[3.0f32, 4.0], [0.0, -2.0]];
        normalize_rows(&mut block);
        assert!((block[[0, 0]] - 0.6).abs() < 1e-6);
        assert!((block[[0, 1]] - 0.8).abs() < 1e-6);
        assert!((block[[1, 1]] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_rows_stay_zero() {
        let mut block = array![[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0]];
        normalize_rows(&mut block);
        assert_eq!(block.row(0).to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(block.row(1).to_vec(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_idempotent_on_unit_rows() {
        let mut block = array![[0.6f32, 0.8], [1.0, 0.0]];
        let before = block.clone();
        normalize_rows(&mut block);
        for (a, b) in block.iter().zip(before.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_samples_are_normalized_independently() {
        let mut batch = EmbeddingBatch {
            ids: vec!["quiet".to_string(), "loud".to_string()],
            samples: vec![
                array![[0.001f32, 0.002], [0.003, 0.004]],
                array![[1000.0f32, 0.0, 0.0], [300.0, 400.0, 0.0], [0.0, 0.0, 5000.0]],
            ],
        };
        normalize_batch(&mut batch);

        for sample in &batch.samples {
            for norm in row_norms(sample) {
                assert!((norm - 1.0).abs() < 1e-5, "norm was {}", norm);
            }
        }
        // Direction within a sample is preserved; scale of the other sample has no effect
        assert!((batch.samples[0][[1, 0]] - 0.6).abs() < 1e-5);
        assert!((batch.samples[1][[1, 1]] - 0.8).abs() < 1e-5);
    }
}
