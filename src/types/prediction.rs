//! Raw model outputs and the columns they map to

use crate::error::{Error, Result};
use ndarray::{Array2, Axis};

/// Outputs of a single artifact for a batch of rows.
///
/// Most models produce one output of shape (rows, targets). Multi-head networks
/// such as autoencoder + MLP models produce several.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    outputs: Vec<Array2<f64>>,
}

impl ModelOutput {
    pub fn new(outputs: Vec<Array2<f64>>) -> Self {
        Self { outputs }
    }

    pub fn single(output: Array2<f64>) -> Self {
        Self {
            outputs: vec![output],
        }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// First output.
    pub fn primary(self) -> Result<Array2<f64>> {
        self.select(0)
    }

    /// Take output `index`, erroring if the artifact produced fewer outputs.
    pub fn select(mut self, index: usize) -> Result<Array2<f64>> {
        if index >= self.outputs.len() {
            return Err(Error::ShapeMismatch(format!(
                "requested output {} but model produced {}",
                index,
                self.outputs.len()
            )));
        }
        Ok(self.outputs.swap_remove(index))
    }
}

/// Average across the target axis, giving a single column.
pub fn combine(predictions: &Array2<f64>) -> Array2<f64> {
    match predictions.mean_axis(Axis(1)) {
        Some(mean) => mean.insert_axis(Axis(1)),
        None => Array2::zeros((predictions.nrows(), 1)),
    }
}

/// Column names for a prediction block: `base` for one target, `base_<i>` otherwise.
pub fn prediction_col_names(base: &str, n_targets: usize) -> Vec<String> {
    if n_targets > 1 {
        (0..n_targets).map(|i| format!("{}_{}", base, i)).collect()
    } else {
        vec![base.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_single_target_names() {
        assert_eq!(prediction_col_names("prediction_a", 1), vec!["prediction_a"]);
    }

    #[test]
    fn test_multi_target_names() {
        assert_eq!(
            prediction_col_names("prediction_a", 3),
            vec!["prediction_a_0", "prediction_a_1", "prediction_a_2"]
        );
    }

    #[test]
    fn test_combine_averages_targets() {
        let preds = array![[0.0, 1.0], [0.5, 0.5], [0.2, 0.4]];
        let combined = combine(&preds);
        assert_eq!(combined.dim(), (3, 1));
        assert!((combined[[0, 0]] - 0.5).abs() < 1e-12);
        assert!((combined[[2, 0]] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_select_out_of_range() {
        let output = ModelOutput::single(array![[1.0]]);
        assert!(matches!(output.select(2), Err(Error::ShapeMismatch(_))));
    }
}
