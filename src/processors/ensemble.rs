//! Combine several prediction columns into one

use crate::error::{Error, Result};
use crate::processors::Processor;
use crate::types::frame::PREDICTION_PREFIX;
use crate::types::NumerFrame;
use std::collections::HashMap;
use tracing::info;

/// Averages prediction columns row by row into `final_col`.
///
/// Equal weights give the arithmetic mean. NaN entries are skipped and a row
/// where every input is NaN stays NaN.
#[derive(Debug, Clone)]
pub struct MeanEnsembler {
    cols: Vec<String>,
    final_col: String,
    /// Per-column weights, normalized to sum to 1 over the non-NaN inputs of a row
    weights: HashMap<String, f64>,
    /// Weight for columns not in the weights map
    default_weight: f64,
}

impl MeanEnsembler {
    pub fn new(cols: Vec<String>, final_col: impl Into<String>) -> Result<Self> {
        let final_col = final_col.into();
        if !final_col.starts_with(PREDICTION_PREFIX) {
            return Err(Error::InvalidColumnName {
                name: final_col,
                reason: format!("final column should start with '{}'", PREDICTION_PREFIX),
            });
        }
        if cols.is_empty() {
            return Err(Error::InvalidParameter("no columns to ensemble".into()));
        }
        Ok(Self {
            cols,
            final_col,
            weights: HashMap::new(),
            default_weight: 1.0,
        })
    }

    /// Weighted mean instead of the plain mean.
    pub fn with_weights(mut self, weights: HashMap<String, f64>) -> Result<Self> {
        if let Some((col, w)) = weights.iter().find(|(_, w)| !(w.is_finite() && **w >= 0.0)) {
            return Err(Error::InvalidParameter(format!(
                "weight for '{}' must be a non-negative number, got {}",
                col, w
            )));
        }
        self.weights = weights;
        Ok(self)
    }

    pub fn cols(&self) -> &[String] {
        &self.cols
    }

    pub fn final_col(&self) -> &str {
        &self.final_col
    }

    fn weight(&self, col: &str) -> f64 {
        self.weights.get(col).copied().unwrap_or(self.default_weight)
    }

    /// Weighted average of one row's scores.
    fn aggregate(&self, scores: impl Iterator<Item = (f64, f64)>) -> f64 {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for (score, weight) in scores {
            if score.is_nan() {
                continue;
            }
            weighted_sum += score * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            f64::NAN
        }
    }
}

impl Processor for MeanEnsembler {
    fn name(&self) -> &str {
        "MeanEnsembler"
    }

    fn transform(&self, mut frame: NumerFrame) -> Result<NumerFrame> {
        let inputs = self
            .cols
            .iter()
            .map(|c| -> Result<(&[f64], f64)> { Ok((frame.column(c)?, self.weight(c))) })
            .collect::<Result<Vec<_>>>()?;

        let ensembled: Vec<f64> = (0..frame.len())
            .map(|row| self.aggregate(inputs.iter().map(|(col, w)| (col[row], *w))))
            .collect();

        frame.insert_column(self.final_col.clone(), ensembled)?;
        info!(
            cols = ?self.cols,
            final_col = %self.final_col,
            weighted = !self.weights.is_empty(),
            "Ensembled prediction columns"
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frame() -> NumerFrame {
        NumerFrame::from_eras(vec!["1".into(), "1".into(), "2".into()])
            .with_column("prediction_a", vec![0.2, 0.4, f64::NAN])
            .unwrap()
            .with_column("prediction_b", vec![0.6, 0.8, f64::NAN])
            .unwrap()
            .with_column("prediction_c", vec![0.4, 0.0, 0.9])
            .unwrap()
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arithmetic_mean() {
        let ensembler =
            MeanEnsembler::new(cols(&["prediction_a", "prediction_b"]), "prediction_ens").unwrap();
        let out = ensembler.transform(frame()).unwrap();
        let values = out.column("prediction_ens").unwrap();
        assert_abs_diff_eq!(values[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(values[1], 0.6, epsilon = 1e-12);
        assert!(values[2].is_nan());
    }

    #[test]
    fn test_nan_skipped() {
        let ensembler = MeanEnsembler::new(
            cols(&["prediction_a", "prediction_b", "prediction_c"]),
            "prediction_ens",
        )
        .unwrap();
        let out = ensembler.transform(frame()).unwrap();
        assert_abs_diff_eq!(out.column("prediction_ens").unwrap()[2], 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_mean() {
        let mut weights = HashMap::new();
        weights.insert("prediction_a".to_string(), 3.0);
        weights.insert("prediction_b".to_string(), 1.0);
        let ensembler =
            MeanEnsembler::new(cols(&["prediction_a", "prediction_b"]), "prediction_ens")
                .unwrap()
                .with_weights(weights)
                .unwrap();
        let out = ensembler.transform(frame()).unwrap();
        // (0.2 * 3 + 0.6) / 4
        assert_abs_diff_eq!(out.column("prediction_ens").unwrap()[0], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_final_col_prefix() {
        let err = MeanEnsembler::new(cols(&["prediction_a"]), "ensemble").unwrap_err();
        assert!(matches!(err, Error::InvalidColumnName { .. }));
    }

    #[test]
    fn test_missing_input_column() {
        let ensembler =
            MeanEnsembler::new(cols(&["prediction_a", "prediction_z"]), "prediction_ens").unwrap();
        assert!(matches!(
            ensembler.transform(frame()),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut weights = HashMap::new();
        weights.insert("prediction_a".to_string(), -1.0);
        let result = MeanEnsembler::new(cols(&["prediction_a"]), "prediction_ens")
            .unwrap()
            .with_weights(weights);
        assert!(result.is_err());
    }
}
