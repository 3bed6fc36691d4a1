//! Constant and random models for testing pipelines end to end.
//!
//! Neither model reads an artifact. Do not submit their predictions.

use crate::error::{Error, Result};
use crate::models::inference::{Model, ModelInfo};
use crate::types::NumerFrame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_CONSTANT: f64 = 0.5;

/// Predicts the same value for every row.
pub struct ConstantModel {
    info: ModelInfo,
    constant: f64,
}

impl ConstantModel {
    pub fn new(constant: f64, model_name: Option<String>) -> Result<Self> {
        if !constant.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "constant prediction must be finite, got {}",
                constant
            )));
        }
        let model_name = model_name.unwrap_or_else(|| format!("constant_{:?}", constant));
        Ok(Self {
            info: ModelInfo::new("", Some(model_name), "ConstantModel"),
            constant,
        })
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }
}

impl Default for ConstantModel {
    fn default() -> Self {
        Self {
            info: ModelInfo::new(
                "",
                Some(format!("constant_{:?}", DEFAULT_CONSTANT)),
                "ConstantModel",
            ),
            constant: DEFAULT_CONSTANT,
        }
    }
}

impl Model for ConstantModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn predict(&self, mut frame: NumerFrame) -> Result<NumerFrame> {
        let values = vec![self.constant; frame.len()];
        frame.insert_column(self.info.prediction_col_name.clone(), values)?;
        Ok(frame)
    }
}

/// Uniformly distributed predictions in [0, 1).
pub struct RandomModel {
    info: ModelInfo,
    /// Fixed seed for reproducible output
    seed: Option<u64>,
}

impl RandomModel {
    pub fn new(model_name: Option<String>) -> Self {
        let model_name = model_name.unwrap_or_else(|| "random".to_string());
        Self {
            info: ModelInfo::new("", Some(model_name), "RandomModel"),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for RandomModel {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Model for RandomModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn predict(&self, mut frame: NumerFrame) -> Result<NumerFrame> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let values: Vec<f64> = (0..frame.len()).map(|_| rng.gen::<f64>()).collect();
        frame.insert_column(self.info.prediction_col_name.clone(), values)?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rows: usize) -> NumerFrame {
        NumerFrame::from_eras(vec!["0001".to_string(); rows])
    }

    #[test]
    fn test_constant_model_default_name() {
        let model = ConstantModel::default();
        assert_eq!(model.name(), "constant_0.5");
        assert_eq!(model.prediction_col_name(), "prediction_constant_0.5");

        let whole = ConstantModel::new(1.0, None).unwrap();
        assert_eq!(whole.name(), "constant_1.0");
    }

    #[test]
    fn test_constant_model_predicts_constant() {
        let model = ConstantModel::new(0.3, Some("c".into())).unwrap();
        let out = model.predict(frame(4)).unwrap();
        assert_eq!(out.column("prediction_c").unwrap(), &[0.3; 4]);
    }

    #[test]
    fn test_constant_model_rejects_nan() {
        assert!(ConstantModel::new(f64::NAN, None).is_err());
    }

    #[test]
    fn test_random_model_range_and_seed() {
        let model = RandomModel::default().with_seed(7);
        let a = model.predict(frame(100)).unwrap();
        let b = model.predict(frame(100)).unwrap();
        let preds = a.column("prediction_random").unwrap();
        assert!(preds.iter().all(|&p| (0.0..1.0).contains(&p)));
        assert_eq!(preds, b.column("prediction_random").unwrap());
    }
}
