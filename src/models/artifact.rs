//! Loaded model artifacts that turn a feature matrix into raw outputs

use crate::error::{Error, Result};
use crate::types::ModelOutput;
use ndarray::{Array1, Array2, ArrayView2};
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// A pre-trained artifact that can predict on a rows x features matrix.
pub trait Predictor {
    /// Artifact name, used in log and error messages
    fn name(&self) -> &str;

    fn predict(&mut self, features: ArrayView2<'_, f64>) -> Result<ModelOutput>;
}

/// ONNX Runtime session wrapping an exported model
pub struct OnnxPredictor {
    /// Model name
    name: String,
    /// ONNX Runtime session
    session: Session,
    /// Input name for the feature tensor
    input_name: String,
}

impl OnnxPredictor {
    pub fn load(path: &Path, name: &str, threads: usize) -> Result<Self> {
        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| Error::inference(name, e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::inference(name, e))?
            .with_intra_threads(threads)
            .map_err(|e| Error::inference(name, e))?
            .commit_from_file(path)
            .map_err(|e| Error::inference(name, e))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        info!(
            model = %name,
            input = %input_name,
            outputs = session.outputs.len(),
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session,
            input_name,
        })
    }
}

impl Predictor for OnnxPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, features: ArrayView2<'_, f64>) -> Result<ModelOutput> {
        use ort::value::Tensor;

        let (rows, cols) = features.dim();
        let shape = vec![rows as i64, cols as i64];
        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input_tensor =
            Tensor::from_array((shape, data)).map_err(|e| Error::inference(&self.name, e))?;

        let outputs = self
            .session
            .run(ort::inputs![&self.input_name => input_tensor])
            .map_err(|e| Error::inference(&self.name, e))?;

        let mut extracted = Vec::new();
        for (output_name, output) in outputs.iter() {
            // Label and sequence outputs from classifier exports are not f32 tensors
            let Ok((shape, data)) = output.try_extract_tensor::<f32>() else {
                debug!(model = %self.name, output = %output_name, "Skipping non-float output");
                continue;
            };
            let dims: Vec<i64> = shape.iter().copied().collect();
            extracted.push(tensor_to_matrix(&dims, data, rows).map_err(|e| {
                Error::inference(&self.name, format!("output '{}': {}", output_name, e))
            })?);
        }

        if extracted.is_empty() {
            return Err(Error::inference(&self.name, "model produced no float outputs"));
        }
        Ok(ModelOutput::new(extracted))
    }
}

/// Reshape a flat output tensor into (rows, targets).
fn tensor_to_matrix(dims: &[i64], data: &[f32], rows: usize) -> Result<Array2<f64>> {
    if rows == 0 || data.len() % rows != 0 {
        return Err(Error::ShapeMismatch(format!(
            "tensor {:?} with {} values does not split into {} rows",
            dims,
            data.len(),
            rows
        )));
    }
    let targets = data.len() / rows;
    let values: Vec<f64> = data.iter().map(|&v| v as f64).collect();
    Array2::from_shape_vec((rows, targets), values)
        .map_err(|e| Error::ShapeMismatch(e.to_string()))
}

/// Linear model serialized as JSON.
///
/// One row of coefficients per target; `intercepts` may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearArtifact {
    pub coefficients: Vec<Vec<f64>>,
    #[serde(default)]
    pub intercepts: Vec<f64>,
}

pub struct LinearPredictor {
    name: String,
    weights: Array2<f64>,
    intercepts: Array1<f64>,
}

impl LinearPredictor {
    pub fn load(path: &Path, name: &str) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let artifact: LinearArtifact = serde_json::from_reader(std::io::BufReader::new(file))?;
        Self::from_artifact(name, artifact)
    }

    pub fn from_artifact(name: &str, artifact: LinearArtifact) -> Result<Self> {
        let targets = artifact.coefficients.len();
        let n_features = artifact.coefficients.first().map(Vec::len).unwrap_or(0);
        if targets == 0 || n_features == 0 {
            return Err(Error::ShapeMismatch(format!(
                "linear model '{}' has no coefficients",
                name
            )));
        }
        if artifact.coefficients.iter().any(|row| row.len() != n_features) {
            return Err(Error::ShapeMismatch(format!(
                "linear model '{}' has ragged coefficient rows",
                name
            )));
        }
        let intercepts = if artifact.intercepts.is_empty() {
            Array1::zeros(targets)
        } else if artifact.intercepts.len() == targets {
            Array1::from(artifact.intercepts)
        } else {
            return Err(Error::ShapeMismatch(format!(
                "linear model '{}' has {} intercepts for {} targets",
                name,
                artifact.intercepts.len(),
                targets
            )));
        };
        // features x targets
        let weights = Array2::from_shape_fn((n_features, targets), |(f, t)| {
            artifact.coefficients[t][f]
        });
        Ok(Self {
            name: name.to_string(),
            weights,
            intercepts,
        })
    }
}

impl Predictor for LinearPredictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&mut self, features: ArrayView2<'_, f64>) -> Result<ModelOutput> {
        if features.ncols() != self.weights.nrows() {
            return Err(Error::ShapeMismatch(format!(
                "model '{}' expects {} features, got {}",
                self.name,
                self.weights.nrows(),
                features.ncols()
            )));
        }
        let predictions = features.dot(&self.weights) + &self.intercepts;
        Ok(ModelOutput::single(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_predict_single_target() {
        let artifact = LinearArtifact {
            coefficients: vec![vec![1.0, 2.0]],
            intercepts: vec![0.5],
        };
        let mut model = LinearPredictor::from_artifact("lin", artifact).unwrap();
        let features = array![[1.0, 1.0], [0.0, 2.0]];
        let out = model.predict(features.view()).unwrap().primary().unwrap();
        assert_eq!(out, array![[3.5], [4.5]]);
    }

    #[test]
    fn test_linear_predict_multi_target() {
        let artifact = LinearArtifact {
            coefficients: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            intercepts: vec![],
        };
        let mut model = LinearPredictor::from_artifact("lin", artifact).unwrap();
        let features = array![[0.25, 0.75]];
        let out = model.predict(features.view()).unwrap().primary().unwrap();
        assert_eq!(out, array![[0.25, 0.75]]);
    }

    #[test]
    fn test_linear_feature_count_mismatch() {
        let artifact = LinearArtifact {
            coefficients: vec![vec![1.0, 2.0, 3.0]],
            intercepts: vec![],
        };
        let mut model = LinearPredictor::from_artifact("lin", artifact).unwrap();
        let features = array![[1.0, 1.0]];
        assert!(matches!(
            model.predict(features.view()),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_linear_rejects_ragged_rows() {
        let artifact = LinearArtifact {
            coefficients: vec![vec![1.0, 2.0], vec![1.0]],
            intercepts: vec![],
        };
        assert!(LinearPredictor::from_artifact("lin", artifact).is_err());
    }

    #[test]
    fn test_tensor_to_matrix_shapes() {
        let flat = tensor_to_matrix(&[3], &[1.0, 2.0, 3.0], 3).unwrap();
        assert_eq!(flat.dim(), (3, 1));
        let wide = tensor_to_matrix(&[2, 2], &[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(wide[[1, 0]], 3.0);
        assert!(tensor_to_matrix(&[5], &[1.0; 5], 2).is_err());
    }
}
