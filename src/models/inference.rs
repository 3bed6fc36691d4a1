//! Predict-only model wrappers that append prediction columns to a frame

use crate::error::{Error, Result};
use crate::models::artifact::Predictor;
use crate::models::loader::{ModelFormat, ModelLoader};
use crate::types::prediction::{combine, prediction_col_names};
use crate::types::{ModelOutput, NumerFrame};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array1, Array2, Axis};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Index of the MLP head in autoencoder + MLP network outputs
const AUTOENCODER_MLP_OUTPUT: usize = 2;

/// A predict-only wrapper around one or more pre-trained artifacts.
pub trait Model {
    fn info(&self) -> &ModelInfo;

    /// Add prediction column(s) to the frame.
    fn predict(&self, frame: NumerFrame) -> Result<NumerFrame>;

    fn name(&self) -> &str {
        &self.info().model_name
    }

    fn prediction_col_name(&self) -> &str {
        &self.info().prediction_col_name
    }

    fn description(&self) -> &str {
        &self.info().description
    }
}

/// Naming shared by every model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Directory models are read from
    pub model_directory: PathBuf,
    /// Name used for column names and display
    pub model_name: String,
    /// `prediction_<model_name>`
    pub prediction_col_name: String,
    /// `<Kind>: '<model_name>' prediction`
    pub description: String,
}

impl ModelInfo {
    /// A random hex name is generated when `model_name` is `None`.
    pub fn new(model_directory: impl Into<PathBuf>, model_name: Option<String>, kind: &str) -> Self {
        let model_name = model_name.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        Self {
            model_directory: model_directory.into(),
            prediction_col_name: format!("prediction_{}", model_name),
            description: format!("{}: '{}' prediction", kind, model_name),
            model_name,
        }
    }
}

/// Averages the predictions of every model file with a given suffix in a directory.
pub struct DirectoryModel {
    info: ModelInfo,
    format: ModelFormat,
    model_paths: Vec<PathBuf>,
    loader: ModelLoader,
}

impl DirectoryModel {
    pub fn new(
        model_directory: impl AsRef<Path>,
        format: ModelFormat,
        model_name: Option<String>,
    ) -> Result<Self> {
        Self::with_loader(model_directory, format, model_name, ModelLoader::new())
    }

    pub fn with_loader(
        model_directory: impl AsRef<Path>,
        format: ModelFormat,
        model_name: Option<String>,
        loader: ModelLoader,
    ) -> Result<Self> {
        let dir = model_directory.as_ref();
        let model_paths = ModelLoader::discover(dir, format)?;
        let info = ModelInfo::new(dir, model_name, "DirectoryModel");
        info!(
            model = %info.model_name,
            directory = %dir.display(),
            format = format.suffix(),
            count = model_paths.len(),
            "Discovered model files"
        );
        Ok(Self {
            info,
            format,
            model_paths,
            loader,
        })
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn model_paths(&self) -> &[PathBuf] {
        &self.model_paths
    }

    pub fn total_models(&self) -> usize {
        self.model_paths.len()
    }

    pub fn load_models(&self) -> Result<Vec<Box<dyn Predictor>>> {
        self.loader.load_all(&self.model_paths)
    }
}

impl Model for DirectoryModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn predict(&self, mut frame: NumerFrame) -> Result<NumerFrame> {
        let features = frame.feature_data()?;
        let models = self.load_models()?;
        let total = models.len() as f64;

        let progress = progress_bar(models.len() as u64, &self.info.description);
        let mut mean = Array1::<f64>::zeros(frame.len());
        for mut model in models {
            let predictions = model.predict(features.view())?.primary()?;
            let column = single_column(&predictions, model.name())?;
            mean.scaled_add(1.0 / total, &column);
            debug!(model = %self.info.model_name, artifact = %model.name(), "Artifact predicted");
            progress.inc(1);
        }
        progress.finish_and_clear();

        frame.insert_column(self.info.prediction_col_name.clone(), mean.to_vec())?;
        Ok(frame)
    }
}

/// Loads one model file and writes one column per predicted target.
pub struct SingleModel {
    info: ModelInfo,
    model_file_path: PathBuf,
    format: ModelFormat,
    /// Average targets into a single column
    combine_preds: bool,
    /// Take the MLP head of an autoencoder + MLP network
    autoencoder_mlp: bool,
    loader: ModelLoader,
}

impl SingleModel {
    pub fn new(model_file_path: impl AsRef<Path>, model_name: Option<String>) -> Result<Self> {
        let path = model_file_path.as_ref();
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        if !path.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }
        let format = ModelFormat::from_path(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self {
            info: ModelInfo::new(directory, model_name, "SingleModel"),
            model_file_path: path.to_path_buf(),
            format,
            combine_preds: false,
            autoencoder_mlp: false,
            loader: ModelLoader::new(),
        })
    }

    pub fn combine_preds(mut self, combine_preds: bool) -> Self {
        self.combine_preds = combine_preds;
        self
    }

    pub fn autoencoder_mlp(mut self, autoencoder_mlp: bool) -> Self {
        self.autoencoder_mlp = autoencoder_mlp;
        self
    }

    pub fn with_loader(mut self, loader: ModelLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn model_file_path(&self) -> &Path {
        &self.model_file_path
    }

    /// Pick the output head and optionally average targets.
    fn shape_output(&self, output: ModelOutput) -> Result<Array2<f64>> {
        let predictions = if self.autoencoder_mlp {
            output.select(AUTOENCODER_MLP_OUTPUT)?
        } else {
            output.primary()?
        };
        Ok(if self.combine_preds {
            combine(&predictions)
        } else {
            predictions
        })
    }
}

impl Model for SingleModel {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn predict(&self, mut frame: NumerFrame) -> Result<NumerFrame> {
        let features = frame.feature_data()?;
        let predictions = {
            let mut model = self.loader.load(&self.model_file_path)?;
            let output = model.predict(features.view())?;
            self.shape_output(output)?
        };

        let cols = prediction_col_names(&self.info.prediction_col_name, predictions.ncols());
        for (col, values) in cols.iter().zip(predictions.axis_iter(Axis(1))) {
            frame.insert_column(col.clone(), values.to_vec())?;
        }
        info!(model = %self.info.model_name, columns = ?cols, "Predictions added");
        Ok(frame)
    }
}

fn single_column(predictions: &Array2<f64>, model: &str) -> Result<Array1<f64>> {
    if predictions.ncols() != 1 {
        return Err(Error::ShapeMismatch(format!(
            "model '{}' produced {} targets, directory models average a single target",
            model,
            predictions.ncols()
        )));
    }
    Ok(predictions.column(0).to_owned())
}

fn progress_bar(len: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template("{msg} [{bar:30}] {pos}/{len}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(message.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::LinearArtifact;
    use ndarray::array;
    use std::fs;

    fn write_linear(dir: &Path, file: &str, coefficients: Vec<Vec<f64>>, intercepts: Vec<f64>) -> PathBuf {
        let path = dir.join(file);
        let artifact = LinearArtifact {
            coefficients,
            intercepts,
        };
        fs::write(&path, serde_json::to_string(&artifact).unwrap()).unwrap();
        path
    }

    fn frame() -> NumerFrame {
        NumerFrame::from_eras(vec!["1".into(), "1".into(), "2".into()])
            .with_column("feature_a", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("feature_b", vec![0.0, 1.0, 0.0])
            .unwrap()
    }

    #[test]
    fn test_model_info_naming() {
        let info = ModelInfo::new("models", Some("gbm".to_string()), "DirectoryModel");
        assert_eq!(info.prediction_col_name, "prediction_gbm");
        assert_eq!(info.description, "DirectoryModel: 'gbm' prediction");
    }

    #[test]
    fn test_model_info_generates_name() {
        let info = ModelInfo::new("", None, "SingleModel");
        assert_eq!(info.model_name.len(), 32);
        assert!(info.prediction_col_name.starts_with("prediction_"));
    }

    #[test]
    fn test_directory_model_averages_models() {
        let dir = tempfile::tempdir().unwrap();
        write_linear(dir.path(), "a.json", vec![vec![1.0, 0.0]], vec![]);
        write_linear(dir.path(), "b.json", vec![vec![0.0, 1.0]], vec![1.0]);

        let model = DirectoryModel::new(dir.path(), ModelFormat::Linear, Some("lin".into())).unwrap();
        assert_eq!(model.total_models(), 2);

        let out = model.predict(frame()).unwrap();
        let preds = out.column("prediction_lin").unwrap();
        // a: [1, 2, 3], b: [1, 2, 1]
        assert_eq!(preds, &[1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_directory_model_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let result = DirectoryModel::new(dir.path(), ModelFormat::Onnx, None);
        assert!(matches!(result, Err(Error::NoModelsFound { .. })));
    }

    #[test]
    fn test_single_model_multi_target_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_linear(
            dir.path(),
            "multi.json",
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![],
        );
        let model = SingleModel::new(&path, Some("multi".into())).unwrap();
        let out = model.predict(frame()).unwrap();
        assert_eq!(out.column("prediction_multi_0").unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(out.column("prediction_multi_1").unwrap(), &[0.0, 1.0, 0.0]);
        assert!(!out.has_column("prediction_multi"));
    }

    #[test]
    fn test_single_model_combine_preds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_linear(
            dir.path(),
            "multi.json",
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![],
        );
        let model = SingleModel::new(&path, Some("multi".into()))
            .unwrap()
            .combine_preds(true);
        let out = model.predict(frame()).unwrap();
        assert_eq!(out.column("prediction_multi").unwrap(), &[0.5, 1.5, 1.5]);
    }

    #[test]
    fn test_single_model_autoencoder_head() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_linear(dir.path(), "m.json", vec![vec![1.0, 1.0]], vec![]);
        let model = SingleModel::new(&path, None).unwrap().autoencoder_mlp(true);

        let output = ModelOutput::new(vec![
            array![[0.0], [0.0]],
            array![[1.0], [1.0]],
            array![[0.25, 0.75], [0.5, 0.5]],
        ]);
        let shaped = model.shape_output(output).unwrap();
        assert_eq!(shaped, array![[0.25, 0.75], [0.5, 0.5]]);

        // A plain single-head model has no MLP output to select
        assert!(model.predict(frame()).is_err());
    }

    #[test]
    fn test_single_model_path_checks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SingleModel::new(dir.path().join("missing.onnx"), None),
            Err(Error::PathNotFound(_))
        ));
        assert!(matches!(
            SingleModel::new(dir.path(), None),
            Err(Error::NotAFile(_))
        ));

        let pickle = dir.path().join("model.pkl");
        fs::write(&pickle, b"").unwrap();
        assert!(matches!(
            SingleModel::new(&pickle, None),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
