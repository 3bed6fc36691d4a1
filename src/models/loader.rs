//! Model file discovery and suffix-based loader dispatch

use crate::error::{Error, Result};
use crate::models::artifact::{LinearPredictor, OnnxPredictor, Predictor};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

static RUNTIME_INIT: OnceLock<()> = OnceLock::new();

/// Serialized model formats that can be loaded natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ModelFormat {
    /// ONNX graph, run through ONNX Runtime
    #[serde(rename = "onnx")]
    Onnx,
    /// JSON linear model ([`LinearArtifact`](crate::models::artifact::LinearArtifact))
    #[serde(rename = "json")]
    Linear,
}

impl ModelFormat {
    pub const SUPPORTED: [&'static str; 2] = ["onnx", "json"];

    /// Python-only serializations with no native loader. Export these to ONNX.
    const PYTHON_ONLY: [&'static str; 6] = ["joblib", "pkl", "pickle", "cbm", "lgb", "h5"];

    pub fn suffix(&self) -> &'static str {
        match self {
            ModelFormat::Onnx => "onnx",
            ModelFormat::Linear => "json",
        }
    }

    /// Parse a file suffix, with or without the leading dot.
    pub fn from_suffix(suffix: &str) -> Result<Self> {
        let normalized = suffix.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "onnx" => Ok(ModelFormat::Onnx),
            "json" => Ok(ModelFormat::Linear),
            _ => Err(Error::UnsupportedFormat {
                suffix: format!(".{}", normalized),
                supported: Self::SUPPORTED.to_vec(),
            }),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let suffix = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        let format = Self::from_suffix(suffix);
        if format.is_err() && Self::PYTHON_ONLY.contains(&suffix) {
            warn!(
                path = %path.display(),
                "Python-only model format, export the model to ONNX to load it"
            );
        }
        format
    }
}

/// Loader for model artifacts
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    pub fn onnx_threads(&self) -> usize {
        self.onnx_threads
    }

    /// Load a single artifact, dispatching on its file suffix
    pub fn load(&self, path: &Path) -> Result<Box<dyn Predictor>> {
        let format = ModelFormat::from_path(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();

        match format {
            ModelFormat::Onnx => {
                init_runtime()?;
                Ok(Box::new(OnnxPredictor::load(path, &name, self.onnx_threads)?))
            }
            ModelFormat::Linear => Ok(Box::new(LinearPredictor::load(path, &name)?)),
        }
    }

    /// Load every path in order
    pub fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<Box<dyn Predictor>>> {
        let models = paths
            .iter()
            .map(|p| self.load(p))
            .collect::<Result<Vec<_>>>()?;
        info!(count = models.len(), "Loaded {} models", models.len());
        Ok(models)
    }

    /// Every file in `dir` with the format's suffix, sorted by path.
    ///
    /// The walk is not recursive.
    pub fn discover(dir: &Path, format: ModelFormat) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::PathNotFound(dir.to_path_buf()));
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(format.suffix()))
                .unwrap_or(false);
            if path.is_file() && matches {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(Error::NoModelsFound {
                dir: dir.to_path_buf(),
                suffix: format.suffix().to_string(),
            });
        }
        paths.sort();
        Ok(paths)
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn init_runtime() -> Result<()> {
    if RUNTIME_INIT.get().is_some() {
        return Ok(());
    }
    ort::init()
        .commit()
        .map_err(|e| Error::inference("onnxruntime", e))?;
    info!("ONNX Runtime initialized");
    let _ = RUNTIME_INIT.set(());
    Ok(())
}
