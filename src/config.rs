//! Configuration management for the prediction pipeline

use crate::models::loader::{ModelFormat, ModelLoader};
use crate::models::{ConstantModel, DirectoryModel, Model, RandomModel, SingleModel};
use crate::pipeline::ModelPipeline;
use crate::processors::neutralize::{DEFAULT_PRED_NAME, DEFAULT_PROPORTION};
use crate::processors::{FeatureNeutralizer, MeanEnsembler, Processor};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub preprocessing: Vec<ProcessorConfig>,
    #[serde(default)]
    pub postprocessing: Vec<ProcessorConfig>,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input and output locations
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// CSV dataset to predict on
    pub input: PathBuf,
    /// CSV file predictions are written to
    pub output: PathBuf,
    #[serde(default = "default_id_col")]
    pub id_col: String,
    #[serde(default = "default_era_col")]
    pub era_col: String,
    /// Prediction columns to write. All prediction columns when empty.
    #[serde(default)]
    pub output_columns: Vec<String>,
}

fn default_id_col() -> String {
    "id".to_string()
}

fn default_era_col() -> String {
    "era".to_string()
}

/// One model stage
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelConfig {
    /// Every file of one format in a directory, averaged
    Directory {
        directory: PathBuf,
        format: ModelFormat,
        name: Option<String>,
    },
    /// One model file
    Single {
        path: PathBuf,
        name: Option<String>,
        #[serde(default)]
        combine_preds: bool,
        #[serde(default)]
        autoencoder_mlp: bool,
    },
    Constant {
        #[serde(default = "default_constant")]
        constant: f64,
        name: Option<String>,
    },
    Random {
        name: Option<String>,
        seed: Option<u64>,
    },
}

fn default_constant() -> f64 {
    crate::models::dummy::DEFAULT_CONSTANT
}

/// One processor stage
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessorConfig {
    MeanEnsemble {
        cols: Vec<String>,
        final_col: String,
        #[serde(default)]
        weights: HashMap<String, f64>,
    },
    FeatureNeutralizer {
        #[serde(default = "default_proportion")]
        proportion: f64,
        #[serde(default = "default_pred_name")]
        pred_name: String,
        /// Exposure columns. All feature columns when absent.
        feature_names: Option<Vec<String>>,
    },
}

fn default_proportion() -> f64 {
    DEFAULT_PROPORTION
}

fn default_pred_name() -> String {
    DEFAULT_PRED_NAME.to_string()
}

/// Inference runtime settings
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn build(&self, onnx_threads: usize) -> Result<Box<dyn Model>> {
        let model: Box<dyn Model> = match self {
            ModelConfig::Directory {
                directory,
                format,
                name,
            } => Box::new(
                DirectoryModel::with_loader(
                    directory,
                    *format,
                    name.clone(),
                    ModelLoader::with_threads(onnx_threads),
                )
                .with_context(|| format!("Failed to set up directory model {:?}", directory))?,
            ),
            ModelConfig::Single {
                path,
                name,
                combine_preds,
                autoencoder_mlp,
            } => Box::new(
                SingleModel::new(path, name.clone())
                    .with_context(|| format!("Failed to set up model {:?}", path))?
                    .combine_preds(*combine_preds)
                    .autoencoder_mlp(*autoencoder_mlp)
                    .with_loader(ModelLoader::with_threads(onnx_threads)),
            ),
            ModelConfig::Constant { constant, name } => {
                Box::new(ConstantModel::new(*constant, name.clone())?)
            }
            ModelConfig::Random { name, seed } => {
                let model = RandomModel::new(name.clone());
                Box::new(match seed {
                    Some(seed) => model.with_seed(*seed),
                    None => model,
                })
            }
        };
        Ok(model)
    }
}

impl ProcessorConfig {
    pub fn build(&self) -> Result<Box<dyn Processor>> {
        let processor: Box<dyn Processor> = match self {
            ProcessorConfig::MeanEnsemble {
                cols,
                final_col,
                weights,
            } => {
                let ensembler = MeanEnsembler::new(cols.clone(), final_col.clone())?;
                if weights.is_empty() {
                    Box::new(ensembler)
                } else {
                    Box::new(ensembler.with_weights(weights.clone())?)
                }
            }
            ProcessorConfig::FeatureNeutralizer {
                proportion,
                pred_name,
                feature_names,
            } => {
                let neutralizer = FeatureNeutralizer::new(*proportion)?.pred_name(pred_name.clone());
                Box::new(match feature_names {
                    Some(names) => neutralizer.feature_names(names.clone()),
                    None => neutralizer,
                })
            }
        };
        Ok(processor)
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Build every configured stage into a pipeline
    pub fn build_pipeline(&self) -> Result<ModelPipeline> {
        let mut pipeline = ModelPipeline::new();
        for stage in &self.preprocessing {
            pipeline = pipeline.with_preprocessor(stage.build()?);
        }
        for model in &self.models {
            pipeline = pipeline.with_model(model.build(self.inference.onnx_threads)?);
        }
        for stage in &self.postprocessing {
            pipeline = pipeline.with_postprocessor(stage.build()?);
        }
        Ok(pipeline)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                input: PathBuf::from("data/live.csv"),
                output: PathBuf::from("predictions/live_predictions.csv"),
                id_col: default_id_col(),
                era_col: default_era_col(),
                output_columns: Vec::new(),
            },
            models: vec![ModelConfig::Constant {
                constant: default_constant(),
                name: None,
            }],
            preprocessing: Vec::new(),
            postprocessing: Vec::new(),
            inference: InferenceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
