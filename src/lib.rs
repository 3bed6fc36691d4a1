//! Numerai Blocks Library
//!
//! Building blocks for tournament prediction pipelines: predict-only model
//! wrappers that append prediction columns to a tabular dataset, and
//! processors that ensemble and neutralize those predictions per era.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod sink;
pub mod source;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use models::{ConstantModel, DirectoryModel, Model, RandomModel, SingleModel};
pub use pipeline::ModelPipeline;
pub use processors::{FeatureNeutralizer, MeanEnsembler, Processor};
pub use sink::PredictionSink;
pub use source::DatasetSource;
pub use types::NumerFrame;
