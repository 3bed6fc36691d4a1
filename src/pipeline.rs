//! Chains preprocessors, models and postprocessors over one frame

use crate::error::Result;
use crate::metrics::{PipelineMetrics, StageKind};
use crate::models::Model;
use crate::processors::Processor;
use crate::types::NumerFrame;
use std::time::Instant;
use tracing::info;

/// Runs every stage in order: preprocessors, then models, then postprocessors.
#[derive(Default)]
pub struct ModelPipeline {
    preprocessors: Vec<Box<dyn Processor>>,
    models: Vec<Box<dyn Model>>,
    postprocessors: Vec<Box<dyn Processor>>,
    metrics: PipelineMetrics,
}

impl ModelPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocessor(mut self, processor: Box<dyn Processor>) -> Self {
        self.preprocessors.push(processor);
        self
    }

    pub fn with_model(mut self, model: Box<dyn Model>) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_postprocessor(mut self, processor: Box<dyn Processor>) -> Self {
        self.postprocessors.push(processor);
        self
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Prediction column names of every model, in run order
    pub fn model_columns(&self) -> Vec<String> {
        self.models
            .iter()
            .map(|m| m.prediction_col_name().to_string())
            .collect()
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn run(&self, mut frame: NumerFrame) -> Result<NumerFrame> {
        info!(
            rows = frame.len(),
            preprocessors = self.preprocessors.len(),
            models = self.models.len(),
            postprocessors = self.postprocessors.len(),
            "Running pipeline"
        );

        for processor in &self.preprocessors {
            let start = Instant::now();
            frame = processor.transform(frame)?;
            self.metrics.record_stage(
                processor.name(),
                StageKind::Preprocessor,
                start.elapsed(),
                frame.shape(),
            );
        }

        for model in &self.models {
            let start = Instant::now();
            frame = model.predict(frame)?;
            self.metrics
                .record_stage(model.description(), StageKind::Model, start.elapsed(), frame.shape());
        }

        for processor in &self.postprocessors {
            let start = Instant::now();
            frame = processor.transform(frame)?;
            self.metrics.record_stage(
                processor.name(),
                StageKind::Postprocessor,
                start.elapsed(),
                frame.shape(),
            );
        }

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConstantModel, RandomModel};
    use crate::processors::{FeatureNeutralizer, MeanEnsembler};

    fn frame() -> NumerFrame {
        let eras: Vec<String> = (0..8).map(|i| format!("{:04}", i / 4)).collect();
        NumerFrame::from_eras(eras)
            .with_column("feature_a", vec![0.0, 0.25, 0.5, 1.0, 0.75, 0.5, 0.25, 0.0])
            .unwrap()
            .with_column("feature_b", vec![1.0, 0.5, 0.0, 0.25, 0.0, 0.75, 1.0, 0.5])
            .unwrap()
    }

    #[test]
    fn test_full_pipeline() {
        let pipeline = ModelPipeline::new()
            .with_model(Box::new(ConstantModel::new(0.5, Some("c".into())).unwrap()))
            .with_model(Box::new(RandomModel::new(Some("r".into())).with_seed(42)))
            .with_postprocessor(Box::new(
                MeanEnsembler::new(
                    vec!["prediction_c".into(), "prediction_r".into()],
                    "prediction",
                )
                .unwrap(),
            ))
            .with_postprocessor(Box::new(FeatureNeutralizer::new(0.5).unwrap()));

        assert_eq!(pipeline.model_columns(), vec!["prediction_c", "prediction_r"]);

        let out = pipeline.run(frame()).unwrap();
        assert_eq!(
            out.prediction_cols(),
            vec![
                "prediction_c",
                "prediction_r",
                "prediction",
                "prediction_neutralized_0.5"
            ]
        );
        assert_eq!(pipeline.metrics().stage_count(), 4);
        assert_eq!(pipeline.metrics().stages()[0].name, "ConstantModel: 'c' prediction");
    }

    #[test]
    fn test_pipeline_stops_on_error() {
        let pipeline = ModelPipeline::new()
            .with_model(Box::new(ConstantModel::default()))
            .with_postprocessor(Box::new(
                MeanEnsembler::new(vec!["prediction_missing".into()], "prediction").unwrap(),
            ));
        assert!(pipeline.run(frame()).is_err());
        assert_eq!(pipeline.metrics().stage_count(), 1);
    }
}
