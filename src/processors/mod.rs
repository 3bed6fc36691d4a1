//! Transformation stages applied to a frame before or after the models

pub mod ensemble;
pub mod neutralize;

use crate::error::Result;
use crate::types::NumerFrame;

pub use ensemble::MeanEnsembler;
pub use neutralize::FeatureNeutralizer;

/// A stateless transform on a frame.
pub trait Processor {
    /// Display name for logs and stage timings
    fn name(&self) -> &str;

    fn transform(&self, frame: NumerFrame) -> Result<NumerFrame>;
}
