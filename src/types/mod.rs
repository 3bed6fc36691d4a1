//! Type definitions for the prediction pipeline

pub mod frame;
pub mod prediction;

pub use frame::NumerFrame;
pub use prediction::ModelOutput;
