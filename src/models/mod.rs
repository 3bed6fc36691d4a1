//! Model loading and inference components

pub mod artifact;
pub mod dummy;
pub mod inference;
pub mod loader;

pub use artifact::{LinearArtifact, Predictor};
pub use dummy::{ConstantModel, RandomModel};
pub use inference::{DirectoryModel, Model, ModelInfo, SingleModel};
pub use loader::{ModelFormat, ModelLoader};
