//! Error types shared by models, processors and I/O.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column '{column}' has {got} values, frame has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid column name '{name}': {reason}")]
    InvalidColumnName { name: String, reason: String },

    #[error("no .{suffix} files found in {}", .dir.display())]
    NoModelsFound { dir: PathBuf, suffix: String },

    #[error("file path '{}' does not exist", .0.display())]
    PathNotFound(PathBuf),

    #[error("file path must point to a file, not valid for '{}'", .0.display())]
    NotAFile(PathBuf),

    #[error("format '{suffix}' is not available, supported formats are {supported:?}")]
    UnsupportedFormat {
        suffix: String,
        supported: Vec<&'static str>,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("degenerate group '{group}': {reason}")]
    DegenerateGroup { group: String, reason: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("inference failed for '{model}': {message}")]
    Inference { model: String, message: String },

    #[error("failed to parse '{value}' in column '{column}' at row {row}")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn inference(model: &str, err: impl std::fmt::Display) -> Self {
        Error::Inference {
            model: model.to_string(),
            message: err.to_string(),
        }
    }
}
