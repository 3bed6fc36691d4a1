//! CSV writer for prediction columns

use crate::error::Result;
use crate::types::frame::{DEFAULT_ERA_COL, DEFAULT_ID_COL};
use crate::types::NumerFrame;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Writes ids, eras and prediction columns of a frame
#[derive(Clone)]
pub struct PredictionSink {
    path: PathBuf,
    /// Columns to write. Every `prediction*` column when `None`.
    columns: Option<Vec<String>>,
}

impl PredictionSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: None,
        }
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, frame: &NumerFrame) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&self.path)?;
        let written = self.write_to(frame, file)?;
        info!(
            path = %self.path.display(),
            rows = frame.len(),
            columns = ?written,
            "Predictions written"
        );
        Ok(())
    }

    /// Write CSV to any writer, returning the prediction columns written.
    pub fn write_to<W: Write>(&self, frame: &NumerFrame, writer: W) -> Result<Vec<String>> {
        let columns = match &self.columns {
            Some(cols) => cols.clone(),
            None => frame.prediction_cols(),
        };
        let values = columns
            .iter()
            .map(|c| frame.column(c))
            .collect::<Result<Vec<_>>>()?;

        let mut writer = csv::Writer::from_writer(writer);
        let mut header = vec![DEFAULT_ID_COL, DEFAULT_ERA_COL];
        header.extend(columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for row in 0..frame.len() {
            let mut record = Vec::with_capacity(columns.len() + 2);
            record.push(frame.ids()[row].clone());
            record.push(frame.eras()[row].clone());
            record.extend(values.iter().map(|col| col[row].to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        debug!(rows = frame.len(), "Flushed prediction rows");
        Ok(columns)
    }
}
