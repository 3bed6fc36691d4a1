//! CSV dataset reader

use crate::error::{Error, Result};
use crate::types::frame::{DATA_TYPE_COL, DEFAULT_ERA_COL, DEFAULT_ID_COL};
use crate::types::NumerFrame;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Reads tournament data from CSV into a [`NumerFrame`]
pub struct DatasetSource {
    path: PathBuf,
    id_col: String,
    era_col: String,
}

impl DatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id_col: DEFAULT_ID_COL.to_string(),
            era_col: DEFAULT_ERA_COL.to_string(),
        }
    }

    pub fn id_col(mut self, id_col: impl Into<String>) -> Self {
        self.id_col = id_col.into();
        self
    }

    pub fn era_col(mut self, era_col: impl Into<String>) -> Self {
        self.era_col = era_col.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<NumerFrame> {
        if !self.path.is_file() {
            return Err(Error::PathNotFound(self.path.clone()));
        }
        let file = std::fs::File::open(&self.path)?;
        let frame = self.read_from(file)?;
        info!(
            path = %self.path.display(),
            rows = frame.len(),
            features = frame.feature_cols().len(),
            eras = frame.era_groups().len(),
            "Dataset loaded"
        );
        Ok(frame)
    }

    /// Parse CSV from any reader. The era column is required, the id column
    /// is generated when absent.
    pub fn read_from<R: Read>(&self, reader: R) -> Result<NumerFrame> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.clone();

        let era_idx = headers
            .iter()
            .position(|h| h == self.era_col)
            .ok_or_else(|| Error::ColumnNotFound(self.era_col.clone()))?;
        let id_idx = headers.iter().position(|h| h == self.id_col);
        let text_idx: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *h == DATA_TYPE_COL && Some(*i) != id_idx && *i != era_idx)
            .map(|(i, _)| i)
            .collect();
        let numeric_idx: Vec<usize> = (0..headers.len())
            .filter(|i| Some(*i) != id_idx && *i != era_idx && !text_idx.contains(i))
            .collect();

        let mut ids = Vec::new();
        let mut eras = Vec::new();
        let mut text: Vec<Vec<String>> = vec![Vec::new(); text_idx.len()];
        let mut numeric: Vec<Vec<f64>> = vec![Vec::new(); numeric_idx.len()];

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            eras.push(record.get(era_idx).unwrap_or_default().to_string());
            ids.push(match id_idx {
                Some(i) => record.get(i).unwrap_or_default().to_string(),
                None => format!("row_{}", row),
            });
            for (slot, &i) in text_idx.iter().enumerate() {
                text[slot].push(record.get(i).unwrap_or_default().to_string());
            }
            for (slot, &i) in numeric_idx.iter().enumerate() {
                let raw = record.get(i).unwrap_or_default();
                numeric[slot].push(parse_value(raw).ok_or_else(|| Error::Parse {
                    column: headers[i].to_string(),
                    row,
                    value: raw.to_string(),
                })?);
            }
        }

        let mut frame = NumerFrame::new(ids, eras)?;
        for (slot, &i) in text_idx.iter().enumerate() {
            frame.insert_text_column(&headers[i], std::mem::take(&mut text[slot]))?;
        }
        for (slot, &i) in numeric_idx.iter().enumerate() {
            frame.insert_column(&headers[i], std::mem::take(&mut numeric[slot]))?;
        }
        Ok(frame)
    }
}

/// Empty cells and `nan` become NaN.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    trimmed.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,era,data_type,feature_a,feature_b,target
n1,era1,validation,0.25,0.5,0.5
n2,era1,validation,0.75,,1.0
n3,era2,live,1.0,0.0,nan
";

    #[test]
    fn test_read_columns() {
        let frame = DatasetSource::new("unused.csv").read_from(CSV.as_bytes()).unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.ids(), &["n1", "n2", "n3"]);
        assert_eq!(frame.eras(), &["era1", "era1", "era2"]);
        assert_eq!(frame.text_column("data_type").unwrap()[2], "live");
        assert_eq!(frame.feature_cols(), vec!["feature_a", "feature_b"]);
        assert!(frame.column("feature_b").unwrap()[1].is_nan());
        assert!(frame.column("target").unwrap()[2].is_nan());
    }

    #[test]
    fn test_generated_ids_and_custom_era() {
        let csv = "date,feature_a\n2024-01-05,1.0\n2024-01-12,2.0\n";
        let frame = DatasetSource::new("unused.csv")
            .era_col("date")
            .read_from(csv.as_bytes())
            .unwrap();
        assert_eq!(frame.ids(), &["row_0", "row_1"]);
        assert_eq!(frame.era_groups().len(), 2);
    }

    #[test]
    fn test_missing_era_column() {
        let csv = "id,feature_a\nn1,1.0\n";
        let err = DatasetSource::new("unused.csv").read_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(ref c) if c == "era"));
    }

    #[test]
    fn test_parse_error_location() {
        let csv = "id,era,feature_a\nn1,1,abc\n";
        let err = DatasetSource::new("unused.csv").read_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { row: 0, ref column, .. } if column == "feature_a"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = DatasetSource::new("/nonexistent/data.csv").read().unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }
}
