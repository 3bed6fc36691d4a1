//! Column-oriented tabular dataset for tournament data

use crate::error::{Error, Result};
use ndarray::Array2;
use std::collections::BTreeMap;

pub const FEATURE_PREFIX: &str = "feature";
pub const TARGET_PREFIX: &str = "target";
pub const PREDICTION_PREFIX: &str = "prediction";

/// Column names that are kept as text instead of being parsed as numbers.
pub const DEFAULT_ID_COL: &str = "id";
pub const DEFAULT_ERA_COL: &str = "era";
pub const DATA_TYPE_COL: &str = "data_type";

/// Tabular dataset with one row per instance.
///
/// Rows carry an id and an era label. Every other column is numeric and is
/// classified by its name prefix into features, targets, predictions or
/// auxiliary columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumerFrame {
    ids: Vec<String>,
    eras: Vec<String>,
    /// Other text columns, e.g. `data_type`
    text_columns: Vec<(String, Vec<String>)>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl NumerFrame {
    /// Create an empty frame with the given row ids and eras.
    pub fn new(ids: Vec<String>, eras: Vec<String>) -> Result<Self> {
        if ids.len() != eras.len() {
            return Err(Error::LengthMismatch {
                column: DEFAULT_ERA_COL.to_string(),
                expected: ids.len(),
                got: eras.len(),
            });
        }
        Ok(Self {
            ids,
            eras,
            ..Default::default()
        })
    }

    /// Create a frame with generated ids (`row_0`, `row_1`, ...).
    pub fn from_eras(eras: Vec<String>) -> Self {
        let ids = (0..eras.len()).map(|i| format!("row_{}", i)).collect();
        Self {
            ids,
            eras,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// (rows, numeric columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.names.len())
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn eras(&self) -> &[String] {
        &self.eras
    }

    /// Add a numeric column, replacing any existing column of the same name.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(Error::LengthMismatch {
                column: name,
                expected: self.len(),
                got: values.len(),
            });
        }
        match self.position(&name) {
            Some(idx) => self.columns[idx] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Builder form of [`insert_column`](Self::insert_column).
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    pub fn insert_text_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(Error::LengthMismatch {
                column: name,
                expected: self.len(),
                got: values.len(),
            });
        }
        match self.text_columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.text_columns.push((name, values)),
        }
        Ok(())
    }

    pub fn text_column(&self, name: &str) -> Result<&[String]> {
        self.text_columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn text_column_names(&self) -> impl Iterator<Item = &str> {
        self.text_columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.position(name)
            .map(|idx| self.columns[idx].as_slice())
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All numeric column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn feature_cols(&self) -> Vec<String> {
        self.cols_with_prefix(FEATURE_PREFIX)
    }

    pub fn target_cols(&self) -> Vec<String> {
        self.cols_with_prefix(TARGET_PREFIX)
    }

    pub fn prediction_cols(&self) -> Vec<String> {
        self.cols_with_prefix(PREDICTION_PREFIX)
    }

    /// Numeric columns that are neither features, targets nor predictions.
    pub fn aux_cols(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| {
                !n.starts_with(FEATURE_PREFIX)
                    && !n.starts_with(TARGET_PREFIX)
                    && !n.starts_with(PREDICTION_PREFIX)
            })
            .cloned()
            .collect()
    }

    /// Rows x features matrix over every `feature*` column.
    pub fn feature_data(&self) -> Result<Array2<f64>> {
        let cols = self.feature_cols();
        if cols.is_empty() {
            return Err(Error::ColumnNotFound(format!("{}*", FEATURE_PREFIX)));
        }
        self.matrix(&cols)
    }

    /// Rows x cols matrix of the requested columns, in the requested order.
    pub fn matrix<S: AsRef<str>>(&self, cols: &[S]) -> Result<Array2<f64>> {
        let selected = cols
            .iter()
            .map(|c| self.column(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Array2::from_shape_fn((self.len(), selected.len()), |(r, c)| {
            selected[c][r]
        }))
    }

    /// Row indices per era, eras in sorted order.
    pub fn era_groups(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (row, era) in self.eras.iter().enumerate() {
            groups.entry(era.as_str()).or_default().push(row);
        }
        groups
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn cols_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> NumerFrame {
        NumerFrame::from_eras(vec!["0001".into(), "0001".into(), "0002".into()])
            .with_column("feature_a", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("feature_b", vec![0.5, 0.25, 0.0])
            .unwrap()
            .with_column("target", vec![0.5, 0.75, 1.0])
            .unwrap()
            .with_column("prediction_model", vec![0.1, 0.2, 0.3])
            .unwrap()
            .with_column("weight", vec![1.0, 1.0, 1.0])
            .unwrap()
    }

    #[test]
    fn test_column_groups() {
        let frame = sample_frame();
        assert_eq!(frame.feature_cols(), vec!["feature_a", "feature_b"]);
        assert_eq!(frame.target_cols(), vec!["target"]);
        assert_eq!(frame.prediction_cols(), vec!["prediction_model"]);
        assert_eq!(frame.aux_cols(), vec!["weight"]);
        assert_eq!(frame.shape(), (3, 5));
    }

    #[test]
    fn test_feature_data_layout() {
        let frame = sample_frame();
        let data = frame.feature_data().unwrap();
        assert_eq!(data.dim(), (3, 2));
        assert_eq!(data[[1, 0]], 2.0);
        assert_eq!(data[[1, 1]], 0.25);
    }

    #[test]
    fn test_insert_overwrites_existing_column() {
        let mut frame = sample_frame();
        frame.insert_column("target", vec![0.0, 0.0, 0.0]).unwrap();
        assert_eq!(frame.column("target").unwrap(), &[0.0, 0.0, 0.0]);
        assert_eq!(frame.shape(), (3, 5));
    }

    #[test]
    fn test_insert_rejects_wrong_length() {
        let mut frame = sample_frame();
        let err = frame.insert_column("prediction_x", vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 3, got: 1, .. }));
    }

    #[test]
    fn test_era_groups_sorted() {
        let frame = NumerFrame::from_eras(vec!["b".into(), "a".into(), "b".into()]);
        let groups = frame.era_groups();
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(groups["b"], vec![0, 2]);
    }

    #[test]
    fn test_missing_column() {
        let frame = sample_frame();
        assert!(matches!(
            frame.column("feature_z"),
            Err(Error::ColumnNotFound(_))
        ));
        let empty = NumerFrame::from_eras(vec!["1".into()]);
        assert!(empty.feature_data().is_err());
    }
}
