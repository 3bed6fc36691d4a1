//! Per-era feature neutralization of a prediction column

use crate::error::{Error, Result};
use crate::processors::Processor;
use crate::types::NumerFrame;
use nalgebra::{DMatrix, DVector};
use ndarray::ArrayView2;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::info;

pub const DEFAULT_PROPORTION: f64 = 0.5;
pub const DEFAULT_PRED_NAME: &str = "prediction";

/// Replace scores with standard-normal quantiles of their ranks.
///
/// Ranks are 1-based and ties keep first-seen order, so `u = (rank - 0.5) / n`
/// is strictly inside (0, 1).
pub fn rank_gauss(scores: &[f64]) -> Result<Vec<f64>> {
    if let Some(bad) = scores.iter().find(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "cannot rank non-finite score {}",
            bad
        )));
    }
    let n = scores.len();
    let mut order: Vec<usize> = (0..n).collect();
    // sort_by is stable: equal scores keep their original order
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let normal = Normal::new(0.0, 1.0).map_err(|e| Error::InvalidParameter(e.to_string()))?;
    let mut out = vec![0.0; n];
    for (position, &row) in order.iter().enumerate() {
        let u = (position as f64 + 0.5) / n as f64;
        out[row] = normal.inverse_cdf(u);
    }
    Ok(out)
}

/// Remove `proportion` of the linear exposure of `scores` to `exposures` and
/// rescale the residual to unit standard deviation.
///
/// `exposures` is rows x features and must have one row per score.
pub fn neutralize(scores: &[f64], exposures: ArrayView2<'_, f64>, proportion: f64) -> Result<Vec<f64>> {
    let (rows, cols) = exposures.dim();
    if rows == 0 {
        return Err(Error::InvalidParameter("cannot neutralize an empty group".into()));
    }
    if rows != scores.len() {
        return Err(Error::ShapeMismatch(format!(
            "{} scores against {} exposure rows",
            scores.len(),
            rows
        )));
    }
    if exposures.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter("exposures contain non-finite values".into()));
    }

    let e = DMatrix::from_fn(rows, cols, |r, c| exposures[[r, c]]);
    let s = DVector::from_column_slice(scores);

    let neutral = if cols == 0 {
        s
    } else {
        let svd = e.clone().svd(true, true);
        let cutoff = svd.singular_values.max() * rows.max(cols) as f64 * f64::EPSILON;
        let pinv = svd
            .pseudo_inverse(cutoff)
            .map_err(|e| Error::ShapeMismatch(e.to_string()))?;
        let projection = &e * (pinv * &s);
        s - projection * proportion
    };

    let std = population_std(neutral.as_slice());
    if !(std > f64::EPSILON) {
        return Err(Error::InvalidParameter(
            "neutralized scores have zero variance".into(),
        ));
    }
    Ok(neutral.iter().map(|v| v / std).collect())
}

/// Rank-gaussianize then neutralize one group.
pub fn normalize_and_neutralize(
    scores: &[f64],
    exposures: ArrayView2<'_, f64>,
    proportion: f64,
) -> Result<Vec<f64>> {
    let normalized = rank_gauss(scores)?;
    neutralize(&normalized, exposures, proportion)
}

/// Scale to [0, 1] in place. A constant input becomes all zeros.
pub fn min_max_scale(values: &mut [f64]) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    let range = if range > 0.0 { range } else { 1.0 };
    for v in values.iter_mut() {
        *v = (*v - min) / range;
    }
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Neutralizes a prediction column against features, era by era, and writes
/// the min-max scaled result to `<pred_name>_neutralized_<proportion>`.
#[derive(Debug, Clone)]
pub struct FeatureNeutralizer {
    proportion: f64,
    pred_name: String,
    /// Explicit exposure columns. All feature columns when `None`.
    feature_names: Option<Vec<String>>,
}

impl FeatureNeutralizer {
    pub fn new(proportion: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&proportion) {
            return Err(Error::InvalidParameter(format!(
                "proportion must be within [0, 1], got {}",
                proportion
            )));
        }
        Ok(Self {
            proportion,
            pred_name: DEFAULT_PRED_NAME.to_string(),
            feature_names: None,
        })
    }

    pub fn pred_name(mut self, pred_name: impl Into<String>) -> Self {
        self.pred_name = pred_name.into();
        self
    }

    pub fn feature_names(mut self, feature_names: Vec<String>) -> Self {
        self.feature_names = Some(feature_names);
        self
    }

    pub fn proportion(&self) -> f64 {
        self.proportion
    }

    pub fn new_col_name(&self) -> String {
        format!("{}_neutralized_{:?}", self.pred_name, self.proportion)
    }
}

impl Default for FeatureNeutralizer {
    fn default() -> Self {
        Self {
            proportion: DEFAULT_PROPORTION,
            pred_name: DEFAULT_PRED_NAME.to_string(),
            feature_names: None,
        }
    }
}

impl Processor for FeatureNeutralizer {
    fn name(&self) -> &str {
        "FeatureNeutralizer"
    }

    fn transform(&self, mut frame: NumerFrame) -> Result<NumerFrame> {
        let feature_names = match &self.feature_names {
            Some(names) => names.clone(),
            None => frame.feature_cols(),
        };
        let scores = frame.column(&self.pred_name)?;
        let exposures = frame.matrix(&feature_names)?;

        let mut neutralized = vec![0.0; frame.len()];
        for (era, rows) in frame.era_groups() {
            let group_scores: Vec<f64> = rows.iter().map(|&r| scores[r]).collect();
            let group_exposures = exposures.select(ndarray::Axis(0), &rows);
            let values = normalize_and_neutralize(
                &group_scores,
                group_exposures.view(),
                self.proportion,
            )
            .map_err(|e| Error::DegenerateGroup {
                group: era.to_string(),
                reason: e.to_string(),
            })?;
            for (&row, value) in rows.iter().zip(values) {
                neutralized[row] = value;
            }
        }
        min_max_scale(&mut neutralized);

        let new_col = self.new_col_name();
        frame.insert_column(new_col.clone(), neutralized)?;
        info!(
            pred_name = %self.pred_name,
            proportion = self.proportion,
            features = feature_names.len(),
            column = %new_col,
            "Neutralized predictions"
        );
        Ok(frame)
    }
}
