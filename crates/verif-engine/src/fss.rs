//! Fractions Skill Score over a threshold-by-scale grid.
//!
//! For every intensity threshold both fields are binarized, local
//! exceedance fractions are computed with a square box filter at each
//! neighborhood scale, and the score compares the two fraction fields.
//! NaN pixels are excluded from every sum; they are never treated as
//! non-exceeding.

use serde::{Deserialize, Serialize};
use tracing::debug;
use verif_common::GridField;

use crate::error::{EngineError, Result};

/// FSS values indexed by threshold (rows) and neighborhood scale
/// (columns), with display labels carried alongside for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FssTable {
    /// Intensity thresholds in the field's physical units.
    pub thresholds: Vec<f64>,
    /// Neighborhood window widths in pixels.
    pub scales: Vec<usize>,
    /// Row labels, e.g. "5 mm/h". Default to the plain threshold values.
    pub threshold_labels: Vec<String>,
    /// Column labels, e.g. "15 km". Default to the plain pixel widths.
    pub scale_labels: Vec<String>,
    /// Score values, `values[threshold_index][scale_index]`, each in
    /// [0, 1] or NaN for the no-signal degenerate case.
    #[serde(with = "verif_common::json::nan_f64_rows")]
    pub values: Vec<Vec<f64>>,
}

impl FssTable {
    /// Score at (threshold index, scale index).
    pub fn value(&self, threshold_idx: usize, scale_idx: usize) -> f64 {
        self.values[threshold_idx][scale_idx]
    }

    /// Replace the display labels. Lengths must match the axes.
    pub fn with_labels(
        mut self,
        threshold_labels: Vec<String>,
        scale_labels: Vec<String>,
    ) -> Result<Self> {
        if threshold_labels.len() != self.thresholds.len()
            || scale_labels.len() != self.scales.len()
        {
            return Err(EngineError::InvalidRequest(
                "label lengths must match the table axes".to_string(),
            ));
        }
        self.threshold_labels = threshold_labels;
        self.scale_labels = scale_labels;
        Ok(self)
    }

    /// Per-cell mean over several tables, ignoring NaN cells. All tables
    /// must share the axes of the first; returns None for empty input.
    pub fn nan_mean(tables: &[FssTable]) -> Option<FssTable> {
        let first = tables.first()?;
        let mut mean = first.clone();
        for (ti, row) in mean.values.iter_mut().enumerate() {
            for (si, cell) in row.iter_mut().enumerate() {
                let mut sum = 0.0f64;
                let mut count = 0usize;
                for table in tables {
                    let v = table.values[ti][si];
                    if !v.is_nan() {
                        sum += v;
                        count += 1;
                    }
                }
                *cell = if count == 0 { f64::NAN } else { sum / count as f64 };
            }
        }
        Some(mean)
    }
}

/// Compute the FSS table for a prediction/observation pair.
///
/// Degenerate thresholds follow the standard convention: when neither
/// field has an exceeding pixel there is no signal to score and every
/// scale gets NaN; when exactly one field has exceeding pixels the
/// forecast is a total miss or total false alarm and every scale gets 0.
pub fn fss_score(
    prediction: &GridField,
    observation: &GridField,
    thresholds: &[f64],
    scales: &[usize],
) -> Result<FssTable> {
    if !prediction.same_shape(observation) {
        return Err(EngineError::ShapeMismatch {
            pred: prediction.shape(),
            obs: observation.shape(),
        });
    }
    if thresholds.is_empty() || scales.is_empty() {
        return Err(EngineError::InvalidRequest(
            "thresholds and scales must be non-empty".to_string(),
        ));
    }
    if scales.iter().any(|&s| s == 0) {
        return Err(EngineError::InvalidRequest(
            "scales must be at least 1 pixel".to_string(),
        ));
    }
    if prediction.finite_count() == 0 || observation.finite_count() == 0 {
        return Err(EngineError::NoValidPixels);
    }

    let (rows, cols) = prediction.shape();
    let pred_valid = valid_mask(prediction);
    let obs_valid = valid_mask(observation);
    let pred_valid_integral = integral_image(&pred_valid, rows, cols);
    let obs_valid_integral = integral_image(&obs_valid, rows, cols);

    let mut values = Vec::with_capacity(thresholds.len());
    for &threshold in thresholds {
        let pred_exceed = exceed_mask(prediction, threshold);
        let obs_exceed = exceed_mask(observation, threshold);
        let pred_count: u64 = pred_exceed.iter().map(|&v| v as u64).sum();
        let obs_count: u64 = obs_exceed.iter().map(|&v| v as u64).sum();

        // Degenerate thresholds resolve without any neighborhood work.
        if pred_count == 0 && obs_count == 0 {
            values.push(vec![f64::NAN; scales.len()]);
            continue;
        }
        if pred_count == 0 || obs_count == 0 {
            values.push(vec![0.0; scales.len()]);
            continue;
        }

        let pred_integral = integral_image(&pred_exceed, rows, cols);
        let obs_integral = integral_image(&obs_exceed, rows, cols);

        let mut row_scores = Vec::with_capacity(scales.len());
        for &scale in scales {
            row_scores.push(fss_at_scale(
                rows,
                cols,
                scale,
                &pred_integral,
                &pred_valid_integral,
                &obs_integral,
                &obs_valid_integral,
                &pred_valid,
                &obs_valid,
            ));
        }
        values.push(row_scores);
    }

    debug!(
        thresholds = thresholds.len(),
        scales = scales.len(),
        "computed FSS table"
    );

    Ok(FssTable {
        thresholds: thresholds.to_vec(),
        scales: scales.to_vec(),
        threshold_labels: thresholds.iter().map(|t| t.to_string()).collect(),
        scale_labels: scales.iter().map(|s| s.to_string()).collect(),
        values,
    })
}

fn valid_mask(field: &GridField) -> Vec<u8> {
    field.data.iter().map(|v| u8::from(v.is_finite())).collect()
}

fn exceed_mask(field: &GridField, threshold: f64) -> Vec<u8> {
    field
        .data
        .iter()
        .map(|&v| u8::from(v.is_finite() && v as f64 >= threshold))
        .collect()
}

/// Summed-area table with a zero top row and left column, so any window
/// sum is four lookups.
fn integral_image(mask: &[u8], rows: usize, cols: usize) -> Vec<u64> {
    let stride = cols + 1;
    let mut table = vec![0u64; (rows + 1) * stride];
    for r in 0..rows {
        let mut row_sum = 0u64;
        for c in 0..cols {
            row_sum += mask[r * cols + c] as u64;
            table[(r + 1) * stride + c + 1] = table[r * stride + c + 1] + row_sum;
        }
    }
    table
}

#[inline]
fn window_sum(table: &[u64], stride: usize, r0: usize, r1: usize, c0: usize, c1: usize) -> u64 {
    // inclusive bounds
    table[(r1 + 1) * stride + c1 + 1] + table[r0 * stride + c0]
        - table[r0 * stride + c1 + 1]
        - table[(r1 + 1) * stride + c0]
}

/// FSS for one threshold at one neighborhood scale.
///
/// The window of width `scale` is clipped at the grid edge and fractions
/// are normalized by the number of valid pixels inside it, computed per
/// field. Cells where either field is NaN contribute to neither the
/// numerator nor the denominator. Even widths extend one pixel further
/// toward higher indices.
#[allow(clippy::too_many_arguments)]
fn fss_at_scale(
    rows: usize,
    cols: usize,
    scale: usize,
    pred_integral: &[u64],
    pred_valid_integral: &[u64],
    obs_integral: &[u64],
    obs_valid_integral: &[u64],
    pred_valid: &[u8],
    obs_valid: &[u8],
) -> f64 {
    let stride = cols + 1;
    let reach_lo = (scale - 1) / 2;
    let reach_hi = scale / 2;

    let mut diff_sq_sum = 0.0f64;
    let mut square_sum = 0.0f64;
    let mut cells = 0u64;

    for r in 0..rows {
        let r0 = r.saturating_sub(reach_lo);
        let r1 = (r + reach_hi).min(rows - 1);
        for c in 0..cols {
            if pred_valid[r * cols + c] == 0 || obs_valid[r * cols + c] == 0 {
                continue;
            }
            let c0 = c.saturating_sub(reach_lo);
            let c1 = (c + reach_hi).min(cols - 1);

            let pred_n = window_sum(pred_valid_integral, stride, r0, r1, c0, c1);
            let obs_n = window_sum(obs_valid_integral, stride, r0, r1, c0, c1);
            if pred_n == 0 || obs_n == 0 {
                continue;
            }
            let f_pred = window_sum(pred_integral, stride, r0, r1, c0, c1) as f64 / pred_n as f64;
            let f_obs = window_sum(obs_integral, stride, r0, r1, c0, c1) as f64 / obs_n as f64;

            diff_sq_sum += (f_pred - f_obs) * (f_pred - f_obs);
            square_sum += f_pred * f_pred + f_obs * f_obs;
            cells += 1;
        }
    }

    if cells == 0 || square_sum == 0.0 {
        return f64::NAN;
    }
    1.0 - diff_sq_sum / square_sum
}
