//! Structure-Amplitude-Location decomposition for spatial fields.
//!
//! All three terms come from Wernli-style object verification: Structure
//! compares scaled feature volumes, Amplitude compares domain means, and
//! Location combines the whole-field centroid displacement (L1) with the
//! spread of features around it (L2). Zero detected objects in either
//! field is a legitimate outcome and yields NaN terms, never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;
use verif_common::GridField;

use crate::detect::{detect, Detection};
use crate::error::{EngineError, Result};
use crate::params::DetectionParameters;

/// The SAL triple, with the two Location sub-terms kept separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalScore {
    #[serde(with = "verif_common::json::nan_f64")]
    pub structure: f64,
    #[serde(with = "verif_common::json::nan_f64")]
    pub amplitude: f64,
    #[serde(with = "verif_common::json::nan_f64")]
    pub location_l1: f64,
    #[serde(with = "verif_common::json::nan_f64")]
    pub location_l2: f64,
}

impl SalScore {
    /// Total Location term, L1 + L2. In [0, 2] by construction; values
    /// outside that range indicate a detection or parameter problem and
    /// are surfaced as-is.
    pub fn location(&self) -> f64 {
        self.location_l1 + self.location_l2
    }
}

/// SAL score plus the per-field detections behind it, for diagnostics.
#[derive(Debug, Clone)]
pub struct SalReport {
    pub score: SalScore,
    pub prediction: Detection,
    pub observation: Detection,
}

/// Compute the SAL triple for a prediction/observation pair.
pub fn sal_score(
    prediction: &GridField,
    observation: &GridField,
    params: &DetectionParameters,
) -> Result<SalScore> {
    Ok(sal_report(prediction, observation, params)?.score)
}

/// Compute SAL and keep the detections used for Structure and L2.
///
/// Each field is detected once with its own adaptively derived thresholds;
/// Structure and L2 share those detections. Negative values are encoding
/// artifacts in precipitation-like fields: they are clamped to zero before
/// detection and the location terms, and excluded (as missing) from the
/// Amplitude means.
pub fn sal_report(
    prediction: &GridField,
    observation: &GridField,
    params: &DetectionParameters,
) -> Result<SalReport> {
    params.validate()?;
    if !prediction.same_shape(observation) {
        return Err(EngineError::ShapeMismatch {
            pred: prediction.shape(),
            obs: observation.shape(),
        });
    }

    let pred = prediction.map(clamp_negative);
    let obs = observation.map(clamp_negative);

    let pred_detection = detect(&pred, params)?;
    let obs_detection = detect(&obs, params)?;

    let structure = structure_term(&pred_detection, &obs_detection);
    let amplitude = amplitude_term(prediction, observation);
    let location_l1 = l1_term(&pred, &obs);
    let location_l2 = l2_term(&pred, &obs, &pred_detection, &obs_detection);

    debug!(
        structure,
        amplitude,
        location = location_l1 + location_l2,
        pred_objects = pred_detection.objects.len(),
        obs_objects = obs_detection.objects.len(),
        "computed SAL"
    );

    Ok(SalReport {
        score: SalScore {
            structure,
            amplitude,
            location_l1,
            location_l2,
        },
        prediction: pred_detection,
        observation: obs_detection,
    })
}

#[inline]
fn clamp_negative(v: f32) -> f32 {
    if v < 0.0 {
        0.0
    } else {
        v
    }
}

/// Scaled volume of one object: pixel count times max intensity over mean
/// intensity.
fn scaled_volume(detection: &Detection) -> f64 {
    detection
        .objects
        .iter()
        .map(|o| o.pixel_count as f64 * o.max_intensity / o.mean_intensity())
        .sum()
}

/// Structure term: normalized difference of summed scaled volumes.
/// Antisymmetric under swapping the fields; NaN when both volumes vanish.
fn structure_term(pred: &Detection, obs: &Detection) -> f64 {
    let v_pred = scaled_volume(pred);
    let v_obs = scaled_volume(obs);
    (v_pred - v_obs) / (0.5 * (v_pred + v_obs))
}

/// Amplitude term: normalized difference of domain means over all finite,
/// non-negative pixels of the full fields.
fn amplitude_term(prediction: &GridField, observation: &GridField) -> f64 {
    let mean_pred = non_negative_mean(prediction);
    let mean_obs = non_negative_mean(observation);
    (mean_pred - mean_obs) / (0.5 * (mean_pred + mean_obs))
}

fn non_negative_mean(field: &GridField) -> f64 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for &v in &field.data {
        if v.is_finite() && v >= 0.0 {
            sum += v as f64;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Intensity-weighted centroid of a whole field, NaN pixels contributing
/// zero mass. None when the field carries no mass at all.
fn weighted_centroid(field: &GridField) -> Option<(f64, f64)> {
    let mut mass = 0.0f64;
    let mut row_moment = 0.0f64;
    let mut col_moment = 0.0f64;
    for row in 0..field.height {
        for col in 0..field.width {
            let v = field.at(row, col);
            if !v.is_finite() {
                continue;
            }
            let w = v as f64;
            mass += w;
            row_moment += w * row as f64;
            col_moment += w * col as f64;
        }
    }
    if mass > 0.0 {
        Some((row_moment / mass, col_moment / mass))
    } else {
        None
    }
}

/// L1: whole-field centroid displacement over the grid diagonal.
fn l1_term(pred: &GridField, obs: &GridField) -> f64 {
    let (pred_centroid, obs_centroid) = match (weighted_centroid(pred), weighted_centroid(obs)) {
        (Some(p), Some(o)) => (p, o),
        _ => return f64::NAN,
    };
    let dr = pred_centroid.0 - obs_centroid.0;
    let dc = pred_centroid.1 - obs_centroid.1;
    (dr * dr + dc * dc).sqrt() / obs.diagonal()
}

/// L2: difference between the fields' mass-weighted object spreads.
fn l2_term(pred: &GridField, obs: &GridField, pred_det: &Detection, obs_det: &Detection) -> f64 {
    let r_pred = weighted_distance(pred, pred_det);
    let r_obs = weighted_distance(obs, obs_det);
    2.0 * (r_pred - r_obs).abs() / obs.diagonal()
}

/// Mass-weighted mean distance of object centroids from the field's own
/// global weighted centroid. NaN when the field has no detected objects.
fn weighted_distance(field: &GridField, detection: &Detection) -> f64 {
    if detection.objects.is_empty() {
        return f64::NAN;
    }
    let global = match weighted_centroid(field) {
        Some(c) => c,
        None => return f64::NAN,
    };
    let mut weighted_sum = 0.0f64;
    let mut mass_sum = 0.0f64;
    for object in &detection.objects {
        let dr = object.centroid.0 - global.0;
        let dc = object.centroid.1 - global.1;
        let distance = (dr * dr + dc * dc).sqrt();
        weighted_sum += object.mass * distance;
        mass_sum += object.mass;
    }
    weighted_sum / mass_sum
}
