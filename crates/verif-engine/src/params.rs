//! Detection parameters and adaptive threshold derivation.

use serde::{Deserialize, Serialize};
use verif_common::GridField;

use crate::error::{EngineError, Result};

/// Epsilon used by the adaptive derivation to collapse the contrast
/// criteria around the derived threshold.
pub const THRESHOLD_EPSILON: f64 = 1e-5;

/// Parameters controlling feature detection.
///
/// When `thr_factor` is set, the raw thresholds `minref`/`maxref`/
/// `mindiff`/`minmax` are re-derived from each field's own quantile at
/// every detection call ([`derive_thresholds`]); the configured values are
/// ignored for those four fields. This keeps detection comparable between
/// fields with different intensity regimes (e.g. a smooth model field vs a
/// raw radar composite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParameters {
    /// Multiplicative factor applied to the field quantile to obtain the
    /// detection threshold. Requires `thr_quantile`.
    pub thr_factor: Option<f64>,
    /// Quantile level for the adaptive threshold, in [0, 1].
    pub thr_quantile: Option<f64>,
    /// Minimum value for a pixel to join a candidate region.
    pub minref: f64,
    /// Values above this are flattened for peak-contrast purposes.
    pub maxref: f64,
    /// Minimum peak contrast for two regions to stay separate.
    pub mindiff: f64,
    /// Minimum region maximum; weaker regions are discarded.
    pub minmax: f64,
    /// Minimum pixel count per object.
    pub minsize: usize,
    /// Minimum peak separation (pixels) for two regions to stay separate.
    pub mindis: f64,
    /// Cap on the number of returned objects; None means unbounded.
    pub max_num_features: Option<usize>,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        // Raw thresholds follow the usual thunderstorm-cell settings for
        // reflectivity in dBZ; adaptive runs override them per field.
        Self {
            thr_factor: None,
            thr_quantile: None,
            minref: 35.0,
            maxref: 48.0,
            mindiff: 8.0,
            minmax: 41.0,
            minsize: 50,
            mindis: 10.0,
            max_num_features: None,
        }
    }
}

impl DetectionParameters {
    /// Adaptive parameters with the conventional SAL factor/quantile.
    pub fn adaptive(thr_factor: f64, thr_quantile: f64) -> Self {
        Self {
            thr_factor: Some(thr_factor),
            thr_quantile: Some(thr_quantile),
            ..Self::default()
        }
    }

    /// Validate the parameter combination. Fails before any field is
    /// touched.
    pub fn validate(&self) -> Result<()> {
        match (self.thr_factor, self.thr_quantile) {
            (Some(_), None) => {
                return Err(EngineError::InvalidParameters(
                    "thr_factor requires thr_quantile".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(EngineError::InvalidParameters(
                    "thr_quantile requires thr_factor".to_string(),
                ))
            }
            _ => {}
        }
        if let Some(q) = self.thr_quantile {
            if !(0.0..=1.0).contains(&q) {
                return Err(EngineError::InvalidParameters(format!(
                    "thr_quantile must be in [0, 1], got {}",
                    q
                )));
            }
        }
        if let Some(f) = self.thr_factor {
            if !f.is_finite() || f <= 0.0 {
                return Err(EngineError::InvalidParameters(format!(
                    "thr_factor must be positive, got {}",
                    f
                )));
            }
        }
        if self.minsize == 0 {
            return Err(EngineError::InvalidParameters(
                "minsize must be at least 1".to_string(),
            ));
        }
        if self.mindis < 0.0 {
            return Err(EngineError::InvalidParameters(format!(
                "mindis must be non-negative, got {}",
                self.mindis
            )));
        }
        if self.maxref < self.minref {
            return Err(EngineError::InvalidParameters(format!(
                "maxref ({}) must not be below minref ({})",
                self.maxref, self.minref
            )));
        }
        Ok(())
    }

    /// Parameters actually used for a given field: the adaptive
    /// derivation when `thr_factor` is set, otherwise a copy of self.
    pub fn effective_for(&self, field: &GridField) -> Result<DetectionParameters> {
        self.validate()?;
        match (self.thr_factor, self.thr_quantile) {
            (Some(factor), Some(quantile)) => derive_thresholds(field, factor, quantile, self),
            _ => {
                if field.finite_count() == 0 {
                    return Err(EngineError::NoValidPixels);
                }
                Ok(self.clone())
            }
        }
    }
}

/// Derive field-dependent detection thresholds.
///
/// The threshold is `thr_factor` times the `thr_quantile` quantile of the
/// values strictly above the field minimum. The labeling thresholds are
/// collapsed around it so that detection reduces to contiguous regions of
/// pixels at or above the threshold:
/// `minref = minmax = threshold`, `maxref = threshold + eps`,
/// `mindiff = eps`.
///
/// Pure function: returns a fresh parameter set, the input `base` is never
/// mutated.
///
/// Two degenerate inputs get explicit handling:
/// - a constant positive field (nothing above its own minimum) takes the
///   quantile over all finite values, so the whole field can still form
///   one object;
/// - a field with no finite value above zero has no detectable signal,
///   and the derived `minref` is +inf so detection returns no objects.
pub fn derive_thresholds(
    field: &GridField,
    thr_factor: f64,
    thr_quantile: f64,
    base: &DetectionParameters,
) -> Result<DetectionParameters> {
    let baseline = field.min_finite().ok_or(EngineError::NoValidPixels)? as f64;

    let mut values: Vec<f64> = field
        .data
        .iter()
        .filter(|v| v.is_finite() && (**v as f64) > baseline)
        .map(|&v| v as f64)
        .collect();

    let threshold = if values.is_empty() {
        if baseline > 0.0 {
            // Constant positive field: every pixel is signal.
            thr_factor * baseline
        } else {
            // Flat zero (or negative) field: no signal at all.
            f64::INFINITY
        }
    } else {
        values.sort_by(f64::total_cmp);
        thr_factor * quantile_sorted(&values, thr_quantile)
    };

    Ok(DetectionParameters {
        minref: threshold,
        maxref: threshold + THRESHOLD_EPSILON,
        mindiff: THRESHOLD_EPSILON,
        minmax: threshold,
        ..base.clone()
    })
}

/// Quantile of a sorted slice with linear interpolation between order
/// statistics.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = pos - lower as f64;
        sorted[lower] + frac * (sorted[upper] - sorted[lower])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_factor_without_quantile() {
        let params = DetectionParameters {
            thr_factor: Some(0.067),
            thr_quantile: None,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameters(_))
        ));

        let params = DetectionParameters {
            thr_factor: None,
            thr_quantile: Some(0.95),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_quantile_range() {
        let params = DetectionParameters::adaptive(0.067, 1.5);
        assert!(params.validate().is_err());
        let params = DetectionParameters::adaptive(0.067, 0.95);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_quantile_sorted() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&values, 0.0), 1.0);
        assert_eq!(quantile_sorted(&values, 1.0), 4.0);
        assert!((quantile_sorted(&values, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile_sorted(&values, 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_derive_thresholds_uses_values_above_minimum() {
        // Minimum is 0; quantile taken over the strictly positive values.
        let field = GridField::new(vec![0.0, 0.0, 10.0, 10.0], 2, 2).unwrap();
        let base = DetectionParameters::adaptive(0.5, 0.95);
        let derived = derive_thresholds(&field, 0.5, 0.95, &base).unwrap();
        assert!((derived.minref - 5.0).abs() < 1e-12);
        assert!((derived.minmax - 5.0).abs() < 1e-12);
        assert!((derived.maxref - (5.0 + THRESHOLD_EPSILON)).abs() < 1e-12);
        assert_eq!(derived.mindiff, THRESHOLD_EPSILON);
        // base untouched
        assert_eq!(base.minref, DetectionParameters::default().minref);
    }

    #[test]
    fn test_derive_thresholds_constant_field_falls_back() {
        let field = GridField::new(vec![5.0; 9], 3, 3).unwrap();
        let derived = derive_thresholds(
            &field,
            0.067,
            0.95,
            &DetectionParameters::adaptive(0.067, 0.95),
        )
        .unwrap();
        assert!((derived.minref - 0.335).abs() < 1e-9);
    }

    #[test]
    fn test_derive_thresholds_flat_zero_field_has_no_signal() {
        let field = GridField::new(vec![0.0; 9], 3, 3).unwrap();
        let derived = derive_thresholds(
            &field,
            0.067,
            0.95,
            &DetectionParameters::adaptive(0.067, 0.95),
        )
        .unwrap();
        assert!(derived.minref.is_infinite());
    }

    #[test]
    fn test_derive_thresholds_all_nan_fails() {
        let field = GridField::new(vec![f32::NAN; 4], 2, 2).unwrap();
        let result = derive_thresholds(
            &field,
            0.067,
            0.95,
            &DetectionParameters::adaptive(0.067, 0.95),
        );
        assert!(matches!(result, Err(EngineError::NoValidPixels)));
    }
}
