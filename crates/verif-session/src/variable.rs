//! Per-variable verification configuration.

use serde::{Deserialize, Serialize};
use verif_common::GridField;
use verif_engine::DetectionParameters;

use crate::error::{SessionError, SessionResult};

/// Grid resolution used only to label FSS scale columns in physical
/// distance, e.g. 2.5 km per pixel. The conversion never feeds back into
/// the scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PixelResolution {
    pub value: f64,
    pub units: String,
}

/// Everything the session needs to verify one variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Variable identifier, e.g. "pcp" or "bt".
    pub name: String,
    /// Physical units for threshold labels, e.g. "mm/h".
    pub units: String,
    /// FSS intensity thresholds in physical units.
    pub thresholds: Vec<f64>,
    /// FSS neighborhood widths in pixels.
    pub scales: Vec<usize>,
    /// Feature detection configuration shared by both SAL detections.
    pub detection: DetectionParameters,
    /// Whether low values are the significant ones (e.g. brightness
    /// temperature). The engine only searches above thresholds, so such
    /// variables are sign-flipped before scoring.
    #[serde(default)]
    pub minimum_seeking: bool,
    /// Offset applied during the sign flip: `x` becomes `offset - x`.
    /// Required whenever `minimum_seeking` is set; there is no safe
    /// default.
    #[serde(default)]
    pub offset: Option<f64>,
    /// Whether the variable is an accumulation (drops lead time 0).
    #[serde(default)]
    pub accumulated: bool,
    /// Whether an instantaneous variable may be verified at lead 0.
    #[serde(default)]
    pub verif_at_0h: bool,
    /// Optional pixel-to-distance conversion for scale labels.
    #[serde(default)]
    pub resolution: Option<PixelResolution>,
}

impl VariableSpec {
    /// Validate the configuration. Fails before any field is touched.
    pub fn validate(&self) -> SessionResult<()> {
        if self.thresholds.is_empty() {
            return Err(SessionError::Config(format!(
                "variable '{}' has no FSS thresholds",
                self.name
            )));
        }
        if self.scales.is_empty() || self.scales.iter().any(|&s| s == 0) {
            return Err(SessionError::Config(format!(
                "variable '{}' needs FSS scales of at least 1 pixel",
                self.name
            )));
        }
        if self.minimum_seeking && self.offset.is_none() {
            return Err(SessionError::Config(format!(
                "minimum-seeking variable '{}' requires an explicit offset",
                self.name
            )));
        }
        self.detection.validate()?;
        Ok(())
    }

    /// Lead times this variable can actually be verified at.
    ///
    /// Accumulations need a previous step to difference against, so lead
    /// 0 is dropped; instantaneous variables drop lead 0 unless
    /// analysis-time verification is enabled.
    pub fn usable_lead_times(&self, lead_times: &[u32]) -> Vec<u32> {
        lead_times
            .iter()
            .copied()
            .filter(|&lead| {
                if self.accumulated {
                    lead >= 1
                } else {
                    self.verif_at_0h || lead > 0
                }
            })
            .collect()
    }

    /// Apply the minimum-seeking sign convention. Identity for ordinary
    /// variables.
    pub fn prepare(&self, field: &GridField) -> GridField {
        match (self.minimum_seeking, self.offset) {
            (true, Some(offset)) => field.map(|v| offset as f32 - v),
            _ => field.clone(),
        }
    }

    /// Row labels for the FSS table, negated for minimum-seeking
    /// variables so reports show the original orientation.
    pub fn threshold_labels(&self) -> Vec<String> {
        self.thresholds
            .iter()
            .map(|thr| {
                if self.minimum_seeking {
                    format!("-{} {}", thr, self.units)
                } else {
                    format!("{} {}", thr, self.units)
                }
            })
            .collect()
    }

    /// Column labels for the FSS table, in physical distance when a
    /// resolution is configured.
    pub fn scale_labels(&self) -> Vec<String> {
        self.scales
            .iter()
            .map(|&pixels| match &self.resolution {
                Some(res) if res.value < 1.0 => {
                    let distance = (pixels as f64 * res.value * 10.0).round() / 10.0;
                    format!("{} {}", distance, res.units)
                }
                Some(res) => {
                    format!("{} {}", (pixels as f64 * res.value).round() as i64, res.units)
                }
                None => format!("{} px", pixels),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn precip() -> VariableSpec {
        VariableSpec {
            name: "pcp".to_string(),
            units: "mm/h".to_string(),
            thresholds: vec![1.0, 5.0],
            scales: vec![3, 9],
            detection: DetectionParameters::adaptive(0.067, 0.95),
            minimum_seeking: false,
            offset: None,
            accumulated: false,
            verif_at_0h: false,
            resolution: None,
        }
    }

    #[test]
    fn test_minimum_seeking_requires_offset() {
        let mut bt = precip();
        bt.name = "bt".to_string();
        bt.minimum_seeking = true;
        assert!(matches!(bt.validate(), Err(SessionError::Config(_))));
        bt.offset = Some(0.0);
        assert!(bt.validate().is_ok());
    }

    #[test]
    fn test_prepare_flips_minimum_seeking_fields() {
        let mut bt = precip();
        bt.minimum_seeking = true;
        bt.offset = Some(0.0);
        let field = GridField::new(vec![210.0, 290.0, f32::NAN, 250.0], 2, 2).unwrap();
        let flipped = bt.prepare(&field);
        // the cold (significant) pixel is now the maximum
        assert_eq!(flipped.at(0, 0), -210.0);
        assert_eq!(flipped.max_finite(), Some(-210.0));
        assert!(flipped.at(1, 0).is_nan());
    }

    #[test]
    fn test_usable_lead_times() {
        let leads = [0, 1, 2, 3];
        let mut v = precip();
        assert_eq!(v.usable_lead_times(&leads), vec![1, 2, 3]);
        v.verif_at_0h = true;
        assert_eq!(v.usable_lead_times(&leads), vec![0, 1, 2, 3]);
        v.accumulated = true;
        assert_eq!(v.usable_lead_times(&leads), vec![1, 2, 3]);
    }

    #[test]
    fn test_labels() {
        let mut v = precip();
        assert_eq!(v.threshold_labels(), vec!["1 mm/h", "5 mm/h"]);
        assert_eq!(v.scale_labels(), vec!["3 px", "9 px"]);

        v.resolution = Some(PixelResolution {
            value: 2.5,
            units: "km".to_string(),
        });
        assert_eq!(v.scale_labels(), vec!["8 km", "23 km"]);

        v.resolution = Some(PixelResolution {
            value: 0.25,
            units: "deg".to_string(),
        });
        assert_eq!(v.scale_labels(), vec!["0.8 deg", "2.3 deg"]);

        v.minimum_seeking = true;
        assert_eq!(v.threshold_labels(), vec!["-1 mm/h", "-5 mm/h"]);
    }
}
