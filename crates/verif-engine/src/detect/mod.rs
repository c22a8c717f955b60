//! Feature detection: adaptive thresholding, labeling, object statistics.

mod label;

use serde::{Deserialize, Serialize};
use tracing::debug;
use verif_common::GridField;

use crate::error::Result;
use crate::params::DetectionParameters;

use label::{label_regions, merge_regions, Region};

/// One detected feature: a connected region surviving thresholding.
///
/// Produced fresh by every detection call and never mutated. Only summary
/// statistics derived from a set of objects are ever persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Label id, unique within one detection call. No ordering guarantee
    /// across calls.
    pub label: u32,
    /// Number of member pixels.
    pub pixel_count: usize,
    /// Intensity-weighted center of mass as (row, col).
    pub centroid: (f64, f64),
    /// Maximum intensity over the members.
    pub max_intensity: f64,
    /// Sum of member intensities.
    pub mass: f64,
    /// Top-left corner (row, col) of the bounding box within the source
    /// field.
    pub bbox_origin: (usize, usize),
    /// Bounding-box crop of the source field with non-member pixels
    /// zeroed.
    pub intensity_image: GridField,
}

impl DetectedObject {
    /// Mean intensity over the member pixels.
    pub fn mean_intensity(&self) -> f64 {
        self.mass / self.pixel_count as f64
    }
}

/// Result of one detection call.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Surviving objects, capped at `max_num_features` when configured.
    pub objects: Vec<DetectedObject>,
    /// The parameters actually applied, including any adaptive
    /// derivation.
    pub effective_params: DetectionParameters,
}

impl Detection {
    /// Total intensity mass over all objects.
    pub fn total_mass(&self) -> f64 {
        self.objects.iter().map(|o| o.mass).sum()
    }
}

/// Detect features in a field.
///
/// Candidate pixels are finite values at or above `minref`; 8-connected
/// components form candidate regions. Regions whose maximum falls below
/// `minmax` are discarded, nearby regions with indistinguishable peaks are
/// merged (peak separation under `mindis`, flattened peak contrast under
/// `mindiff`), and regions smaller than `minsize` pixels are dropped.
/// When `max_num_features` is set, objects are kept by descending pixel
/// count (ties by descending max intensity) and the list is truncated.
///
/// An empty object list is a legitimate "no significant feature" outcome.
/// A field without a single finite pixel is a data error.
pub fn detect(field: &GridField, params: &DetectionParameters) -> Result<Detection> {
    let effective = params.effective_for(field)?;

    let regions = label_regions(field, effective.minref);
    let regions: Vec<Region> = regions
        .into_iter()
        .filter(|r| r.max_value >= effective.minmax)
        .collect();
    let regions = merge_regions(
        regions,
        effective.maxref,
        effective.mindiff,
        effective.mindis,
    );

    let mut objects: Vec<DetectedObject> = regions
        .into_iter()
        .filter(|r| r.size() >= effective.minsize)
        .map(|r| build_object(field, &r))
        .collect();

    objects.sort_by(|a, b| {
        b.pixel_count
            .cmp(&a.pixel_count)
            .then(b.max_intensity.total_cmp(&a.max_intensity))
    });
    if let Some(cap) = effective.max_num_features {
        objects.truncate(cap);
    }
    for (i, object) in objects.iter_mut().enumerate() {
        object.label = (i + 1) as u32;
    }

    debug!(
        objects = objects.len(),
        threshold = effective.minref,
        "detected features"
    );

    Ok(Detection {
        objects,
        effective_params: effective,
    })
}

/// Compute per-object statistics for one region.
fn build_object(field: &GridField, region: &Region) -> DetectedObject {
    let mut row_min = usize::MAX;
    let mut row_max = 0usize;
    let mut col_min = usize::MAX;
    let mut col_max = 0usize;
    let mut mass = 0.0f64;
    let mut row_moment = 0.0f64;
    let mut col_moment = 0.0f64;

    for &(row, col) in &region.pixels {
        row_min = row_min.min(row);
        row_max = row_max.max(row);
        col_min = col_min.min(col);
        col_max = col_max.max(col);
        let v = field.at(row, col) as f64;
        mass += v;
        row_moment += v * row as f64;
        col_moment += v * col as f64;
    }

    let height = row_max - row_min + 1;
    let width = col_max - col_min + 1;
    let mut crop = vec![0.0f32; width * height];
    for &(row, col) in &region.pixels {
        crop[(row - row_min) * width + (col - col_min)] = field.at(row, col);
    }
    let intensity_image = GridField {
        data: crop,
        width,
        height,
        coords: None,
    };

    DetectedObject {
        label: 0, // assigned after sorting
        pixel_count: region.pixels.len(),
        centroid: (row_moment / mass, col_moment / mass),
        max_intensity: region.max_value,
        mass,
        bbox_origin: (row_min, col_min),
        intensity_image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use verif_testdata::{constant_field, hotspot_field, two_blob_field, zero_field};

    fn explicit_params(minref: f64, minsize: usize) -> DetectionParameters {
        DetectionParameters {
            thr_factor: None,
            thr_quantile: None,
            minref,
            maxref: minref + 1e-5,
            mindiff: 1e-5,
            minmax: minref,
            minsize,
            mindis: 0.0,
            max_num_features: None,
        }
    }

    #[test]
    fn test_detect_hotspot() {
        let field = hotspot_field(20, 20, 0.0, 10.0, (10, 10), 3);
        let detection = detect(&field, &explicit_params(5.0, 1)).unwrap();
        assert_eq!(detection.objects.len(), 1);
        let object = &detection.objects[0];
        assert!(object.pixel_count > 0);
        assert_eq!(object.max_intensity, 10.0);
        // symmetric hotspot: centroid on its center
        assert!((object.centroid.0 - 10.0).abs() < 1e-9);
        assert!((object.centroid.1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_detect_zero_field_is_empty_not_error() {
        let field = zero_field(10, 10);
        let params = DetectionParameters::adaptive(0.067, 0.95);
        let detection = detect(&field, &params).unwrap();
        assert!(detection.objects.is_empty());
    }

    #[test]
    fn test_detect_all_nan_is_data_error() {
        let field = GridField::new(vec![f32::NAN; 16], 4, 4).unwrap();
        let params = DetectionParameters::adaptive(0.067, 0.95);
        assert!(matches!(
            detect(&field, &params),
            Err(EngineError::NoValidPixels)
        ));
    }

    #[test]
    fn test_detect_constant_field_is_one_object() {
        let field = constant_field(10, 10, 5.0);
        let params = DetectionParameters::adaptive(0.067, 0.95);
        let detection = detect(&field, &params).unwrap();
        assert_eq!(detection.objects.len(), 1);
        assert_eq!(detection.objects[0].pixel_count, 100);
        assert!((detection.objects[0].centroid.0 - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_minsize_filters_small_objects() {
        let field = hotspot_field(20, 20, 0.0, 10.0, (10, 10), 2);
        let detection = detect(&field, &explicit_params(5.0, 1000)).unwrap();
        assert!(detection.objects.is_empty());
    }

    #[test]
    fn test_max_num_features_keeps_largest() {
        let field = two_blob_field(30, 30, 8.0, (8, 8), 2, 12.0, (22, 22), 4);
        let mut params = explicit_params(5.0, 1);
        let all = detect(&field, &params).unwrap();
        assert_eq!(all.objects.len(), 2);

        params.max_num_features = Some(1);
        let capped = detect(&field, &params).unwrap();
        assert_eq!(capped.objects.len(), 1);
        // the larger blob survives the cap
        assert_eq!(capped.objects[0].max_intensity, 12.0);
    }

    #[test]
    fn test_adaptive_monotonicity_in_thr_factor() {
        // Two well-separated blobs of different strength: raising the
        // factor can only lose objects, never gain them.
        let field = two_blob_field(40, 40, 4.0, (10, 10), 3, 12.0, (30, 30), 3);
        let mut previous = usize::MAX;
        for factor in [0.05, 0.2, 0.5, 1.0, 2.0] {
            let params = DetectionParameters {
                minsize: 1,
                ..DetectionParameters::adaptive(factor, 0.95)
            };
            let count = detect(&field, &params).unwrap().objects.len();
            assert!(
                count <= previous,
                "object count rose from {} to {} at factor {}",
                previous,
                count,
                factor
            );
            previous = count;
        }
    }

    #[test]
    fn test_effective_params_are_derived_per_field() {
        let weak = hotspot_field(20, 20, 0.0, 2.0, (10, 10), 4);
        let strong = hotspot_field(20, 20, 0.0, 20.0, (10, 10), 4);
        let params = DetectionParameters {
            minsize: 1,
            ..DetectionParameters::adaptive(0.5, 0.95)
        };
        let weak_detection = detect(&weak, &params).unwrap();
        let strong_detection = detect(&strong, &params).unwrap();
        assert!(
            weak_detection.effective_params.minref < strong_detection.effective_params.minref
        );
        // the configured parameters are untouched
        assert_eq!(params.minref, DetectionParameters::default().minref);
    }

    #[test]
    fn test_intensity_image_zeroes_non_members() {
        let field = hotspot_field(12, 12, 0.0, 9.0, (6, 6), 2);
        let detection = detect(&field, &explicit_params(5.0, 1)).unwrap();
        let object = &detection.objects[0];
        let sum: f64 = object.intensity_image.data.iter().map(|&v| v as f64).sum();
        assert!((sum - object.mass).abs() < 1e-6);
    }
}
