//! End-to-end scenarios combining detection, SAL and FSS.

use verif_common::GridField;
use verif_engine::{detect, fss_score, sal_score, DetectionParameters};
use verif_testdata::{constant_field, hotspot_field, zero_field};

fn adaptive_params() -> DetectionParameters {
    DetectionParameters {
        minsize: 1,
        ..DetectionParameters::adaptive(0.067, 0.95)
    }
}

#[test]
fn identical_constant_fields_are_a_perfect_forecast() {
    let pred = constant_field(10, 10, 5.0);
    let obs = constant_field(10, 10, 5.0);

    let fss = fss_score(&pred, &obs, &[1.0, 3.0], &[1, 3]).unwrap();
    for row in &fss.values {
        for &v in row {
            assert_eq!(v, 1.0);
        }
    }

    let sal = sal_score(&pred, &obs, &adaptive_params()).unwrap();
    assert_eq!(sal.structure, 0.0);
    assert_eq!(sal.amplitude, 0.0);
    assert_eq!(sal.location(), 0.0);
}

#[test]
fn hotspot_against_empty_observation() {
    let pred = hotspot_field(20, 20, 0.0, 10.0, (10, 10), 4);
    let obs = zero_field(20, 20);

    // every threshold the hotspot exceeds scores a total false alarm
    let fss = fss_score(&pred, &obs, &[1.0, 5.0], &[1, 3, 9]).unwrap();
    for row in &fss.values {
        for &v in row {
            assert_eq!(v, 0.0);
        }
    }

    let sal = sal_score(&pred, &obs, &adaptive_params()).unwrap();
    assert!(sal.structure > 0.0);
    assert!((sal.structure - 2.0).abs() < 1e-12);
    assert!(sal.location().is_nan());
}

#[test]
fn nan_sentinels_propagate_without_poisoning_scores() {
    let mut pred = hotspot_field(20, 20, 0.0, 10.0, (10, 10), 4);
    let mut obs = hotspot_field(20, 20, 0.0, 10.0, (11, 11), 4);
    // missing stripe along one edge of both fields
    for col in 0..20 {
        pred.data[col] = f32::NAN;
        obs.data[col] = f32::NAN;
    }

    let fss = fss_score(&pred, &obs, &[1.0], &[3]).unwrap();
    let v = fss.value(0, 0);
    assert!(v.is_finite());
    assert!((0.0..=1.0).contains(&v));

    let sal = sal_score(&pred, &obs, &adaptive_params()).unwrap();
    assert!(sal.structure.is_finite());
    assert!(sal.amplitude.is_finite());
    assert!(sal.location().is_finite());
}

#[test]
fn detection_and_scores_share_the_parameter_contract() {
    let pred = hotspot_field(30, 30, 0.0, 8.0, (15, 15), 5);
    let params = adaptive_params();

    let detection = detect(&pred, &params).unwrap();
    assert_eq!(detection.objects.len(), 1);

    // the same parameter value drives the SAL detections
    let sal = sal_score(&pred, &pred, &params).unwrap();
    assert_eq!(sal.structure, 0.0);
    assert_eq!(sal.location(), 0.0);
}

#[test]
fn missing_everything_is_a_data_error() {
    let field = GridField::new(vec![f32::NAN; 100], 10, 10).unwrap();
    let ok = hotspot_field(10, 10, 0.0, 5.0, (5, 5), 2);

    assert!(fss_score(&field, &ok, &[1.0], &[1]).is_err());
    assert!(sal_score(&field, &ok, &adaptive_params()).is_err());
}
