use hypertune::{
    Accuracy, Error, KFold, Params, StratifiedKFold, cross_validate,
};

use crate::estimators::{NearestCentroid, Threshold, blobs, line};

#[test]
fn test_cross_validate_scores_each_fold() {
    let data = line(40, 20);
    let cv = cross_validate(
        &Threshold,
        &Params::new().with("threshold", 5.5),
        &data.view(),
        &KFold::new(4),
        &Accuracy,
        &mut fastrand::Rng::with_seed(0),
    )
    .unwrap();

    assert_eq!(cv.scores, vec![0.6, 0.0, 1.0, 1.0]);
    assert!((cv.mean() - 0.65).abs() < 1e-12);
    assert!((cv.min() - 0.0).abs() < f64::EPSILON);
    assert!((cv.max() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_cross_validate_propagates_fit_error() {
    let data = blobs(20, 2, 3.0, 0);
    let err = cross_validate(
        &NearestCentroid,
        &Params::new().with("shrink", 1.0),
        &data.view(),
        &StratifiedKFold::new(4),
        &Accuracy,
        &mut fastrand::Rng::with_seed(0),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::EstimatorFit {
            candidate: 0,
            fold: Some(0),
            ..
        }
    ));
}

#[test]
fn test_cross_validate_rejects_unknown_parameter() {
    let data = line(10, 5);
    let err = cross_validate(
        &Threshold,
        &Params::new().with("threshold", 1.0).with("depth", 3),
        &data.view(),
        &KFold::new(2),
        &Accuracy,
        &mut fastrand::Rng::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnknownParameter { ref name, .. } if name == "depth"));
}
