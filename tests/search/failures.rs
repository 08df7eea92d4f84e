use hypertune::{
    CandidateState, DatasetView, Error, Estimator, ParameterGrid, Params, Search,
};

use crate::estimators::{Constant, Majority, NearestCentroid, Threshold, blobs, line};

#[test]
fn test_failed_candidate_is_recorded_and_excluded() {
    let data = blobs(60, 2, 4.0, 1);
    let grid = ParameterGrid::builder()
        .add("shrink", [1.5, 0.0])
        .build()
        .unwrap();
    let result = Search::builder(NearestCentroid)
        .grid(grid)
        .n_folds(3)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert_eq!(result.n_failed(), 1);
    assert_eq!(result.best_index(), 1);

    let failed = &result.candidates()[0];
    assert_eq!(failed.state, CandidateState::Failed);
    assert!(!failed.is_complete());
    assert_eq!(failed.failed_fold, Some(0));
    assert!(failed.error.as_deref().unwrap().contains("shrink must be below 1"));
    assert_eq!(failed.mean_score, None);
    assert_eq!(failed.rank, None);
    assert!(failed.fold_scores.iter().all(Option::is_none));
}

#[test]
fn test_all_failed_returns_first_failure() {
    let data = line(12, 6);
    let grid = ParameterGrid::builder()
        .add("fail", [true])
        .add("sleep_ms", [0_i64, 1])
        .build()
        .unwrap();
    let err = Search::builder(Majority)
        .grid(grid)
        .n_folds(3)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap_err();

    match err {
        Error::EstimatorFit {
            candidate,
            fold,
            message,
        } => {
            assert_eq!(candidate, 0);
            assert_eq!(fold, Some(0));
            assert_eq!(message, "asked to fail");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_non_finite_score_counts_as_failure() {
    let data = line(12, 6);
    let grid = ParameterGrid::builder()
        .add("threshold", [5.5])
        .build()
        .unwrap();
    let err = Search::builder(Threshold)
        .grid(grid)
        .n_folds(3)
        .metric(|_: &[usize], _: &[usize]| f64::NAN)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap_err();

    assert!(
        matches!(err, Error::EstimatorFit { ref message, .. } if message.contains("non-finite"))
    );
}

/// Fits on cross-validation folds but refuses the full dataset.
struct FailsOnFullData;

impl Estimator for FailsOnFullData {
    type Model = Constant;
    type Error = &'static str;

    fn param_names(&self) -> &[&'static str] {
        &[]
    }

    fn fit(&self, _: &Params, data: &DatasetView<'_>) -> Result<Constant, &'static str> {
        if data.len() == data.dataset().len() {
            Err("too much data")
        } else {
            Ok(Constant(0))
        }
    }
}

#[test]
fn test_refit_failure_is_reported() {
    let data = line(10, 5);
    let err = Search::builder(FailsOnFullData)
        .n_folds(2)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::EstimatorFit {
            candidate: 0,
            fold: None,
            ..
        }
    ));
}

#[test]
fn test_unknown_parameter_rejected_before_fitting() {
    let grid = ParameterGrid::builder()
        .add("threshold", [1.0])
        .add("gamma", [0.1])
        .build()
        .unwrap();
    let err = Search::builder(Threshold).grid(grid).build().unwrap_err();

    match err {
        Error::UnknownParameter { name, allowed } => {
            assert_eq!(name, "gamma");
            assert_eq!(allowed, ["threshold"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_candidate_list_rejected() {
    let err = ParameterGrid::builder()
        .add("threshold", Vec::<f64>::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidGrid { ref name, .. } if name == "threshold"));
}
