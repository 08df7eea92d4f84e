use hypertune::{CandidateState, Error, KFold, ParameterGrid, Search};

use crate::estimators::{Majority, Threshold, line};

fn threshold_grid(values: &[f64]) -> ParameterGrid {
    ParameterGrid::builder()
        .add("threshold", values.iter().copied())
        .build()
        .unwrap()
}

#[test]
fn test_grid_search_finds_boundary() {
    let data = line(40, 20);
    let result = Search::builder(Threshold)
        .grid(threshold_grid(&[5.5, 19.5, 30.5]))
        .n_folds(4)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert_eq!(result.n_candidates(), 3);
    assert_eq!(result.best_index(), 1);
    assert_eq!(result.best_params().get_f64("threshold"), Some(19.5));
    assert!((result.best_score() - 1.0).abs() < 1e-12);

    // blocks of 10: [0,10) [10,20) [20,30) [30,40)
    let low = &result.candidates()[0];
    assert_eq!(low.fold_scores, vec![Some(0.6), Some(0.0), Some(1.0), Some(1.0)]);
    assert!((low.mean_score.unwrap() - 0.65).abs() < 1e-12);

    let ranks: Vec<_> = result.candidates().iter().map(|c| c.rank).collect();
    assert_eq!(ranks, [Some(3), Some(1), Some(2)]);
}

#[test]
fn test_candidates_follow_grid_order() {
    let data = line(30, 15);
    let grid = ParameterGrid::builder()
        .add("threshold", [10.5, 14.5])
        .build()
        .unwrap();
    let result = Search::builder(Threshold)
        .grid(grid.clone())
        .n_folds(3)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    for (i, (candidate, params)) in result.candidates().iter().zip(grid.iter()).enumerate() {
        assert_eq!(candidate.index, i);
        assert_eq!(candidate.params, params);
        assert_eq!(candidate.fold_scores.len(), 3);
        assert_eq!(candidate.state, CandidateState::Complete);
    }
}

#[test]
fn test_ties_go_to_first_candidate() {
    // both thresholds separate integer features identically
    let data = line(20, 10);
    let result = Search::builder(Threshold)
        .grid(threshold_grid(&[9.5, 9.2]))
        .n_folds(5)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert_eq!(result.best_index(), 0);
    assert_eq!(result.candidates()[0].rank, Some(1));
    assert_eq!(result.candidates()[1].rank, Some(1));
}

#[test]
fn test_empty_grid_evaluates_one_candidate() {
    let data = line(12, 4);
    let result = Search::builder(Majority)
        .n_folds(3)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert_eq!(result.n_candidates(), 1);
    assert!(result.best_params().is_empty());
    assert_eq!(result.predict(&[vec![0.0]]).unwrap(), vec![1]);
}

#[test]
fn test_folds_partition_dataset() {
    let data = line(23, 10);
    let result = Search::builder(Threshold)
        .grid(threshold_grid(&[9.5]))
        .cv(KFold::new(4).shuffle(true))
        .seed(3)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    let mut validation: Vec<usize> = result
        .folds()
        .iter()
        .flat_map(|f| f.validation.iter().copied())
        .collect();
    validation.sort_unstable();
    assert_eq!(validation, (0..23).collect::<Vec<_>>());

    for fold in result.folds() {
        assert_eq!(fold.train.len() + fold.validation.len(), 23);
        assert!(fold.train.iter().all(|i| !fold.validation.contains(i)));
    }
}

#[test]
fn test_same_seed_same_result() {
    let data = line(40, 17);
    let search = Search::builder(Threshold)
        .grid(threshold_grid(&[10.5, 16.5, 20.5]))
        .cv(KFold::new(5).shuffle(true))
        .seed(11)
        .build()
        .unwrap();

    let a = search.fit(&data).unwrap();
    let b = search.fit(&data).unwrap();
    assert_eq!(a.folds(), b.folds());
    for (x, y) in a.candidates().iter().zip(b.candidates()) {
        assert_eq!(x.fold_scores, y.fold_scores);
    }
}

#[test]
fn test_fold_count_larger_than_dataset() {
    let data = line(6, 3);
    let err = Search::builder(Threshold)
        .grid(threshold_grid(&[2.5]))
        .n_folds(7)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::InvalidFoldCount {
            n_splits: 7,
            n_samples: 6
        }
    ));
}

#[test]
fn test_refit_model_predicts() {
    let data = line(20, 10);
    let result = Search::builder(Threshold)
        .grid(threshold_grid(&[4.5, 9.5]))
        .n_folds(4)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert!(result.refit_time().is_some());
    assert_eq!(
        result.predict(&[vec![2.0], vec![9.0], vec![10.0]]).unwrap(),
        vec![0, 0, 1]
    );
    let score = result
        .score(&data.view(), &hypertune::Accuracy)
        .unwrap();
    assert!((score - 1.0).abs() < 1e-12);
}

#[test]
fn test_refit_disabled() {
    let data = line(20, 10);
    let result = Search::builder(Threshold)
        .grid(threshold_grid(&[9.5]))
        .n_folds(4)
        .refit(false)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert!(result.best_model().is_none());
    assert!(result.refit_time().is_none());
    assert!(matches!(
        result.predict(&[vec![1.0]]),
        Err(Error::NotRefitted)
    ));
}

#[test]
fn test_train_scores_recorded_on_request() {
    let data = line(20, 10);
    let search = |train: bool| {
        Search::builder(Threshold)
            .grid(threshold_grid(&[4.5, 9.5]))
            .n_folds(4)
            .return_train_score(train)
            .build()
            .unwrap()
            .fit(&data)
            .unwrap()
    };

    let with = search(true);
    assert!(
        with.candidates()
            .iter()
            .all(|c| c.mean_train_score.is_some() && c.std_train_score.is_some())
    );
    assert!((with.candidates()[1].mean_train_score.unwrap() - 1.0).abs() < 1e-12);

    let without = search(false);
    assert!(without.candidates().iter().all(|c| c.mean_train_score.is_none()));
}

#[test]
fn test_fit_view_uses_only_view() {
    let data = line(40, 20);
    let view = data.select(&(10..30).collect::<Vec<_>>());
    let result = Search::builder(Threshold)
        .grid(threshold_grid(&[19.5]))
        .n_folds(4)
        .build()
        .unwrap()
        .fit_view(&view)
        .unwrap();

    for fold in result.folds() {
        assert!(fold.train.iter().chain(&fold.validation).all(|&i| (10..30).contains(&i)));
    }
}
