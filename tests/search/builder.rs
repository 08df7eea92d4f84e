use core::time::Duration;

use hypertune::{
    Accuracy, BalancedAccuracy, Error, KFold, Metric, ParameterGrid, Search, SearchConfig,
    SearchStrategy, ShuffleSplit, ValidationSize,
};

use crate::estimators::{Threshold, line};

#[test]
fn test_builder_defaults() {
    let search = Search::builder(Threshold).build().unwrap();
    assert_eq!(search.config(), &SearchConfig::default());
    assert_eq!(search.config().n_jobs, 1);
    assert!(search.config().refit);
    assert!(!search.config().return_train_score);
    assert_eq!(search.metric().name(), Accuracy.name());
    assert_eq!(search.n_candidates(), 1);
    assert!(matches!(search.strategy(), SearchStrategy::Grid(g) if g.len() == 1));
}

#[test]
fn test_builder_chaining() {
    let grid = ParameterGrid::builder()
        .add("threshold", [1.0, 2.0, 3.0])
        .build()
        .unwrap();
    let search = Search::builder(Threshold)
        .grid(grid)
        .cv(ShuffleSplit::new(4, ValidationSize::Fraction(0.25)))
        .metric(BalancedAccuracy)
        .seed(5)
        .n_jobs(3)
        .timeout(Duration::from_secs(1))
        .refit(false)
        .return_train_score(true)
        .build()
        .unwrap();

    assert_eq!(search.n_candidates(), 3);
    assert_eq!(search.metric().name(), "balanced_accuracy");
    let config = search.config();
    assert_eq!(config.seed, Some(5));
    assert_eq!(config.n_jobs, 3);
    assert_eq!(config.timeout, Some(Duration::from_secs(1)));
    assert!(!config.refit);
    assert!(config.return_train_score);
}

#[test]
fn test_builder_config_snapshot() {
    let config = SearchConfig {
        n_jobs: 2,
        seed: Some(1),
        ..SearchConfig::default()
    };
    let search = Search::builder(Threshold)
        .config(config.clone())
        .build()
        .unwrap();
    assert_eq!(search.config(), &config);
}

#[test]
fn test_single_fold_rejected_at_build() {
    let err = Search::builder(Threshold)
        .cv(KFold::new(1))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFoldCount { n_splits: 1, .. }));
}

#[test]
fn test_shuffle_split_search() {
    let data = line(40, 20);
    let grid = ParameterGrid::builder()
        .add("threshold", [9.5, 19.5])
        .build()
        .unwrap();
    let result = Search::builder(Threshold)
        .grid(grid)
        .cv(ShuffleSplit::new(6, ValidationSize::Count(8)))
        .seed(2)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert_eq!(result.n_splits(), 6);
    assert!(result.folds().iter().all(|f| f.validation.len() == 8));
    assert_eq!(result.best_index(), 1);
}
