use core::time::Duration;

use hypertune::{Error, ParameterGrid, Search};

use crate::estimators::{Majority, line};

#[test]
fn test_timeout_returns_completed_candidates() {
    let data = line(12, 6);
    let grid = ParameterGrid::builder()
        .add("sleep_ms", [20_i64, 21, 22, 23, 24, 25])
        .build()
        .unwrap();
    let err = Search::builder(Majority)
        .grid(grid)
        .n_folds(3)
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap()
        .fit(&data)
        .unwrap_err();

    let Error::SearchTimeout { completed, elapsed } = &err else {
        panic!("expected a timeout, got {err}");
    };
    assert!(!completed.is_empty());
    assert!(completed.len() < 6);
    assert!(completed.iter().all(|c| c.is_complete()));
    assert!(*elapsed >= Duration::from_millis(100));
    assert_eq!(err.completed_candidates().map(<[_]>::len), Some(completed.len()));

    // completed candidates are a prefix of the enumeration
    for (i, c) in completed.iter().enumerate() {
        assert_eq!(c.index, i);
    }
}

#[test]
fn test_generous_timeout_completes() {
    let data = line(12, 6);
    let grid = ParameterGrid::builder()
        .add("sleep_ms", [0_i64, 1])
        .build()
        .unwrap();
    let result = Search::builder(Majority)
        .grid(grid)
        .n_folds(3)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();
    assert_eq!(result.n_candidates(), 2);
}
