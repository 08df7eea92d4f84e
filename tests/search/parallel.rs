use hypertune::{ParameterGrid, Search, SearchResult, StratifiedKFold};

use crate::estimators::{CentroidModel, NearestCentroid, blobs};

fn run(n_jobs: usize) -> SearchResult<CentroidModel> {
    let data = blobs(90, 3, 1.0, 5);
    let grid = ParameterGrid::builder()
        .add("shrink", [0.0, 0.3, 0.6, 0.9, 1.2])
        .add("metric", ["euclidean", "manhattan"])
        .build()
        .unwrap();
    Search::builder(NearestCentroid)
        .grid(grid)
        .cv(StratifiedKFold::new(5).shuffle(true))
        .seed(99)
        .n_jobs(n_jobs)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap()
}

#[test]
fn test_worker_count_does_not_change_results() {
    let sequential = run(1);
    for n_jobs in [2, 4, 0] {
        let parallel = run(n_jobs);
        assert_eq!(parallel.best_index(), sequential.best_index());
        assert_eq!(parallel.folds(), sequential.folds());
        for (p, s) in parallel.candidates().iter().zip(sequential.candidates()) {
            assert_eq!(p.params, s.params);
            assert_eq!(p.fold_scores, s.fold_scores);
            assert_eq!(p.mean_score, s.mean_score);
            assert_eq!(p.rank, s.rank);
            assert_eq!(p.state, s.state);
        }
    }
}

#[test]
fn test_failures_are_isolated_across_workers() {
    let result = run(4);
    // shrink 1.2 fails for both metrics
    assert_eq!(result.n_failed(), 2);
    assert_eq!(result.n_candidates(), 10);
    assert!(result.best().is_complete());
}
