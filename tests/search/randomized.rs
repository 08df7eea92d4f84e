use std::collections::HashSet;

use hypertune::{
    DatasetView, Distribution, Error, Estimator, ParamDistributions, Params, Search,
};

use crate::estimators::{Constant, NearestCentroid, blobs, line};

fn mixed_space() -> ParamDistributions {
    ParamDistributions::builder()
        .add("shrink", Distribution::uniform(0.0, 0.8))
        .add("metric", Distribution::choice(["euclidean", "manhattan"]))
        .build()
        .unwrap()
}

#[test]
fn test_randomized_search_draws_n_iter_candidates() {
    let data = blobs(40, 2, 3.0, 2);
    let result = Search::builder(NearestCentroid)
        .randomized(mixed_space(), 7)
        .n_folds(4)
        .seed(1)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    assert_eq!(result.n_candidates(), 7);
    for c in result.candidates() {
        let shrink = c.params.get_f64("shrink").unwrap();
        assert!((0.0..=0.8).contains(&shrink));
        assert!(matches!(c.params.get_str("metric"), Some("euclidean" | "manhattan")));
    }
}

#[test]
fn test_randomized_search_reproducible_by_seed() {
    let data = blobs(40, 2, 3.0, 2);
    let params = |seed: u64| -> Vec<String> {
        Search::builder(NearestCentroid)
            .randomized(mixed_space(), 5)
            .n_folds(4)
            .seed(seed)
            .build()
            .unwrap()
            .fit(&data)
            .unwrap()
            .candidates()
            .iter()
            .map(|c| c.params.to_string())
            .collect()
    };

    assert_eq!(params(8), params(8));
    assert_ne!(params(8), params(9));
}

#[test]
fn test_discrete_space_samples_without_replacement() {
    let data = blobs(40, 2, 3.0, 2);
    let space = ParamDistributions::builder()
        .add("shrink", Distribution::choice([0.0, 0.5]))
        .add("metric", Distribution::choice(["euclidean", "manhattan"]))
        .build()
        .unwrap();
    let search = Search::builder(NearestCentroid)
        .randomized(space, 10)
        .n_folds(4)
        .seed(4)
        .build()
        .unwrap();
    assert_eq!(search.n_candidates(), 4);

    let result = search.fit(&data).unwrap();
    let distinct: HashSet<String> = result
        .candidates()
        .iter()
        .map(|c| c.params.to_string())
        .collect();
    assert_eq!(distinct.len(), 4);
}

#[test]
fn test_zero_iterations_rejected() {
    let err = Search::builder(NearestCentroid)
        .randomized(mixed_space(), 0)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidIterations));
}

#[test]
fn test_invalid_distribution_rejected() {
    let err = ParamDistributions::builder()
        .add("shrink", Distribution::log_uniform(0.0, 1.0))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidLogBounds));

    let err = ParamDistributions::builder()
        .add("shrink", Distribution::uniform(1.0, 0.0))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidBounds { .. }));
}

const WIDE_NAMES: [&str; 14] = [
    "p0", "p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9", "p10", "p11", "p12", "p13",
];

/// Accepts fourteen integer parameters and predicts the class in `p0 % 2`.
struct Wide;

impl Estimator for Wide {
    type Model = Constant;
    type Error = String;

    fn param_names(&self) -> &[&'static str] {
        &WIDE_NAMES
    }

    fn fit(&self, params: &Params, _: &DatasetView<'_>) -> Result<Constant, String> {
        let p0 = params.get_i64("p0").ok_or("p0 is required")?;
        usize::try_from(p0 % 2).map(Constant).map_err(|e| e.to_string())
    }
}

#[test]
fn test_discrete_space_beyond_usize_draws_n_iter() {
    // 30^14 combinations: more than a usize can count
    let mut builder = ParamDistributions::builder();
    for name in WIDE_NAMES {
        builder = builder.add(name, Distribution::choice(0..30_i64));
    }
    let search = Search::builder(Wide)
        .randomized(builder.build().unwrap(), 5)
        .n_folds(3)
        .seed(6)
        .build()
        .unwrap();
    assert_eq!(search.n_candidates(), 5);

    let result = search.fit(&line(12, 6)).unwrap();
    assert_eq!(result.n_candidates(), 5);
    let distinct: HashSet<String> = result
        .candidates()
        .iter()
        .map(|c| c.params.to_string())
        .collect();
    assert_eq!(distinct.len(), 5);
}
