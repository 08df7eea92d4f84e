//! Grid and randomized search over a k-nearest-neighbours classifier.
//!
//! Run with `cargo run --example grid_search`.

use hypertune::prelude::*;

/// k-nearest neighbours with majority (or distance-weighted) voting.
struct Knn;

struct KnnModel {
    records: Vec<Vec<f64>>,
    targets: Vec<usize>,
    k: usize,
    weighted: bool,
}

impl Predictor for KnnModel {
    fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
        records
            .iter()
            .map(|query| {
                let mut by_distance: Vec<(f64, usize)> = self
                    .records
                    .iter()
                    .zip(&self.targets)
                    .map(|(r, &y)| {
                        let d = r.iter().zip(query).map(|(a, b)| (a - b).powi(2)).sum::<f64>();
                        (d.sqrt(), y)
                    })
                    .collect();
                by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut votes = [0.0_f64; 2];
                for &(d, y) in by_distance.iter().take(self.k) {
                    votes[y] += if self.weighted { 1.0 / (d + 1e-9) } else { 1.0 };
                }
                usize::from(votes[1] > votes[0])
            })
            .collect()
    }
}

impl Estimator for Knn {
    type Model = KnnModel;
    type Error = String;

    fn param_names(&self) -> &[&'static str] {
        &["k", "weights"]
    }

    fn fit(&self, params: &Params, data: &DatasetView<'_>) -> Result<KnnModel, String> {
        let k = params.get_i64("k").unwrap_or(5);
        let k = usize::try_from(k).map_err(|_| format!("k must be positive, got {k}"))?;
        if k == 0 || k > data.len() {
            return Err(format!("k = {k} does not fit {} training samples", data.len()));
        }
        let weighted = match params.get_str("weights").unwrap_or("uniform") {
            "uniform" => false,
            "distance" => true,
            other => return Err(format!("unknown weighting {other}")),
        };
        Ok(KnnModel {
            records: data.to_records(),
            targets: data.to_targets(),
            k,
            weighted,
        })
    }
}

/// Two noisy interleaved half-moons.
fn moons(n: usize, seed: u64) -> Dataset {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut records = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);
    for i in 0..n {
        let label = i % 2;
        let t = rng.f64() * core::f64::consts::PI;
        let (x, y) = if label == 0 {
            (t.cos(), t.sin())
        } else {
            (1.0 - t.cos(), 0.5 - t.sin())
        };
        records.push(vec![x + rng.f64() * 0.4 - 0.2, y + rng.f64() * 0.4 - 0.2]);
        targets.push(label);
    }
    Dataset::new(records, targets).expect("generated rows are consistent")
}

fn main() -> hypertune::Result<()> {
    let data = moons(300, 7);

    let grid = ParameterGrid::builder()
        .add("k", [1_i64, 3, 5, 9, 15, 31])
        .add("weights", ["uniform", "distance"])
        .build()?;

    let result = Search::builder(Knn)
        .grid(grid)
        .cv(StratifiedKFold::new(5).shuffle(true))
        .seed(42)
        .n_jobs(0)
        .return_train_score(true)
        .build()?
        .fit(&data)?;

    println!("{result}\n");
    for c in result.candidates() {
        println!(
            "  #{:<2} rank {:>2}  {:.3} +/- {:.3}  train {:.3}  {}",
            c.index,
            c.rank.unwrap_or(0),
            c.mean_score.unwrap_or(f64::NAN),
            c.std_score.unwrap_or(f64::NAN),
            c.mean_train_score.unwrap_or(f64::NAN),
            c.params
        );
    }

    let space = ParamDistributions::builder()
        .add("k", Distribution::int_log_uniform(1, 64))
        .add("weights", Distribution::choice(["uniform", "distance"]))
        .build()?;

    let randomized = Search::builder(Knn)
        .randomized(space, 12)
        .n_folds(5)
        .metric(BalancedAccuracy)
        .seed(42)
        .build()?
        .fit(&data)?;

    println!("\nRandomized search:\n{randomized}");

    let holdout = moons(100, 8);
    let score = randomized.score(&holdout.view(), &Accuracy)?;
    println!("\nHold-out accuracy of the refitted model: {score:.3}");

    Ok(())
}
