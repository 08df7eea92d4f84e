//! Nested cross-validation of a typed configuration.
//!
//! Run with `cargo run --example nested_cv --features derive`.

use hypertune::prelude::*;

/// Configuration of a ridge-regularised nearest-centroid classifier.
#[derive(Debug, Default, FromParams)]
struct CentroidConfig {
    /// Pulls each centroid towards the global mean; `0` disables.
    shrink: f64,
    /// Standardise features with training statistics before fitting.
    standardize: bool,
}

struct ShrunkenCentroid;

struct ShrunkenCentroidModel {
    centroids: Vec<(usize, Vec<f64>)>,
    scale: Option<(Vec<f64>, Vec<f64>)>,
}

impl ShrunkenCentroidModel {
    fn transform(&self, row: &[f64]) -> Vec<f64> {
        match &self.scale {
            Some((mean, std)) => row
                .iter()
                .zip(mean.iter().zip(std))
                .map(|(x, (m, s))| (x - m) / s)
                .collect(),
            None => row.to_vec(),
        }
    }
}

impl Predictor for ShrunkenCentroidModel {
    fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
        records
            .iter()
            .map(|r| {
                let x = self.transform(r);
                let dist = |c: &[f64]| x.iter().zip(c).map(|(a, b)| (a - b).powi(2)).sum::<f64>();
                self.centroids
                    .iter()
                    .min_by(|a, b| dist(&a.1).total_cmp(&dist(&b.1)))
                    .map_or(0, |c| c.0)
            })
            .collect()
    }
}

fn column_stats(rows: &[Vec<f64>]) -> (Vec<f64>, Vec<f64>) {
    let n = rows.len() as f64;
    let width = rows.first().map_or(0, Vec::len);
    let mean: Vec<f64> = (0..width).map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n).collect();
    let std = (0..width)
        .map(|j| {
            let var = rows.iter().map(|r| (r[j] - mean[j]).powi(2)).sum::<f64>() / n;
            var.sqrt().max(1e-12)
        })
        .collect();
    (mean, std)
}

impl Estimator for ShrunkenCentroid {
    type Model = ShrunkenCentroidModel;
    type Error = hypertune::Error;

    fn param_names(&self) -> &[&'static str] {
        CentroidConfig::PARAM_NAMES
    }

    fn fit(
        &self,
        params: &Params,
        data: &DatasetView<'_>,
    ) -> Result<ShrunkenCentroidModel, hypertune::Error> {
        let cfg = CentroidConfig::from_params(params)?;
        let rows = data.to_records();
        let scale = cfg.standardize.then(|| column_stats(&rows));
        let mut model = ShrunkenCentroidModel {
            centroids: Vec::new(),
            scale,
        };
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| model.transform(r)).collect();
        let (global, _) = column_stats(&rows);

        for class in data.dataset().classes() {
            let members: Vec<Vec<f64>> = rows
                .iter()
                .zip(data.targets())
                .filter(|(_, y)| *y == class)
                .map(|(r, _)| r.clone())
                .collect();
            if members.is_empty() {
                continue;
            }
            let (mean, _) = column_stats(&members);
            let centroid = mean
                .iter()
                .zip(&global)
                .map(|(m, g)| g + (m - g) * (1.0 - cfg.shrink))
                .collect();
            model.centroids.push((class, centroid));
        }
        Ok(model)
    }
}

/// Three classes with one informative and two noisy, badly scaled features.
fn synthetic(n: usize, seed: u64) -> Dataset {
    let mut rng = fastrand::Rng::with_seed(seed);
    let targets: Vec<usize> = (0..n).map(|i| i % 3).collect();
    let records = targets
        .iter()
        .map(|&y| {
            vec![
                y as f64 + rng.f64() - 0.5,
                rng.f64() * 100.0,
                (y as f64) * 40.0 + rng.f64() * 120.0,
            ]
        })
        .collect();
    Dataset::new(records, targets).expect("generated rows are consistent")
}

fn main() -> hypertune::Result<()> {
    let data = synthetic(240, 3);

    let grid = ParameterGrid::builder()
        .add("shrink", [0.0, 0.25, 0.5, 0.75])
        .add("standardize", [false, true])
        .build()?;

    let search = Search::builder(ShrunkenCentroid)
        .grid(grid)
        .cv(StratifiedKFold::new(4).shuffle(true))
        .metric(MacroF1)
        .build()?;

    let report = NestedCv::new(search, StratifiedKFold::new(5).shuffle(true))
        .seed(2024)
        .n_jobs(0)
        .evaluate(&data)?;

    print!("{report}");

    let baseline = cross_validate(
        &ShrunkenCentroid,
        &Params::new(),
        &data.view(),
        &StratifiedKFold::new(5),
        &MacroF1,
        &mut fastrand::Rng::with_seed(0),
    )?;
    println!(
        "Untuned baseline: {:.4} (+/- {:.4})",
        baseline.mean(),
        baseline.std()
    );

    Ok(())
}
