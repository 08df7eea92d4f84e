//! Nested cross-validation.
//!
//! An outer splitter partitions the data; for each outer fold the wrapped
//! [`Search`] runs on the outer-training samples only, and its refitted best
//! model is scored on the held-out outer-validation samples. The outer
//! scores estimate how well the *whole tuning procedure* generalises.

use core::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::dataset::{Dataset, DatasetView};
use crate::error::{Error, Result};
use crate::estimator::Estimator;
use crate::param::{Params, check_names};
use crate::rng_util::derive_seed;
use crate::search::{Plan, Search, mean_std, run_indexed};
use crate::split::{Fold, Splitter};

/// The evaluation of one outer fold.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OuterFoldResult {
    /// Position of the fold in the outer split.
    pub index: usize,
    /// The outer fold, as dataset indices.
    pub fold: Fold,
    /// The folds of the inner search, as dataset indices.
    ///
    /// Every index here belongs to `fold.train`.
    pub inner_folds: Vec<Fold>,
    /// The combination selected by the inner search.
    pub best_params: Params,
    /// Mean inner validation score of that combination.
    pub inner_best_score: f64,
    /// Score of the refitted model on the outer-validation samples.
    pub outer_score: f64,
}

/// The outcome of a nested cross-validation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NestedReport {
    folds: Vec<OuterFoldResult>,
    metric_name: String,
}

impl NestedReport {
    /// Per-outer-fold results, in fold order.
    #[must_use]
    pub fn folds(&self) -> &[OuterFoldResult] {
        &self.folds
    }

    /// Outer scores in fold order.
    #[must_use]
    pub fn scores(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.outer_score).collect()
    }

    /// Mean outer score.
    #[must_use]
    pub fn mean(&self) -> f64 {
        mean_std(&self.scores()).0
    }

    /// Population standard deviation of the outer scores.
    #[must_use]
    pub fn std(&self) -> f64 {
        mean_std(&self.scores()).1
    }

    /// Name of the metric behind the scores.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }
}

impl fmt::Display for NestedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Nested CV: {} outer folds | {}: {:.4} (+/- {:.4})",
            self.folds.len(),
            self.metric_name,
            self.mean(),
            self.std()
        )?;
        for fold in &self.folds {
            writeln!(
                f,
                "  fold {}: outer {:.4}, inner {:.4}, params {}",
                fold.index, fold.outer_score, fold.inner_best_score, fold.best_params
            )?;
        }
        Ok(())
    }
}

/// Wraps a [`Search`] in an outer cross-validation loop.
///
/// The inner search always refits, whatever its own configuration says, since
/// the refitted model is what the outer fold scores.
///
/// # Examples
///
/// ```
/// use hypertune::prelude::*;
///
/// struct Threshold;
/// struct Cut(f64);
///
/// impl Predictor for Cut {
///     fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
///         records.iter().map(|r| usize::from(r[0] > self.0)).collect()
///     }
/// }
///
/// impl Estimator for Threshold {
///     type Model = Cut;
///     type Error = String;
///
///     fn param_names(&self) -> &[&'static str] {
///         &["t"]
///     }
///
///     fn fit(&self, params: &Params, _: &DatasetView<'_>) -> Result<Cut, String> {
///         params.get_f64("t").map(Cut).ok_or_else(|| "missing t".to_owned())
///     }
/// }
///
/// let data = Dataset::new(
///     (0..30).map(|i| vec![f64::from(i)]).collect(),
///     (0..30).map(|i| usize::from(i >= 15)).collect(),
/// )
/// .unwrap();
///
/// let search = Search::builder(Threshold)
///     .grid(ParameterGrid::builder().add("t", [5.0, 14.5, 25.0]).build().unwrap())
///     .cv(StratifiedKFold::new(3))
///     .build()
///     .unwrap();
///
/// let report = NestedCv::new(search, StratifiedKFold::new(3).shuffle(true))
///     .seed(7)
///     .evaluate(&data)
///     .unwrap();
///
/// assert_eq!(report.folds().len(), 3);
/// assert!((report.mean() - 1.0).abs() < 1e-12);
/// ```
pub struct NestedCv<E> {
    search: Search<E>,
    outer: Arc<dyn Splitter>,
    n_jobs: usize,
    seed: Option<u64>,
}

impl<E> fmt::Debug for NestedCv<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedCv")
            .field("search", &self.search)
            .field("outer_splits", &self.outer.n_splits())
            .field("n_jobs", &self.n_jobs)
            .field("seed", &self.seed)
            .finish()
    }
}

impl<E: Estimator> NestedCv<E> {
    /// Wraps `search` in the outer splitter `outer`.
    ///
    /// Outer folds run one at a time unless [`n_jobs`](Self::n_jobs) is set.
    #[must_use]
    pub fn new(search: Search<E>, outer: impl Splitter + 'static) -> Self {
        Self {
            seed: search.config().seed,
            search,
            outer: Arc::new(outer),
            n_jobs: 1,
        }
    }

    /// Number of outer folds evaluated concurrently; `0` uses every core.
    #[must_use]
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    /// Seed for the outer split and, through derived seeds, every inner search.
    ///
    /// Defaults to the inner search's seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The wrapped search.
    #[must_use]
    pub fn search(&self) -> &Search<E> {
        &self.search
    }

    /// Runs the nested evaluation.
    ///
    /// # Errors
    ///
    /// - Configuration errors of the outer splitter or the inner search
    ///   ([`Error::UnknownParameter`], [`Error::InvalidFoldCount`], ...),
    ///   raised before any fitting.
    /// - The first inner-search failure in outer-fold order, such as
    ///   [`Error::EstimatorFit`] when every candidate failed on an outer fold.
    pub fn evaluate(&self, dataset: &Dataset) -> Result<NestedReport> {
        check_names(self.search.strategy().names(), self.search.estimator().param_names())?;

        let mut rng = self
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let outer_folds = self.outer.split(dataset.targets(), &mut rng)?;
        let base_seed = rng.u64(..);

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "nested_cv",
            outer_splits = outer_folds.len(),
            n_jobs = self.n_jobs
        )
        .entered();

        // Every inner search is planned up front, so configuration errors
        // surface before any outer fold starts fitting.
        let view = dataset.view();
        let plans = outer_folds
            .iter()
            .enumerate()
            .map(|(i, fold)| {
                let seed = derive_seed(base_seed, i as u64);
                self.search.plan(&view.subset(&fold.train), Some(seed))
            })
            .collect::<Result<Vec<_>>>()?;

        let (results, _) = run_indexed(outer_folds.len(), self.n_jobs, None, |i| {
            self.evaluate_fold(i, &outer_folds[i], &plans[i], &view)
        })?;

        let folds = results
            .into_iter()
            .map(|r| r.unwrap_or(Err(Error::Internal("outer fold left unevaluated"))))
            .collect::<Result<Vec<_>>>()?;

        let report = NestedReport {
            folds,
            metric_name: self.search.metric().name().to_owned(),
        };
        trace_info!(mean = report.mean(), std = report.std(), "nested evaluation finished");
        Ok(report)
    }

    fn evaluate_fold(
        &self,
        index: usize,
        fold: &Fold,
        plan: &Plan,
        data: &DatasetView<'_>,
    ) -> Result<OuterFoldResult> {
        let train = data.subset(&fold.train);
        let validation = data.subset(&fold.validation);
        // The outer score needs the refitted model whatever the search says.
        let inner = self.search.run_plan(plan, &train, true, Instant::now())?;
        let outer_score = inner.score(&validation, self.search.metric())?;

        trace_debug!(
            index,
            outer_score,
            inner_score = inner.best_score(),
            "outer fold evaluated"
        );

        Ok(OuterFoldResult {
            index,
            fold: fold.map_indices(data.indices()),
            inner_folds: inner.folds().to_vec(),
            best_params: inner.best_params().clone(),
            inner_best_score: inner.best_score(),
            outer_score,
        })
    }
}
