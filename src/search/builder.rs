use core::time::Duration;
use std::sync::Arc;

use crate::distribution::ParamDistributions;
use crate::error::{Error, Result};
use crate::estimator::{Accuracy, Estimator, Metric};
use crate::grid::ParameterGrid;
use crate::param::check_names;
use crate::split::{KFold, Splitter};

use super::{Search, SearchConfig, SearchStrategy};

/// A builder for constructing [`Search`] instances with a fluent API.
///
/// Created via [`Search::builder()`].
///
/// # Defaults
///
/// - Strategy: an empty grid (one candidate with no parameters)
/// - Splitter: [`KFold::new(5)`](KFold) without shuffling
/// - Metric: [`Accuracy`]
/// - Workers: 1
/// - Refit: enabled
///
/// # Examples
///
/// ```
/// use core::time::Duration;
///
/// use hypertune::prelude::*;
///
/// struct Noop;
/// struct Always(usize);
///
/// impl Predictor for Always {
///     fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
///         vec![self.0; records.len()]
///     }
/// }
///
/// impl Estimator for Noop {
///     type Model = Always;
///     type Error = String;
///
///     fn param_names(&self) -> &[&'static str] {
///         &["label"]
///     }
///
///     fn fit(&self, params: &Params, _: &DatasetView<'_>) -> Result<Always, String> {
///         Ok(Always(params.get_i64("label").unwrap_or(0) as usize))
///     }
/// }
///
/// let search = Search::builder(Noop)
///     .grid(ParameterGrid::builder().add("label", [0_i64, 1]).build().unwrap())
///     .cv(StratifiedKFold::new(3))
///     .metric(BalancedAccuracy)
///     .n_jobs(2)
///     .timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
///
/// assert_eq!(search.n_candidates(), 2);
/// assert_eq!(search.config().n_jobs, 2);
/// ```
pub struct SearchBuilder<E> {
    estimator: E,
    strategy: SearchStrategy,
    splitter: Arc<dyn Splitter>,
    metric: Arc<dyn Metric>,
    config: SearchConfig,
}

impl<E: Estimator> SearchBuilder<E> {
    pub(super) fn new(estimator: E) -> Self {
        Self {
            estimator,
            strategy: SearchStrategy::Grid(ParameterGrid::default()),
            splitter: Arc::new(KFold::new(5)),
            metric: Arc::new(Accuracy),
            config: SearchConfig::default(),
        }
    }

    /// Search every combination of `grid`.
    #[must_use]
    pub fn grid(mut self, grid: ParameterGrid) -> Self {
        self.strategy = SearchStrategy::Grid(grid);
        self
    }

    /// Search `n_iter` combinations sampled from `space`.
    #[must_use]
    pub fn randomized(mut self, space: ParamDistributions, n_iter: usize) -> Self {
        self.strategy = SearchStrategy::Randomized { space, n_iter };
        self
    }

    /// Set the cross-validation splitter.
    #[must_use]
    pub fn cv(mut self, splitter: impl Splitter + 'static) -> Self {
        self.splitter = Arc::new(splitter);
        self
    }

    /// Shorthand for `cv(KFold::new(n_splits))`.
    #[must_use]
    pub fn n_folds(self, n_splits: usize) -> Self {
        self.cv(KFold::new(n_splits))
    }

    /// Set the metric candidates are ranked by. Higher is better.
    #[must_use]
    pub fn metric(mut self, metric: impl Metric + 'static) -> Self {
        self.metric = Arc::new(metric);
        self
    }

    /// Seed candidate sampling and fold shuffling.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the number of worker threads; `0` uses every available core.
    #[must_use]
    pub fn n_jobs(mut self, n_jobs: usize) -> Self {
        self.config.n_jobs = n_jobs;
        self
    }

    /// Stop starting new fits once `timeout` has elapsed.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Whether to refit the best combination on the full data.
    #[must_use]
    pub fn refit(mut self, refit: bool) -> Self {
        self.config.refit = refit;
        self
    }

    /// Whether to also record scores on each fold's training data.
    #[must_use]
    pub fn return_train_score(mut self, enabled: bool) -> Self {
        self.config.return_train_score = enabled;
        self
    }

    /// Replace the whole run-time configuration.
    #[must_use]
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and build the [`Search`].
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownParameter`] if the strategy names a parameter the
    ///   estimator does not declare.
    /// - [`Error::InvalidIterations`] for a randomized search with
    ///   `n_iter == 0`.
    /// - [`Error::InvalidFoldCount`] if the splitter asks for fewer than two
    ///   folds.
    pub fn build(self) -> Result<Search<E>> {
        check_names(self.strategy.names(), self.estimator.param_names())?;
        if let SearchStrategy::Randomized { n_iter: 0, .. } = self.strategy {
            return Err(Error::InvalidIterations);
        }
        let n_splits = self.splitter.n_splits();
        if n_splits < 2 {
            return Err(Error::InvalidFoldCount {
                n_splits,
                n_samples: 0,
            });
        }

        Ok(Search {
            estimator: Arc::new(self.estimator),
            strategy: self.strategy,
            splitter: self.splitter,
            metric: self.metric,
            config: self.config,
        })
    }
}
