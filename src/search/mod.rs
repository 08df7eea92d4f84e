//! Cross-validated hyper-parameter search.
//!
//! A [`Search`] evaluates every candidate combination (from a
//! [`ParameterGrid`] or sampled from [`ParamDistributions`]) on every fold of
//! a [`Splitter`], ranks the candidates by mean validation score and refits
//! the winner on the full data.

use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use crate::dataset::{Dataset, DatasetView};
use crate::distribution::ParamDistributions;
use crate::error::{Error, Result};
use crate::estimator::{Estimator, Metric, score_model};
use crate::grid::ParameterGrid;
use crate::param::{Params, check_names};
use crate::split::{Fold, Splitter};
use crate::types::CandidateState;

mod builder;
mod cv;
mod export;
mod pool;
mod result;

#[cfg(feature = "async")]
mod async_impl;

pub use builder::SearchBuilder;
pub use cv::{CvScores, cross_validate};
pub use result::{CandidateResult, SearchResult};

pub(crate) use pool::run_indexed;
pub(crate) use result::mean_std;

/// How candidate combinations are produced.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchStrategy {
    /// Every combination of a grid, in enumeration order.
    Grid(ParameterGrid),
    /// `n_iter` combinations sampled from distributions.
    Randomized {
        /// The distributions to sample from.
        space: ParamDistributions,
        /// Number of combinations to draw.
        n_iter: usize,
    },
}

impl SearchStrategy {
    pub(crate) fn names(&self) -> Vec<&str> {
        match self {
            SearchStrategy::Grid(grid) => grid.names().collect(),
            SearchStrategy::Randomized { space, .. } => space.names().collect(),
        }
    }

    fn candidates(&self, rng: &mut fastrand::Rng) -> Vec<Params> {
        match self {
            SearchStrategy::Grid(grid) => grid.iter().collect(),
            SearchStrategy::Randomized { space, n_iter } => space
                .sampler(*n_iter, fastrand::Rng::with_seed(rng.u64(..)))
                .collect(),
        }
    }
}

/// Run-time options of a [`Search`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Worker threads evaluating candidate × fold cells; `0` uses every core.
    pub n_jobs: usize,
    /// Seed for candidate sampling and fold shuffling.
    pub seed: Option<u64>,
    /// Wall-clock budget for the whole search.
    pub timeout: Option<Duration>,
    /// Whether to refit the best combination on the full data.
    pub refit: bool,
    /// Whether to also score each fold's model on its training data.
    pub return_train_score: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_jobs: 1,
            seed: None,
            timeout: None,
            refit: true,
            return_train_score: false,
        }
    }
}

/// A configured hyper-parameter search over an [`Estimator`].
///
/// Built with [`Search::builder`]; run with [`fit`](Self::fit). The search
/// itself is immutable, so one `Search` can be fitted on several datasets,
/// which is what [`NestedCv`](crate::nested::NestedCv) does.
///
/// # Examples
///
/// ```
/// use hypertune::prelude::*;
///
/// /// Predicts 1 when the first feature exceeds `threshold`.
/// struct Threshold;
/// struct ThresholdModel(f64);
///
/// impl Predictor for ThresholdModel {
///     fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
///         records.iter().map(|r| usize::from(r[0] > self.0)).collect()
///     }
/// }
///
/// impl Estimator for Threshold {
///     type Model = ThresholdModel;
///     type Error = String;
///
///     fn param_names(&self) -> &[&'static str] {
///         &["threshold"]
///     }
///
///     fn fit(&self, params: &Params, _data: &DatasetView<'_>) -> Result<ThresholdModel, String> {
///         params
///             .get_f64("threshold")
///             .map(ThresholdModel)
///             .ok_or_else(|| "threshold missing".into())
///     }
/// }
///
/// let data = Dataset::new(
///     (0..20).map(|i| vec![f64::from(i)]).collect(),
///     (0..20).map(|i| usize::from(i >= 10)).collect(),
/// )
/// .unwrap();
///
/// let grid = ParameterGrid::builder()
///     .add("threshold", [2.5, 9.5, 15.5])
///     .build()
///     .unwrap();
///
/// let search = Search::builder(Threshold)
///     .grid(grid)
///     .cv(KFold::new(4).shuffle(true))
///     .seed(0)
///     .build()
///     .unwrap();
///
/// let result = search.fit(&data).unwrap();
/// assert_eq!(result.best_params().get_f64("threshold"), Some(9.5));
/// assert_eq!(result.predict(&[vec![3.0], vec![12.0]]).unwrap(), vec![0, 1]);
/// ```
pub struct Search<E> {
    pub(crate) estimator: Arc<E>,
    pub(crate) strategy: SearchStrategy,
    pub(crate) splitter: Arc<dyn Splitter>,
    pub(crate) metric: Arc<dyn Metric>,
    pub(crate) config: SearchConfig,
}

impl<E> core::fmt::Debug for Search<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Search")
            .field("strategy", &self.strategy)
            .field("n_splits", &self.splitter.n_splits())
            .field("metric", &self.metric.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Candidates and folds, fixed before any fitting starts.
pub(crate) struct Plan {
    pub(crate) candidates: Vec<Params>,
    /// Folds as positions within the searched view.
    pub(crate) folds: Vec<Fold>,
}

/// The outcome of fitting and scoring one candidate on one fold.
pub(crate) struct CellOutcome {
    pub(crate) score: core::result::Result<f64, String>,
    pub(crate) train_score: Option<f64>,
    pub(crate) fit_time: Duration,
}

impl<E: Estimator> Search<E> {
    /// Returns a [`SearchBuilder`] for `estimator`.
    #[must_use]
    pub fn builder(estimator: E) -> SearchBuilder<E> {
        SearchBuilder::new(estimator)
    }

    /// The estimator being tuned.
    #[must_use]
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// The candidate strategy.
    #[must_use]
    pub fn strategy(&self) -> &SearchStrategy {
        &self.strategy
    }

    /// The run-time options.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The metric candidates are ranked by.
    #[must_use]
    pub fn metric(&self) -> &dyn Metric {
        self.metric.as_ref()
    }

    /// Number of candidates a fit will evaluate.
    ///
    /// For discrete randomized spaces this is capped at the grid size.
    #[must_use]
    pub fn n_candidates(&self) -> usize {
        match &self.strategy {
            SearchStrategy::Grid(grid) => grid.len(),
            SearchStrategy::Randomized { space, n_iter } => space.n_draws(*n_iter),
        }
    }

    /// Runs the search on the whole dataset.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownParameter`] or [`Error::InvalidFoldCount`] (and other
    ///   splitter configuration errors) before any fitting.
    /// - [`Error::SearchTimeout`] if the configured budget runs out; the error
    ///   carries the candidates completed so far.
    /// - [`Error::EstimatorFit`] if every candidate failed, or if the refit of
    ///   the best combination failed.
    pub fn fit(&self, dataset: &Dataset) -> Result<SearchResult<E::Model>> {
        self.fit_view(&dataset.view())
    }

    /// Runs the search on a subset of a dataset.
    ///
    /// Folds are drawn from the view only; the refitted model sees exactly
    /// the view's samples.
    ///
    /// # Errors
    ///
    /// Same as [`fit`](Self::fit).
    pub fn fit_view(&self, data: &DatasetView<'_>) -> Result<SearchResult<E::Model>> {
        let start = Instant::now();
        let plan = self.plan(data, self.config.seed)?;
        self.run_plan(&plan, data, self.config.refit, start)
    }

    /// Evaluates a plan drawn from `data` and finishes the search.
    pub(crate) fn run_plan(
        &self,
        plan: &Plan,
        data: &DatasetView<'_>,
        refit: bool,
        start: Instant,
    ) -> Result<SearchResult<E::Model>> {
        let deadline = self.config.timeout.map(|t| start + t);

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "search",
            n_candidates = plan.candidates.len(),
            n_splits = plan.folds.len(),
            n_jobs = self.config.n_jobs
        )
        .entered();

        let n_splits = plan.folds.len();
        let (cells, timed_out) = run_indexed(
            plan.candidates.len() * n_splits,
            self.config.n_jobs,
            deadline,
            |cell| {
                let (c, f) = (cell / n_splits, cell % n_splits);
                evaluate_cell(
                    self.estimator.as_ref(),
                    self.metric.as_ref(),
                    &plan.candidates[c],
                    &plan.folds[f],
                    data,
                    self.config.return_train_score,
                )
            },
        )?;

        let candidates = aggregate(plan, cells);
        self.finish(plan, candidates, timed_out, start, data, refit)
    }

    /// Validates the schema, draws candidates and splits the view.
    pub(crate) fn plan(&self, data: &DatasetView<'_>, seed: Option<u64>) -> Result<Plan> {
        check_names(self.strategy.names(), self.estimator.param_names())?;

        let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        let candidates = self.strategy.candidates(&mut rng);
        let targets = data.to_targets();
        let folds = self.splitter.split(&targets, &mut rng)?;

        trace_debug!(
            n_candidates = candidates.len(),
            n_splits = folds.len(),
            n_samples = targets.len(),
            "search planned"
        );
        Ok(Plan { candidates, folds })
    }

    /// Ranks candidates, handles timeout and failure, and refits the winner.
    pub(crate) fn finish(
        &self,
        plan: &Plan,
        mut candidates: Vec<Option<CandidateResult>>,
        timed_out: bool,
        start: Instant,
        data: &DatasetView<'_>,
        refit: bool,
    ) -> Result<SearchResult<E::Model>> {
        if timed_out {
            let completed: Vec<CandidateResult> = candidates.into_iter().flatten().collect();
            trace_info!(
                n_completed = completed.len(),
                "search timed out; returning completed candidates"
            );
            return Err(Error::SearchTimeout {
                completed,
                elapsed: start.elapsed(),
            });
        }

        let mut candidates: Vec<CandidateResult> = candidates
            .iter_mut()
            .map(|c| c.take().ok_or(Error::Internal("candidate left unevaluated")))
            .collect::<Result<_>>()?;

        let Some(best_index) = result::rank_candidates(&mut candidates) else {
            return Err(first_failure(&candidates).unwrap_or(Error::NoCompletedCandidates));
        };

        let best = &candidates[best_index];
        trace_info!(
            best_index,
            score = best.mean_score,
            params = %best.params,
            "best candidate selected"
        );

        let (best_model, refit_time) = if refit {
            let refit_start = Instant::now();
            let model = self
                .estimator
                .fit(&best.params, data)
                .map_err(|e| Error::EstimatorFit {
                    candidate: best_index,
                    fold: None,
                    message: e.to_string(),
                })?;
            (Some(model), Some(refit_start.elapsed()))
        } else {
            (None, None)
        };

        Ok(SearchResult {
            candidates,
            best_index,
            best_model,
            folds: plan
                .folds
                .iter()
                .map(|f| f.map_indices(data.indices()))
                .collect(),
            metric_name: self.metric.name().to_owned(),
            elapsed: start.elapsed(),
            refit_time,
        })
    }
}

/// Fits `params` on the fold's training positions and scores the
/// validation positions.
pub(crate) fn evaluate_cell<E: Estimator + ?Sized>(
    estimator: &E,
    metric: &dyn Metric,
    params: &Params,
    fold: &Fold,
    data: &DatasetView<'_>,
    return_train_score: bool,
) -> CellOutcome {
    let fit_start = Instant::now();
    let train = data.subset(&fold.train);
    let model = match estimator.fit(params, &train) {
        Ok(model) => model,
        Err(e) => {
            return CellOutcome {
                score: Err(e.to_string()),
                train_score: None,
                fit_time: fit_start.elapsed(),
            };
        }
    };
    let fit_time = fit_start.elapsed();

    let score = score_model(&model, &data.subset(&fold.validation), metric);
    let score = if score.is_finite() {
        Ok(score)
    } else {
        Err(format!("metric returned a non-finite score ({score})"))
    };
    let train_score = return_train_score.then(|| score_model(&model, &train, metric));

    CellOutcome {
        score,
        train_score,
        fit_time,
    }
}

/// Folds cell outcomes into per-candidate results.
///
/// A candidate with any cell that never ran is `None`.
pub(crate) fn aggregate(plan: &Plan, cells: Vec<Option<CellOutcome>>) -> Vec<Option<CandidateResult>> {
    let n_splits = plan.folds.len();
    let mut cells = cells.into_iter();
    plan.candidates
        .iter()
        .enumerate()
        .map(|(index, params)| {
            let outcomes: Vec<Option<CellOutcome>> = cells.by_ref().take(n_splits).collect();
            let outcomes: Vec<CellOutcome> = outcomes.into_iter().collect::<Option<_>>()?;
            Some(candidate_from_outcomes(index, params.clone(), outcomes))
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn candidate_from_outcomes(
    index: usize,
    params: Params,
    outcomes: Vec<CellOutcome>,
) -> CandidateResult {
    let n = outcomes.len().max(1) as u32;
    let mean_fit_time = outcomes.iter().map(|o| o.fit_time).sum::<Duration>() / n;
    let failure = outcomes
        .iter()
        .enumerate()
        .find_map(|(fold, o)| o.score.as_ref().err().map(|msg| (fold, msg.clone())));
    let fold_scores: Vec<Option<f64>> = outcomes.iter().map(|o| o.score.clone().ok()).collect();
    let train_scores: Option<Vec<f64>> = outcomes.iter().map(|o| o.train_score).collect();

    match failure {
        Some((fold, message)) => {
            trace_debug!(index, fold, error = %message, "candidate failed");
            CandidateResult {
                index,
                params,
                fold_scores,
                mean_score: None,
                std_score: None,
                mean_train_score: None,
                std_train_score: None,
                mean_fit_time,
                rank: None,
                state: CandidateState::Failed,
                failed_fold: Some(fold),
                error: Some(message),
            }
        }
        None => {
            let scores: Vec<f64> = fold_scores.iter().flatten().copied().collect();
            let (mean, std) = mean_std(&scores);
            let train = train_scores.filter(|t| !t.is_empty()).map(|t| mean_std(&t));
            trace_debug!(index, mean, std, params = %params, "candidate evaluated");
            CandidateResult {
                index,
                params,
                fold_scores,
                mean_score: Some(mean),
                std_score: Some(std),
                mean_train_score: train.map(|(m, _)| m),
                std_train_score: train.map(|(_, s)| s),
                mean_fit_time,
                rank: None,
                state: CandidateState::Complete,
                failed_fold: None,
                error: None,
            }
        }
    }
}

fn first_failure(candidates: &[CandidateResult]) -> Option<Error> {
    candidates.iter().find_map(|c| {
        c.error.as_ref().map(|message| Error::EstimatorFit {
            candidate: c.index,
            fold: c.failed_fold,
            message: message.clone(),
        })
    })
}
