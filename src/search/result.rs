use core::time::Duration;

use crate::dataset::DatasetView;
use crate::error::{Error, Result};
use crate::estimator::{Metric, Predictor, score_model};
use crate::param::Params;
use crate::split::Fold;
use crate::types::CandidateState;

/// The cross-validated evaluation of one parameter combination.
///
/// Failed candidates keep their per-fold scores where available but have no
/// mean, standard deviation or rank, and never become the best candidate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateResult {
    /// Position in the enumeration (grid order or sampling order).
    pub index: usize,
    /// The evaluated combination.
    pub params: Params,
    /// Validation score per fold; `None` where the fold failed.
    pub fold_scores: Vec<Option<f64>>,
    /// Mean validation score across folds.
    pub mean_score: Option<f64>,
    /// Population standard deviation of the validation scores.
    pub std_score: Option<f64>,
    /// Mean training score, when training scores were requested.
    pub mean_train_score: Option<f64>,
    /// Standard deviation of the training scores, when requested.
    pub std_train_score: Option<f64>,
    /// Mean wall-clock time spent fitting one fold.
    pub mean_fit_time: Duration,
    /// 1-based rank by mean score; tied scores share a rank.
    pub rank: Option<usize>,
    /// Whether every fold succeeded.
    pub state: CandidateState,
    /// The first fold that failed.
    pub failed_fold: Option<usize>,
    /// The estimator's message for that failure.
    pub error: Option<String>,
}

impl CandidateResult {
    /// Returns `true` if every fold was fitted and scored.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == CandidateState::Complete
    }
}

/// Mean and population standard deviation of `values`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Assigns ranks in place and returns the index of the best candidate.
///
/// The best candidate has the highest mean score; ties go to the candidate
/// enumerated first.
pub(crate) fn rank_candidates(candidates: &mut [CandidateResult]) -> Option<usize> {
    let means: Vec<Option<f64>> = candidates.iter().map(|c| c.mean_score).collect();
    for candidate in candidates.iter_mut() {
        candidate.rank = candidate
            .mean_score
            .map(|m| 1 + means.iter().flatten().filter(|&&other| other > m).count());
    }
    let mut best: Option<(usize, f64)> = None;
    for (i, mean) in means.iter().enumerate() {
        let Some(m) = *mean else { continue };
        if best.is_none_or(|(_, b)| m > b) {
            best = Some((i, m));
        }
    }
    best.map(|(i, _)| i)
}

/// The outcome of a completed search.
///
/// Holds every [`CandidateResult`] in enumeration order, the winning
/// candidate and, unless refit was disabled, a model trained on the full
/// search data with the winning combination. That model answers
/// [`predict`](Self::predict) and [`score`](Self::score).
#[derive(Debug)]
pub struct SearchResult<M> {
    pub(crate) candidates: Vec<CandidateResult>,
    pub(crate) best_index: usize,
    pub(crate) best_model: Option<M>,
    pub(crate) folds: Vec<Fold>,
    pub(crate) metric_name: String,
    pub(crate) elapsed: Duration,
    pub(crate) refit_time: Option<Duration>,
}

impl<M> SearchResult<M> {
    /// Every evaluated candidate, in enumeration order.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateResult] {
        &self.candidates
    }

    /// Number of candidates evaluated.
    #[must_use]
    pub fn n_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Number of candidates that failed on at least one fold.
    #[must_use]
    pub fn n_failed(&self) -> usize {
        self.candidates.iter().filter(|c| !c.is_complete()).count()
    }

    /// Index of the best candidate.
    #[must_use]
    pub fn best_index(&self) -> usize {
        self.best_index
    }

    /// The best candidate.
    #[must_use]
    pub fn best(&self) -> &CandidateResult {
        &self.candidates[self.best_index]
    }

    /// The combination of the best candidate.
    #[must_use]
    pub fn best_params(&self) -> &Params {
        &self.best().params
    }

    /// Mean validation score of the best candidate.
    #[must_use]
    pub fn best_score(&self) -> f64 {
        self.best().mean_score.unwrap_or(f64::NAN)
    }

    /// The model refitted on the full search data, if refit was enabled.
    #[must_use]
    pub fn best_model(&self) -> Option<&M> {
        self.best_model.as_ref()
    }

    /// Takes the refitted model out of the result.
    #[must_use]
    pub fn into_best_model(self) -> Option<M> {
        self.best_model
    }

    /// The folds used by the search, as indices into the dataset.
    #[must_use]
    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    /// Number of cross-validation folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.folds.len()
    }

    /// Name of the metric that ranked the candidates.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Wall-clock time of the whole search, refit included.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time spent refitting the best combination.
    #[must_use]
    pub fn refit_time(&self) -> Option<Duration> {
        self.refit_time
    }
}

impl<M: Predictor> SearchResult<M> {
    /// Predicts labels with the refitted model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefitted`] if the search ran with refit disabled.
    pub fn predict(&self, records: &[Vec<f64>]) -> Result<Vec<usize>> {
        self.best_model
            .as_ref()
            .map(|m| m.predict(records))
            .ok_or(Error::NotRefitted)
    }

    /// Scores the refitted model on `data` with `metric`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRefitted`] if the search ran with refit disabled.
    pub fn score(&self, data: &DatasetView<'_>, metric: &dyn Metric) -> Result<f64> {
        self.best_model
            .as_ref()
            .map(|m| score_model(m, data, metric))
            .ok_or(Error::NotRefitted)
    }
}
