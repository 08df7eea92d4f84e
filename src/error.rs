use core::time::Duration;

use crate::search::CandidateResult;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a grid parameter has no candidate values, or a name is
    /// declared twice.
    #[error("invalid grid for '{name}': {reason}")]
    InvalidGrid {
        /// The offending parameter name.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Returned when the fold count is below 2 or exceeds the number of samples.
    #[error(
        "invalid fold count: {n_splits} folds requested for {n_samples} samples (need 2 <= k <= n)"
    )]
    InvalidFoldCount {
        /// The requested number of folds.
        n_splits: usize,
        /// The number of samples available.
        n_samples: usize,
    },

    /// Returned when a shuffle-split validation size is empty or leaves no
    /// training samples.
    #[error("invalid validation size: {size} of {n_samples} samples")]
    InvalidValidationSize {
        /// The resolved validation size.
        size: usize,
        /// The number of samples available.
        n_samples: usize,
    },

    /// Returned when the estimator fails to fit or score.
    ///
    /// `fold` is `None` when the failure happened while refitting on the
    /// full dataset.
    #[error("estimator failed on candidate {candidate} (fold {fold:?}): {message}")]
    EstimatorFit {
        /// Index of the candidate in enumeration order.
        candidate: usize,
        /// Index of the fold, if any.
        fold: Option<usize>,
        /// The estimator's error message.
        message: String,
    },

    /// Returned when the search exceeds its wall-clock budget.
    ///
    /// Candidates whose folds all finished before the deadline are preserved.
    #[error("search timed out after {elapsed:?} with {} completed candidates", .completed.len())]
    SearchTimeout {
        /// Candidates that were fully evaluated before the deadline.
        completed: Vec<CandidateResult>,
        /// Time spent before giving up.
        elapsed: Duration,
    },

    /// Returned when a parameter is not part of the estimator's declared schema.
    #[error("unknown parameter '{name}'; expected one of {allowed:?}")]
    UnknownParameter {
        /// The rejected parameter name.
        name: String,
        /// The names the estimator accepts.
        allowed: Vec<&'static str>,
    },

    /// Returned when a parameter value cannot be converted to the field type.
    #[error("parameter '{name}' expects {expected}, got {got}")]
    ParameterType {
        /// The parameter name.
        name: String,
        /// The expected kind of value.
        expected: &'static str,
        /// The value that was supplied.
        got: String,
    },

    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds: low must be positive for log scale")]
    InvalidLogBounds,

    /// Returned when step size is not positive.
    #[error("invalid step: step must be positive")]
    InvalidStep,

    /// Returned when a choice distribution is empty.
    #[error("choice distribution for '{0}' cannot be empty")]
    EmptyChoices(String),

    /// Returned when randomized search is configured with zero iterations.
    #[error("randomized search needs at least one iteration")]
    InvalidIterations,

    /// Returned when records and labels do not line up.
    #[error("dimension mismatch: expected {expected} but row {index} has {got}")]
    DimensionMismatch {
        /// The expected length.
        expected: usize,
        /// The actual length.
        got: usize,
        /// The index of the offending row (or label count).
        index: usize,
    },

    /// Returned when predicting with a search that was run without refit.
    #[error("search was run with refit disabled; no fitted model is available")]
    NotRefitted,

    /// Returned when asking for a best candidate but none completed.
    #[error("no completed candidates available")]
    NoCompletedCandidates,

    /// Returned when the worker thread pool cannot be started.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Returned when an async task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskError(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Returns the completed candidates carried by a [`Error::SearchTimeout`].
    #[must_use]
    pub fn completed_candidates(&self) -> Option<&[CandidateResult]> {
        match self {
            Error::SearchTimeout { completed, .. } => Some(completed),
            _ => None,
        }
    }
}
