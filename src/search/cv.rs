//! Cross-validated scoring of one fixed combination.

use crate::dataset::DatasetView;
use crate::error::{Error, Result};
use crate::estimator::{Estimator, Metric};
use crate::param::{Params, check_names};
use crate::split::Splitter;

use super::{evaluate_cell, mean_std};

/// Per-fold validation scores of one combination.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CvScores {
    /// Validation score of each fold, in fold order.
    pub scores: Vec<f64>,
}

impl CvScores {
    /// Mean score across folds.
    #[must_use]
    pub fn mean(&self) -> f64 {
        mean_std(&self.scores).0
    }

    /// Population standard deviation across folds.
    #[must_use]
    pub fn std(&self) -> f64 {
        mean_std(&self.scores).1
    }

    /// Lowest fold score.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.scores.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Highest fold score.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Scores `params` on every fold produced by `splitter`.
///
/// The baseline counterpart of a [`Search`](super::Search): one combination,
/// no ranking, no refit.
///
/// # Errors
///
/// - [`Error::UnknownParameter`] if `params` names a parameter the estimator
///   does not declare.
/// - Splitter errors such as [`Error::InvalidFoldCount`].
/// - [`Error::EstimatorFit`] for the first fold whose fit or score failed
///   (`candidate` is always 0).
///
/// # Examples
///
/// ```
/// use hypertune::prelude::*;
///
/// struct Constant;
/// struct Always(usize);
///
/// impl Predictor for Always {
///     fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
///         vec![self.0; records.len()]
///     }
/// }
///
/// impl Estimator for Constant {
///     type Model = Always;
///     type Error = String;
///
///     fn param_names(&self) -> &[&'static str] {
///         &[]
///     }
///
///     fn fit(&self, _: &Params, _: &DatasetView<'_>) -> Result<Always, String> {
///         Ok(Always(1))
///     }
/// }
///
/// let data = Dataset::new(vec![vec![0.0]; 8], vec![1, 1, 1, 1, 1, 1, 0, 0]).unwrap();
/// let cv = cross_validate(
///     &Constant,
///     &Params::new(),
///     &data.view(),
///     &KFold::new(4),
///     &Accuracy,
///     &mut fastrand::Rng::with_seed(0),
/// )
/// .unwrap();
///
/// assert_eq!(cv.scores, vec![1.0, 1.0, 1.0, 0.0]);
/// assert!((cv.mean() - 0.75).abs() < 1e-12);
/// ```
pub fn cross_validate<E: Estimator + ?Sized>(
    estimator: &E,
    params: &Params,
    data: &DatasetView<'_>,
    splitter: &dyn Splitter,
    metric: &dyn Metric,
    rng: &mut fastrand::Rng,
) -> Result<CvScores> {
    check_names(params.names(), estimator.param_names())?;

    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("cross_validate", n_splits = splitter.n_splits()).entered();

    let folds = splitter.split(&data.to_targets(), rng)?;
    let scores = folds
        .iter()
        .enumerate()
        .map(|(i, fold)| {
            evaluate_cell(estimator, metric, params, fold, data, false)
                .score
                .map_err(|message| Error::EstimatorFit {
                    candidate: 0,
                    fold: Some(i),
                    message,
                })
        })
        .collect::<Result<Vec<f64>>>()?;

    trace_debug!(n_splits = scores.len(), "cross-validation finished");
    Ok(CvScores { scores })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_scores_stats() {
        let cv = CvScores {
            scores: vec![0.5, 0.75, 1.0],
        };
        assert!((cv.mean() - 0.75).abs() < 1e-12);
        assert!((cv.min() - 0.5).abs() < f64::EPSILON);
        assert!((cv.max() - 1.0).abs() < f64::EPSILON);
        assert!(cv.std() > 0.0);
    }
}
