//! The capability traits a search drives: [`Estimator`], [`Predictor`] and
//! [`Metric`].
//!
//! An estimator is a factory: given a parameter combination and a training
//! view it produces a fresh trained model. Searches never reuse a model
//! across folds, so implementations need no interior state.
//!
//! ```
//! use hypertune::{DatasetView, Estimator, Params, Predictor};
//!
//! /// Predicts the majority class seen during training.
//! struct Majority;
//!
//! struct MajorityModel(usize);
//!
//! impl Predictor for MajorityModel {
//!     fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
//!         vec![self.0; records.len()]
//!     }
//! }
//!
//! impl Estimator for Majority {
//!     type Model = MajorityModel;
//!     type Error = String;
//!
//!     fn param_names(&self) -> &[&'static str] {
//!         &[]
//!     }
//!
//!     fn fit(&self, _params: &Params, data: &DatasetView<'_>) -> Result<MajorityModel, String> {
//!         let mut counts = std::collections::HashMap::new();
//!         for y in data.targets() {
//!             *counts.entry(y).or_insert(0usize) += 1;
//!         }
//!         counts
//!             .into_iter()
//!             .max_by_key(|&(label, n)| (n, core::cmp::Reverse(label)))
//!             .map(|(label, _)| MajorityModel(label))
//!             .ok_or_else(|| "empty training set".to_string())
//!     }
//! }
//! ```

use crate::dataset::DatasetView;
use crate::param::Params;

/// A trained model that maps feature rows to class labels.
pub trait Predictor {
    /// Predicts one label per row.
    fn predict(&self, records: &[Vec<f64>]) -> Vec<usize>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
        (**self).predict(records)
    }
}

/// A trainable estimator family with a declared hyper-parameter schema.
///
/// # Thread safety
///
/// The search fits folds on worker threads, so the estimator must be
/// `Send + Sync` and its models `Send`.
pub trait Estimator: Send + Sync {
    /// The trained state produced by [`fit`](Estimator::fit).
    type Model: Predictor + Send;

    /// The error type reported when fitting fails.
    type Error: ToString;

    /// Names of the hyper-parameters this estimator accepts.
    ///
    /// A search rejects grids or distributions that mention any other name
    /// before fitting anything.
    fn param_names(&self) -> &[&'static str];

    /// Trains a fresh model with `params` on `data`.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying learning algorithm. The search records
    /// it against the current candidate and carries on.
    fn fit(&self, params: &Params, data: &DatasetView<'_>) -> Result<Self::Model, Self::Error>;
}

impl<E: Estimator + ?Sized> Estimator for &E {
    type Model = E::Model;
    type Error = E::Error;

    fn param_names(&self) -> &[&'static str] {
        (**self).param_names()
    }

    fn fit(&self, params: &Params, data: &DatasetView<'_>) -> Result<Self::Model, Self::Error> {
        (**self).fit(params, data)
    }
}

/// A scoring function over predictions and true labels. Higher is better.
///
/// Any `Fn(&[usize], &[usize]) -> f64` closure is a metric.
pub trait Metric: Send + Sync {
    /// Scores `predictions` against `truth`. Both slices have equal length.
    fn score(&self, predictions: &[usize], truth: &[usize]) -> f64;

    /// A short name used in summaries.
    fn name(&self) -> &str {
        "score"
    }
}

impl<F> Metric for F
where
    F: Fn(&[usize], &[usize]) -> f64 + Send + Sync,
{
    fn score(&self, predictions: &[usize], truth: &[usize]) -> f64 {
        self(predictions, truth)
    }
}

/// Scores a trained model on a view.
pub(crate) fn score_model<M: Predictor + ?Sized>(
    model: &M,
    data: &DatasetView<'_>,
    metric: &dyn Metric,
) -> f64 {
    let predictions = model.predict(&data.to_records());
    metric.score(&predictions, &data.to_targets())
}

/// Fraction of correctly classified samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct Accuracy;

impl Metric for Accuracy {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, predictions: &[usize], truth: &[usize]) -> f64 {
        if truth.is_empty() {
            return 0.0;
        }
        let correct = predictions
            .iter()
            .zip(truth)
            .filter(|(p, t)| p == t)
            .count();
        correct as f64 / truth.len() as f64
    }

    fn name(&self) -> &str {
        "accuracy"
    }
}

/// Mean per-class recall over the classes present in the true labels.
#[derive(Clone, Copy, Debug, Default)]
pub struct BalancedAccuracy;

impl Metric for BalancedAccuracy {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, predictions: &[usize], truth: &[usize]) -> f64 {
        let classes = distinct(truth);
        if classes.is_empty() {
            return 0.0;
        }
        let total: f64 = classes
            .iter()
            .map(|&c| {
                let support = truth.iter().filter(|&&t| t == c).count();
                let hits = predictions
                    .iter()
                    .zip(truth)
                    .filter(|&(&p, &t)| t == c && p == c)
                    .count();
                hits as f64 / support as f64
            })
            .sum();
        total / classes.len() as f64
    }

    fn name(&self) -> &str {
        "balanced_accuracy"
    }
}

/// Binary F1 score for one positive class.
#[derive(Clone, Copy, Debug)]
pub struct F1 {
    positive: usize,
}

impl F1 {
    /// F1 with `positive` as the positive label.
    #[must_use]
    pub fn new(positive: usize) -> Self {
        Self { positive }
    }
}

impl Default for F1 {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Metric for F1 {
    fn score(&self, predictions: &[usize], truth: &[usize]) -> f64 {
        f1_for(self.positive, predictions, truth)
    }

    fn name(&self) -> &str {
        "f1"
    }
}

/// Unweighted mean of per-class F1 over every label seen in either slice.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroF1;

impl Metric for MacroF1 {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, predictions: &[usize], truth: &[usize]) -> f64 {
        let mut labels: Vec<usize> = truth.iter().chain(predictions).copied().collect();
        labels.sort_unstable();
        labels.dedup();
        if labels.is_empty() {
            return 0.0;
        }
        let total: f64 = labels
            .iter()
            .map(|&c| f1_for(c, predictions, truth))
            .sum();
        total / labels.len() as f64
    }

    fn name(&self) -> &str {
        "f1_macro"
    }
}

#[allow(clippy::cast_precision_loss)]
fn f1_for(positive: usize, predictions: &[usize], truth: &[usize]) -> f64 {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&p, &t) in predictions.iter().zip(truth) {
        match (p == positive, t == positive) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }
    let denom = 2 * tp + fp + fn_;
    if denom == 0 {
        return 0.0;
    }
    (2 * tp) as f64 / denom as f64
}

fn distinct(labels: &[usize]) -> Vec<usize> {
    let mut v = labels.to_vec();
    v.sort_unstable();
    v.dedup();
    v
}
