#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Hyper-parameter search for classification estimators: exhaustive grid
//! search, seeded randomized search, cross-validated scoring and nested
//! cross-validation, with candidate × fold evaluation spread over a worker
//! pool.
//!
//! The crate ships no learning algorithm. You describe your model through the
//! [`Estimator`] trait (declared parameter names plus a `fit` that returns a
//! [`Predictor`]), and the search drives it.
//!
//! # Getting Started
//!
//! ```
//! use hypertune::prelude::*;
//!
//! /// Nearest class centroid, with features optionally scaled by `gamma`.
//! struct Centroid;
//!
//! struct CentroidModel {
//!     centroids: Vec<(usize, Vec<f64>)>,
//! }
//!
//! impl Predictor for CentroidModel {
//!     fn predict(&self, records: &[Vec<f64>]) -> Vec<usize> {
//!         records
//!             .iter()
//!             .map(|r| {
//!                 let dist = |c: &[f64]| r.iter().zip(c).map(|(a, b)| (a - b).powi(2)).sum::<f64>();
//!                 self.centroids
//!                     .iter()
//!                     .min_by(|a, b| dist(&a.1).total_cmp(&dist(&b.1)))
//!                     .map_or(0, |c| c.0)
//!             })
//!             .collect()
//!     }
//! }
//!
//! impl Estimator for Centroid {
//!     type Model = CentroidModel;
//!     type Error = String;
//!
//!     fn param_names(&self) -> &[&'static str] {
//!         &["shrink"]
//!     }
//!
//!     fn fit(&self, params: &Params, data: &DatasetView<'_>) -> Result<CentroidModel, String> {
//!         let shrink = params.get_f64("shrink").unwrap_or(0.0);
//!         let mut centroids = Vec::new();
//!         for class in data.dataset().classes() {
//!             let rows: Vec<&[f64]> = data.iter().filter(|(_, y)| *y == class).map(|(x, _)| x).collect();
//!             if rows.is_empty() {
//!                 continue;
//!             }
//!             let n = rows.len() as f64;
//!             let centroid = (0..rows[0].len())
//!                 .map(|j| (1.0 - shrink) * rows.iter().map(|r| r[j]).sum::<f64>() / n)
//!                 .collect();
//!             centroids.push((class, centroid));
//!         }
//!         Ok(CentroidModel { centroids })
//!     }
//! }
//!
//! let data = Dataset::new(
//!     (0..40).map(|i| vec![f64::from(i % 2) * 4.0 + f64::from(i % 5) * 0.1]).collect(),
//!     (0..40).map(|i| i % 2).collect(),
//! )
//! .unwrap();
//!
//! let grid = ParameterGrid::builder()
//!     .add("shrink", [0.0, 0.5])
//!     .build()
//!     .unwrap();
//!
//! let result = Search::builder(Centroid)
//!     .grid(grid)
//!     .cv(StratifiedKFold::new(4).shuffle(true))
//!     .seed(42)
//!     .build()
//!     .unwrap()
//!     .fit(&data)
//!     .unwrap();
//!
//! assert_eq!(result.n_candidates(), 2);
//! assert!(result.best_score() > 0.9);
//! println!("{result}");
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Estimator`] | Declares a parameter schema and fits a model on a [`DatasetView`]. |
//! | [`ParameterGrid`] | Candidate values per parameter; expands to their Cartesian product. |
//! | [`ParamDistributions`] | Distributions to sample candidates from in randomized search. |
//! | [`Splitter`](split::Splitter) | Produces train/validation folds: [`KFold`], [`StratifiedKFold`], [`ShuffleSplit`]. |
//! | [`Search`] | Evaluates every candidate on every fold, ranks them and refits the best. |
//! | [`NestedCv`] | Wraps a search in an outer split to estimate its generalisation. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `async` | [`Search::fit_async`] on a tokio runtime | off |
//! | `derive` | `#[derive(FromParams)]` for typed estimator configuration | off |
//! | `serde` | `Serialize`/`Deserialize` on public types, JSON export | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at key search points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod dataset;
pub mod distribution;
mod error;
pub mod estimator;
pub mod grid;
pub mod nested;
pub mod param;
mod rng_util;
pub mod search;
pub mod split;
mod types;

pub use dataset::{Dataset, DatasetView};
pub use distribution::{Distribution, ParamDistributions};
pub use error::{Error, Result};
pub use estimator::{Accuracy, BalancedAccuracy, Estimator, F1, MacroF1, Metric, Predictor};
pub use grid::ParameterGrid;
#[cfg(feature = "derive")]
pub use hypertune_derive::FromParams;
pub use nested::{NestedCv, NestedReport, OuterFoldResult};
pub use param::{FromParamValue, FromParams, ParamValue, Params};
pub use search::{
    CandidateResult, CvScores, Search, SearchBuilder, SearchConfig, SearchResult, SearchStrategy,
    cross_validate,
};
pub use split::{Fold, KFold, ShuffleSplit, Splitter, StratifiedKFold, ValidationSize};
pub use types::CandidateState;

/// Convenient wildcard import for the most common types.
///
/// The crate's `Result` alias is left out so that estimator implementations
/// can name `core::result::Result` with their own error type.
///
/// ```
/// use hypertune::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "derive")]
    pub use hypertune_derive::FromParams;

    pub use crate::dataset::{Dataset, DatasetView};
    pub use crate::distribution::{Distribution, ParamDistributions};
    pub use crate::error::Error;
    pub use crate::estimator::{
        Accuracy, BalancedAccuracy, Estimator, F1, MacroF1, Metric, Predictor,
    };
    pub use crate::grid::ParameterGrid;
    pub use crate::nested::{NestedCv, NestedReport};
    pub use crate::param::{FromParamValue, FromParams, ParamValue, Params};
    pub use crate::search::{
        CandidateResult, CvScores, Search, SearchBuilder, SearchConfig, SearchResult,
        cross_validate,
    };
    pub use crate::split::{KFold, ShuffleSplit, Splitter, StratifiedKFold, ValidationSize};
    pub use crate::types::CandidateState;
}
