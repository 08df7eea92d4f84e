//! Exhaustive parameter grids.
//!
//! A [`ParameterGrid`] maps each parameter name to a finite, non-empty list of
//! candidate values and enumerates the full Cartesian product lazily. The
//! enumeration order is lexicographic in declaration order: the first
//! parameter changes slowest, the last fastest.
//!
//! ```
//! use hypertune::grid::ParameterGrid;
//!
//! let grid = ParameterGrid::builder()
//!     .add("c", [0.1, 1.0])
//!     .add("penalty", ["l1", "l2"])
//!     .build()
//!     .unwrap();
//!
//! let combos: Vec<String> = grid.iter().map(|p| p.to_string()).collect();
//! assert_eq!(
//!     combos,
//!     [
//!         "{c: 0.1, penalty: l1}",
//!         "{c: 0.1, penalty: l2}",
//!         "{c: 1, penalty: l1}",
//!         "{c: 1, penalty: l2}",
//!     ]
//! );
//! ```

use crate::distribution::{Distribution, FloatDistribution, IntDistribution, ParamDistributions};
use crate::error::{Error, Result};
use crate::param::{ParamValue, Params};

/// An ordered mapping from parameter name to candidate values.
///
/// Every candidate list is non-empty; [`ParameterGridBuilder::build`] rejects
/// empty lists before any search work starts.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterGrid {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl ParameterGrid {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ParameterGridBuilder {
        ParameterGridBuilder::default()
    }

    /// Builds the grid implied by a space of choice distributions.
    ///
    /// Non-choice distributions are skipped; callers check
    /// [`ParamDistributions::is_discrete`] first.
    pub(crate) fn from_choices(space: &ParamDistributions) -> Self {
        Self {
            entries: space
                .iter()
                .filter_map(|(name, dist)| dist.choices().map(|c| (name.to_owned(), c.to_vec())))
                .collect(),
        }
    }

    /// Number of combinations: the product of all candidate counts.
    ///
    /// A grid with no parameters has exactly one (empty) combination. The
    /// count saturates at `usize::MAX`; see [`checked_len`](Self::checked_len).
    #[must_use]
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Number of combinations, or `None` if it does not fit in a `usize`.
    #[must_use]
    pub fn checked_len(&self) -> Option<usize> {
        self.entries
            .iter()
            .try_fold(1usize, |acc, (_, v)| acc.checked_mul(v.len()))
    }

    /// Always `false`: a valid grid has at least one combination.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Candidate values for `name`.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[ParamValue]> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v.as_slice()))
    }

    /// Returns the combination at position `index` of the enumeration.
    ///
    /// Returns `None` if `index` is past the last combination. When the grid
    /// is larger than `usize` can count, every index is valid.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Params> {
        if self.checked_len().is_some_and(|n| index >= n) {
            return None;
        }
        // Mixed-radix decode, last parameter least significant. Division
        // only, so oversized grids cannot overflow here.
        let mut rest = index;
        let mut picked = vec![0usize; self.entries.len()];
        for (slot, (_, values)) in picked.iter_mut().zip(&self.entries).rev() {
            *slot = rest % values.len();
            rest /= values.len();
        }
        Some(self.combination(&picked))
    }

    /// Lazily enumerates every combination.
    #[must_use]
    pub fn iter(&self) -> GridIter<'_> {
        GridIter {
            grid: self,
            cursor: Some(vec![0; self.entries.len()]),
            remaining: self.len(),
        }
    }

    /// Candidate counts per parameter, in declaration order.
    pub(crate) fn value_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(_, v)| v.len())
    }

    /// The combination picking `picked[k]` from the k-th parameter.
    pub(crate) fn combination(&self, picked: &[usize]) -> Params {
        self.entries
            .iter()
            .zip(picked)
            .map(|((name, values), &i)| (name.clone(), values[i].clone()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ParameterGrid {
    type Item = Params;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the combinations of a [`ParameterGrid`].
#[derive(Clone, Debug)]
pub struct GridIter<'a> {
    grid: &'a ParameterGrid,
    cursor: Option<Vec<usize>>,
    remaining: usize,
}

impl Iterator for GridIter<'_> {
    type Item = Params;

    fn next(&mut self) -> Option<Params> {
        let cursor = self.cursor.as_mut()?;
        if self.remaining == 0 {
            self.cursor = None;
            return None;
        }
        let item = self.grid.combination(cursor);
        self.remaining -= 1;

        // Odometer increment from the last position.
        let mut pos = cursor.len();
        loop {
            if pos == 0 {
                self.cursor = None;
                break;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < self.grid.entries[pos].1.len() {
                break;
            }
            cursor[pos] = 0;
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GridIter<'_> {}

/// Builder for [`ParameterGrid`].
#[derive(Debug, Default)]
pub struct ParameterGridBuilder {
    entries: Vec<(String, Vec<ParamValue>)>,
}

impl ParameterGridBuilder {
    /// Adds a parameter with explicit candidate values.
    #[must_use]
    pub fn add<V: Into<ParamValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.entries
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Adds a parameter whose candidates discretize `distribution`.
    ///
    /// Float and integer ranges produce `n_points` evenly spaced values (in
    /// log space for log-scaled distributions) unless a step is set, in which
    /// case the step grid is used. Choice distributions contribute all their
    /// values.
    #[must_use]
    pub fn add_distribution(
        mut self,
        name: impl Into<String>,
        distribution: &Distribution,
        n_points: usize,
    ) -> Self {
        let values = match distribution {
            Distribution::Float(d) => generate_float_grid_points(d, n_points)
                .into_iter()
                .map(ParamValue::Float)
                .collect(),
            Distribution::Int(d) => generate_int_grid_points(d, n_points)
                .into_iter()
                .map(ParamValue::Int)
                .collect(),
            Distribution::Choice(values) => values.clone(),
        };
        self.entries.push((name.into(), values));
        self
    }

    /// Validates and builds the grid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrid`] if any candidate list is empty or a
    /// parameter name is declared twice.
    pub fn build(self) -> Result<ParameterGrid> {
        for (i, (name, values)) in self.entries.iter().enumerate() {
            if values.is_empty() {
                return Err(Error::InvalidGrid {
                    name: name.clone(),
                    reason: "candidate list is empty",
                });
            }
            if self.entries[..i].iter().any(|(n, _)| n == name) {
                return Err(Error::InvalidGrid {
                    name: name.clone(),
                    reason: "parameter declared more than once",
                });
            }
        }
        Ok(ParameterGrid {
            entries: self.entries,
        })
    }
}

/// Generates grid points for an integer distribution.
///
/// # Behavior
///
/// - If `step` is `Some(s)`: generates points at `low, low+s, low+2*s, ...` up to `high`.
/// - If `step` is `None` and `log_scale` is `false`: generates `n_points` evenly spaced
///   integers from `low` to `high`.
/// - If `step` is `None` and `log_scale` is `true`: generates `n_points` evenly spaced
///   in log space, rounded to integers.
///
/// All grid points are clamped to `[low, high]` bounds and deduplicated.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn generate_int_grid_points(dist: &IntDistribution, n_points: usize) -> Vec<i64> {
    let low = dist.low;
    let high = dist.high;

    if low > high {
        return vec![];
    }
    if low == high {
        return vec![low];
    }

    let points: Vec<i64> = if let Some(step) = dist.step {
        if step <= 0 {
            return vec![low];
        }
        let mut result = Vec::new();
        let mut current = low;
        while current <= high {
            result.push(current);
            current = current.saturating_add(step);
            if result.last() == Some(&current) {
                break;
            }
        }
        result
    } else if dist.log_scale && low > 0 {
        log_points(low as f64, high as f64, n_points)
            .into_iter()
            .map(|v| v.round() as i64)
            .collect()
    } else {
        linear_points(low as f64, high as f64, n_points)
            .into_iter()
            .map(|v| v.round() as i64)
            .collect()
    };

    let mut clamped: Vec<i64> = points.into_iter().map(|p| p.clamp(low, high)).collect();
    clamped.sort_unstable();
    clamped.dedup();
    clamped
}

/// Generates grid points for a float distribution.
///
/// A step overrides `log_scale`. Without a step, `n_points` values are spaced
/// evenly (in log space when `log_scale` is set and `low > 0`). All points lie
/// within `[low, high]`.
#[must_use]
pub fn generate_float_grid_points(dist: &FloatDistribution, n_points: usize) -> Vec<f64> {
    let low = dist.low;
    let high = dist.high;

    if low.is_nan() || high.is_nan() || low > high {
        return vec![];
    }
    if (low - high).abs() < f64::EPSILON {
        return vec![low];
    }

    let points: Vec<f64> = if let Some(step) = dist.step {
        if step.is_nan() || step <= 0.0 {
            return vec![low];
        }
        let mut result = Vec::new();
        let mut current = low;
        while current <= high + f64::EPSILON {
            result.push(current);
            current += step;
            if result.len() > 1_000_000 {
                break;
            }
        }
        result
    } else if dist.log_scale && low > 0.0 {
        log_points(low, high, n_points)
    } else {
        linear_points(low, high, n_points)
    };

    points.into_iter().map(|p| p.clamp(low, high)).collect()
}

#[allow(clippy::cast_precision_loss)]
fn linear_points(low: f64, high: f64, n_points: usize) -> Vec<f64> {
    match n_points {
        0 => vec![],
        1 => vec![low],
        _ => (0..n_points)
            .map(|i| low + (i as f64 / (n_points - 1) as f64) * (high - low))
            .collect(),
    }
}

fn log_points(low: f64, high: f64, n_points: usize) -> Vec<f64> {
    linear_points(low.ln(), high.ln(), n_points)
        .into_iter()
        .map(f64::exp)
        .collect()
}
