//! Parameter distributions for randomized search.
//!
//! A [`ParamDistributions`] maps parameter names to [`Distribution`]s, and a
//! [`ParameterSampler`] draws a fixed number of combinations from it with an
//! explicitly seeded generator.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::grid::ParameterGrid;
use crate::param::{ParamValue, Params};
use crate::rng_util;

/// Distribution for floating-point parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatDistribution {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
    /// Whether to sample in log space.
    pub log_scale: bool,
    /// Optional step size for discretization.
    pub step: Option<f64>,
}

/// Distribution for integer parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntDistribution {
    /// Lower bound (inclusive).
    pub low: i64,
    /// Upper bound (inclusive).
    pub high: i64,
    /// Whether to sample in log space.
    pub log_scale: bool,
    /// Optional step size for discretization.
    pub step: Option<i64>,
}

/// Enum wrapping all parameter distribution types.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distribution {
    /// A floating-point distribution.
    Float(FloatDistribution),
    /// An integer distribution.
    Int(IntDistribution),
    /// A uniform choice among fixed values.
    Choice(Vec<ParamValue>),
}

impl Distribution {
    /// Uniform floats in `[low, high]`.
    #[must_use]
    pub fn uniform(low: f64, high: f64) -> Self {
        Distribution::Float(FloatDistribution {
            low,
            high,
            log_scale: false,
            step: None,
        })
    }

    /// Floats in `[low, high]` whose logarithm is uniform.
    #[must_use]
    pub fn log_uniform(low: f64, high: f64) -> Self {
        Distribution::Float(FloatDistribution {
            low,
            high,
            log_scale: true,
            step: None,
        })
    }

    /// Floats on the grid `low, low + step, ...` up to `high`.
    #[must_use]
    pub fn stepped(low: f64, high: f64, step: f64) -> Self {
        Distribution::Float(FloatDistribution {
            low,
            high,
            log_scale: false,
            step: Some(step),
        })
    }

    /// Uniform integers in `[low, high]`.
    #[must_use]
    pub fn int_uniform(low: i64, high: i64) -> Self {
        Distribution::Int(IntDistribution {
            low,
            high,
            log_scale: false,
            step: None,
        })
    }

    /// Integers in `[low, high]` whose logarithm is uniform.
    #[must_use]
    pub fn int_log_uniform(low: i64, high: i64) -> Self {
        Distribution::Int(IntDistribution {
            low,
            high,
            log_scale: true,
            step: None,
        })
    }

    /// Integers on the grid `low, low + step, ...` up to `high`.
    #[must_use]
    pub fn int_stepped(low: i64, high: i64, step: i64) -> Self {
        Distribution::Int(IntDistribution {
            low,
            high,
            log_scale: false,
            step: Some(step),
        })
    }

    /// A uniform choice among `values`.
    #[must_use]
    pub fn choice<V: Into<ParamValue>>(values: impl IntoIterator<Item = V>) -> Self {
        Distribution::Choice(values.into_iter().map(Into::into).collect())
    }

    /// Returns the choices when this is a [`Distribution::Choice`].
    #[must_use]
    pub fn choices(&self) -> Option<&[ParamValue]> {
        match self {
            Distribution::Choice(values) => Some(values),
            _ => None,
        }
    }

    /// Checks the bounds, step and choices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`], [`Error::InvalidLogBounds`],
    /// [`Error::InvalidStep`] or [`Error::EmptyChoices`].
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self, name: &str) -> Result<()> {
        match self {
            Distribution::Float(d) => {
                if d.low.is_nan() || d.high.is_nan() || d.low > d.high {
                    return Err(Error::InvalidBounds {
                        low: d.low,
                        high: d.high,
                    });
                }
                if d.log_scale && d.low <= 0.0 {
                    return Err(Error::InvalidLogBounds);
                }
                if d.step.is_some_and(|s| s.is_nan() || s <= 0.0) {
                    return Err(Error::InvalidStep);
                }
            }
            Distribution::Int(d) => {
                if d.low > d.high {
                    return Err(Error::InvalidBounds {
                        low: d.low as f64,
                        high: d.high as f64,
                    });
                }
                if d.log_scale && d.low <= 0 {
                    return Err(Error::InvalidLogBounds);
                }
                if d.step.is_some_and(|s| s <= 0) {
                    return Err(Error::InvalidStep);
                }
            }
            Distribution::Choice(values) => {
                if values.is_empty() {
                    return Err(Error::EmptyChoices(name.to_owned()));
                }
            }
        }
        Ok(())
    }

    /// Draws one value. The distribution must be valid.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn sample(&self, rng: &mut fastrand::Rng) -> ParamValue {
        match self {
            Distribution::Float(d) => {
                let value = if d.log_scale {
                    let log_low = d.low.ln();
                    let log_high = d.high.ln();
                    rng_util::f64_range(rng, log_low, log_high)
                        .exp()
                        .clamp(d.low, d.high)
                } else if let Some(step) = d.step {
                    let n_steps = ((d.high - d.low) / step).floor() as i64;
                    let k = rng.i64(0..=n_steps);
                    d.low + (k as f64) * step
                } else {
                    rng_util::f64_range(rng, d.low, d.high)
                };
                ParamValue::Float(value)
            }
            Distribution::Int(d) => {
                let value = if d.log_scale {
                    let log_low = (d.low as f64).ln();
                    let log_high = (d.high as f64).ln();
                    let raw = rng_util::f64_range(rng, log_low, log_high).exp().round() as i64;
                    // rounding can step outside the bounds
                    raw.clamp(d.low, d.high)
                } else if let Some(step) = d.step {
                    let n_steps = (d.high - d.low) / step;
                    d.low + rng.i64(0..=n_steps) * step
                } else {
                    rng.i64(d.low..=d.high)
                };
                ParamValue::Int(value)
            }
            Distribution::Choice(values) => values[rng.usize(0..values.len())].clone(),
        }
    }
}

/// An ordered mapping from parameter name to [`Distribution`].
///
/// # Examples
///
/// ```
/// use hypertune::distribution::{Distribution, ParamDistributions};
///
/// let space = ParamDistributions::builder()
///     .add("c", Distribution::log_uniform(1e-3, 1e2))
///     .add("penalty", Distribution::choice(["l1", "l2"]))
///     .build()
///     .unwrap();
/// assert_eq!(space.names().collect::<Vec<_>>(), ["c", "penalty"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamDistributions {
    entries: Vec<(String, Distribution)>,
}

impl ParamDistributions {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ParamDistributionsBuilder {
        ParamDistributionsBuilder::default()
    }

    /// Iterates over parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterates over `(name, distribution)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Distribution)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no parameters are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draws one combination.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Params {
        self.entries
            .iter()
            .map(|(name, dist)| (name.clone(), dist.sample(rng)))
            .collect()
    }

    /// Returns `true` when every distribution is a finite choice list, so the
    /// space is itself a grid.
    #[must_use]
    pub fn is_discrete(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, d)| matches!(d, Distribution::Choice(_)))
    }

    /// Number of combinations a sampler asked for `n_iter` draws yields.
    ///
    /// Equal to `n_iter` unless the space is discrete and smaller.
    #[must_use]
    pub fn n_draws(&self, n_iter: usize) -> usize {
        if self.is_discrete() && !self.is_empty() {
            ParameterGrid::from_choices(self)
                .checked_len()
                .map_or(n_iter, |total| total.min(n_iter))
        } else {
            n_iter
        }
    }

    /// Sampler drawing `n_iter` combinations with `rng`.
    #[must_use]
    pub fn sampler(&self, n_iter: usize, rng: fastrand::Rng) -> ParameterSampler<'_> {
        ParameterSampler::new(self, n_iter, rng)
    }
}

/// Builder for [`ParamDistributions`].
#[derive(Debug, Default)]
pub struct ParamDistributionsBuilder {
    entries: Vec<(String, Distribution)>,
}

impl ParamDistributionsBuilder {
    /// Adds a parameter.
    #[must_use]
    pub fn add(mut self, name: impl Into<String>, distribution: Distribution) -> Self {
        self.entries.push((name.into(), distribution));
        self
    }

    /// Validates every distribution and builds the space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGrid`] for duplicate names, or the
    /// distribution's own validation error.
    pub fn build(self) -> Result<ParamDistributions> {
        for (i, (name, dist)) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|(n, _)| n == name) {
                return Err(Error::InvalidGrid {
                    name: name.clone(),
                    reason: "parameter declared more than once",
                });
            }
            dist.validate(name)?;
        }
        Ok(ParamDistributions {
            entries: self.entries,
        })
    }
}

/// Draws a fixed number of combinations from a [`ParamDistributions`].
///
/// When every distribution is a choice list, combinations are drawn from the
/// implied grid without replacement, so no combination repeats; `n_iter` is
/// capped at the grid size. Otherwise each draw is independent.
pub struct ParameterSampler<'a> {
    space: &'a ParamDistributions,
    rng: fastrand::Rng,
    remaining: usize,
    drawn: Option<std::vec::IntoIter<Params>>,
}

impl<'a> ParameterSampler<'a> {
    fn new(space: &'a ParamDistributions, n_iter: usize, mut rng: fastrand::Rng) -> Self {
        if space.is_discrete() && !space.is_empty() {
            let grid = ParameterGrid::from_choices(space);
            let drawn = draw_distinct(&grid, n_iter, &mut rng);
            return Self {
                space,
                rng,
                remaining: drawn.len(),
                drawn: Some(drawn.into_iter()),
            };
        }
        Self {
            space,
            rng,
            remaining: n_iter,
            drawn: None,
        }
    }
}

/// Up to `n_iter` distinct combinations of `grid`, in random order.
///
/// Memory is proportional to the number drawn, not to the grid size.
fn draw_distinct(grid: &ParameterGrid, n_iter: usize, rng: &mut fastrand::Rng) -> Vec<Params> {
    if let Some(total) = grid.checked_len() {
        if n_iter > total {
            trace_warn!(
                n_iter,
                grid_size = total,
                "n_iter exceeds the number of distinct combinations; sampling the full grid"
            );
        }
        return rng_util::sample_distinct(total, n_iter, rng)
            .into_iter()
            .filter_map(|i| grid.get(i))
            .collect();
    }

    // Too many combinations to index: pick one value per parameter and
    // reject repeats.
    let counts: Vec<usize> = grid.value_counts().collect();
    let mut seen = HashSet::new();
    let mut drawn = Vec::new();
    while drawn.len() < n_iter {
        let picked: Vec<usize> = counts.iter().map(|&n| rng.usize(..n)).collect();
        if seen.insert(picked.clone()) {
            drawn.push(grid.combination(&picked));
        }
    }
    drawn
}

impl Iterator for ParameterSampler<'_> {
    type Item = Params;

    fn next(&mut self) -> Option<Params> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match &mut self.drawn {
            Some(drawn) => drawn.next(),
            None => Some(self.space.sample(&mut self.rng)),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ParameterSampler<'_> {}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_float() {
        let mut rng = fastrand::Rng::with_seed(42);
        let dist = Distribution::uniform(0.0, 1.0);
        for _ in 0..100 {
            let ParamValue::Float(v) = dist.sample(&mut rng) else {
                panic!("Expected Float value");
            };
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_sample_float_log() {
        let mut rng = fastrand::Rng::with_seed(42);
        let dist = Distribution::log_uniform(1e-5, 1.0);
        let mut below = 0;
        for _ in 0..1000 {
            let v = dist.sample(&mut rng).as_f64().unwrap();
            assert!((1e-5..=1.0).contains(&v));
            if v < 1e-2 {
                below += 1;
            }
        }
        // log-uniform puts ~60% of the mass below 1e-2
        assert!(below > 450, "only {below} samples below 1e-2");
    }

    #[test]
    fn test_sample_float_step() {
        let mut rng = fastrand::Rng::with_seed(42);
        let dist = Distribution::stepped(0.0, 1.0, 0.25);
        for _ in 0..100 {
            let v = dist.sample(&mut rng).as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v));
            let k = (v / 0.25).round() as i64;
            assert!((v - k as f64 * 0.25).abs() < 1e-10);
        }
    }

    #[test]
    fn test_sample_int_variants() {
        let mut rng = fastrand::Rng::with_seed(42);
        let uniform = Distribution::int_uniform(0, 10);
        let log = Distribution::int_log_uniform(1, 1000);
        let stepped = Distribution::int_stepped(0, 10, 2);
        for _ in 0..100 {
            let u = uniform.sample(&mut rng).as_i64().unwrap();
            assert!((0..=10).contains(&u));
            let l = log.sample(&mut rng).as_i64().unwrap();
            assert!((1..=1000).contains(&l));
            let s = stepped.sample(&mut rng).as_i64().unwrap();
            assert!((0..=10).contains(&s) && s % 2 == 0);
        }
    }

    #[test]
    fn test_sample_choice() {
        let mut rng = fastrand::Rng::with_seed(42);
        let dist = Distribution::choice(["lbfgs", "liblinear", "saga"]);
        for _ in 0..50 {
            let v = dist.sample(&mut rng);
            assert!(dist.choices().unwrap().contains(&v));
        }
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            Distribution::uniform(1.0, 0.0).validate("x"),
            Err(Error::InvalidBounds { .. })
        ));
        assert!(matches!(
            Distribution::log_uniform(0.0, 1.0).validate("x"),
            Err(Error::InvalidLogBounds)
        ));
        assert!(matches!(
            Distribution::stepped(0.0, 1.0, 0.0).validate("x"),
            Err(Error::InvalidStep)
        ));
        assert!(matches!(
            Distribution::int_log_uniform(0, 5).validate("x"),
            Err(Error::InvalidLogBounds)
        ));
        assert!(matches!(
            Distribution::choice(Vec::<f64>::new()).validate("solver"),
            Err(Error::EmptyChoices(ref n)) if n == "solver"
        ));
        assert!(Distribution::uniform(f64::NAN, 1.0).validate("x").is_err());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ParamDistributions::builder()
            .add("c", Distribution::uniform(0.0, 1.0))
            .add("c", Distribution::uniform(0.0, 2.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGrid { .. }));
    }

    #[test]
    fn test_sampler_reproducible() {
        let space = ParamDistributions::builder()
            .add("c", Distribution::log_uniform(1e-3, 1e3))
            .add("max_iter", Distribution::int_uniform(50, 500))
            .build()
            .unwrap();
        let a: Vec<_> = space.sampler(3, fastrand::Rng::with_seed(9)).collect();
        let b: Vec<_> = space.sampler(3, fastrand::Rng::with_seed(9)).collect();
        assert_eq!(a.len(), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_discrete_space_without_replacement() {
        let space = ParamDistributions::builder()
            .add("c", Distribution::choice([0.1, 1.0, 10.0]))
            .add("penalty", Distribution::choice(["l1", "l2"]))
            .build()
            .unwrap();
        assert_eq!(space.n_draws(10), 6);
        let drawn: Vec<_> = space.sampler(10, fastrand::Rng::with_seed(1)).collect();
        assert_eq!(drawn.len(), 6);
        for (i, a) in drawn.iter().enumerate() {
            for b in &drawn[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    fn choice_space(n_params: usize, n_choices: i64) -> ParamDistributions {
        let mut builder = ParamDistributions::builder();
        for k in 0..n_params {
            builder = builder.add(format!("p{k}"), Distribution::choice(0..n_choices));
        }
        builder.build().unwrap()
    }

    fn assert_distinct(drawn: &[Params]) {
        for (i, a) in drawn.iter().enumerate() {
            for b in &drawn[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_discrete_space_too_large_to_count() {
        // 30^14 combinations overflow a usize
        let space = choice_space(14, 30);
        assert_eq!(space.n_draws(5), 5);

        let drawn: Vec<_> = space.sampler(5, fastrand::Rng::with_seed(2)).collect();
        assert_eq!(drawn.len(), 5);
        assert_distinct(&drawn);
        for params in &drawn {
            assert_eq!(params.len(), 14);
            assert!(params.iter().all(|(_, v)| (0..30).contains(&v.as_i64().unwrap())));
        }

        let again: Vec<_> = space.sampler(5, fastrand::Rng::with_seed(2)).collect();
        assert_eq!(drawn, again);
    }

    #[test]
    fn test_large_discrete_space_draws_only_n_iter() {
        // 40^5 = 1.024e8 combinations; only three are materialised
        let space = choice_space(5, 40);
        let sampler = space.sampler(3, fastrand::Rng::with_seed(8));
        assert_eq!(sampler.len(), 3);
        let drawn: Vec<_> = sampler.collect();
        assert_eq!(drawn.len(), 3);
        assert_distinct(&drawn);
    }
}
