//! Cross-validation splitters.
//!
//! A [`Splitter`] turns a label sequence into train/validation [`Fold`]s. All
//! randomness comes from the generator passed to [`Splitter::split`], so a
//! seeded generator gives reproducible folds.
//!
//! | Splitter | Validation sets | Randomness |
//! |----------|-----------------|------------|
//! | [`KFold`] | Partition of all samples into contiguous blocks | Optional shuffle before blocking |
//! | [`StratifiedKFold`] | Partition preserving class proportions | Optional shuffle within each class |
//! | [`ShuffleSplit`] | Independent random subsets of fixed size | Always |

use crate::error::{Error, Result};
use crate::rng_util;

/// A train/validation partition of sample indices.
///
/// Both index lists are sorted and disjoint.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fold {
    /// Indices used to fit the model.
    pub train: Vec<usize>,
    /// Indices used to score the fitted model.
    pub validation: Vec<usize>,
}

impl Fold {
    fn new(mut train: Vec<usize>, mut validation: Vec<usize>) -> Self {
        train.sort_unstable();
        validation.sort_unstable();
        Self { train, validation }
    }

    /// Rewrites local positions into the indices they stand for.
    ///
    /// Used when a fold was computed over a subset: position `p` becomes
    /// `indices[p]`.
    #[must_use]
    pub fn map_indices(&self, indices: &[usize]) -> Fold {
        Fold::new(
            self.train.iter().map(|&p| indices[p]).collect(),
            self.validation.iter().map(|&p| indices[p]).collect(),
        )
    }
}

/// Produces cross-validation folds.
pub trait Splitter: Send + Sync {
    /// Number of folds produced.
    fn n_splits(&self) -> usize;

    /// Splits `targets.len()` samples into [`n_splits`](Self::n_splits) folds.
    ///
    /// Index `i` refers to `targets[i]`. Label-agnostic splitters only use
    /// the length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFoldCount`] if the fold count is below 2 or
    /// larger than the number of samples; splitter-specific configuration
    /// errors otherwise.
    fn split(&self, targets: &[usize], rng: &mut fastrand::Rng) -> Result<Vec<Fold>>;
}

impl<S: Splitter + ?Sized> Splitter for Box<S> {
    fn n_splits(&self) -> usize {
        (**self).n_splits()
    }

    fn split(&self, targets: &[usize], rng: &mut fastrand::Rng) -> Result<Vec<Fold>> {
        (**self).split(targets, rng)
    }
}

fn check_fold_count(n_splits: usize, n_samples: usize) -> Result<()> {
    if n_splits < 2 || n_splits > n_samples {
        return Err(Error::InvalidFoldCount {
            n_splits,
            n_samples,
        });
    }
    Ok(())
}

/// K-fold cross-validator.
///
/// Splits the samples into `k` consecutive blocks; the first `n % k` blocks
/// hold one extra sample. Each block is the validation set once.
///
/// # Examples
///
/// ```
/// use hypertune::split::{KFold, Splitter};
///
/// let folds = KFold::new(3).split(&[0; 7], &mut fastrand::Rng::with_seed(0)).unwrap();
/// assert_eq!(folds[0].validation, vec![0, 1, 2]);
/// assert_eq!(folds[1].validation, vec![3, 4]);
/// assert_eq!(folds[2].validation, vec![5, 6]);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
}

impl KFold {
    /// Creates a k-fold splitter with `n_splits` folds and no shuffling.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
        }
    }

    /// Shuffle sample order before blocking.
    #[must_use]
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}

impl Splitter for KFold {
    fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn split(&self, targets: &[usize], rng: &mut fastrand::Rng) -> Result<Vec<Fold>> {
        let n_samples = targets.len();
        check_fold_count(self.n_splits, n_samples)?;

        let mut order: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            rng.shuffle(&mut order);
        }

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for i in 0..self.n_splits {
            let len = if i < remainder { fold_size + 1 } else { fold_size };
            let end = start + len;
            let mut train = Vec::with_capacity(n_samples - len);
            train.extend_from_slice(&order[..start]);
            train.extend_from_slice(&order[end..]);
            folds.push(Fold::new(train, order[start..end].to_vec()));
            start = end;
        }
        Ok(folds)
    }
}

/// Stratified k-fold cross-validator.
///
/// Samples of each class are dealt round-robin across the folds, so every
/// validation set holds nearly the same class proportions as the whole
/// dataset. The validation sets still partition all samples.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
}

impl StratifiedKFold {
    /// Creates a stratified splitter with `n_splits` folds and no shuffling.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
        }
    }

    /// Shuffle samples within each class before dealing them out.
    #[must_use]
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }
}

impl Splitter for StratifiedKFold {
    fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn split(&self, targets: &[usize], rng: &mut fastrand::Rng) -> Result<Vec<Fold>> {
        let n_samples = targets.len();
        check_fold_count(self.n_splits, n_samples)?;

        let mut classes: Vec<usize> = targets.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let mut by_class: Vec<Vec<usize>> = classes
            .iter()
            .map(|&c| (0..n_samples).filter(|&i| targets[i] == c).collect())
            .collect();

        let smallest = by_class.iter().map(Vec::len).min().unwrap_or(0);
        if smallest < self.n_splits {
            trace_warn!(
                smallest,
                n_splits = self.n_splits,
                "least populated class has fewer members than n_splits"
            );
        }

        if self.shuffle {
            for members in &mut by_class {
                rng.shuffle(members);
            }
        }

        // Deal classes one after another, continuing the rotation across
        // class boundaries so fold sizes differ by at most one.
        let mut assignment = vec![0usize; n_samples];
        let mut next = 0usize;
        for members in &by_class {
            for &i in members {
                assignment[i] = next;
                next = (next + 1) % self.n_splits;
            }
        }

        Ok((0..self.n_splits)
            .map(|k| {
                let (validation, train): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|&i| assignment[i] == k);
                Fold::new(train, validation)
            })
            .collect())
    }
}

/// Size of each validation subset drawn by [`ShuffleSplit`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationSize {
    /// An absolute number of samples.
    Count(usize),
    /// A fraction of the samples, rounded up.
    Fraction(f64),
}

impl ValidationSize {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn resolve(self, n_samples: usize) -> Result<usize> {
        let size = match self {
            ValidationSize::Count(c) => c,
            ValidationSize::Fraction(f) if f > 0.0 && f < 1.0 => {
                (f * n_samples as f64).ceil() as usize
            }
            ValidationSize::Fraction(_) => 0,
        };
        if size == 0 || size >= n_samples {
            return Err(Error::InvalidValidationSize { size, n_samples });
        }
        Ok(size)
    }
}

/// Random-subset cross-validator.
///
/// Each fold independently samples a validation set of the configured size
/// without replacement; the rest is the training set. Validation sets of
/// different folds may overlap.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShuffleSplit {
    n_splits: usize,
    validation_size: ValidationSize,
}

impl ShuffleSplit {
    /// Creates a splitter producing `n_splits` random folds.
    #[must_use]
    pub fn new(n_splits: usize, validation_size: ValidationSize) -> Self {
        Self {
            n_splits,
            validation_size,
        }
    }
}

impl Splitter for ShuffleSplit {
    fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn split(&self, targets: &[usize], rng: &mut fastrand::Rng) -> Result<Vec<Fold>> {
        let n_samples = targets.len();
        check_fold_count(self.n_splits, n_samples)?;
        let size = self.validation_size.resolve(n_samples)?;

        Ok((0..self.n_splits)
            .map(|_| {
                let validation = rng_util::partial_shuffle(n_samples, size, rng);
                let mut in_validation = vec![false; n_samples];
                for &i in &validation {
                    in_validation[i] = true;
                }
                let train = (0..n_samples).filter(|&i| !in_validation[i]).collect();
                Fold::new(train, validation)
            })
            .collect())
    }
}
