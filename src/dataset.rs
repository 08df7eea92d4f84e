//! Immutable classification datasets and borrowed index views.

use crate::error::{Error, Result};

/// An ordered sequence of `(features, label)` pairs.
///
/// The dataset never changes after construction. Folds and nested splits
/// refer to it through [`DatasetView`]s, which borrow the data and carry only
/// an index list.
///
/// # Examples
///
/// ```
/// use hypertune::Dataset;
///
/// let data = Dataset::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]], vec![0, 1]).unwrap();
/// assert_eq!(data.len(), 2);
/// assert_eq!(data.n_features(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    records: Vec<Vec<f64>>,
    targets: Vec<usize>,
}

impl Dataset {
    /// Creates a dataset from feature rows and class labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the number of labels differs
    /// from the number of rows, or if rows have different widths.
    pub fn new(records: Vec<Vec<f64>>, targets: Vec<usize>) -> Result<Self> {
        if records.len() != targets.len() {
            return Err(Error::DimensionMismatch {
                expected: records.len(),
                got: targets.len(),
                index: targets.len(),
            });
        }
        if let Some(first) = records.first() {
            let width = first.len();
            if let Some((index, row)) = records.iter().enumerate().find(|(_, r)| r.len() != width)
            {
                return Err(Error::DimensionMismatch {
                    expected: width,
                    got: row.len(),
                    index,
                });
            }
        }
        Ok(Self { records, targets })
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if the dataset holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of features per sample (0 for an empty dataset).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.records.first().map_or(0, Vec::len)
    }

    /// All feature rows.
    #[must_use]
    pub fn records(&self) -> &[Vec<f64>] {
        &self.records
    }

    /// All class labels.
    #[must_use]
    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// Distinct class labels in ascending order.
    #[must_use]
    pub fn classes(&self) -> Vec<usize> {
        let mut classes = self.targets.clone();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    /// A view covering every sample.
    #[must_use]
    pub fn view(&self) -> DatasetView<'_> {
        DatasetView {
            dataset: self,
            indices: (0..self.len()).collect(),
        }
    }

    /// A view over the given sample indices.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> DatasetView<'_> {
        assert!(
            indices.iter().all(|&i| i < self.len()),
            "dataset index out of bounds"
        );
        DatasetView {
            dataset: self,
            indices: indices.to_vec(),
        }
    }
}

/// A borrowed subset of a [`Dataset`], addressed by global sample indices.
#[derive(Clone, Debug)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> DatasetView<'a> {
    /// Number of samples in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The underlying dataset.
    #[must_use]
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Global indices of the samples in this view.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Iterates over feature rows.
    pub fn records(&self) -> impl ExactSizeIterator<Item = &'a [f64]> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| dataset.records[i].as_slice())
    }

    /// Iterates over class labels.
    pub fn targets(&self) -> impl ExactSizeIterator<Item = usize> + '_ {
        self.indices.iter().map(|&i| self.dataset.targets[i])
    }

    /// Iterates over `(features, label)` pairs.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&'a [f64], usize)> + '_ {
        let dataset = self.dataset;
        self.indices
            .iter()
            .map(move |&i| (dataset.records[i].as_slice(), dataset.targets[i]))
    }

    /// Copies the feature rows out of the view.
    #[must_use]
    pub fn to_records(&self) -> Vec<Vec<f64>> {
        self.records().map(<[f64]>::to_vec).collect()
    }

    /// Copies the labels out of the view.
    #[must_use]
    pub fn to_targets(&self) -> Vec<usize> {
        self.targets().collect()
    }

    /// A view over a subset of this view, addressed by local positions.
    ///
    /// Position `p` refers to `self.indices()[p]`; the result still carries
    /// global indices.
    #[must_use]
    pub fn subset(&self, positions: &[usize]) -> DatasetView<'a> {
        DatasetView {
            dataset: self.dataset,
            indices: positions.iter().map(|&p| self.indices[p]).collect(),
        }
    }
}
