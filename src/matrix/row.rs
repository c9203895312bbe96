use std::borrow::Cow;
use std::fmt;

use crate::index::FeatureId;
use crate::matrix::sort::quick_sort_soa;

/// One document's term-weight vector, nonzero entries only.
///
/// `features` is sorted ascending without duplicates, paired by position
/// with `weights`. Rows yielded by [`SparseMatrix::rows`](super::SparseMatrix::rows)
/// borrow their segment of the matrix; query rows own their arrays.
#[derive(Clone, PartialEq)]
pub struct SparseRow<'a> {
    features: Cow<'a, [FeatureId]>,
    weights: Cow<'a, [f64]>,
    /// training row number, `None` for a detached query row
    index: Option<usize>,
}

impl<'a> SparseRow<'a> {
    /// Borrow an already sorted segment of the matrix
    pub(crate) fn borrowed(features: &'a [FeatureId], weights: &'a [f64], index: usize) -> Self {
        debug_assert_eq!(features.len(), weights.len());
        Self {
            features: Cow::Borrowed(features),
            weights: Cow::Borrowed(weights),
            index: Some(index),
        }
    }

    /// Detached row from unordered pairs; sorted here by feature id.
    /// Repeated feature ids are merged by summing their weights.
    pub fn from_unsorted(mut features: Vec<FeatureId>, mut weights: Vec<f64>) -> SparseRow<'static> {
        assert_eq!(features.len(), weights.len());
        quick_sort_soa(&mut features, &mut weights);
        merge_duplicates(&mut features, &mut weights);
        SparseRow {
            features: Cow::Owned(features),
            weights: Cow::Owned(weights),
            index: None,
        }
    }

    pub fn empty() -> SparseRow<'static> {
        SparseRow {
            features: Cow::Owned(Vec::new()),
            weights: Cow::Owned(Vec::new()),
            index: None,
        }
    }

    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// number of stored entries
    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[inline]
    pub fn features(&self) -> &[FeatureId] {
        &self.features
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// (feature, weight) at position i
    #[inline]
    pub fn column(&self, i: usize) -> (FeatureId, f64) {
        (self.features[i], self.weights[i])
    }

    #[inline]
    pub fn feature(&self, i: usize) -> FeatureId {
        self.features[i]
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f64)> + '_ {
        self.features.iter().copied().zip(self.weights.iter().copied())
    }

    /// Weight of a feature, 0 when absent
    #[inline]
    pub fn value(&self, feature: FeatureId) -> f64 {
        match self.features.binary_search(&feature) {
            Ok(i) => self.weights[i],
            Err(_) => 0.0,
        }
    }

    #[inline]
    pub fn contains(&self, feature: FeatureId) -> bool {
        self.features.binary_search(&feature).is_ok()
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// sum of squared weights
    pub fn square(&self) -> f64 {
        self.weights.iter().map(|w| w * w).sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.square().sqrt()
    }

    /// Dot product.
    /// The shorter row drives the scan; each of its features is looked up in
    /// the longer row by binary search, O(min(n,m) log max(n,m)).
    pub fn dot(&self, other: &SparseRow<'_>) -> f64 {
        let (short, long) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        short
            .iter()
            .map(|(feature, weight)| weight * long.value(feature))
            .sum()
    }

    /// New detached row restricted to `features`, weights looked up in self
    pub fn values(&self, features: &[FeatureId]) -> SparseRow<'static> {
        let weights = features.iter().map(|&f| self.value(f)).collect();
        SparseRow {
            features: Cow::Owned(features.to_vec()),
            weights: Cow::Owned(weights),
            index: None,
        }
    }

    pub fn into_owned(self) -> SparseRow<'static> {
        SparseRow {
            features: Cow::Owned(self.features.into_owned()),
            weights: Cow::Owned(self.weights.into_owned()),
            index: self.index,
        }
    }
}

/// Collapse runs of equal ids in a sorted SoA pair, in place
fn merge_duplicates(features: &mut Vec<FeatureId>, weights: &mut Vec<f64>) {
    if features.windows(2).all(|w| w[0] < w[1]) {
        return;
    }
    let mut write = 0;
    for read in 1..features.len() {
        if features[read] == features[write] {
            weights[write] += weights[read];
        } else {
            write += 1;
            features[write] = features[read];
            weights[write] = weights[read];
        }
    }
    features.truncate(write + 1);
    weights.truncate(write + 1);
}

impl fmt::Debug for SparseRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseRow")
            .field("index", &self.index)
            .field("features", &self.features)
            .field("weights", &self.weights)
            .finish()
    }
}
