pub mod row;
pub mod sort;

use std::fmt;
use std::iter::FusedIterator;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::index::{FeatureId, TermIndex};
use crate::token::TermCounts;
use crate::weight::WeightScheme;

pub use self::row::SparseRow;
use self::sort::quick_sort_soa;

const HEAD_ROWS: usize = 10;

/// Compressed sparse row storage of all trained documents
///
/// Row `i` occupies `[row_bounds[i], row_bounds[i + 1])` of the flat
/// `feature_ids`/`weights` arrays and is sorted by feature id within itself.
/// Rows are only ever appended.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct SparseMatrix {
    feature_ids: Vec<FeatureId>,
    weights: Vec<f64>,
    row_bounds: Vec<usize>,
}

impl Default for SparseMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseMatrix {
    pub fn new() -> Self {
        Self {
            feature_ids: Vec::new(),
            weights: Vec::new(),
            row_bounds: vec![0],
        }
    }

    /// Append a document as a new row and return its row number.
    ///
    /// Terms missing from the index are registered first.
    pub fn add(&mut self, index: &TermIndex, scheme: WeightScheme, doc: &TermCounts) -> usize {
        let start = self.feature_ids.len();
        self.feature_ids.reserve(doc.term_num());
        self.weights.reserve(doc.term_num());
        for (term, count) in doc.iter() {
            self.feature_ids.push(resolve(index, term));
            self.weights.push(scheme.weight_count(doc, count));
        }

        let end = self.feature_ids.len();
        quick_sort_soa(&mut self.feature_ids[start..end], &mut self.weights[start..end]);
        self.row_bounds.push(end);
        self.row_bounds.len() - 2
    }

    /// Build a detached row without storing it.
    ///
    /// A term the index has never seen is registered as a side effect, so
    /// repeated queries keep a consistent feature identity.
    pub fn make_row(index: &TermIndex, scheme: WeightScheme, doc: &TermCounts) -> SparseRow<'static> {
        let mut features = Vec::with_capacity(doc.term_num());
        let mut weights = Vec::with_capacity(doc.term_num());
        for (term, count) in doc.iter() {
            features.push(resolve(index, term));
            weights.push(scheme.weight_count(doc, count));
        }
        SparseRow::from_unsorted(features, weights)
    }

    /// Lazy one-shot iterator over all rows in row order
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            matrix: self,
            next: 0,
        }
    }

    /// All rows as a rayon parallel iterator, in row order
    pub fn par_rows(&self) -> impl IndexedParallelIterator<Item = SparseRow<'_>> + '_ {
        (0..self.row_count()).into_par_iter().map(move |i| self.row_unchecked(i))
    }

    pub fn row(&self, i: usize) -> Option<SparseRow<'_>> {
        (i < self.row_count()).then(|| self.row_unchecked(i))
    }

    #[inline]
    fn row_unchecked(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.row_bounds[i], self.row_bounds[i + 1]);
        SparseRow::borrowed(&self.feature_ids[start..end], &self.weights[start..end], i)
    }

    /// First rows, up to ten
    pub fn head(&self) -> Vec<SparseRow<'_>> {
        self.rows().take(HEAD_ROWS).collect()
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_bounds.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// stored entries across all rows
    #[inline]
    pub fn nnz(&self) -> usize {
        self.feature_ids.len()
    }

    /// "entries x rows"
    pub fn shape(&self) -> String {
        format!("{} x {}", self.nnz(), self.row_count())
    }

    /// Check the structural invariants of a decoded matrix
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.feature_ids.len() != self.weights.len() {
            return Err(format!(
                "feature/weight length mismatch: {} != {}",
                self.feature_ids.len(),
                self.weights.len()
            ));
        }
        if self.row_bounds.first() != Some(&0) {
            return Err("row boundaries must start at 0".to_string());
        }
        if self.row_bounds.windows(2).any(|w| w[0] > w[1]) {
            return Err("row boundaries are not monotonic".to_string());
        }
        if self.row_bounds.last() != Some(&self.feature_ids.len()) {
            return Err("row boundaries do not cover the entries".to_string());
        }
        for row in self.rows() {
            if row.features().windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("row {:?} is not sorted by feature id", row.index()));
            }
        }
        Ok(())
    }

    /// highest feature id referenced by any row
    pub(crate) fn max_feature(&self) -> Option<FeatureId> {
        self.feature_ids.iter().copied().max()
    }
}

#[inline]
fn resolve(index: &TermIndex, term: &str) -> FeatureId {
    match index.index_of(term) {
        Some(id) => id,
        // another thread may have registered it since the read
        None => index.register(term),
    }
}

impl fmt::Debug for SparseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "SparseMatrix ({}) [", self.shape())?;
            for row in self.rows() {
                writeln!(f, "    {:?}", row)?;
            }
            write!(f, "]")
        } else {
            f.debug_struct("SparseMatrix")
                .field("feature_ids", &self.feature_ids)
                .field("weights", &self.weights)
                .field("row_bounds", &self.row_bounds)
                .finish()
        }
    }
}

/// Iterator over the rows of a [`SparseMatrix`]
pub struct Rows<'a> {
    matrix: &'a SparseMatrix,
    next: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = SparseRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.matrix.row_count() {
            return None;
        }
        let row = self.matrix.row_unchecked(self.next);
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.matrix.row_count().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Rows<'_> {}
impl FusedIterator for Rows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(terms: &[&str]) -> TermCounts {
        let mut c = TermCounts::new();
        c.add_terms(terms);
        c
    }

    #[test]
    fn new_matrix_is_empty() {
        let m = SparseMatrix::new();
        assert_eq!(m.row_count(), 0);
        assert!(m.is_empty());
        assert_eq!(m.rows().count(), 0);
        assert_eq!(m.shape(), "0 x 0");
        assert!(m.row(0).is_none());
    }

    #[test]
    fn add_appends_sorted_rows() {
        let index = TermIndex::new();
        // pre-register so ids are not in document order
        for t in ["d", "c", "b", "a"] {
            index.add(t);
        }
        let mut m = SparseMatrix::new();
        assert_eq!(m.add(&index, WeightScheme::BagOfWords, &counts(&["a", "b", "a", "c"])), 0);
        assert_eq!(m.add(&index, WeightScheme::BagOfWords, &counts(&["d"])), 1);

        assert_eq!(m.row_count(), 2);
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.shape(), "4 x 2");

        let rows: Vec<_> = m.rows().collect();
        // ids: d=0 c=1 b=2 a=3
        assert_eq!(rows[0].features(), &[1, 2, 3]);
        assert_eq!(rows[0].weights(), &[1.0, 1.0, 2.0]);
        assert_eq!(rows[0].index(), Some(0));
        assert_eq!(rows[1].features(), &[0]);
        assert_eq!(rows[1].index(), Some(1));
        assert!(m.validate().is_ok());
    }

    #[test]
    fn add_registers_missing_terms() {
        let index = TermIndex::new();
        let mut m = SparseMatrix::new();
        m.add(&index, WeightScheme::Binary, &counts(&["x", "y"]));
        assert_eq!(index.count(), 2);
        assert_eq!(m.max_feature(), Some(1));
    }

    #[test]
    fn empty_document_adds_empty_row() {
        let index = TermIndex::new();
        let mut m = SparseMatrix::new();
        m.add(&index, WeightScheme::Binary, &TermCounts::new());
        assert_eq!(m.row_count(), 1);
        assert!(m.row(0).map(|r| r.is_empty()).unwrap_or(false));
    }

    #[test]
    fn make_row_is_detached_and_extends_index() {
        let index = TermIndex::new();
        index.add("known");
        let m = SparseMatrix::new();
        let row = SparseMatrix::make_row(&index, WeightScheme::Binary, &counts(&["novel", "known"]));
        assert_eq!(m.row_count(), 0);
        assert_eq!(row.index(), None);
        assert_eq!(row.features(), &[0, 1]);
        assert_eq!(index.index_of("novel"), Some(1));
        // registered once, frequency of known terms untouched
        assert_eq!(index.frequency("known"), 1.0);
    }

    #[test]
    fn rows_is_one_shot_and_restartable_by_new_call() {
        let index = TermIndex::new();
        let mut m = SparseMatrix::new();
        m.add(&index, WeightScheme::Binary, &counts(&["a"]));
        m.add(&index, WeightScheme::Binary, &counts(&["b"]));

        let mut rows = m.rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.next().is_some());
        assert!(rows.next().is_some());
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
        assert_eq!(m.rows().count(), 2);
    }

    #[test]
    fn par_rows_matches_rows() {
        let index = TermIndex::new();
        let mut m = SparseMatrix::new();
        for i in 0..50 {
            let doc: Vec<String> = (0..(i % 7 + 1)).map(|j| format!("t{}", (i * 3 + j) % 23)).collect();
            let terms: Vec<&str> = doc.iter().map(String::as_str).collect();
            m.add(&index, WeightScheme::LogNorm, &counts(&terms));
        }
        let seq: Vec<_> = m.rows().map(|r| r.into_owned()).collect();
        let par: Vec<_> = m.par_rows().map(|r| r.into_owned()).collect();
        assert_eq!(seq, par);
    }

    #[test]
    fn head_caps_at_ten_rows() {
        let index = TermIndex::new();
        let mut m = SparseMatrix::new();
        for i in 0..12 {
            m.add(&index, WeightScheme::Binary, &counts(&[format!("t{i}").as_str()]));
        }
        assert_eq!(m.head().len(), 10);
    }

    #[test]
    fn validate_rejects_broken_boundaries() {
        let m = SparseMatrix {
            feature_ids: vec![1, 0],
            weights: vec![1.0, 1.0],
            row_bounds: vec![0, 2],
        };
        assert!(m.validate().is_err());

        let m = SparseMatrix {
            feature_ids: vec![0],
            weights: vec![1.0],
            row_bounds: vec![0, 2, 1],
        };
        assert!(m.validate().is_err());
    }
}
