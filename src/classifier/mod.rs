pub mod options;
pub mod serde;
pub mod vote;

use std::io::Read;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::error::{KnnError, Result};
use crate::index::TermIndex;
use crate::matrix::SparseMatrix;
use crate::token::{StdTokenizer, TermCounts, Tokenizer};

pub use self::options::{KnnBuilder, KnnOptions};
pub use self::vote::{majority, Hits, Neighbor};

/// Text classifier seam shared by classifier implementations
pub trait Classifier {
    /// Train on a document read to its end
    /// A read failure aborts before any state changes
    fn train(&self, reader: &mut dyn Read, category: &str) -> Result<()> {
        let doc = read_document(reader)?;
        self.train_str(&doc, category)
    }

    fn train_str(&self, doc: &str, category: &str) -> Result<()>;

    /// Classify a document read to its end
    fn classify(&self, reader: &mut dyn Read) -> Result<String> {
        let doc = read_document(reader)?;
        self.classify_str(&doc)
    }

    fn classify_str(&self, doc: &str) -> Result<String>;
}

fn read_document(reader: &mut dyn Read) -> Result<String> {
    let mut doc = String::new();
    reader.read_to_string(&mut doc)?;
    Ok(doc)
}

/// Everything a train call mutates, guarded by one lock
#[derive(Debug, Clone, Default)]
pub(crate) struct TrainedState {
    pub(crate) matrix: SparseMatrix,
    /// category of matrix row i
    pub(crate) categories: Vec<String>,
}

/// k-nearest-neighbor text classifier
///
/// Training appends one weighted sparse row per document. Classification
/// scores the query against every stored row and takes a majority vote over
/// the k best.
///
/// # Thread Safety
/// Train takes the write lock for its whole duration; classify calls share
/// the read lock and run concurrently. The term index has its own lock, so
/// vocabulary first seen in a query is registered without upgrading.
/// Classify may be called from rayon workers. Train must not be called from
/// inside the rayon pool while classify calls run there.
///
/// ```
/// use knn_classifier::KnnClassifier;
///
/// let knn = KnnClassifier::new();
/// knn.train_str("aaa bbb ccc ddd", "A").unwrap();
/// knn.train_str("111 222 333 444 zzz", "X").unwrap();
/// assert_eq!(knn.classify_str("bbb ccc ddd").unwrap(), "A");
/// ```
#[derive(Debug)]
pub struct KnnClassifier {
    options: KnnOptions,
    tokenizer: Arc<dyn Tokenizer>,
    term_index: Arc<TermIndex>,
    state: RwLock<TrainedState>,
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl KnnClassifier {
    /// k = 1, binary weights, cosine similarity, default tokenizer
    pub fn new() -> Self {
        Self::from_parts(
            KnnOptions::default(),
            Arc::new(StdTokenizer::new()),
            Arc::new(TermIndex::new()),
            TrainedState::default(),
        )
    }

    pub fn builder() -> KnnBuilder {
        KnnBuilder::new()
    }

    pub fn with_options(options: KnnOptions) -> Result<Self> {
        KnnBuilder::new().options(options).build()
    }

    pub(crate) fn from_parts(
        options: KnnOptions,
        tokenizer: Arc<dyn Tokenizer>,
        term_index: Arc<TermIndex>,
        state: TrainedState,
    ) -> Self {
        Self {
            options,
            tokenizer,
            term_index,
            state: RwLock::new(state),
        }
    }

    pub fn options(&self) -> &KnnOptions {
        &self.options
    }

    pub fn term_index(&self) -> &Arc<TermIndex> {
        &self.term_index
    }

    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// number of trained rows
    pub fn len(&self) -> usize {
        self.state.read().matrix.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// categories in training order
    pub fn categories(&self) -> Vec<String> {
        self.state.read().categories.clone()
    }

    /// Tokenize a document with this classifier's tokenizer
    pub fn term_counts(&self, doc: &str) -> TermCounts {
        TermCounts::from_tokens(self.tokenizer.tokenize(doc))
    }

    pub fn train_str(&self, doc: &str, category: &str) -> Result<()> {
        let counts = self.term_counts(doc);
        self.train_counts(&counts, category).map(|_| ())
    }

    pub fn train_reader<R: Read>(&self, mut reader: R, category: &str) -> Result<()> {
        Classifier::train(self, &mut reader, category)
    }

    /// Train on already counted terms and return the new row number
    pub fn train_counts(&self, counts: &TermCounts, category: &str) -> Result<usize> {
        if category.is_empty() {
            return Err(KnnError::EmptyCategory);
        }

        let mut state = self.state.write();
        // one registration per distinct term per document
        for term in counts.terms() {
            self.term_index.add(term);
        }
        state.categories.push(category.to_string());
        let row = state
            .matrix
            .add(&self.term_index, self.options.weight_scheme, counts);

        if counts.is_empty() {
            warn!(row, category, "trained document has no terms, stored an empty row");
        }
        debug!(
            row,
            category,
            terms = counts.term_num(),
            vocabulary = self.term_index.count(),
            "trained document"
        );
        Ok(row)
    }

    pub fn classify_str(&self, doc: &str) -> Result<String> {
        let counts = self.term_counts(doc);
        self.classify_counts(&counts)
    }

    pub fn classify_reader<R: Read>(&self, mut reader: R) -> Result<String> {
        Classifier::classify(self, &mut reader)
    }

    /// Majority category among the k nearest training rows
    pub fn classify_counts(&self, counts: &TermCounts) -> Result<String> {
        let neighbors = self.neighbors_counts(counts)?;
        let (category, votes) = majority(neighbors.iter().map(|n| n.category.as_str()))
            .ok_or(KnnError::NotClassified("no neighbors to vote"))?;
        debug!(category, votes, k = neighbors.len(), "classified document");
        Ok(category.to_string())
    }

    /// The k nearest training rows, best first
    pub fn neighbors(&self, doc: &str) -> Result<Vec<Neighbor>> {
        let counts = self.term_counts(doc);
        self.neighbors_counts(&counts)
    }

    pub fn neighbors_counts(&self, counts: &TermCounts) -> Result<Vec<Neighbor>> {
        // a rayon worker waiting in par_rows below may steal another classify
        // on this thread; a recursive read cannot block behind a queued writer
        let state = self.state.read_recursive();
        if state.matrix.is_empty() {
            return Err(KnnError::NotClassified("classifier has no training data"));
        }
        if counts.is_empty() {
            return Err(KnnError::NotClassified("document has no terms"));
        }

        let known = self.term_index.count();
        let query = SparseMatrix::make_row(&self.term_index, self.options.weight_scheme, counts);
        let novel = self.term_index.count().saturating_sub(known);
        if novel > 0 {
            trace!(novel, "registered query vocabulary");
        }

        let similarity = self.options.similarity;
        let mut hits = Hits::new(
            state
                .matrix
                .par_rows()
                .enumerate()
                .map(|(i, row)| (i, similarity.score(&row, &query)))
                .collect(),
        );
        hits.sort_by_score();

        let k = self.options.k.min(hits.len());
        debug!(rows = hits.len(), k, "scored training rows");
        Ok(hits
            .top_k(k)
            .map(|&(row, score)| Neighbor {
                row,
                score,
                category: state.categories[row].clone(),
            })
            .collect())
    }
}

impl Classifier for KnnClassifier {
    fn train_str(&self, doc: &str, category: &str) -> Result<()> {
        KnnClassifier::train_str(self, doc, category)
    }

    fn classify_str(&self, doc: &str) -> Result<String> {
        KnnClassifier::classify_str(self, doc)
    }
}
