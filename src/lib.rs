/// This crate is a k-nearest-neighbor text classifier over a sparse vector space.
pub mod classifier;
pub mod error;
pub mod index;
pub mod matrix;
pub mod similarity;
pub mod token;
pub mod weight;

/// KNN Classifier
/// The top-level struct of this crate. Training turns each document into a
/// weighted sparse row; classification scores a query against every row and
/// takes a majority vote over the k nearest.
///
/// Internally, it holds:
/// - The options (k, weight scheme, similarity)
/// - A tokenizer
/// - The term index, shared through `Arc<TermIndex>`
/// - The trained matrix and per-row categories behind one lock
///
/// # Thread Safety
/// Any number of classify calls run concurrently. Train calls are exclusive.
///
/// # Serialization
/// Supported, through `save`/`to_bytes`.
/// Deserialize into `KnnData` or use `load`/`from_bytes`.
pub use classifier::KnnClassifier;

/// Builder and serializable settings for `KnnClassifier`
/// Invalid settings fail at `build`, never later.
pub use classifier::options::{KnnBuilder, KnnOptions};

/// KNN Classifier Data Structure for Serialization
/// An owned snapshot of a trained classifier without its tokenizer.
/// Convert it back with `into_classifier`.
pub use classifier::serde::KnnData;

/// Classifier trait
/// The train/classify seam shared by text classifiers.
pub use classifier::Classifier;

/// A training row among the k nearest to a query
pub use classifier::vote::Neighbor;

/// Errors of the whole crate
pub use error::{KnnError, Result};

/// Term Index
/// Maps each vocabulary term to a dense, stable feature id and counts the
/// documents it appeared in.
///
/// # Thread Safety
/// Thread-safe, with its own lock. Can be shared among classifiers.
pub use index::{FeatureId, TermIndex};

/// Sparse row storage
/// - `SparseMatrix`: all trained rows in compressed sparse row layout
/// - `SparseRow`: one row, sorted by feature id, borrowed or owned
pub use matrix::{SparseMatrix, SparseRow};

/// Similarity Algorithm
/// - Cosine: cosine similarity
/// - Euclidean: 1 / (1 + euclidean distance)
/// - Pearson: correlation over shared features
pub use similarity::Similarity;

/// Tokenization and term counting
/// - `Tokenizer`: the pluggable splitting seam
/// - `StdTokenizer`: whitespace or alphabetic splitting with stop-word removal
/// - `TermCounts`: per-document term occurrence counts
pub use token::{word_counts, SplitMode, StdTokenizer, TermCounts, Tokenizer};

/// Weight Scheme
/// How a term count in a document becomes a matrix value.
pub use weight::WeightScheme;
