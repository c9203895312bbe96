use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{KnnError, Result};
use crate::index::TermIndex;
use crate::similarity::Similarity;
use crate::token::{StdTokenizer, Tokenizer};
use crate::weight::WeightScheme;

use super::KnnClassifier;

pub const DEFAULT_K: usize = 1;

/// Serializable classifier settings
///
/// Missing fields fall back to `k = 1`, binary weights and cosine similarity,
/// so a partial table in a config file is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnOptions {
    /// number of neighbors that vote
    pub k: usize,
    pub weight_scheme: WeightScheme,
    pub similarity: Similarity,
}

impl Default for KnnOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            weight_scheme: WeightScheme::default(),
            similarity: Similarity::default(),
        }
    }
}

impl KnnOptions {
    pub fn validate(&self) -> Result<()> {
        if self.k < 1 {
            return Err(KnnError::Configuration {
                param: "k",
                value: self.k.to_string(),
                constraint: "must be a positive integer",
            });
        }
        Ok(())
    }
}

/// Named-option construction of a [`KnnClassifier`]
///
/// ```
/// use knn_classifier::{KnnClassifier, Similarity, WeightScheme};
///
/// let knn = KnnClassifier::builder()
///     .k(4)
///     .similarity(Similarity::Euclidean)
///     .weight_scheme(WeightScheme::TermFrequency)
///     .build()
///     .unwrap();
/// assert_eq!(knn.options().k, 4);
/// ```
#[derive(Debug, Default)]
pub struct KnnBuilder {
    options: KnnOptions,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    term_index: Option<Arc<TermIndex>>,
}

impl KnnBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn k(mut self, k: usize) -> Self {
        self.options.k = k;
        self
    }

    pub fn weight_scheme(mut self, scheme: WeightScheme) -> Self {
        self.options.weight_scheme = scheme;
        self
    }

    pub fn similarity(mut self, similarity: Similarity) -> Self {
        self.options.similarity = similarity;
        self
    }

    /// replace all settings at once
    pub fn options(mut self, options: KnnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tokenizer<T>(mut self, tokenizer: T) -> Self
    where
        T: Tokenizer + 'static,
    {
        self.tokenizer = Some(Arc::new(tokenizer));
        self
    }

    pub fn shared_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Use an existing vocabulary, possibly shared with other classifiers
    pub fn term_index(mut self, index: Arc<TermIndex>) -> Self {
        self.term_index = Some(index);
        self
    }

    /// Fails fast on invalid settings, nothing is clamped here
    pub fn build(self) -> Result<KnnClassifier> {
        self.options.validate()?;
        Ok(KnnClassifier::from_parts(
            self.options,
            self.tokenizer.unwrap_or_else(|| Arc::new(StdTokenizer::new())),
            self.term_index.unwrap_or_default(),
            Default::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = KnnOptions::default();
        assert_eq!(opts.k, 1);
        assert_eq!(opts.weight_scheme, WeightScheme::Binary);
        assert_eq!(opts.similarity, Similarity::Cosine);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn zero_k_is_rejected_at_build() {
        let err = KnnBuilder::new().k(0).build().unwrap_err();
        assert!(matches!(err, KnnError::Configuration { param: "k", .. }));
    }

    #[test]
    fn builder_carries_options() {
        let knn = KnnBuilder::new()
            .k(3)
            .weight_scheme(WeightScheme::LogNorm)
            .similarity(Similarity::Pearson)
            .build()
            .unwrap();
        assert_eq!(
            *knn.options(),
            KnnOptions {
                k: 3,
                weight_scheme: WeightScheme::LogNorm,
                similarity: Similarity::Pearson,
            }
        );
    }

    #[test]
    fn builder_shares_term_index() {
        let index = Arc::new(TermIndex::new());
        let a = KnnBuilder::new().term_index(Arc::clone(&index)).build().unwrap();
        let b = KnnBuilder::new().term_index(Arc::clone(&index)).build().unwrap();
        a.train_str("shared words", "x").unwrap();
        assert_eq!(b.term_index().index_of("shared"), Some(0));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let opts: KnnOptions = serde_cbor::from_slice(
            &serde_cbor::to_vec(&std::collections::BTreeMap::from([("k", 5usize)])).unwrap(),
        )
        .unwrap();
        assert_eq!(opts.k, 5);
        assert_eq!(opts.similarity, Similarity::Cosine);
    }
}
