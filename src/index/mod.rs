use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Column id of a vocabulary term in the sparse vector space
pub type FeatureId = u32;

const DEFAULT_CAPACITY: usize = 10_000;

/// keep term ids and corpus frequencies in a thread-safe way
///
/// Ids are assigned densely in first-seen order starting at 0 and never
/// change: a term's id is its position in the insertion-ordered map, and
/// terms are never removed.
///
/// The index carries its own lock, independent of any classifier lock, so a
/// classifier holding only a shared lock on its rows can still register
/// vocabulary first seen in a query.
#[derive(Debug, Serialize, Deserialize)]
pub struct TermIndex {
    /// term -> cumulative frequency, positioned by id
    terms: RwLock<IndexMap<Box<str>, f64>>,
}

impl Default for TermIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for TermIndex {
    fn clone(&self) -> Self {
        Self {
            terms: RwLock::new(self.terms.read().clone()),
        }
    }
}

impl TermIndex {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: RwLock::new(IndexMap::with_capacity(capacity)),
        }
    }

    /// Rebuild from (term, frequency) pairs listed in id order
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<Box<str>>,
    {
        let map = terms
            .into_iter()
            .map(|(term, freq)| (term.into(), freq))
            .collect::<IndexMap<Box<str>, f64>>();
        Self {
            terms: RwLock::new(map),
        }
    }

    /// Register one occurrence of a term and return its id.
    /// Lookup, insert and increment happen under one write lock.
    pub fn add(&self, term: &str) -> FeatureId {
        let mut terms = self.terms.write();
        if let Some((id, _, freq)) = terms.get_full_mut(term) {
            *freq += 1.0;
            return id as FeatureId;
        }
        let (id, _) = terms.insert_full(term.into(), 1.0);
        id as FeatureId
    }

    /// Id of a term, registering it with frequency 1 if unseen.
    /// A known term keeps its frequency. Lookup and insert share one write lock.
    pub fn register(&self, term: &str) -> FeatureId {
        let mut terms = self.terms.write();
        if let Some(id) = terms.get_index_of(term) {
            return id as FeatureId;
        }
        let (id, _) = terms.insert_full(term.into(), 1.0);
        id as FeatureId
    }

    /// Id of a known term, `None` if the term was never added
    pub fn index_of(&self, term: &str) -> Option<FeatureId> {
        self.terms
            .read()
            .get_index_of(term)
            .map(|id| id as FeatureId)
    }

    /// Cumulative frequency across everything added, 0 for unseen terms
    pub fn frequency(&self, term: &str) -> f64 {
        self.terms.read().get(term).copied().unwrap_or(0.0)
    }

    /// Reverse lookup of an id
    pub fn term(&self, id: FeatureId) -> Option<String> {
        self.terms
            .read()
            .get_index(id as usize)
            .map(|(term, _)| term.to_string())
    }

    /// Number of distinct terms
    #[inline]
    pub fn count(&self) -> usize {
        self.terms.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.read().is_empty()
    }

    /// Snapshot of (term, frequency) in id order
    pub fn terms(&self) -> Vec<(String, f64)> {
        self.terms
            .read()
            .iter()
            .map(|(term, freq)| (term.to_string(), *freq))
            .collect()
    }
}
