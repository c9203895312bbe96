pub mod stopwords;

use std::fmt::Debug;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use self::stopwords::is_not_stop_word;

/// Tokenizer collaborator
/// Breaks a document into a finite, lazy sequence of normalized terms.
/// Each call produces a fresh sequence; the caller drains it fully.
pub trait Tokenizer: Send + Sync + Debug {
    fn tokenize<'a>(&'a self, doc: &'a str) -> Box<dyn Iterator<Item = String> + 'a>;
}

/// How `StdTokenizer` finds word boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// split on unicode whitespace
    #[default]
    Whitespace,
    /// split on every character that is not alphanumeric
    Alpha,
}

/// Default tokenizer
/// splits, drops english stop words, then lowercases
#[derive(Debug, Clone, Default)]
pub struct StdTokenizer {
    mode: SplitMode,
    keep_stop_words: bool,
}

impl StdTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha() -> Self {
        Self {
            mode: SplitMode::Alpha,
            keep_stop_words: false,
        }
    }

    pub fn with_mode(mut self, mode: SplitMode) -> Self {
        self.mode = mode;
        self
    }

    /// keep stop words instead of filtering them out
    pub fn keep_stop_words(mut self, keep: bool) -> Self {
        self.keep_stop_words = keep;
        self
    }
}

impl Tokenizer for StdTokenizer {
    fn tokenize<'a>(&'a self, doc: &'a str) -> Box<dyn Iterator<Item = String> + 'a> {
        let words: Box<dyn Iterator<Item = &'a str> + 'a> = match self.mode {
            SplitMode::Whitespace => Box::new(doc.split_whitespace()),
            SplitMode::Alpha => Box::new(
                doc.split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty()),
            ),
        };
        let keep = self.keep_stop_words;
        Box::new(
            words
                .filter(move |w| keep || is_not_stop_word(w))
                .map(|w| w.to_lowercase()),
        )
    }
}

/// TermCounts 構造体
/// Per-document term occurrence counts.
/// Terms iterate in first-seen order, which keeps id assignment deterministic.
///
/// # Examples
/// ```
/// use knn_classifier::TermCounts;
/// let mut counts = TermCounts::new();
/// counts.add_term("rust");
/// counts.add_term("safe");
/// counts.add_term("rust");
/// assert_eq!(counts.term_count("rust"), 2);
/// assert_eq!(counts.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermCounts {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

impl TermCounts {
    pub fn new() -> Self {
        TermCounts {
            term_count: IndexMap::new(),
            total_term_count: 0,
        }
    }

    /// Drain a token sequence into counts
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut counts = Self::new();
        for token in tokens {
            *counts.term_count.entry(token).or_insert(0) += 1;
            counts.total_term_count += 1;
        }
        counts
    }

    /// termを追加する
    /// returns the count of the term before this call
    #[inline]
    pub fn add_term(&mut self, term: &str) -> u32 {
        self.total_term_count += 1;
        match self.term_count.get_mut(term) {
            Some(count) => {
                *count += 1;
                *count - 1
            }
            None => {
                self.term_count.insert(term.to_string(), 1);
                0
            }
        }
    }

    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    #[inline]
    pub fn contains_term(&self, term: &str) -> bool {
        self.term_count.contains_key(term)
    }

    /// number of distinct terms
    #[inline]
    pub fn term_num(&self) -> usize {
        self.term_count.len()
    }

    /// number of tokens including repeats
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }

    /// (term, count) in first-seen order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(t, &c)| (t.as_str(), c))
    }

    #[inline]
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.term_count.keys().map(String::as_str)
    }
}

/// Term counts of a document using the default tokenizer
pub fn word_counts(doc: &str) -> TermCounts {
    TermCounts::from_tokens(StdTokenizer::new().tokenize(doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_tokenizer_filters_and_lowercases() {
        let tokens: Vec<String> = StdTokenizer::new()
            .tokenize("The Quick brown FOX and the dog")
            .collect();
        assert_eq!(tokens, vec!["quick", "brown", "fox", "dog"]);
    }

    #[test]
    fn alpha_mode_splits_on_punctuation() {
        let tokens: Vec<String> = StdTokenizer::alpha()
            .tokenize("Super-Bowl, 2023: Eagles!")
            .collect();
        assert_eq!(tokens, vec!["super", "bowl", "2023", "eagles"]);
    }

    #[test]
    fn keep_stop_words_disables_filter() {
        let tokens: Vec<String> = StdTokenizer::new()
            .keep_stop_words(true)
            .tokenize("the end")
            .collect();
        assert_eq!(tokens, vec!["the", "end"]);
    }

    #[test]
    fn tokenize_is_restartable_per_call() {
        let tokenizer = StdTokenizer::new();
        let first: Vec<String> = tokenizer.tokenize("aaa bbb").collect();
        let second: Vec<String> = tokenizer.tokenize("aaa bbb").collect();
        assert_eq!(first, second);
    }

    #[test]
    fn counts_keep_first_seen_order() {
        let counts = TermCounts::from_tokens(
            ["b", "a", "b", "c"].iter().map(|s| s.to_string()),
        );
        let order: Vec<&str> = counts.terms().collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(counts.term_count("b"), 2);
        assert_eq!(counts.term_count("zzz"), 0);
        assert_eq!(counts.term_num(), 3);
        assert_eq!(counts.term_sum(), 4);
    }

    #[test]
    fn add_term_reports_previous_count() {
        let mut counts = TermCounts::new();
        assert_eq!(counts.add_term("x"), 0);
        assert_eq!(counts.add_term("x"), 1);
        counts.add_terms(&["y", "x"]);
        assert_eq!(counts.term_count("x"), 3);
        assert!(counts.contains_term("y"));
    }

    #[test]
    fn word_counts_uses_default_tokenizer() {
        let counts = word_counts("the cat and the hat cat");
        assert_eq!(counts.term_count("cat"), 2);
        assert_eq!(counts.term_count("the"), 0);
        assert!(!counts.is_empty());
    }
}
