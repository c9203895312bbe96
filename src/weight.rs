use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::token::TermCounts;

/// Term weighting strategy
/// Maps a document's raw term counts to the weight stored for each term.
/// All schemes are pure functions of the document alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    /// 1 if the term occurs, 0 otherwise
    #[default]
    Binary,
    /// raw occurrence count
    BagOfWords,
    /// sqrt(count / distinct terms in the document)
    TermFrequency,
    /// ln(1 + count)
    LogNorm,
}

impl WeightScheme {
    pub const ALL: [WeightScheme; 4] = [
        WeightScheme::Binary,
        WeightScheme::BagOfWords,
        WeightScheme::TermFrequency,
        WeightScheme::LogNorm,
    ];

    /// Weight of `term` within `doc`
    #[inline]
    pub fn weight(&self, doc: &TermCounts, term: &str) -> f64 {
        self.weight_count(doc, doc.term_count(term))
    }

    /// Weight for a term already known to occur `count` times in `doc`
    #[inline]
    pub fn weight_count(&self, doc: &TermCounts, count: u32) -> f64 {
        let count = count as f64;
        match self {
            WeightScheme::Binary => {
                if count > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            WeightScheme::BagOfWords => count,
            WeightScheme::TermFrequency => {
                let distinct = doc.term_num();
                if distinct == 0 {
                    0.0
                } else {
                    (count / distinct as f64).sqrt()
                }
            }
            WeightScheme::LogNorm => (1.0 + count).ln(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeightScheme::Binary => "binary",
            WeightScheme::BagOfWords => "bag_of_words",
            WeightScheme::TermFrequency => "term_frequency",
            WeightScheme::LogNorm => "log_norm",
        }
    }
}

impl fmt::Display for WeightScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeightScheme {
    type Err = &'static str;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        match given {
            "binary" => Ok(WeightScheme::Binary),
            "bag_of_words" => Ok(WeightScheme::BagOfWords),
            "term_frequency" => Ok(WeightScheme::TermFrequency),
            "log_norm" => Ok(WeightScheme::LogNorm),
            _ => Err("unknown weight scheme"),
        }
    }
}
