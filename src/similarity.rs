use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::matrix::SparseRow;

/// Similarity scoring between two sparse rows
/// Higher scores mean more similar for every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Cosine similarity
    /// cos(θ) = Σ(a_i * b_i) / (||a|| * ||b||)
    /// 0 when either row has zero norm
    #[default]
    Cosine,
    /// Euclidean distance folded into (0, 1]
    /// s(a, b) = 1 / (1 + sqrt(Σ((a_i - b_i)^2)))
    /// taken over the union of both rows' features
    Euclidean,
    /// Pearson correlation over the features both rows share
    /// 0 when no feature is shared or either side is constant
    Pearson,
}

impl Similarity {
    pub const ALL: [Similarity; 3] = [Similarity::Cosine, Similarity::Euclidean, Similarity::Pearson];

    /// Score two rows. Never returns NaN: degenerate inputs score 0.
    #[inline]
    pub fn score(&self, a: &SparseRow<'_>, b: &SparseRow<'_>) -> f64 {
        let score = match self {
            Similarity::Cosine => cosine_similarity(a, b),
            Similarity::Euclidean => euclidean_similarity(a, b),
            Similarity::Pearson => pearson_correlation(a, b),
        };
        if score.is_finite() {
            score
        } else {
            0.0
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Similarity::Cosine => "cosine",
            Similarity::Euclidean => "euclidean",
            Similarity::Pearson => "pearson",
        }
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Similarity {
    type Err = &'static str;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        match given {
            "cosine" => Ok(Similarity::Cosine),
            "euclidean" => Ok(Similarity::Euclidean),
            "pearson" => Ok(Similarity::Pearson),
            _ => Err("unknown similarity"),
        }
    }
}

/// cosθ = A・B / (|A||B|)
pub fn cosine_similarity(a: &SparseRow<'_>, b: &SparseRow<'_>) -> f64 {
    let norm_sq = a.square() * b.square();
    if norm_sq == 0.0 {
        return 0.0;
    }
    // sqrt of the product keeps cos(a, a) at exactly 1
    a.dot(b) / norm_sq.sqrt()
}

/// 1 / (1 + |A - B|)
pub fn euclidean_similarity(a: &SparseRow<'_>, b: &SparseRow<'_>) -> f64 {
    let mut a_it = a.iter().fuse();
    let mut b_it = b.iter().fuse();
    let mut a_next = a_it.next();
    let mut b_next = b_it.next();
    let mut dist_sq = 0_f64;
    while let (Some((ia, va)), Some((ib, vb))) = (a_next, b_next) {
        match ia.cmp(&ib) {
            Ordering::Equal => {
                dist_sq += (va - vb) * (va - vb);
                a_next = a_it.next();
                b_next = b_it.next();
            }
            Ordering::Less => {
                dist_sq += va * va;
                a_next = a_it.next();
            }
            Ordering::Greater => {
                dist_sq += vb * vb;
                b_next = b_it.next();
            }
        }
    }
    // Remaining terms on either side
    while let Some((_, va)) = a_next {
        dist_sq += va * va;
        a_next = a_it.next();
    }
    while let Some((_, vb)) = b_next {
        dist_sq += vb * vb;
        b_next = b_it.next();
    }
    1.0 / (1.0 + dist_sq.sqrt())
}

/// Pearson correlation restricted to the intersection of both rows' features
pub fn pearson_correlation(a: &SparseRow<'_>, b: &SparseRow<'_>) -> f64 {
    let shared: Vec<_> = a.features().iter().copied().filter(|&f| b.contains(f)).collect();
    if shared.is_empty() {
        return 0.0;
    }
    let left = a.values(&shared);
    let right = b.values(&shared);

    let n = shared.len() as f64;
    let left_sum = left.sum();
    let right_sum = right.sum();
    let denom = ((left.square() - left_sum * left_sum / n) * (right.square() - right_sum * right_sum / n)).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (left.dot(&right) - left_sum * right_sum / n) / denom
}
