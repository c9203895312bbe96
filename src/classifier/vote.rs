use std::fmt::Debug;

use indexmap::IndexMap;
use serde::Serialize;

/// A training row among the k nearest to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    /// training row number
    pub row: usize,
    pub score: f64,
    pub category: String,
}

/// Structure to store per-row similarity scores
pub struct Hits {
    /// (row, score)
    pub list: Vec<(usize, f64)>,
}

impl Hits {
    pub fn new(list: Vec<(usize, f64)>) -> Self {
        Hits { list }
    }

    /// Sort ascending by score.
    /// Equal scores put the earlier row last, so it ranks higher.
    pub fn sort_by_score(&mut self) -> &mut Self {
        self.list
            .sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(&a.0)));
        self
    }

    /// The last `k` entries, best first. `k` is clamped to the list length.
    pub fn top_k(&self, k: usize) -> impl Iterator<Item = &(usize, f64)> {
        self.list.iter().rev().take(k)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Hits [")?;
            for (row, score) in &self.list {
                writeln!(f, "    {}: {:.6}", row, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_list().entries(&self.list).finish()
        }
    }
}

/// Majority label and its vote count.
///
/// Labels are counted in the order given; on equal counts the label seen
/// first wins. Feed labels best-ranked first so ties go to the nearer
/// neighbor. `None` only for an empty input.
pub fn majority<'a, I>(labels: I) -> Option<(&'a str, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut votes: IndexMap<&'a str, usize> = IndexMap::new();
    for label in labels {
        *votes.entry(label).or_insert(0) += 1;
    }

    let mut best: Option<(&'a str, usize)> = None;
    for (label, count) in votes {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((label, count)),
        }
    }
    best
}
