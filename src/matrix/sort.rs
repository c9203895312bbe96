use crate::index::FeatureId;

/// Ranges at or below this length are finished by insertion sort.
const INSERTION_THRESHOLD: usize = 16;

/// In-place quicksort for SoA (inds/vals).
/// - Sorts by inds ascending
/// - Reorders vals in lockstep
/// - Iterative: pending ranges live on an explicit stack, never the call stack
///
/// The smaller side of each partition is processed first, so the stack
/// holds at most O(log n) ranges. Not stable.
pub fn quick_sort_soa<N>(inds: &mut [FeatureId], vals: &mut [N]) {
    assert_eq!(inds.len(), vals.len());
    let n = inds.len();
    if n <= 1 {
        return;
    }

    // inclusive (low, high)
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(2 * usize::BITS as usize);
    stack.push((0, n - 1));

    while let Some((low, high)) = stack.pop() {
        if high - low < INSERTION_THRESHOLD {
            insertion_sort_soa(&mut inds[low..=high], &mut vals[low..=high]);
            continue;
        }

        let pivot = partition(inds, vals, low, high);
        let left = (pivot > low + 1).then(|| (low, pivot - 1));
        let right = (pivot + 1 < high).then(|| (pivot + 1, high));

        match (left, right) {
            (Some(l), Some(r)) => {
                // larger pushed first, popped last
                if l.1 - l.0 > r.1 - r.0 {
                    stack.push(l);
                    stack.push(r);
                } else {
                    stack.push(r);
                    stack.push(l);
                }
            }
            (Some(l), None) => stack.push(l),
            (None, Some(r)) => stack.push(r),
            (None, None) => {}
        }
    }
}

/// Lomuto partition of `[low, high]` around a median-of-three pivot.
/// Returns the pivot's final position.
#[inline]
fn partition<N>(inds: &mut [FeatureId], vals: &mut [N], low: usize, high: usize) -> usize {
    let mid = low + (high - low) / 2;
    let median = median_of_three(inds, low, mid, high);
    inds.swap(median, high);
    vals.swap(median, high);

    let x = inds[high];
    let mut i = low;
    for j in low..high {
        if inds[j] <= x {
            inds.swap(i, j);
            vals.swap(i, j);
            i += 1;
        }
    }
    inds.swap(i, high);
    vals.swap(i, high);
    i
}

#[inline]
fn median_of_three(inds: &[FeatureId], a: usize, b: usize, c: usize) -> usize {
    let (x, y, z) = (inds[a], inds[b], inds[c]);
    if (x <= y) == (y <= z) {
        b
    } else if (y <= x) == (x <= z) {
        a
    } else {
        c
    }
}

/// Tiny insertion sort for small n (SoA).
#[inline(always)]
fn insertion_sort_soa<N>(inds: &mut [FeatureId], vals: &mut [N]) {
    let n = inds.len();
    for i in 1..n {
        let mut j = i;
        while j > 0 && inds[j] < inds[j - 1] {
            inds.swap(j, j - 1);
            vals.swap(j, j - 1);
            j -= 1;
        }
    }
}
