//! Top-K selection algorithms
//!
//! **Problem**: `ORDER BY abs_rank_diff DESC LIMIT K` is O(N log N) as a full sort.
//! Signatures only ever need the K most-changed dimensions.
//!
//! **Solution**: Min-heap based Top-K selection, O(N log K)
//!
//! Toyota Way Principles:
//! - **Kaizen**: Algorithmic improvement (O(N log N) → O(N log K))
//! - **Muda elimination**: Avoid unnecessary full sort

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Sort order for Top-K selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order (smallest K values)
    Ascending,
    /// Descending order (largest K values)
    Descending,
}

/// `f64` key with a total order (`f64::total_cmp`).
///
/// Positive `NaN` sorts above `+inf`, which matches how Postgres orders
/// `NaN` in `ORDER BY ... DESC`.
#[derive(Debug, Clone, Copy)]
pub struct TotalF64(pub f64);

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalF64 {}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Heap item for descending order (min-heap: keep smallest at top, so we can find largest K)
#[derive(Debug)]
struct MinHeapItem<K> {
    key: K,
    index: usize,
}

impl<K: Ord> PartialEq for MinHeapItem<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for MinHeapItem<K> {}

impl<K: Ord> Ord for MinHeapItem<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse comparison for min-heap (smallest at top); later index evicted first
        other
            .key
            .cmp(&self.key)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl<K: Ord> PartialOrd for MinHeapItem<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Heap item for ascending order (max-heap: keep largest at top, so we can find smallest K)
#[derive(Debug)]
struct MaxHeapItem<K> {
    key: K,
    index: usize,
}

impl<K: Ord> PartialEq for MaxHeapItem<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for MaxHeapItem<K> {}

impl<K: Ord> Ord for MaxHeapItem<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl<K: Ord> PartialOrd for MaxHeapItem<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select the top K items by `key`.
///
/// The result is sorted in `order`; items with equal keys keep their input
/// order. `k == 0` selects nothing, and `k` past the input length selects
/// everything.
///
/// # Examples
///
/// ```rust
/// use cwbench::topk::{top_k_by_key, SortOrder};
///
/// let top3 = top_k_by_key(vec![1, 5, 3, 9, 2], 3, SortOrder::Descending, |v| *v);
/// assert_eq!(top3, vec![9, 5, 3]);
/// ```
pub fn top_k_by_key<T, K, F>(
    items: impl IntoIterator<Item = T>,
    k: usize,
    order: SortOrder,
    key: F,
) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let items: Vec<T> = items.into_iter().collect();
    if k == 0 {
        return Vec::new();
    }

    let indices = match order {
        SortOrder::Descending => select_largest(&items, k, &key),
        SortOrder::Ascending => select_smallest(&items, k, &key),
    };

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    indices
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}

/// Time complexity: O(N log K), space O(K)
fn select_largest<T, K: Ord>(items: &[T], k: usize, key: impl Fn(&T) -> K) -> Vec<usize> {
    let mut heap: BinaryHeap<MinHeapItem<K>> = BinaryHeap::with_capacity(k.min(items.len()));

    for (index, item) in items.iter().enumerate() {
        let value = key(item);
        if heap.len() < k {
            heap.push(MinHeapItem { key: value, index });
        } else if let Some(top) = heap.peek() {
            if value > top.key {
                heap.pop();
                heap.push(MinHeapItem { key: value, index });
            }
        }
    }

    let mut result: Vec<_> = heap.into_vec();
    result.sort_by(|a, b| b.key.cmp(&a.key).then_with(|| a.index.cmp(&b.index)));
    result.into_iter().map(|item| item.index).collect()
}

fn select_smallest<T, K: Ord>(items: &[T], k: usize, key: impl Fn(&T) -> K) -> Vec<usize> {
    let mut heap: BinaryHeap<MaxHeapItem<K>> = BinaryHeap::with_capacity(k.min(items.len()));

    for (index, item) in items.iter().enumerate() {
        let value = key(item);
        if heap.len() < k {
            heap.push(MaxHeapItem { key: value, index });
        } else if let Some(top) = heap.peek() {
            if value < top.key {
                heap.pop();
                heap.push(MaxHeapItem { key: value, index });
            }
        }
    }

    let mut result: Vec<_> = heap.into_vec();
    result.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.index.cmp(&b.index)));
    result.into_iter().map(|item| item.index).collect()
}
