use std::{cmp::Reverse, collections::BinaryHeap};

use ordered_float::OrderedFloat;

use crate::metric::Bounds;

/// The `k` best `(distance, index)` candidates seen so far for one query.
///
/// Candidates are ordered by distance, then by index, so the kept set and its
/// order do not depend on the order in which candidates arrive.
#[derive(Clone, Debug)]
pub struct NeighborHeap {
    k: usize,
    heap: BinaryHeap<(OrderedFloat<f64>, usize)>,
}

impl NeighborHeap {
    #[must_use]
    pub fn new(k: usize) -> Self {
        NeighborHeap {
            k,
            heap: BinaryHeap::with_capacity(k),
        }
    }

    /// Distance a candidate must beat to be kept; infinite until `k` are held.
    #[must_use]
    pub fn largest(&self) -> f64 {
        if self.heap.len() < self.k {
            return f64::INFINITY;
        }
        self.heap.peek().map_or(f64::INFINITY, |(distance, _)| distance.0)
    }

    pub fn push(&mut self, distance: f64, index: usize) {
        let candidate = (OrderedFloat(distance), index);
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if candidate < *worst {
                *worst = candidate;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Kept candidates in ascending order.
    #[must_use]
    pub fn into_sorted_vec(self) -> Vec<(f64, usize)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|(distance, index)| (distance.into_inner(), index))
            .collect()
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Entry<T> {
    lower: OrderedFloat<f64>,
    item: T,
    upper: OrderedFloat<f64>,
}

/// Min-priority queue of tree items keyed on their lower distance bound.
pub(crate) struct NodeHeap<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T: Ord> NodeHeap<T> {
    pub(crate) fn new() -> Self {
        NodeHeap {
            heap: BinaryHeap::new(),
        }
    }

    pub(crate) fn push(&mut self, bounds: Bounds, item: T) {
        self.heap.push(Reverse(Entry {
            lower: OrderedFloat(bounds.lower),
            item,
            upper: OrderedFloat(bounds.upper),
        }));
    }

    pub(crate) fn pop(&mut self) -> Option<(Bounds, T)> {
        self.heap.pop().map(|Reverse(entry)| {
            (
                Bounds {
                    lower: entry.lower.0,
                    upper: entry.upper.0,
                },
                entry.item,
            )
        })
    }
}
