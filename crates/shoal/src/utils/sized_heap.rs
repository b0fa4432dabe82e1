//! A helper struct for maintaining a max heap of an optionally fixed size.

use std::collections::BinaryHeap;

use super::MinItem;

/// Maintains the `k` smallest items seen so far, by keeping them in a
/// max-heap and evicting the worst candidate on overflow.
///
/// This is the working set of the k-nearest-neighbor search: the heap's top
/// is the current worst candidate, whose distance is the pruning bound.
#[derive(Debug)]
pub struct SizedHeap<A, T: PartialOrd> {
    /// The heap of items.
    heap: BinaryHeap<MinItem<A, T>>,
    /// The maximum size of the heap.
    k: usize,
}

impl<A, T: PartialOrd> SizedHeap<A, T> {
    /// Creates a new `SizedHeap` with an optionally fixed size.
    #[must_use]
    pub fn new(k: Option<usize>) -> Self {
        k.map_or_else(
            || Self {
                heap: BinaryHeap::new(),
                k: usize::MAX,
            },
            |k| Self {
                heap: BinaryHeap::with_capacity(k),
                k,
            },
        )
    }

    /// Pushes an item onto the heap, maintaining the max size.
    pub fn push(&mut self, (a, item): (A, T)) {
        if self.heap.len() < self.k {
            self.heap.push(MinItem(a, item));
        } else if let Some(top) = self.heap.peek() {
            if item < top.1 {
                self.heap.pop();
                self.heap.push(MinItem(a, item));
            }
        }
    }

    /// Peeks at the top (worst) item in the heap.
    #[must_use]
    pub fn peek(&self) -> Option<(&A, &T)> {
        self.heap.peek().map(|MinItem(a, x)| (a, x))
    }

    /// Consumes the `SizedHeap` and returns the items in an iterator.
    pub fn take_items(self) -> impl Iterator<Item = (A, T)> {
        self.heap.into_iter().map(|MinItem(a, x)| (a, x))
    }

    /// Returns whether the heap is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns whether the heap is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }
}

#[cfg(test)]
mod tests {
    use super::SizedHeap;

    #[test]
    fn keeps_the_k_smallest() {
        let mut heap = SizedHeap::new(Some(3));
        assert!(heap.is_empty());
        for (i, d) in [5.0, 1.0, 4.0, 2.0, 3.0].into_iter().enumerate() {
            heap.push((i, d));
        }
        assert!(heap.is_full());
        let mut items = heap.take_items().map(|(_, d)| d).collect::<Vec<_>>();
        items.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
        assert_eq!(items, vec![1.0, 2.0, 3.0]);
    }
}
