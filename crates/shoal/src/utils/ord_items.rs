//! Total-order adapters for partially ordered values.
//!
//! Distances are `f64`, which is only `PartialOrd`; these wrappers impose a
//! total order (treating incomparable values as equal) so distances can be
//! used with `BinaryHeap` and the `*_by_key` family.

use core::cmp::Ordering;
use core::fmt;

/// Orders by the second field, ascending. In a `BinaryHeap` this yields a
/// max-heap on the value, which is what a bounded "k smallest" heap needs.
pub struct MinItem<A, T: PartialOrd>(pub A, pub T);

impl<A: fmt::Debug, T: PartialOrd + fmt::Debug> fmt::Debug for MinItem<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MinItem").field(&self.0).field(&self.1).finish()
    }
}

impl<A, T: PartialOrd> PartialEq for MinItem<A, T> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl<A, T: PartialOrd> Eq for MinItem<A, T> {}

impl<A, T: PartialOrd> PartialOrd for MinItem<A, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A, T: PartialOrd> Ord for MinItem<A, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.1.partial_cmp(&other.1).unwrap_or(Ordering::Equal)
    }
}

