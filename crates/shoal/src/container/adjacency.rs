//! Adjacency collections over a fixed set of nodes.

use std::collections::HashSet;

use bitvec::prelude::BitVec;

/// An adjacency collection over nodes `0..size`, with a representation
/// chosen by the caller: a bit matrix (dense graphs, minimal memory), a
/// boolean matrix (dense graphs, fastest access), or per-node hash sets
/// (sparse graphs).
///
/// Edges are directed; callers model an undirected edge by setting both
/// directions, or use [`connect_undirected`](Self::connect_undirected).
pub enum Adjacency {
    /// One bit per ordered node pair.
    BitMatrix {
        /// Row-major edge bits.
        bits: BitVec,
        /// The number of nodes.
        size: usize,
    },
    /// One boolean per ordered node pair.
    Matrix {
        /// Row-major edge flags.
        cells: Vec<Vec<bool>>,
    },
    /// A hash set of successors per node.
    List {
        /// Successor sets, indexed by source node.
        successors: Vec<HashSet<usize>>,
    },
}

impl Adjacency {
    /// A bit-matrix collection over `size` nodes with no edges.
    #[must_use]
    pub fn bit_matrix(size: usize) -> Self {
        Self::BitMatrix {
            bits: BitVec::repeat(false, size * size),
            size,
        }
    }

    /// A boolean-matrix collection over `size` nodes with no edges.
    #[must_use]
    pub fn matrix(size: usize) -> Self {
        Self::Matrix {
            cells: vec![vec![false; size]; size],
        }
    }

    /// A list collection over `size` nodes with no edges.
    #[must_use]
    pub fn list(size: usize) -> Self {
        Self::List {
            successors: vec![HashSet::new(); size],
        }
    }

    /// The number of nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::BitMatrix { size, .. } => *size,
            Self::Matrix { cells } => cells.len(),
            Self::List { successors } => successors.len(),
        }
    }

    /// Sets the directed edge `from -> to`.
    pub fn connect(&mut self, from: usize, to: usize) {
        match self {
            Self::BitMatrix { bits, size } => bits.set(from * *size + to, true),
            Self::Matrix { cells } => cells[from][to] = true,
            Self::List { successors } => {
                successors[from].insert(to);
            }
        }
    }

    /// Sets both directed edges between `a` and `b`.
    pub fn connect_undirected(&mut self, a: usize, b: usize) {
        self.connect(a, b);
        self.connect(b, a);
    }

    /// Erases the directed edge `from -> to`.
    pub fn disconnect(&mut self, from: usize, to: usize) {
        match self {
            Self::BitMatrix { bits, size } => bits.set(from * *size + to, false),
            Self::Matrix { cells } => cells[from][to] = false,
            Self::List { successors } => {
                successors[from].remove(&to);
            }
        }
    }

    /// Whether the directed edge `from -> to` is set.
    #[must_use]
    pub fn has_connection(&self, from: usize, to: usize) -> bool {
        match self {
            Self::BitMatrix { bits, size } => bits[from * *size + to],
            Self::Matrix { cells } => cells[from][to],
            Self::List { successors } => successors[from].contains(&to),
        }
    }

    /// The successors of `node`, in ascending order.
    #[must_use]
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        match self {
            Self::BitMatrix { bits, size } => (0..*size).filter(|to| bits[node * *size + to]).collect(),
            Self::Matrix { cells } => cells[node]
                .iter()
                .enumerate()
                .filter_map(|(to, set)| set.then_some(to))
                .collect(),
            Self::List { successors } => {
                let mut neighbors = successors[node].iter().copied().collect::<Vec<_>>();
                neighbors.sort_unstable();
                neighbors
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::Adjacency;

    #[test_case(Adjacency::bit_matrix(4) ; "bit matrix")]
    #[test_case(Adjacency::matrix(4) ; "matrix")]
    #[test_case(Adjacency::list(4) ; "list")]
    fn edges_round_trip(mut adjacency: Adjacency) {
        assert_eq!(adjacency.size(), 4);
        adjacency.connect(0, 2);
        adjacency.connect_undirected(1, 3);
        assert!(adjacency.has_connection(0, 2));
        assert!(!adjacency.has_connection(2, 0));
        assert!(adjacency.has_connection(1, 3));
        assert!(adjacency.has_connection(3, 1));
        assert_eq!(adjacency.neighbors(1), vec![3]);

        adjacency.disconnect(0, 2);
        assert!(!adjacency.has_connection(0, 2));
        assert!(adjacency.neighbors(0).is_empty());
    }
}
