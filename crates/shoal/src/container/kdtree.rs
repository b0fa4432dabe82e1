//! A balanced k-d tree over points of a fixed dimension.
//!
//! Nodes live in an arena owned by the tree; child and parent links are
//! indices into that arena, so there are no shared-ownership cycles. The
//! tree is balanced at construction by the median-on-discriminator rule and
//! is never rebalanced afterwards.

use core::cmp::Ordering;

use crate::dataset::{self, Point};
use crate::utils::SizedHeap;
use crate::{Error, Result};

/// A node of the tree: a point, an opaque payload, and arena links.
pub struct KdNode<P> {
    /// The node's point.
    point: Point,
    /// The payload attached to the point at construction.
    payload: P,
    /// The dimension this node splits on (`depth mod dimension`).
    discriminator: usize,
    /// Arena index of the left child.
    left: Option<usize>,
    /// Arena index of the right child.
    right: Option<usize>,
    /// Arena index of the parent; `None` for the root.
    parent: Option<usize>,
}

impl<P> KdNode<P> {
    /// The node's point.
    #[must_use]
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// The payload attached to the point at construction.
    #[must_use]
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    /// The dimension this node splits on.
    #[must_use]
    pub const fn discriminator(&self) -> usize {
        self.discriminator
    }

    /// Arena index of the parent node; `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }
}

/// A balanced k-d tree with a payload per point.
///
/// An empty tree is valid: every query returns an empty result. Querying
/// with a point of the wrong arity is a programming error and panics.
pub struct KdTree<P = ()> {
    /// The node arena; children precede nothing in particular, the root is
    /// tracked separately.
    nodes: Vec<KdNode<P>>,
    /// Arena index of the root node.
    root: Option<usize>,
    /// The arity shared by all points in the tree.
    dimension: usize,
}

impl KdTree<()> {
    /// Builds a balanced tree over `points` with unit payloads.
    ///
    /// # Errors
    ///
    /// - See [`new`](Self::new).
    pub fn from_points(points: Vec<Point>) -> Result<Self> {
        let payloads = vec![(); points.len()];
        Self::new(points, payloads)
    }
}

impl<P> KdTree<P> {
    /// Builds a balanced tree over `points`, attaching `payloads[i]` to
    /// `points[i]`.
    ///
    /// At depth `h` the discriminator is `h mod dimension`; the root of
    /// each subtree is the *leftmost* element whose discriminator value
    /// equals that of the median, so duplicate values on the split axis
    /// stay on the correct side.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `points` and `payloads` disagree on
    ///   length.
    /// - [`Error::DimensionMismatch`] if the points disagree on arity.
    pub fn new(points: Vec<Point>, payloads: Vec<P>) -> Result<Self> {
        if points.len() != payloads.len() {
            return Err(Error::InvalidArgument(format!(
                "{} points but {} payloads",
                points.len(),
                payloads.len()
            )));
        }
        if points.is_empty() {
            return Ok(Self {
                nodes: Vec::new(),
                root: None,
                dimension: 0,
            });
        }
        let dimension = dataset::dimension(&points)?;
        let mut payloads = payloads.into_iter().map(Some).collect::<Vec<_>>();
        let mut order = (0..points.len()).collect::<Vec<_>>();
        let mut nodes = Vec::with_capacity(points.len());
        let root = Self::build(&points, &mut payloads, &mut order, 0, None, &mut nodes, dimension);
        Ok(Self { nodes, root, dimension })
    }

    /// Recursively builds the subtree over `order`, returning its root.
    fn build(
        points: &[Point],
        payloads: &mut [Option<P>],
        order: &mut [usize],
        depth: usize,
        parent: Option<usize>,
        nodes: &mut Vec<KdNode<P>>,
        dimension: usize,
    ) -> Option<usize> {
        if order.is_empty() {
            return None;
        }
        let discriminator = depth % dimension;
        // A stable sort, so equal keys keep a deterministic order.
        order.sort_by(|&a, &b| {
            points[a][discriminator]
                .partial_cmp(&points[b][discriminator])
                .unwrap_or(Ordering::Equal)
        });

        let median = order.len() / 2;
        let mut split = median;
        while split > 0 && points[order[split - 1]][discriminator] == points[order[median]][discriminator] {
            split -= 1;
        }

        let chosen = order[split];
        let index = nodes.len();
        let payload = payloads[chosen]
            .take()
            .map_or_else(|| unreachable!("every payload is taken exactly once"), |p| p);
        nodes.push(KdNode {
            point: points[chosen].clone(),
            payload,
            discriminator,
            left: None,
            right: None,
            parent,
        });

        let (before, rest) = order.split_at_mut(split);
        let after = &mut rest[1..];
        let left = Self::build(points, payloads, before, depth + 1, Some(index), nodes, dimension);
        let right = Self::build(points, payloads, after, depth + 1, Some(index), nodes, dimension);
        nodes[index].left = left;
        nodes[index].right = right;
        Some(index)
    }

    /// The number of points in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The arity shared by the points of the tree; zero for an empty tree.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// The node at an arena index, if any.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&KdNode<P>> {
        self.nodes.get(index)
    }

    /// Finds a node holding exactly `point`, if present.
    #[must_use]
    pub fn find_node(&self, point: &[f64]) -> Option<&KdNode<P>> {
        self.find_node_with(point, |_| true)
    }

    /// Finds a node holding exactly `point` and satisfying `predicate`.
    ///
    /// The predicate distinguishes between duplicate points, e.g. by
    /// payload.
    pub fn find_node_with<F: Fn(&KdNode<P>) -> bool>(&self, point: &[f64], predicate: F) -> Option<&KdNode<P>> {
        self.check_query(point);
        let mut current = self.root;
        while let Some(index) = current {
            let node = &self.nodes[index];
            if node.point == point && predicate(node) {
                return Some(node);
            }
            current = if point[node.discriminator] < node.point[node.discriminator] {
                node.left
            } else {
                node.right
            };
        }
        None
    }

    /// The single nearest node within `radius` of `point`, with its
    /// Euclidean distance, or `None` if the ball is empty.
    #[must_use]
    pub fn find_nearest(&self, point: &[f64], radius: f64) -> Option<(f64, &KdNode<P>)> {
        self.check_query(point);
        let mut best: Option<(f64, usize)> = None;
        if let Some(root) = self.root {
            self.nearest_in(root, point, radius * radius, &mut best);
        }
        best.map(|(distance_sq, index)| (distance_sq.sqrt(), &self.nodes[index]))
    }

    /// Every node within `radius` of `point`, with Euclidean distances, in
    /// no particular order.
    #[must_use]
    pub fn find_nearest_nodes(&self, point: &[f64], radius: f64) -> Vec<(f64, &KdNode<P>)> {
        self.check_query(point);
        let mut found = Vec::new();
        if let Some(root) = self.root {
            self.collect_in(root, point, radius * radius, &mut found);
        }
        found
            .into_iter()
            .map(|(distance_sq, index)| (distance_sq.sqrt(), &self.nodes[index]))
            .collect()
    }

    /// The `k` nearest nodes to `point` in ascending distance order. Ties
    /// break on arena index, so results are deterministic.
    #[must_use]
    pub fn find_k_nearest(&self, point: &[f64], k: usize) -> Vec<(f64, &KdNode<P>)> {
        self.check_query(point);
        if k == 0 {
            return Vec::new();
        }
        let mut heap = SizedHeap::new(Some(k));
        if let Some(root) = self.root {
            self.knn_in(root, point, &mut heap);
        }
        let mut items = heap.take_items().collect::<Vec<_>>();
        items.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        items
            .into_iter()
            .map(|(index, distance_sq)| (distance_sq.sqrt(), &self.nodes[index]))
            .collect()
    }

    /// Recursive pruned descent keeping the best candidate within the ball.
    fn nearest_in(&self, index: usize, query: &[f64], radius_sq: f64, best: &mut Option<(f64, usize)>) {
        let node = &self.nodes[index];
        let distance_sq = shoal_metrics::euclidean_sq(query, &node.point);
        if distance_sq <= radius_sq && best.map_or(true, |(b, _)| distance_sq < b) {
            *best = Some((distance_sq, index));
        }

        let diff = query[node.discriminator] - node.point[node.discriminator];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.nearest_in(near, query, radius_sq, best);
        }
        let bound = best.map_or(radius_sq, |(b, _)| b.min(radius_sq));
        if diff * diff <= bound {
            if let Some(far) = far {
                self.nearest_in(far, query, radius_sq, best);
            }
        }
    }

    /// Recursive pruned descent collecting every node within the ball.
    fn collect_in(&self, index: usize, query: &[f64], radius_sq: f64, out: &mut Vec<(f64, usize)>) {
        let node = &self.nodes[index];
        let distance_sq = shoal_metrics::euclidean_sq(query, &node.point);
        if distance_sq <= radius_sq {
            out.push((distance_sq, index));
        }

        let diff = query[node.discriminator] - node.point[node.discriminator];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.collect_in(near, query, radius_sq, out);
        }
        if diff * diff <= radius_sq {
            if let Some(far) = far {
                self.collect_in(far, query, radius_sq, out);
            }
        }
    }

    /// Recursive pruned descent with a bounded candidate heap; the pruning
    /// bound is the current worst candidate once the heap is full.
    fn knn_in(&self, index: usize, query: &[f64], heap: &mut SizedHeap<usize, f64>) {
        let node = &self.nodes[index];
        let distance_sq = shoal_metrics::euclidean_sq(query, &node.point);
        heap.push((index, distance_sq));

        let diff = query[node.discriminator] - node.point[node.discriminator];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.knn_in(near, query, heap);
        }
        let bound = if heap.is_full() {
            heap.peek().map_or(f64::INFINITY, |(_, d)| *d)
        } else {
            f64::INFINITY
        };
        if diff * diff <= bound {
            if let Some(far) = far {
                self.knn_in(far, query, heap);
            }
        }
    }

    /// Rejects queries whose arity does not match the tree's.
    fn check_query(&self, point: &[f64]) {
        assert!(
            self.root.is_none() || point.len() == self.dimension,
            "query dimension {} does not match tree dimension {}",
            point.len(),
            self.dimension,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::KdTree;

    #[test]
    fn empty_tree_queries() {
        let tree = KdTree::from_points(Vec::new()).map_or_else(|_| unreachable!(), |t| t);
        assert!(tree.is_empty());
        assert!(tree.find_node(&[1.0]).is_none());
        assert!(tree.find_nearest(&[1.0], 10.0).is_none());
        assert!(tree.find_nearest_nodes(&[1.0], 10.0).is_empty());
        assert!(tree.find_k_nearest(&[1.0], 3).is_empty());
    }

    #[test]
    fn duplicate_split_values_stay_findable() {
        // Several points share x == 1.0, which exercises the
        // leftmost-equal rule on the first discriminator.
        let points = vec![
            vec![1.0, 5.0],
            vec![1.0, 2.0],
            vec![1.0, 9.0],
            vec![0.0, 1.0],
            vec![2.0, 3.0],
            vec![1.0, 7.0],
        ];
        let tree = KdTree::from_points(points.clone()).map_or_else(|_| unreachable!(), |t| t);
        for point in &points {
            assert!(tree.find_node(point).is_some(), "lost point {point:?}");
        }
    }

    #[test]
    fn k_nearest_is_sorted() {
        let points = (0..10).map(|i| vec![f64::from(i)]).collect::<Vec<_>>();
        let tree = KdTree::from_points(points).map_or_else(|_| unreachable!(), |t| t);
        let found = tree.find_k_nearest(&[3.2], 4);
        let distances = found.iter().map(|(d, _)| *d).collect::<Vec<_>>();
        let mut sorted = distances.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
        assert_eq!(distances, sorted);
        assert_eq!(found.len(), 4);
    }
}
