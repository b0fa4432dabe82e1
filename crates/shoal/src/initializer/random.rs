//! Uniform random center selection.

use rand::SeedableRng;

use crate::dataset::Point;

/// Draws a fixed number of distinct points uniformly, without replacement,
/// from a seeded generator.
#[derive(Debug, Clone, Copy)]
pub struct RandomCenters {
    /// The number of centers to draw.
    amount: usize,
    /// The seed for the generator; equal seeds yield equal centers.
    seed: u64,
}

impl RandomCenters {
    /// A selector for `amount` centers drawn with the given seed.
    #[must_use]
    pub const fn new(amount: usize, seed: u64) -> Self {
        Self { amount, seed }
    }

    /// Draws centers from the whole dataset.
    ///
    /// When `amount == data.len()` the dataset is returned verbatim; when
    /// `amount` is zero or exceeds the dataset, the result is empty.
    #[must_use]
    pub fn initialize(&self, data: &[Point]) -> Vec<Point> {
        self.initialize_indices(data.len())
            .into_iter()
            .map(|index| data[index].clone())
            .collect()
    }

    /// Draws centers from the points named by `indices`.
    #[must_use]
    pub fn initialize_subset(&self, data: &[Point], indices: &[usize]) -> Vec<Point> {
        self.initialize_indices(indices.len())
            .into_iter()
            .map(|position| data[indices[position]].clone())
            .collect()
    }

    /// Draws distinct point indices from `0..size` under the same rules as
    /// [`initialize`](Self::initialize).
    #[must_use]
    pub fn initialize_indices(&self, size: usize) -> Vec<usize> {
        if self.amount == 0 || self.amount > size {
            return Vec::new();
        }
        if self.amount == size {
            return (0..size).collect();
        }
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        rand::seq::index::sample(&mut rng, size, self.amount).into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::RandomCenters;

    #[test]
    fn full_draw_is_verbatim() {
        let data = vec![vec![1.0], vec![2.0], vec![3.0]];
        assert_eq!(RandomCenters::new(3, 7).initialize(&data), data);
    }

    #[test]
    fn out_of_range_draws_are_empty() {
        let data = vec![vec![1.0], vec![2.0]];
        assert!(RandomCenters::new(0, 7).initialize(&data).is_empty());
        assert!(RandomCenters::new(3, 7).initialize(&data).is_empty());
    }

    #[test]
    fn seeded_draws_repeat() {
        let indices = RandomCenters::new(5, 42).initialize_indices(100);
        assert_eq!(indices, RandomCenters::new(5, 42).initialize_indices(100));
        assert_eq!(indices.len(), 5);
        let mut unique = indices.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }
}
