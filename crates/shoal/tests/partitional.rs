//! K-Means, K-Medians, K-Medoids, and Fuzzy C-Means end to end.

use float_cmp::approx_eq;
use shoal::cluster::{FuzzyCMeans, KMeans, KMedians, KMedoids, PamBuild};
use shoal::initializer::{KMeansPlusPlus, RandomCenters};
use shoal::parallel::ThreadPool;
use shoal::Error;

mod common;

#[test]
fn kmeans_resolves_the_tri_modal_line() {
    let data = common::tri_modal();
    let result = KMeans::new(vec![vec![1.0], vec![3.0], vec![8.0]], 0.001)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), common::tri_modal_partition());
    common::assert_partition(result.clusters(), &[], data.len());

    let expected = [1.1, 3.1, 8.1];
    for (center, expected) in result.centers().iter().zip(expected) {
        assert!(approx_eq!(f64, center[0], expected, epsilon = 1e-9), "center {center:?}");
    }
}

#[test]
fn kmeans_error_sum_is_monotone_in_the_iteration_cap() {
    let data = common::random_tabular(120, 2, 0.0, 10.0, 31);
    let centers = RandomCenters::new(6, 17).initialize(&data);

    let mut previous = f64::INFINITY;
    for itermax in 1..8 {
        let result = KMeans::new(centers.clone(), 1e-12)
            .with_itermax(itermax)
            .process(&data)
            .map_or_else(|e| unreachable!("{e}"), |r| r);
        assert!(
            result.wce() <= previous + 1e-9,
            "wce rose from {previous} to {} at cap {itermax}",
            result.wce()
        );
        previous = result.wce();
    }
}

#[test]
fn kmeans_parallel_matches_sequential() {
    let data = common::random_tabular(300, 3, -5.0, 5.0, 77);
    let centers = RandomCenters::new(7, 3).initialize(&data);
    let pool = ThreadPool::with_workers(4);

    let sequential = KMeans::new(centers.clone(), 0.001)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);
    let parallel = KMeans::new(centers, 0.001)
        .par_process(&data, &pool)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(sequential.clusters(), parallel.clusters());
    assert_eq!(sequential.centers(), parallel.centers());
    assert!(approx_eq!(f64, sequential.wce(), parallel.wce()));
}

#[test]
fn kmeans_observer_records_every_iteration() {
    let data = common::tri_modal();
    let result = KMeans::new(vec![vec![0.0], vec![4.0], vec![9.0]], 1e-9)
        .with_observer(true)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert!(!result.evolution_centers().is_empty());
    assert_eq!(result.evolution_centers().len(), result.evolution_clusters().len());
    let last = &result.evolution_centers()[result.evolution_centers().len() - 1];
    assert_eq!(last, result.centers());
}

#[test]
fn kmeans_rejects_bad_arguments() {
    let data = common::tri_modal();
    assert!(matches!(
        KMeans::new(Vec::new(), 0.001).process(&data),
        Err(Error::InvalidClusterCount { amount: 0, .. })
    ));
    assert!(matches!(
        KMeans::new(vec![vec![1.0, 2.0]], 0.001).process(&data),
        Err(Error::DimensionMismatch { .. })
    ));
    assert!(matches!(
        KMeans::new(vec![vec![1.0]], 0.0).process(&data),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        KMeans::new(vec![vec![1.0]], 0.001).process(&[]),
        Err(Error::EmptyDataset)
    ));
}

#[test]
fn kmeans_plus_plus_is_repeatable_and_spreads_centers() {
    let data = common::random_tabular(200, 2, 0.0, 100.0, 41);
    let first = KMeansPlusPlus::new(5, 23).initialize(&data).map_or_else(|e| unreachable!("{e}"), |c| c);
    let second = KMeansPlusPlus::new(5, 23).initialize(&data).map_or_else(|e| unreachable!("{e}"), |c| c);
    assert_eq!(first, second);

    // Distinct seeds may move the first draw, but the spread rule keeps
    // centers distinct.
    for centers in [first, second] {
        for i in 0..centers.len() {
            for j in 0..i {
                assert_ne!(centers[i], centers[j], "duplicate centers at ({i}, {j})");
            }
        }
    }
}

#[test]
fn kmedians_resolves_the_tri_modal_line() {
    let data = common::tri_modal();
    let result = KMedians::new(vec![vec![1.0], vec![3.0], vec![8.0]], 0.001)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), common::tri_modal_partition());
    let expected = [1.1, 3.1, 8.1];
    for (median, expected) in result.medians().iter().zip(expected) {
        assert!(approx_eq!(f64, median[0], expected, epsilon = 1e-9), "median {median:?}");
    }
}

#[test]
fn kmedoids_keeps_the_central_points() {
    let data = common::two_chains();
    let result = KMedoids::new(vec![1, 4], 0.1)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    assert_eq!(result.medoids(), &[1, 4]);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn kmedoids_matrix_mode_matches_points_mode() {
    let data = common::two_chains();
    let matrix = shoal::DistanceMatrix::from_points(&data, &shoal::Metric::EuclideanSquare)
        .map_or_else(|e| unreachable!("{e}"), |m| m);

    let from_points = KMedoids::new(vec![0, 3], 0.1)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);
    let from_matrix = KMedoids::new(vec![0, 3], 0.1)
        .process_matrix(&matrix)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(from_points.clusters(), from_matrix.clusters());
    assert_eq!(from_points.medoids(), from_matrix.medoids());
}

#[test]
fn pam_build_seeds_the_chain_centers() {
    let data = common::two_chains();
    let medoids = PamBuild::new(2).initialize(&data).map_or_else(|e| unreachable!("{e}"), |m| m);
    assert_eq!(medoids, vec![2, 4]);
}

#[test]
fn kmedoids_rejects_bad_medoids() {
    let data = common::two_chains();
    assert!(matches!(
        KMedoids::new(vec![0, 9], 0.1).process(&data),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        KMedoids::new(vec![0, 0], 0.1).process(&data),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        KMedoids::new(Vec::new(), 0.1).process(&data),
        Err(Error::InvalidClusterCount { .. })
    ));
}

#[test]
fn fuzzy_cmeans_memberships_are_row_stochastic() {
    let data = common::tri_modal();
    let result = FuzzyCMeans::new(vec![vec![1.0], vec![3.0], vec![8.0]])
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), common::tri_modal_partition());
    let membership = result.membership();
    for i in 0..data.len() {
        let row_sum = (0..result.centers().len()).map(|j| membership[[i, j]]).sum::<f64>();
        assert!(approx_eq!(f64, row_sum, 1.0, epsilon = 1e-9), "row {i} sums to {row_sum}");
    }
}

#[test]
fn fuzzy_cmeans_coincident_point_takes_full_membership() {
    let data = vec![vec![0.0], vec![10.0], vec![0.4]];
    let result = FuzzyCMeans::new(vec![vec![0.0], vec![10.0]])
        .with_itermax(1)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    // With a single iteration the first membership update sees the initial
    // centers, and the point sitting on a center owns it outright.
    let membership = result.membership();
    assert!(approx_eq!(f64, membership[[0, 0]], 1.0));
    assert!(approx_eq!(f64, membership[[0, 1]], 0.0));
    assert!(approx_eq!(f64, membership[[1, 1]], 1.0));
}

#[test]
fn fuzzy_cmeans_rejects_a_crisp_fuzzifier() {
    let data = common::tri_modal();
    assert!(matches!(
        FuzzyCMeans::new(vec![vec![1.0]]).with_fuzziness(1.0).process(&data),
        Err(Error::InvalidArgument(_))
    ));
}
