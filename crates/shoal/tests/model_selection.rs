//! X-Means, G-Means, Silhouette, Silhouette K-search, and Elbow.

use shoal::cluster::{Elbow, GMeans, KMeans, Silhouette, SilhouetteAllocator, SilhouetteKSearch, XMeans};
use shoal::initializer::RandomCenters;
use shoal::parallel::ThreadPool;
use shoal::Error;
use test_case::test_case;

mod common;

/// Two 1-D groups of five tightly spaced points around 0 and 100.
fn two_tight_groups() -> Vec<Vec<f64>> {
    (0..5)
        .map(|i| vec![f64::from(i) * 0.01])
        .chain((0..5).map(|i| vec![100.0 + f64::from(i) * 0.01]))
        .collect()
}

#[test]
fn xmeans_with_an_exhausted_budget_returns_the_input_centers() {
    let data = common::tri_modal();
    let result = XMeans::new(vec![vec![5.0]], 1, 0.001)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.centers(), &[vec![5.0]]);
    assert_eq!(result.clusters().len(), 1);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn xmeans_splits_two_separated_groups() {
    let data = two_tight_groups();
    let result = XMeans::new(vec![vec![50.0]], 10, 0.001)
        .with_seed(3)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.centers().len(), 2);
    assert_eq!(
        common::normalized(result.clusters()),
        vec![vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8, 9]]
    );
}

#[test]
fn xmeans_respects_the_center_budget() {
    let data = common::random_tabular(90, 2, 0.0, 30.0, 21);
    let result = XMeans::new(vec![vec![10.0, 10.0], vec![20.0, 20.0]], 4, 0.001)
        .with_seed(5)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert!(result.centers().len() <= 4);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn xmeans_rejects_a_budget_below_the_start() {
    let data = common::tri_modal();
    assert!(matches!(
        XMeans::new(vec![vec![1.0], vec![8.0]], 1, 0.001).process(&data),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn gmeans_grows_the_tri_modal_line_to_three_clusters() {
    let data = common::tri_modal();
    let result = GMeans::new(2, 1).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.centers().len(), 3, "centers {:?}", result.centers());
    assert_eq!(common::normalized(result.clusters()), common::tri_modal_partition());
}

#[test]
fn gmeans_honors_kmax() {
    let data = common::tri_modal();
    let result = GMeans::new(1, 1)
        .with_kmax(2)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);
    assert!(result.centers().len() <= 2);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn silhouette_of_a_clean_partition_is_high() {
    let data = common::tri_modal();
    let result = Silhouette::new()
        .process(&data, &common::tri_modal_partition())
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert!(result.mean_score() > 0.9, "mean {}", result.mean_score());
    for &score in result.scores() {
        assert!((-1.0..=1.0).contains(&score), "score {score} out of range");
    }
}

#[test]
fn silhouette_scores_stay_in_range_on_arbitrary_partitions() {
    let data = common::random_tabular(80, 2, -3.0, 3.0, 61);
    let centers = RandomCenters::new(5, 11).initialize(&data);
    let clusters = KMeans::new(centers, 0.001)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r)
        .clusters()
        .to_vec();

    let result = Silhouette::new().process(&data, &clusters).map_or_else(|e| unreachable!("{e}"), |r| r);
    for &score in result.scores() {
        assert!((-1.0..=1.0).contains(&score), "score {score} out of range");
    }
}

#[test]
fn silhouette_parallel_matches_sequential() {
    let data = common::random_tabular(150, 3, 0.0, 5.0, 71);
    let centers = RandomCenters::new(4, 9).initialize(&data);
    let clusters = KMeans::new(centers, 0.001)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r)
        .clusters()
        .to_vec();
    let pool = ThreadPool::with_workers(3);

    let sequential = Silhouette::new().process(&data, &clusters).map_or_else(|e| unreachable!("{e}"), |r| r);
    let parallel = Silhouette::new()
        .par_process(&data, &clusters, &pool)
        .map_or_else(|e| unreachable!("{e}"), |r| r);
    assert_eq!(sequential.scores(), parallel.scores());
}

#[test]
fn silhouette_matrix_mode_matches_points_mode() {
    let data = common::two_chains();
    let clusters = vec![vec![0, 1, 2], vec![3, 4, 5]];
    let matrix = shoal::DistanceMatrix::from_points(&data, &shoal::Metric::EuclideanSquare)
        .map_or_else(|e| unreachable!("{e}"), |m| m);

    let from_points = Silhouette::new().process(&data, &clusters).map_or_else(|e| unreachable!("{e}"), |r| r);
    let from_matrix = Silhouette::new()
        .process_matrix(&matrix, &clusters)
        .map_or_else(|e| unreachable!("{e}"), |r| r);
    assert_eq!(from_points.scores(), from_matrix.scores());
}

#[test_case(SilhouetteAllocator::KMeans ; "kmeans allocator")]
#[test_case(SilhouetteAllocator::KMedians ; "kmedians allocator")]
#[test_case(SilhouetteAllocator::KMedoids ; "kmedoids allocator")]
fn ksearch_finds_three_groups(allocator: SilhouetteAllocator) {
    let data = common::tri_modal();
    let result = SilhouetteKSearch::new(2, 6, allocator, 7)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.amount(), 3, "scores {:?}", result.scores());
    assert!(result.score() > 0.9);
    assert_eq!(result.scores().len(), 4);
}

#[test]
fn ksearch_rejects_degenerate_bounds() {
    let data = common::tri_modal();
    assert!(matches!(
        SilhouetteKSearch::new(1, 5, SilhouetteAllocator::KMeans, 0).process(&data),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        SilhouetteKSearch::new(2, 100, SilhouetteAllocator::KMeans, 0).process(&data),
        Err(Error::InvalidClusterCount { .. })
    ));
}

#[test]
fn elbow_finds_the_knee_of_three_blobs() {
    let data = vec![
        vec![0.0],
        vec![0.1],
        vec![0.2],
        vec![10.0],
        vec![10.1],
        vec![10.2],
        vec![20.0],
        vec![20.1],
        vec![20.2],
    ];
    let result = Elbow::new(1, 6, 2).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.amount(), 3, "wce curve {:?}", result.wce());
    assert_eq!(result.wce().len(), 6);
}

#[test]
fn elbow_rejects_a_flat_range() {
    let data = common::tri_modal();
    assert!(matches!(
        Elbow::new(2, 3, 0).process(&data),
        Err(Error::InvalidArgument(_))
    ));
}
