//! CURE, ROCK, and agglomerative clustering end to end.

use float_cmp::approx_eq;
use shoal::cluster::{Agglomerative, Cure, Linkage, Rock};
use shoal::Error;
use test_case::test_case;

mod common;

#[test]
fn cure_separates_the_two_chains() {
    let data = common::two_chains();
    let result = Cure::new(2, 1, 0.5).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    common::assert_partition(result.clusters(), &[], data.len());

    let mut means = result.means().iter().map(|mean| mean[0]).collect::<Vec<_>>();
    means.sort_by(|a, b| a.partial_cmp(b).map_or(core::cmp::Ordering::Equal, |o| o));
    assert!(approx_eq!(f64, means[0], 2.0, epsilon = 1e-9), "means {means:?}");
    assert!(approx_eq!(f64, means[1], 11.0, epsilon = 1e-9), "means {means:?}");

    for representatives in result.representors() {
        assert_eq!(representatives.len(), 1);
    }
}

#[test]
fn cure_keeps_at_most_the_representative_budget() {
    let data = common::two_blobs(20, 8);
    let result = Cure::new(2, 4, 0.3).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.clusters().len(), 2);
    for representatives in result.representors() {
        assert!(representatives.len() <= 4);
        assert!(!representatives.is_empty());
    }
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn cure_rejects_bad_parameters() {
    let data = common::two_chains();
    assert!(matches!(
        Cure::new(0, 1, 0.5).process(&data),
        Err(Error::InvalidClusterCount { .. })
    ));
    assert!(matches!(Cure::new(2, 0, 0.5).process(&data), Err(Error::InvalidArgument(_))));
    assert!(matches!(Cure::new(2, 1, 1.5).process(&data), Err(Error::InvalidArgument(_))));
}

#[test]
fn rock_links_the_two_chains_apart() {
    let data = common::two_chains();
    let result = Rock::new(2.5, 2, 0.5).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn rock_stops_when_no_links_remain() {
    // Two far-apart pairs and a target of one cluster: no cross links
    // exist, so the merge loop must stop early at two clusters.
    let data = vec![vec![0.0], vec![1.0], vec![100.0], vec![101.0]];
    let result = Rock::new(2.0, 1, 0.5).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);
    assert_eq!(common::normalized(result.clusters()), vec![vec![0, 1], vec![2, 3]]);
}

#[test_case(Linkage::Single ; "single link")]
#[test_case(Linkage::Complete ; "complete link")]
#[test_case(Linkage::Average ; "average link")]
#[test_case(Linkage::Centroid ; "centroid link")]
fn agglomerative_separates_the_two_chains(linkage: Linkage) {
    let data = common::two_chains();
    let result = Agglomerative::new(2, linkage)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn agglomerative_singletons_when_target_equals_size() {
    let data = common::two_chains();
    let result = Agglomerative::new(data.len(), Linkage::Single)
        .process(&data)
        .map_or_else(|e| unreachable!("{e}"), |r| r);
    assert_eq!(result.clusters().len(), data.len());
}
