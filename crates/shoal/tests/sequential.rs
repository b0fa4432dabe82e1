//! BSAS, MBSAS, and TTSAS end to end.

use float_cmp::approx_eq;
use shoal::cluster::{Bsas, Mbsas, Ttsas};
use shoal::Error;

mod common;

/// Two 1-D groups in presentation order: 0, 1, 2, then 9, 10, 11.
fn two_groups() -> Vec<Vec<f64>> {
    vec![vec![0.0], vec![1.0], vec![2.0], vec![9.0], vec![10.0], vec![11.0]]
}

#[test]
fn bsas_opens_a_cluster_past_the_threshold() {
    let data = two_groups();
    let result = Bsas::new(3, 3.0).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.clusters(), &[vec![0, 1, 2], vec![3, 4, 5]]);
    common::assert_partition(result.clusters(), &[], data.len());
    assert_eq!(result.representatives().len(), 2);
}

#[test]
fn bsas_representative_update_divides_by_the_cluster_count() {
    let data = two_groups();
    let result = Bsas::new(3, 3.0).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    // While a single cluster is open the running mean divides by one, so
    // each addition replaces the representative outright: after points 0,
    // 1, and 2 the first representative is 2.0, not the arithmetic mean
    // 1.0. Once the second cluster opens, updates divide by two.
    assert!(approx_eq!(f64, result.representatives()[0][0], 2.0));
    assert!(approx_eq!(f64, result.representatives()[1][0], 10.25));
}

#[test]
fn bsas_respects_the_cluster_budget() {
    let data = vec![vec![0.0], vec![50.0], vec![100.0]];
    let result = Bsas::new(2, 3.0).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    // The budget is exhausted after two clusters; the third far point must
    // join its nearest representative instead of opening a cluster.
    assert_eq!(result.clusters().len(), 2);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn bsas_rejects_a_zero_budget() {
    assert!(matches!(
        Bsas::new(0, 3.0).process(&two_groups()),
        Err(Error::InvalidClusterCount { amount: 0, .. })
    ));
}

#[test]
fn mbsas_assigns_non_seeds_in_the_second_pass() {
    let data = two_groups();
    let result = Mbsas::new(3, 3.0).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.clusters(), &[vec![0, 1, 2], vec![3, 4, 5]]);
    common::assert_partition(result.clusters(), &[], data.len());
    assert!(approx_eq!(f64, result.representatives()[0][0], 1.25));
    assert!(approx_eq!(f64, result.representatives()[1][0], 10.25));
}

#[test]
fn ttsas_resolves_clear_groups_in_one_pass() {
    let data = two_groups();
    let result = Ttsas::new(2.0, 5.0).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.clusters(), &[vec![0, 1, 2], vec![3, 4, 5]]);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn ttsas_forces_progress_through_the_gray_zone() {
    // Every inter-point distance sits between the thresholds, so no pass
    // can assign or allocate freely; each no-change pass must force one
    // cluster open, and the loop must still terminate with full coverage.
    let data = vec![vec![0.0], vec![3.0], vec![6.0]];
    let result = Ttsas::new(1.0, 10.0).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.clusters(), &[vec![0], vec![1], vec![2]]);
    common::assert_partition(result.clusters(), &[], data.len());
}

#[test]
fn ttsas_rejects_misordered_thresholds() {
    assert!(matches!(
        Ttsas::new(5.0, 1.0).process(&two_groups()),
        Err(Error::InvalidArgument(_))
    ));
}
