//! CLIQUE end to end.

use shoal::cluster::Clique;
use shoal::Error;

mod common;

#[test]
fn clique_separates_the_two_chains() {
    let data = common::two_chains();
    let result = Clique::new(4, 2).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(common::normalized(result.clusters()), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    assert!(result.noise().is_empty());
    common::assert_partition(result.clusters(), result.noise(), data.len());
}

#[test]
fn clique_reports_sparse_blocks_as_noise() {
    let data = common::two_chains();
    let result = Clique::new(4, 4).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert!(result.clusters().is_empty());
    assert_eq!(result.noise(), &[0, 1, 2, 3, 4, 5]);
}

#[test]
fn clique_blocks_carry_their_geometry() {
    let data = common::two_chains();
    let result = Clique::new(4, 2).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);

    assert_eq!(result.blocks().len(), 2);
    for block in result.blocks() {
        assert_eq!(block.logical_location().len(), 1);
        for &member in block.points() {
            assert!(block.contains(&data[member]), "block {:?} lost point {member}", block.logical_location());
        }
    }
}

#[test]
fn clique_merges_adjacent_dense_blocks() {
    // A contiguous 2-D diagonal-free band: every occupied cell touches the
    // next along an axis, so one cluster must come out.
    let data = vec![
        vec![0.1, 0.1],
        vec![0.2, 0.1],
        vec![1.1, 0.1],
        vec![1.2, 0.1],
        vec![2.1, 0.1],
        vec![2.2, 0.1],
    ];
    let result = Clique::new(3, 1).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);
    assert_eq!(result.clusters().len(), 1);
    assert_eq!(result.clusters()[0], vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn clique_covers_random_data() {
    let data = common::random_tabular(150, 3, -2.0, 2.0, 55);
    let result = Clique::new(5, 3).process(&data).map_or_else(|e| unreachable!("{e}"), |r| r);
    common::assert_partition(result.clusters(), result.noise(), data.len());
}

#[test]
fn clique_rejects_a_zero_grid() {
    assert!(matches!(
        Clique::new(0, 1).process(&common::two_chains()),
        Err(Error::InvalidArgument(_))
    ));
}
