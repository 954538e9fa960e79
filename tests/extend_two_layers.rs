// SPDX-License-Identifier: Apache-2.0

//! Counts of pairwise non-redundant two-layer prefixes, starting from the
//! canonical first layer. These numbers pin down the extension enumeration
//! and the pruner together.

use rand::rngs::StdRng;
use rand::SeedableRng;

use sortnet::container::create_first_layer;
use sortnet::extend::extend_networks;

fn two_layer_count(n: usize, symmetric: bool) -> usize {
    let mut rng = StdRng::seed_from_u64(0);
    let mut networks = create_first_layer(n, symmetric);
    for network in &mut networks {
        network.add_empty_layer();
    }
    let networks = extend_networks(n, &networks, symmetric, false, usize::MAX, &mut rng);
    for network in &networks {
        assert_eq!(network.layers.len(), 2);
        assert!(!network.outputs.is_empty());
        if symmetric {
            assert!(network.is_symmetric());
        }
    }
    networks.len()
}

#[test]
fn two_layer_counts_small() {
    assert_eq!(two_layer_count(3, false), 1);
    assert_eq!(two_layer_count(4, false), 2);
    assert_eq!(two_layer_count(4, true), 2);
    assert_eq!(two_layer_count(5, false), 4);
}

#[test]
fn two_layer_counts_medium() {
    assert_eq!(two_layer_count(6, false), 5);
    assert_eq!(two_layer_count(6, true), 4);
    assert_eq!(two_layer_count(7, false), 8);
}

#[test]
fn two_layer_counts_large() {
    assert_eq!(two_layer_count(8, false), 12);
    assert_eq!(two_layer_count(8, true), 12);
    assert_eq!(two_layer_count(9, false), 22);
}
