// SPDX-License-Identifier: Apache-2.0

//! Encode a prefix, hand the encoder's own variable numbering back as a
//! solver assignment, and decode: the reconstructed network must sort.

use std::collections::HashMap;

use sortnet::decode::{parse_cnf_comparator_vars, parse_solution, reconstruct_network};
use sortnet::encode::write_prefix_cnf;
use sortnet::network::{Comparator, Network};

/// The first two layers of the depth-3 sorting network on four channels;
/// the unique completing suffix layer is [(1,2)].
fn batcher_prefix() -> Network {
    let mut network = Network::new(4, 0);
    network.outputs = (0..16).collect();
    for layer in [[(0, 2), (1, 3)], [(0, 1), (2, 3)]] {
        network.add_empty_layer();
        for (i, j) in layer {
            network.add_comparator(Comparator::new(i, j));
        }
    }
    network
}

#[test]
fn known_suffix_decodes_to_a_sorting_network() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = batcher_prefix();

    assert!(write_prefix_cnf(4, 3, 0, &prefix, dir.path(), None, false).unwrap());
    let cnf_path = dir.path().join("0000.cnf.gz");
    let var_to_comparator = parse_cnf_comparator_vars(&cnf_path).unwrap();

    // The suffix that completes this prefix is the single comparator (1,2)
    // in suffix layer 0.
    let (&g_1_2, _) = var_to_comparator
        .iter()
        .find(|(_, &triple)| triple == (0, 1, 2))
        .expect("g_0_1_2 must be declared");

    let sol_path = dir.path().join("0000.sol");
    std::fs::write(&sol_path, format!("SAT\n-1 {g_1_2} -7 0\n")).unwrap();
    let assignment = parse_solution(&sol_path).unwrap().expect("file says SAT");

    let network = reconstruct_network(
        &prefix,
        None,
        &[0, 1, 2, 3],
        &var_to_comparator,
        &assignment,
        false,
        false,
    );
    assert_eq!(network.layers.len(), 3);
    assert!(network.is_sorting_network());
    assert_eq!(network.layers[2].to_bracket(), "(1,2)");
}

#[test]
fn permuted_prefix_is_verified_independently() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = batcher_prefix();
    write_prefix_cnf(4, 3, 1, &prefix, dir.path(), None, false).unwrap();
    let var_to_comparator =
        parse_cnf_comparator_vars(&dir.path().join("0001.cnf.gz")).unwrap();
    let (&g_1_2, _) = var_to_comparator
        .iter()
        .find(|(_, &triple)| triple == (0, 1, 2))
        .unwrap();

    // Identity permutation: the permuted prefix is the prefix itself, and
    // both verification paths must agree.
    let network = reconstruct_network(
        &prefix,
        Some(&prefix),
        &[0, 1, 2, 3],
        &var_to_comparator,
        &[g_1_2],
        false,
        true,
    );
    assert!(network.is_sorting_network());
    // Simplification has nothing to drop from a minimal network.
    assert_eq!(network.size(), 5);
}

#[test]
#[should_panic(expected = "does not sort")]
fn wrong_suffix_aborts_verification() {
    let prefix = batcher_prefix();
    // Claim the suffix is [(0,1)], which does not complete this prefix.
    let mut var_to_comparator = HashMap::new();
    var_to_comparator.insert(1, (0usize, 0usize, 1usize));
    reconstruct_network(
        &prefix,
        None,
        &[0, 1, 2, 3],
        &var_to_comparator,
        &[1],
        false,
        false,
    );
}
