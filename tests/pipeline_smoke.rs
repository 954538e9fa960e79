// SPDX-License-Identifier: Apache-2.0

//! Drives the batch stages end to end, short of the external SAT solver:
//! enumerate prefixes, optimize windows, persist, and emit CNFs whose
//! comparator variables the decoder can read back.

use rand::rngs::StdRng;
use rand::SeedableRng;

use sortnet::container::{create_first_layer, load_collection, save_collection};
use sortnet::decode::parse_cnf_comparator_vars;
use sortnet::encode::write_prefix_cnf;
use sortnet::extend::extend_networks;
use sortnet::network::Network;
use sortnet::output::window_stats;
use sortnet::window::optimize_window_size;

#[test]
fn prefixes_to_cnf_files() {
    let n = 5;
    let mut rng = StdRng::seed_from_u64(0);

    // Depth 1 -> 3 with a budget, as add-layers would run it.
    let mut networks = create_first_layer(n, false);
    for depth in 1..3 {
        for network in &mut networks {
            network.add_empty_layer();
        }
        networks = extend_networks(n, &networks, false, false, 10, &mut rng);
        assert!(!networks.is_empty(), "no prefixes at depth {}", depth + 1);
        assert!(networks.len() <= 10);
    }

    // Window optimization, as optimize-windows would run it.
    let mut permutations = Vec::new();
    for network in &mut networks {
        let before = window_stats(n, &network.outputs).sum;
        let (optimized, perm) = optimize_window_size(n, &network.outputs, &mut rng, false);
        assert!(window_stats(n, &optimized).sum <= before);
        let depth = network.layers.len();
        *network = Network::new(n, depth);
        network.outputs = optimized;
        permutations.push(perm);
    }

    // Persist and reload through the binary container.
    let dir = tempfile::tempdir().unwrap();
    let collection_path = dir.path().join("prefixes.bin");
    save_collection(&networks, &collection_path).unwrap();
    let reloaded = load_collection(&collection_path, Some(n)).unwrap();
    assert_eq!(reloaded, networks);

    // One CNF per prefix, with decodable comparator variables.
    for (idx, prefix) in reloaded.iter().enumerate() {
        assert!(write_prefix_cnf(n, 5, idx, prefix, dir.path(), Some(4), false).unwrap());
        let cnf_path = dir.path().join(format!("{idx:04}.cnf.gz"));
        let vars = parse_cnf_comparator_vars(&cnf_path).unwrap();
        assert!(!vars.is_empty());
        for &(layer, i, j) in vars.values() {
            assert!(layer < 2);
            assert!(i < j && j < n);
        }
    }
}
