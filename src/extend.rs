// SPDX-License-Identifier: Apache-2.0

//! Enumeration of all ways to fill the last layer of each prefix.
//!
//! Comparators are placed in increasing order of their lower endpoint, and
//! recursion resumes past the endpoint just placed, so each set of
//! comparators for a layer is emitted exactly once regardless of order.
//! Only useful comparators (some reachable output still has the pair
//! inverted) are considered; symmetric mode places mirrored pairs together.

use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::clean_up::clean_up;
use crate::network::{Comparator, Network, UNMATCHED};
use crate::output::is_symmetric;

fn dfs(
    network: &Network,
    symmetric: bool,
    has_inverse: &[Vec<bool>],
    i0: usize,
    remaining_depth: usize,
    extended: &mut Vec<Network>,
) {
    let n = network.n;
    if symmetric {
        debug_assert!(network.is_symmetric());
    }

    // Every node of the search tree is itself an extension, including the
    // empty one.
    extended.push(network.clone());

    if remaining_depth == 0 {
        return;
    }

    let layer = network.layers.last().expect("network has no layers");
    for i in i0..n {
        if layer.matching[i] != UNMATCHED {
            continue;
        }
        if symmetric && layer.matching[n - 1 - i] != UNMATCHED {
            continue;
        }
        for j in i + 1..n {
            if layer.matching[j] != UNMATCHED {
                continue;
            }
            if symmetric && (n - 1 - j < i0 || layer.matching[n - 1 - j] != UNMATCHED) {
                continue;
            }
            if !has_inverse[i][j] {
                continue;
            }
            if symmetric && !has_inverse[n - 1 - j][n - 1 - i] {
                continue;
            }

            let mut extended_network = network.clone();
            extended_network.add_comparator(Comparator::new(i, j));
            if symmetric && i + j != n - 1 {
                extended_network.add_comparator(Comparator::new(n - 1 - j, n - 1 - i));
            }

            // Only rows and columns touched by i and j (and their mirrors)
            // can change.
            let mut new_has_inverse = has_inverse.to_vec();
            for k in 0..n {
                if k < i {
                    new_has_inverse[k][i] = extended_network.has_inverse(k, i);
                    if symmetric {
                        new_has_inverse[n - 1 - i][n - 1 - k] = new_has_inverse[k][i];
                    }
                }
                if k > i {
                    new_has_inverse[i][k] = extended_network.has_inverse(i, k);
                    if symmetric {
                        new_has_inverse[n - 1 - k][n - 1 - i] = new_has_inverse[i][k];
                    }
                }
                if k < j {
                    new_has_inverse[k][j] = extended_network.has_inverse(k, j);
                    if symmetric {
                        new_has_inverse[n - 1 - j][n - 1 - k] = new_has_inverse[k][j];
                    }
                }
                if k > j {
                    new_has_inverse[j][k] = extended_network.has_inverse(j, k);
                    if symmetric {
                        new_has_inverse[n - 1 - k][n - 1 - j] = new_has_inverse[j][k];
                    }
                }
            }

            dfs(
                &extended_network,
                symmetric,
                &new_has_inverse,
                i + 1,
                remaining_depth - 1,
                extended,
            );
        }
    }
}

fn extend_single(network: &Network, n: usize, symmetric: bool, add_one_comparator: bool) -> Vec<Network> {
    assert!(!network.outputs.is_empty(), "extension requires cached outputs");
    if symmetric {
        assert_eq!(n % 2, 0);
        assert!(network.is_symmetric());
        assert!(is_symmetric(n, &network.outputs));
    }

    let mut has_inverse = vec![vec![false; n]; n];
    for i in 0..n {
        for j in i + 1..n {
            has_inverse[i][j] = network.has_inverse(i, j);
            if symmetric {
                let mirror_j = n - 1 - j;
                let mirror_i = n - 1 - i;
                if mirror_j < i {
                    debug_assert_eq!(has_inverse[i][j], has_inverse[mirror_j][mirror_i]);
                }
            }
        }
    }

    let remaining_depth = if add_one_comparator { 1 } else { usize::MAX };
    let mut extended = Vec::new();
    dfs(network, symmetric, &has_inverse, 0, remaining_depth, &mut extended);
    extended
}

/// Extends every network (all sharing `n` and an appended last layer) by
/// every admissible filling of that layer, then prunes the union down to
/// `keep_best_count` survivors. `add_one_comparator` restricts each
/// extension to at most one placement (plus its mirror).
pub fn extend_networks(
    n: usize,
    networks: &[Network],
    symmetric: bool,
    add_one_comparator: bool,
    keep_best_count: usize,
    rng: &mut StdRng,
) -> Vec<Network> {
    log::info!("extending {} networks", networks.len());
    let extended: Vec<Network> = networks
        .par_iter()
        .flat_map_iter(|network| extend_single(network, n, symmetric, add_one_comparator))
        .collect();
    log::info!("extended to {} networks", extended.len());
    clean_up(extended, symmetric, keep_best_count, rng)
}
