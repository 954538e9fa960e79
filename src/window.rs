// SPDX-License-Identifier: Apache-2.0

//! Greedy channel reordering to shrink the unsorted windows of an output
//! set. Smaller windows mean fewer free variables per output in the CNF
//! encoding downstream.

use rand::rngs::StdRng;

use crate::isomorphism::sort_by_weight;
use crate::output::{is_symmetric, permute_channels, window_stats, Output};
use crate::perm::{inverse_permutation, random_permutation};

/// Local search over channel permutations minimizing the sum of window
/// sizes. Starts from the weight-sorted order and accepts the first
/// improving channel swap until a full scan finds none. Returns the
/// permuted set and the permutation producing it; the result's window sum
/// never exceeds the input's.
pub fn optimize_window_size(
    n: usize,
    outputs: &[Output],
    rng: &mut StdRng,
    symmetric: bool,
) -> (Vec<Output>, Vec<usize>) {
    assert!(!outputs.is_empty());
    if symmetric {
        assert_eq!(n % 2, 0);
        assert!(is_symmetric(n, outputs));
    }

    let (mut current, mut perm) = sort_by_weight(n, outputs, Some(rng), symmetric);
    debug_assert_eq!(current, permute_channels(outputs, &perm));

    let mut best_sum = window_stats(n, &current).sum;

    loop {
        let mut found_better = false;
        // Random scan order; equal-cost plateaus differ between runs, which
        // is what the repeated canonicalization passes want.
        'scan: for i in random_permutation(n, rng) {
            for j in random_permutation(n, rng) {
                if i >= j {
                    continue;
                }
                let mut swap_perm: Vec<usize> = (0..n).collect();
                swap_perm.swap(i, j);
                if symmetric && i + j != n - 1 {
                    swap_perm.swap(n - 1 - i, n - 1 - j);
                }
                let candidate = permute_channels(&current, &swap_perm);
                let candidate_sum = window_stats(n, &candidate).sum;
                if candidate_sum < best_sum {
                    best_sum = candidate_sum;
                    current = candidate;
                    let mut inverse = inverse_permutation(&perm);
                    inverse.swap(i, j);
                    if symmetric && i + j != n - 1 {
                        inverse.swap(n - 1 - i, n - 1 - j);
                    }
                    perm = inverse_permutation(&inverse);
                    debug_assert_eq!(current, permute_channels(outputs, &perm));
                    found_better = true;
                    break 'scan;
                }
            }
        }
        if !found_better {
            break;
        }
    }

    current.sort_unstable();
    if symmetric {
        assert!(is_symmetric(n, &current));
    }
    (current, perm)
}
