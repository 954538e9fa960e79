// SPDX-License-Identifier: Apache-2.0

//! Subset-isomorphism between reachable-output sets.
//!
//! The central question: given sorted sets A, B ⊆ {0,1}ⁿ, does some channel
//! permutation σ make σ(A) ⊆ B? A cheap monotone precheck filters most
//! negatives; a backtracking search over partial permutations settles the
//! rest. [`find_redundant_outputs`] applies the machinery across a whole
//! collection to mark sets covered by a smaller one.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::output::{is_symmetric, Output};
use crate::perm::inverse_permutation;

/// Multiset inclusion over sorted slices: every element of `sub` (with
/// multiplicity) occurs in `sup`.
pub fn sorted_includes(sup: &[Output], sub: &[Output]) -> bool {
    let mut i = 0;
    for &x in sub {
        while i < sup.len() && sup[i] < x {
            i += 1;
        }
        if i >= sup.len() || sup[i] > x {
            return false;
        }
        i += 1;
    }
    true
}

/// Per-row (set element) zero/one counts, optionally sorted ascending.
/// Index 0 holds zero counts, index 1 one counts.
fn aggregate_rows(n: usize, set: &[Output], sort: bool) -> [Vec<u32>; 2] {
    let mut ones: Vec<u32> = set.iter().map(|x| x.count_ones()).collect();
    let mut zeros: Vec<u32> = ones.iter().map(|&c| n as u32 - c).collect();
    if sort {
        ones.sort_unstable();
        zeros.sort_unstable();
    }
    [zeros, ones]
}

/// Per-column (channel) zero/one counts, optionally sorted ascending.
fn aggregate_columns(n: usize, set: &[Output], sort: bool) -> [Vec<u32>; 2] {
    let mut ones = vec![0u32; n];
    for &x in set {
        for (i, count) in ones.iter_mut().enumerate() {
            *count += (x >> i) & 1;
        }
    }
    let mut zeros: Vec<u32> = ones.iter().map(|&c| set.len() as u32 - c).collect();
    if sort {
        ones.sort_unstable();
        zeros.sort_unstable();
    }
    [zeros, ones]
}

/// Applies the inverse of `inv_perm`, after stable-sorting `inv_perm` by
/// column weight, and returns the sorted permuted set.
fn sort_by_weight_with(
    n: usize,
    set: &[Output],
    count_one_by_col: &[u32],
    inv_perm: &mut [usize],
) -> Vec<Output> {
    inv_perm.sort_by_key(|&i| count_one_by_col[i]);
    let mut permuted: Vec<Output> = set
        .iter()
        .map(|&x| {
            let mut y = 0;
            for (i, &src) in inv_perm.iter().enumerate() {
                y |= ((x >> src) & 1) << i;
            }
            y
        })
        .collect();
    permuted.sort_unstable();
    permuted
}

/// Canonicalizes a set by sorting its channels ascending by column weight.
/// A supplied rng randomizes the order of equal-weight channels (mirrored
/// swaps keep reflection symmetry when `symmetric`). Returns the sorted set
/// and the permutation that produces it, i.e.
/// `permute_channels(set, perm) == sorted_set`.
pub fn sort_by_weight(
    n: usize,
    set: &[Output],
    mut rng: Option<&mut StdRng>,
    symmetric: bool,
) -> (Vec<Output>, Vec<usize>) {
    let count_one_by_col = aggregate_columns(n, set, false)[1].clone();
    let mut inv_perm: Vec<usize> = (0..n).collect();
    if let Some(rng) = rng.as_deref_mut() {
        if symmetric {
            assert_eq!(n % 2, 0);
            for i in 0..n {
                let j = rng.gen_range(0..n);
                inv_perm.swap(i, j);
                if i + j != n - 1 {
                    inv_perm.swap(n - 1 - i, n - 1 - j);
                }
            }
        } else {
            inv_perm.shuffle(rng);
        }
    }
    let sorted_set = sort_by_weight_with(n, set, &count_one_by_col, &mut inv_perm);
    (sorted_set, inverse_permutation(&inv_perm))
}

/// Returns false only when no σ(set_a) ⊆ set_b can exist; true means
/// unknown. Uses the permutation-invariant row and column weight profiles:
/// rows of A must dominate rows of B at aligned ascending indices (A's rows
/// are a sub-multiset of B's), while columns must be dominated (σ may
/// redistribute columns, but B's counts only grow on a superset).
pub fn is_isomorphic_to_subset_negative_precheck(
    n: usize,
    set_a: &[Output],
    set_b: &[Output],
) -> bool {
    if set_a.len() > set_b.len() {
        return false;
    }
    let rows_a = aggregate_rows(n, set_a, true);
    let rows_b = aggregate_rows(n, set_b, true);
    for bit in 0..2 {
        for (a, b) in rows_a[bit].iter().zip(rows_b[bit].iter()) {
            if a < b {
                return false;
            }
        }
    }
    let cols_a = aggregate_columns(n, set_a, true);
    let cols_b = aggregate_columns(n, set_b, true);
    for bit in 0..2 {
        for (a, b) in cols_a[bit].iter().zip(cols_b[bit].iter()) {
            if a > b {
                return false;
            }
        }
    }
    true
}

/// Returns true only when a σ(set_a) ⊆ set_b was actually found; false means
/// unknown. Tries `num_tests` randomized weight-sort canonicalizations of A
/// against the canonicalized B.
pub fn is_isomorphic_to_subset_positive_precheck(
    n: usize,
    set_a: &[Output],
    set_b: &[Output],
    num_tests: usize,
    rng: &mut StdRng,
) -> bool {
    let count_a = aggregate_columns(n, set_a, false)[1].clone();
    let count_b = aggregate_columns(n, set_b, false)[1].clone();
    let mut inv_perm_b: Vec<usize> = (0..n).collect();
    let set_b_canonical = sort_by_weight_with(n, set_b, &count_b, &mut inv_perm_b);
    let mut inv_perm_a: Vec<usize> = (0..n).collect();
    for _ in 0..num_tests {
        inv_perm_a.shuffle(rng);
        let set_a_canonical = sort_by_weight_with(n, set_a, &count_a, &mut inv_perm_a);
        if sorted_includes(&set_b_canonical, &set_a_canonical) {
            return true;
        }
    }
    false
}

/// Reference implementation: tries every permutation of the n channels.
/// Only viable for small n; the backtracker is tested against it.
fn is_isomorphic_to_subset_slow(n: usize, set_a: &[Output], set_b: &[Output]) -> bool {
    debug_assert!(set_b.is_sorted());
    fn visit(perm: &mut Vec<usize>, k: usize, found: &mut dyn FnMut(&[usize]) -> bool) -> bool {
        if k == perm.len() {
            return found(perm);
        }
        for i in k..perm.len() {
            perm.swap(k, i);
            if visit(perm, k + 1, found) {
                return true;
            }
            perm.swap(k, i);
        }
        false
    }
    let mut perm: Vec<usize> = (0..n).collect();
    visit(&mut perm, 0, &mut |perm| {
        let mut permuted: Vec<Output> = set_a
            .iter()
            .map(|&a| {
                let mut y = 0;
                for i in 0..n {
                    y |= ((a >> i) & 1) << perm[i];
                }
                y
            })
            .collect();
        permuted.sort_unstable();
        sorted_includes(set_b, &permuted)
    })
}

fn backtrack(
    n: usize,
    set_a: &[Output],
    set_b_pasts: &[Vec<Output>],
    symmetric: bool,
    pos: usize,
    perm: &mut Vec<usize>,
    used: &mut Vec<bool>,
) -> bool {
    // Project every a ∈ A through the fixed prefix of the permutation and
    // test sub-multiset inclusion against B's matching projection.
    let mut a_past: Vec<Output> = set_a
        .iter()
        .map(|&a| {
            let mut y = 0;
            for j in 0..pos {
                y |= ((a >> perm[j]) & 1) << j;
            }
            if symmetric {
                for j in n - pos..n {
                    y |= ((a >> perm[j]) & 1) << j;
                }
            }
            y
        })
        .collect();
    a_past.sort_unstable();
    if !sorted_includes(&set_b_pasts[pos], &a_past) {
        return false;
    }

    let limit = if symmetric { n / 2 } else { n };
    if pos == limit {
        return true;
    }

    for i in 0..n {
        if used[i] {
            continue;
        }
        if symmetric && used[n - 1 - i] {
            continue;
        }
        perm[pos] = i;
        used[i] = true;
        if symmetric {
            perm[n - 1 - pos] = n - 1 - i;
            used[n - 1 - i] = true;
        }
        if backtrack(n, set_a, set_b_pasts, symmetric, pos + 1, perm, used) {
            return true;
        }
        used[i] = false;
        if symmetric {
            used[n - 1 - i] = false;
        }
    }
    false
}

/// Backtracking search for σ with σ(set_a) ⊆ set_b. Builds σ position by
/// position; in symmetric mode positions are fixed in mirrored pairs and the
/// search stops at n/2.
fn is_isomorphic_to_subset_backtracking(
    n: usize,
    set_a: &[Output],
    set_b: &[Output],
    symmetric: bool,
) -> bool {
    if symmetric {
        assert_eq!(n % 2, 0);
    }
    debug_assert!(set_b.is_sorted());

    let limit = if symmetric { n / 2 } else { n };
    let mut set_b_pasts: Vec<Vec<Output>> = Vec::with_capacity(limit + 1);
    for pos in 0..=limit {
        let mut past_mask: Output = (1 << pos) - 1;
        if symmetric {
            past_mask |= past_mask << (n - pos);
        }
        let mut projected: Vec<Output> = set_b.iter().map(|&b| b & past_mask).collect();
        projected.sort_unstable();
        set_b_pasts.push(projected);
    }

    let mut perm = vec![0usize; n];
    let mut used = vec![false; n];
    backtrack(n, set_a, &set_b_pasts, symmetric, 0, &mut perm, &mut used)
}

/// True iff some channel permutation σ satisfies σ(set_a) ⊆ set_b.
pub fn is_isomorphic_to_subset(
    n: usize,
    set_a: &[Output],
    set_b: &[Output],
    symmetric: bool,
) -> bool {
    debug_assert!(set_b.is_sorted());
    if !is_isomorphic_to_subset_negative_precheck(n, set_a, set_b) {
        return false;
    }
    is_isomorphic_to_subset_backtracking(n, set_a, set_b, symmetric)
}

/// One redundancy probe: is `collection[i]` covered by any live smaller set?
fn is_redundant(
    n: usize,
    i: usize,
    collection: &[Vec<Output>],
    twins: &[Vec<Output>],
    flags: &[AtomicBool],
    fast: bool,
    last_pass: bool,
    symmetric: bool,
) -> bool {
    for j in 0..collection.len() {
        if j == i || flags[j].load(Ordering::Relaxed) {
            continue;
        }
        let size_i = collection[i].len();
        let size_j = collection[j].len();
        if size_i < size_j || (size_i == size_j && i < j) {
            continue;
        }
        // Here (size_j, j) < (size_i, i): j is the set i must not cover.
        if fast || !last_pass {
            if sorted_includes(&collection[i], &collection[j]) {
                return true;
            }
            if !twins.is_empty() && sorted_includes(&twins[i], &collection[j]) {
                return true;
            }
        } else {
            if is_isomorphic_to_subset(n, &collection[j], &collection[i], symmetric) {
                return true;
            }
            if is_isomorphic_to_subset(n, &collection[j], &twins[i], symmetric) {
                return true;
            }
        }
    }
    false
}

/// Marks every set in `collection` that is covered, under some channel
/// permutation, by a set with smaller (|S|, index) — directly or through its
/// reflect-and-invert twin. Runs up to 6 passes (2 in `fast` mode) of
/// re-canonicalization plus parallel probing; only the final full pass runs
/// the backtracker, the rest rely on canonical-form inclusion.
pub fn find_redundant_outputs(
    n: usize,
    mut collection: Vec<Vec<Output>>,
    fast: bool,
    symmetric: bool,
    rng: &mut StdRng,
) -> Vec<bool> {
    if symmetric && n < 16 {
        // Affordable to verify here; for larger n the caller vouches.
        log::info!("find_redundant_outputs: checking all sets are symmetric");
        for set in &collection {
            assert!(is_symmetric(n, set));
        }
    }

    let flags: Vec<AtomicBool> = (0..collection.len()).map(|_| AtomicBool::new(false)).collect();
    let num_passes = if fast { 2 } else { 6 };

    for pass in 0..num_passes {
        let live = flags.iter().filter(|f| !f.load(Ordering::Relaxed)).count();
        log::info!("find_redundant_outputs: pass {pass}, live count {live}");

        // Reflect-and-invert twins, final two full passes only. Complement is
        // enough: reversal is itself a permutation, and the probe searches
        // over all permutations.
        let mut twins: Vec<Vec<Output>> = if !fast && pass + 2 >= num_passes {
            collection.clone()
        } else {
            Vec::new()
        };
        let invert_mask: Output = (1 << n) - 1;
        for (i, twin) in twins.iter_mut().enumerate() {
            if flags[i].load(Ordering::Relaxed) {
                continue;
            }
            for x in twin.iter_mut() {
                *x ^= invert_mask;
            }
        }

        // Re-canonicalize with fresh random tie-breaks so each pass sees a
        // different equal-weight column order.
        let base_seed: u64 = rng.gen();
        collection.par_iter_mut().enumerate().for_each(|(i, set)| {
            if flags[i].load(Ordering::Relaxed) {
                return;
            }
            let mut item_rng = StdRng::seed_from_u64(base_seed ^ i as u64);
            *set = sort_by_weight(n, set, Some(&mut item_rng), symmetric).0;
        });
        let twin_seed: u64 = rng.gen();
        twins.par_iter_mut().enumerate().for_each(|(i, twin)| {
            if flags[i].load(Ordering::Relaxed) {
                return;
            }
            let mut item_rng = StdRng::seed_from_u64(twin_seed ^ i as u64);
            *twin = sort_by_weight(n, twin, Some(&mut item_rng), symmetric).0;
        });

        let last_pass = pass + 1 == num_passes;
        (0..collection.len()).into_par_iter().for_each(|i| {
            if flags[i].load(Ordering::Relaxed) {
                return;
            }
            if is_redundant(n, i, &collection, &twins, &flags, fast, last_pass, symmetric) {
                flags[i].store(true, Ordering::Relaxed);
            }
        });
    }

    let redundant: Vec<bool> = flags.iter().map(|f| f.load(Ordering::Relaxed)).collect();
    log::info!(
        "find_redundant_outputs: non-redundant count {}",
        redundant.iter().filter(|&&r| !r).count()
    );
    redundant
}
