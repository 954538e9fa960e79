// SPDX-License-Identifier: Apache-2.0

//! Process-wide cache of precomputed bitmasks over {0,1}ⁿ.
//!
//! Each mask is a bitset of length 2ⁿ indexed by output value. Building the
//! cache is O(n·2ⁿ), so instances are built once per n and shared read-only.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use bitvec::prelude::*;

use crate::output::Output;

/// Bitset over the 2ⁿ possible outputs.
pub type OutputBits = BitVec<u64, Lsb0>;

/// Precomputed masks for one value of n.
pub struct MaskCache {
    n: usize,
    zero: Vec<OutputBits>,
    one: Vec<OutputBits>,
    one_zero: Vec<Vec<OutputBits>>,
    by_pop: Vec<OutputBits>,
}

impl MaskCache {
    /// Returns the shared instance for `n`, building it on first use.
    pub fn get(n: usize) -> Arc<MaskCache> {
        static INSTANCES: OnceLock<Mutex<HashMap<usize, Arc<MaskCache>>>> = OnceLock::new();
        let mut instances = INSTANCES
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .unwrap();
        instances
            .entry(n)
            .or_insert_with(|| Arc::new(MaskCache::build(n)))
            .clone()
    }

    fn build(n: usize) -> MaskCache {
        log::info!("building mask cache for n={n}");
        assert!(n > 0);
        assert!(n < Output::BITS as usize);
        let universe = 1usize << n;

        let mut one: Vec<OutputBits> = Vec::with_capacity(n);
        let mut zero: Vec<OutputBits> = Vec::with_capacity(n);
        for i in 0..n {
            let mut mask = bitvec![u64, Lsb0; 0; universe];
            for x in 0..universe {
                if x >> i & 1 != 0 {
                    mask.set(x, true);
                }
            }
            zero.push(!mask.clone());
            one.push(mask);
        }

        // Only i < j is ever queried; the rest stay empty.
        let mut one_zero: Vec<Vec<OutputBits>> = vec![vec![OutputBits::new(); n]; n];
        for i in 0..n {
            for j in i + 1..n {
                let mut mask = one[i].clone();
                mask &= zero[j].as_bitslice();
                one_zero[i][j] = mask;
            }
        }

        let mut by_pop: Vec<OutputBits> = vec![bitvec![u64, Lsb0; 0; universe]; n + 1];
        for x in 0..universe {
            by_pop[x.count_ones() as usize].set(x, true);
        }

        MaskCache {
            n,
            zero,
            one,
            one_zero,
            by_pop,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Mask of outputs with bit i = 0.
    pub fn zero(&self, i: usize) -> &OutputBits {
        &self.zero[i]
    }

    /// Mask of outputs with bit i = 1.
    pub fn one(&self, i: usize) -> &OutputBits {
        &self.one[i]
    }

    /// Mask of outputs with bit i = 1 and bit j = 0. Requires i < j.
    pub fn one_zero(&self, i: usize, j: usize) -> &OutputBits {
        assert!(i < j);
        let mask = &self.one_zero[i][j];
        assert!(!mask.is_empty());
        mask
    }

    /// Mask of outputs with exactly `popcount` one bits (0 ≤ popcount ≤ n).
    pub fn by_popcount(&self, popcount: usize) -> &OutputBits {
        &self.by_pop[popcount]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_one_are_complements() {
        let cache = MaskCache::get(4);
        for i in 0..4 {
            let mut both = cache.one(i).clone();
            both &= cache.zero(i).as_bitslice();
            assert!(both.not_any());
            let mut either = cache.one(i).clone();
            either |= cache.zero(i).as_bitslice();
            assert!(either.all());
        }
    }

    #[test]
    fn one_zero_matches_definition() {
        let cache = MaskCache::get(5);
        for i in 0..5 {
            for j in i + 1..5 {
                let mask = cache.one_zero(i, j);
                for x in 0..1usize << 5 {
                    let expected = x >> i & 1 == 1 && x >> j & 1 == 0;
                    assert_eq!(mask[x], expected, "i={i} j={j} x={x:05b}");
                }
            }
        }
    }

    #[test]
    fn popcount_masks_partition_universe() {
        let cache = MaskCache::get(6);
        let mut union = bitvec![u64, Lsb0; 0; 1 << 6];
        let mut total = 0;
        for w in 0..=6 {
            total += cache.by_popcount(w).count_ones();
            union |= cache.by_popcount(w).as_bitslice();
        }
        assert_eq!(total, 1 << 6);
        assert!(union.all());
    }

    #[test]
    fn instances_are_shared() {
        let a = MaskCache::get(3);
        let b = MaskCache::get(3);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.n(), 3);
    }
}
