// SPDX-License-Identifier: Apache-2.0

//! Dense representation of a network's reachable-output set.
//!
//! A bitset of length 2ⁿ starts with every vector reachable and shrinks as
//! comparators are applied. The comparator step is branch-free: the "bad"
//! vectors (bit i = 1, bit j = 0) are masked out and re-inserted at their
//! swapped positions, which is a plain shift by 2ʲ − 2ⁱ.

use bitvec::prelude::*;

use crate::mask_cache::{MaskCache, OutputBits};
use crate::output::Output;

pub struct OutputBitset {
    n: usize,
    bits: OutputBits,
}

impl OutputBitset {
    /// Starts from the full universe {0,1}ⁿ.
    pub fn new(n: usize) -> OutputBitset {
        assert!(n > 0);
        assert!(n < Output::BITS as usize);
        OutputBitset {
            n,
            bits: bitvec![u64, Lsb0; 1; 1 << n],
        }
    }

    /// Applies comparator (i, j): every vector with bit i = 1 and bit j = 0
    /// moves to the vector with those bits swapped. Requires i < j.
    pub fn add_comparator(&mut self, i: usize, j: usize) {
        assert!(i < j);
        let cache = MaskCache::get(self.n);
        let mut active = self.bits.clone();
        active &= cache.one_zero(i, j).as_bitslice();
        // x - 2^i + 2^j is exactly the swap when bit i is set and bit j clear.
        let delta = (1usize << j) - (1usize << i);
        self.bits ^= active.as_bitslice();
        active.shift_right(delta);
        self.bits |= active.as_bitslice();
    }

    /// Enumerates the surviving vectors in ascending order.
    pub fn to_sparse(&self) -> Vec<Output> {
        self.bits.iter_ones().map(|x| x as Output).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::apply_comparator;
    use rand::{Rng, SeedableRng};

    #[test]
    fn starts_with_full_universe() {
        let bitset = OutputBitset::new(3);
        assert_eq!(bitset.to_sparse(), (0..8).collect::<Vec<Output>>());
    }

    #[test]
    fn single_comparator_collapses_bad_pairs() {
        let mut bitset = OutputBitset::new(2);
        bitset.add_comparator(0, 1);
        assert_eq!(bitset.to_sparse(), vec![0b00, 0b10, 0b11]);
    }

    #[test]
    fn matches_sparse_recomputation() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        for n in 2..=7usize {
            let mut bitset = OutputBitset::new(n);
            let mut sparse: Vec<Output> = (0..1 << n).collect();
            for _ in 0..10 {
                let i = rng.gen_range(0..n - 1);
                let j = rng.gen_range(i + 1..n);
                bitset.add_comparator(i, j);
                sparse = apply_comparator(&sparse, i, j);
                assert_eq!(bitset.to_sparse(), sparse, "n={n} after ({i},{j})");
            }
        }
    }

    #[test]
    fn sorting_network_reaches_sorted_outputs_only() {
        // [(0,2),(1,3)], [(0,1),(2,3)], [(1,2)] sorts 4 channels.
        let mut bitset = OutputBitset::new(4);
        for (i, j) in [(0, 2), (1, 3), (0, 1), (2, 3), (1, 2)] {
            bitset.add_comparator(i, j);
        }
        assert_eq!(
            bitset.to_sparse(),
            vec![0b0000, 0b1000, 0b1100, 0b1110, 0b1111]
        );
    }
}
