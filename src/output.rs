// SPDX-License-Identifier: Apache-2.0

//! Operations on binary outputs of a sorting network.
//!
//! For n channels, bit i of an [`Output`] is the value carried on channel i.
//! Sets of outputs are kept as sorted, deduplicated `Vec<Output>`.

/// A binary output of an n-channel network. Bit i is the value of channel i.
/// Widen to `u64` if n grows past 31.
pub type Output = u32;

/// Window-size statistics over a set of outputs. The window of an output is
/// the unsorted middle region between its leading zeros and trailing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowStats {
    pub sum: usize,
    pub sum_sqr: usize,
    pub max: usize,
}

/// Renders the low n bits of `x`, channel 0 first.
pub fn to_binary_string(n: usize, x: Output) -> String {
    let mut s = String::with_capacity(n);
    for i in 0..n {
        s.push(if (x >> i) & 1 != 0 { '1' } else { '0' });
    }
    s
}

/// Number of 0-valued channels before the first 1, scanning from channel 0.
fn leading_zeros(n: usize, x: Output) -> usize {
    (0..n).take_while(|&i| (x >> i) & 1 == 0).count()
}

/// Number of 1-valued channels after the last 0, scanning from channel n-1.
fn trailing_ones(n: usize, x: Output) -> usize {
    (0..n).rev().take_while(|&i| (x >> i) & 1 != 0).count()
}

/// Computes the sum, sum of squares, and maximum of the window sizes of
/// `outputs`.
pub fn window_stats(n: usize, outputs: &[Output]) -> WindowStats {
    let mut stats = WindowStats::default();
    for &x in outputs {
        let window = n - leading_zeros(n, x) - trailing_ones(n, x);
        stats.sum += window;
        stats.sum_sqr += window * window;
        stats.max = stats.max.max(window);
    }
    stats
}

/// Moves bit i of every element to position `perm[i]` and returns the sorted
/// result.
pub fn permute_channels(set: &[Output], perm: &[usize]) -> Vec<Output> {
    let n = perm.len();
    let mut permuted: Vec<Output> = set
        .iter()
        .map(|&x| {
            let mut y = 0;
            for i in 0..n {
                y |= ((x >> i) & 1) << perm[i];
            }
            y
        })
        .collect();
    permuted.sort_unstable();
    permuted
}

/// Reverses channel order and complements every bit: bit k becomes
/// 1 - bit (n-1-k). This map is an involution.
pub fn reflect_and_invert(n: usize, x: Output) -> Output {
    assert!(n < Output::BITS as usize);
    let mut reflected = 0;
    for i in 0..n {
        reflected |= ((x >> i) & 1) << (n - 1 - i);
    }
    reflected ^ ((1 << n) - 1)
}

/// True iff `set` is closed under [`reflect_and_invert`]. Requires a sorted
/// set.
pub fn is_symmetric(n: usize, set: &[Output]) -> bool {
    debug_assert!(set.is_sorted());
    set.iter()
        .all(|&x| set.binary_search(&reflect_and_invert(n, x)).is_ok())
}

/// True iff some element has bit i = 1 and bit j = 0, i.e. a comparator
/// (i, j) would still have an effect on `outputs`.
pub fn has_inverse(outputs: &[Output], i: usize, j: usize) -> bool {
    assert!(i < j);
    outputs.iter().any(|&x| (x >> i) & 1 > (x >> j) & 1)
}

/// Applies comparator (i, j) to every element: where bit i > bit j, the two
/// bits are swapped. Returns the sorted, deduplicated image.
pub fn apply_comparator(outputs: &[Output], i: usize, j: usize) -> Vec<Output> {
    assert!(i < j);
    let swap_mask: Output = (1 << i) | (1 << j);
    let mut new_outputs: Vec<Output> = outputs
        .iter()
        .map(|&x| {
            if (x >> i) & 1 > (x >> j) & 1 {
                x ^ swap_mask
            } else {
                x
            }
        })
        .collect();
    new_outputs.sort_unstable();
    new_outputs.dedup();
    new_outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_string_is_channel0_first() {
        assert_eq!(to_binary_string(1, 0b0), "0");
        assert_eq!(to_binary_string(1, 0b1), "1");
        assert_eq!(to_binary_string(2, 0b01), "10");
        assert_eq!(to_binary_string(2, 0b10), "01");
        assert_eq!(to_binary_string(3, 0b101), "101");
        assert_eq!(to_binary_string(4, 0b1010), "0101");
    }

    #[test]
    fn reflect_and_invert_small_cases() {
        assert_eq!(reflect_and_invert(1, 0b0), 0b1);
        assert_eq!(reflect_and_invert(1, 0b1), 0b0);
        assert_eq!(reflect_and_invert(2, 0b01), 0b01);
        assert_eq!(reflect_and_invert(2, 0b10), 0b10);
        assert_eq!(reflect_and_invert(3, 0b011), 0b001);
        assert_eq!(reflect_and_invert(3, 0b001), 0b011);
        assert_eq!(reflect_and_invert(3, 0b010), 0b101);
    }

    #[test]
    fn reflect_and_invert_is_involution() {
        for n in 1..=8 {
            for x in 0..(1 as Output) << n {
                assert_eq!(reflect_and_invert(n, reflect_and_invert(n, x)), x);
            }
        }
    }

    #[test]
    fn window_stats_sorted_outputs_have_zero_window() {
        let outputs = vec![0b000, 0b100, 0b110, 0b111];
        let stats = window_stats(3, &outputs);
        assert_eq!(stats, WindowStats::default());
    }

    #[test]
    fn window_stats_counts_middle_region() {
        // 010: one leading zero, window 2. 001: no margin at all, window 3.
        let outputs = vec![0b010, 0b001];
        let stats = window_stats(3, &outputs);
        assert_eq!(stats.sum, 5);
        assert_eq!(stats.sum_sqr, 13);
        assert_eq!(stats.max, 3);
    }

    #[test]
    fn apply_comparator_swaps_and_dedups() {
        // 0b01 has bit0=1, bit1=0 so it swaps into 0b10 and collides with it.
        let outputs = vec![0b00, 0b01, 0b10, 0b11];
        assert_eq!(apply_comparator(&outputs, 0, 1), vec![0b00, 0b10, 0b11]);
    }

    #[test]
    fn apply_comparator_elements_come_from_input() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for n in 2..=6usize {
            for _ in 0..50 {
                let mut set: Vec<Output> =
                    (0..rng.gen_range(1..=12)).map(|_| rng.gen_range(0..1 << n)).collect();
                set.sort_unstable();
                set.dedup();
                let i = rng.gen_range(0..n - 1);
                let j = rng.gen_range(i + 1..n);
                let result = apply_comparator(&set, i, j);
                assert!(result.is_sorted());
                let swap_mask = ((1 << i) | (1 << j)) as Output;
                for &y in &result {
                    let preimage_swapped = set.contains(&(y ^ swap_mask))
                        && (y >> j) & 1 > (y >> i) & 1;
                    assert!(set.contains(&y) || preimage_swapped);
                }
            }
        }
    }

    #[test]
    fn has_inverse_detects_unsorted_pair() {
        let outputs = vec![0b001, 0b010];
        assert!(has_inverse(&outputs, 0, 1));
        assert!(has_inverse(&outputs, 0, 2));
        assert!(has_inverse(&outputs, 1, 2));
        let sorted = vec![0b000, 0b100, 0b110, 0b111];
        assert!(!has_inverse(&sorted, 0, 1));
        assert!(!has_inverse(&sorted, 1, 2));
    }

    #[test]
    fn permute_channels_roundtrip() {
        use crate::perm::inverse_permutation;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        for n in 2..=7usize {
            let mut set: Vec<Output> = (0..1 << n).step_by(3).collect();
            set.sort_unstable();
            let mut perm: Vec<usize> = (0..n).collect();
            perm.shuffle(&mut rng);
            let there = permute_channels(&set, &perm);
            let back = permute_channels(&there, &inverse_permutation(&perm));
            assert_eq!(back, set);
        }
    }

    #[test]
    fn symmetric_set_detected() {
        // {010, 101} is closed under reflect-and-invert for n=3.
        assert!(is_symmetric(3, &[0b010, 0b101]));
        assert!(!is_symmetric(3, &[0b001, 0b010]));
    }
}
