// SPDX-License-Identifier: Apache-2.0

//! Permutation helpers shared by the canonicalization and window stages.

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Returns a uniformly random permutation of `0..n`.
pub fn random_permutation(n: usize, rng: &mut StdRng) -> Vec<usize> {
    assert!(n > 0);
    let mut perm: Vec<usize> = (0..n).collect();
    perm.shuffle(rng);
    perm
}

/// Computes the inverse permutation: `inverse[perm[i]] = i`.
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; perm.len()];
    for (i, &p) in perm.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

/// Parses a permutation of `0..n` from a comma- or space-separated list.
pub fn parse_permutation(text: &str, n: usize) -> Result<Vec<usize>> {
    let mut perm = Vec::with_capacity(n);
    let mut used = vec![false; n];
    for token in text.split([',', ' ']).filter(|t| !t.is_empty()) {
        let x: usize = token
            .parse()
            .map_err(|_| anyhow::anyhow!("bad permutation entry: {token:?}"))?;
        if x >= n {
            bail!("permutation entry {x} out of range for n={n}");
        }
        if used[x] {
            bail!("permutation entry {x} repeated");
        }
        used[x] = true;
        perm.push(x);
    }
    if perm.len() != n {
        bail!("permutation has {} entries, expected {n}", perm.len());
    }
    Ok(perm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn inverse_of_inverse_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        for n in 1..=10 {
            let perm = random_permutation(n, &mut rng);
            assert_eq!(inverse_permutation(&inverse_permutation(&perm)), perm);
        }
    }

    #[test]
    fn inverse_composes_to_identity() {
        let mut rng = StdRng::seed_from_u64(2);
        let perm = random_permutation(8, &mut rng);
        let inverse = inverse_permutation(&perm);
        for i in 0..8 {
            assert_eq!(inverse[perm[i]], i);
        }
    }

    #[test]
    fn parse_accepts_commas_and_spaces() {
        assert_eq!(parse_permutation("2,0,1", 3).unwrap(), vec![2, 0, 1]);
        assert_eq!(parse_permutation("2 0 1", 3).unwrap(), vec![2, 0, 1]);
        assert!(parse_permutation("0,1", 3).is_err());
        assert!(parse_permutation("0,0,1", 3).is_err());
        assert!(parse_permutation("0,1,3", 3).is_err());
    }
}
