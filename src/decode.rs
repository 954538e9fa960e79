// SPDX-License-Identifier: Apache-2.0

//! Reconstruction of networks from SAT solver output.
//!
//! The encoder's `c var k : g_<layer>_<i>_<j>` comments give the mapping
//! from DIMACS variables back to comparators; the solver's positive
//! literals select which of them are present. The rebuilt suffix is
//! un-permuted, concatenated onto its prefix, and verified.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use regex::Regex;

use crate::container::network_outputs;
use crate::network::{Comparator, Network};
use crate::output::is_symmetric;
use crate::perm::inverse_permutation;
use crate::simplify::simplify;

/// Maps DIMACS variable index to (suffix layer, i, j) for every comparator
/// variable declared in the CNF's comment preamble. Accepts `.gz` files.
pub fn parse_cnf_comparator_vars(path: &Path) -> Result<HashMap<i32, (usize, usize, usize)>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(file)
    };
    let pattern = Regex::new(r"^c var (\d+) : g_(\d+)_(\d+)_(\d+)$").unwrap();
    let mut var_to_comparator = HashMap::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if line.starts_with("p cnf ") {
            break;
        }
        if let Some(captures) = pattern.captures(&line) {
            let var: i32 = captures[1].parse()?;
            let layer: usize = captures[2].parse()?;
            let i: usize = captures[3].parse()?;
            let j: usize = captures[4].parse()?;
            assert!(i < j, "malformed comparator variable in {}", path.display());
            var_to_comparator.insert(var, (layer, i, j));
        }
    }
    if var_to_comparator.is_empty() {
        bail!("no comparator variables found in {}", path.display());
    }
    Ok(var_to_comparator)
}

/// Parses a solver result: `None` for UNSAT, otherwise the assignment's
/// signed literals. The first non-empty line must be `SAT` or `UNSAT`.
pub fn parse_solution(path: &Path) -> Result<Option<Vec<i32>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let verdict = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    break line.trim().to_string();
                }
            }
            None => bail!("{}: empty solution file", path.display()),
        }
    };
    match verdict.as_str() {
        "UNSAT" => Ok(None),
        "SAT" => {
            let mut assignment = Vec::new();
            for line in lines {
                for token in line?.split_whitespace() {
                    let literal: i32 = token
                        .parse()
                        .with_context(|| format!("{}: bad literal {token:?}", path.display()))?;
                    assignment.push(literal);
                }
            }
            Ok(Some(assignment))
        }
        other => bail!("{}: expected SAT or UNSAT, found {other:?}", path.display()),
    }
}

/// Parses one permutation per line, space-separated.
pub fn parse_permutation_file(path: &Path) -> Result<Vec<Vec<usize>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut permutations = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let permutation: Vec<usize> = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .with_context(|| format!("{}: bad index {token:?}", path.display()))
            })
            .collect::<Result<_>>()?;
        permutations.push(permutation);
    }
    Ok(permutations)
}

/// Rebuilds the suffix selected by `assignment`, appends it to `prefix`
/// after undoing `permutation`, and verifies the result is a sorting
/// network (and symmetric, in symmetric mode). A failed verification is an
/// encoder/decoder bug and aborts with the network dump.
///
/// When `permuted_prefix` is given, the suffix is additionally verified
/// in the permuted channel order it was actually solved in.
pub fn reconstruct_network(
    prefix: &Network,
    permuted_prefix: Option<&Network>,
    permutation: &[usize],
    var_to_comparator: &HashMap<i32, (usize, usize, usize)>,
    assignment: &[i32],
    symmetric: bool,
    apply_simplify: bool,
) -> Network {
    let n = prefix.n;
    let mut suffix = Network::new(n, 0);
    // Assignment literals come in ascending variable order and comparator
    // variables are declared layer by layer, so layers appear in order.
    for &literal in assignment {
        if literal <= 0 {
            continue;
        }
        let Some(&(layer, i, j)) = var_to_comparator.get(&literal) else {
            continue;
        };
        if layer >= suffix.layers.len() {
            suffix.add_empty_layer();
        }
        assert_eq!(layer + 1, suffix.layers.len(), "suffix layers out of order");
        suffix.add_comparator(Comparator::new(i, j));
        if symmetric && i + j != n - 1 {
            suffix.add_comparator(Comparator::new(n - 1 - j, n - 1 - i));
        }
    }

    if let Some(permuted_prefix) = permuted_prefix {
        let mut permuted = permuted_prefix.clone();
        for layer in &suffix.layers {
            permuted.add_empty_layer();
            for (i, &j) in layer.matching.iter().enumerate() {
                if j > i as i32 {
                    permuted.add_comparator(Comparator::new(i, j as usize));
                }
            }
        }
        assert!(
            permuted.is_sorting_network(),
            "suffix does not sort the permuted prefix:\n{}",
            permuted.render(false)
        );
    }

    let suffix = suffix.permute_channels(&inverse_permutation(permutation));
    let mut network = prefix.clone();
    network.layers.extend(suffix.layers);
    network.outputs.clear();
    network.outputs = network_outputs(&network);

    if symmetric {
        assert!(network.is_symmetric(), "decoded network lost layer symmetry");
        assert!(
            is_symmetric(n, &network.outputs),
            "decoded network lost output symmetry"
        );
    }
    assert!(
        network.is_sorting_network(),
        "decoded network does not sort:\n{}",
        network.render(false)
    );

    if apply_simplify {
        let network = simplify(&network);
        assert!(network.is_sorting_network());
        if symmetric {
            assert!(network.is_symmetric());
            assert!(is_symmetric(n, &network.outputs));
        }
        return network;
    }
    network
}
