// SPDX-License-Identifier: Apache-2.0

//! CNF encoding of "prefix P extends to a sorting network of target depth".
//!
//! Variable families, with names that round-trip through the DIMACS
//! comments for the decoder:
//!
//! - `g_{k}_{i}_{j}`: comparator (i,j) sits in suffix layer k.
//! - `used_{k}_{i}`: channel i is an endpoint of some comparator in layer k.
//! - `one_down_{k}_{i}_{j}` / `one_up_{k}_{i}_{j}`: a comparator leaves i
//!   downward into (i,j], resp. enters j upward from [i,j).
//! - `v_{m}_{k}_{i}`: value of channel i before suffix layer k when the
//!   input is prefix output m. Channels outside the output's unsorted
//!   window are pinned to the `true`/`false` sentinels instead.
//!
//! Symmetric mode aliases each variable with its mirror image so the model
//! space only contains reflection-symmetric suffixes.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cnf::{Clause, Formula, Lit, VarTable};
use crate::network::Network;
use crate::output::to_binary_string;

/// a ⇒ (b ↔ (c ∨ d)) as three clauses.
fn implies_eq_or(a: Lit, b: Lit, c: Lit, d: Lit) -> Formula {
    let mut formula = Formula::from(Clause::or(&[!a, b, !c]));
    formula.and_assign_clause(Clause::or(&[!a, b, !d]));
    formula.and_assign_clause(Clause::or(&[!a, !b, c, d]));
    formula
}

/// a ⇒ (b ↔ (c ∧ d)) as three clauses.
fn implies_eq_and(a: Lit, b: Lit, c: Lit, d: Lit) -> Formula {
    let mut formula = Formula::from(Clause::or(&[!a, !b, c]));
    formula.and_assign_clause(Clause::or(&[!a, !b, d]));
    formula.and_assign_clause(Clause::or(&[!a, b, !c, !d]));
    formula
}

/// Builds the suffix-search formula for `prefix` with `suffix_depth` layers
/// to fill. `subnet_channels` skips any prefix output whose unsorted window
/// is wider than the limit. The formula is SAT iff such a suffix exists.
pub fn build_suffix_formula(
    n: usize,
    suffix_depth: usize,
    prefix: &Network,
    subnet_channels: Option<usize>,
    vars: &mut VarTable,
    symmetric: bool,
) -> Formula {
    let d = suffix_depth;
    assert!(d >= 1);
    if symmetric {
        assert_eq!(n % 2, 0);
    }
    assert!(!prefix.outputs.is_empty(), "prefix must carry outputs");

    let mut formula = Formula::truth();

    // The invalid sentinel fills array slots that must never be read; the
    // final assertion below proves none leaked into the formula.
    let invalid = vars.add("invalid");
    let true_lit = vars.add("true");
    formula.and_assign_clause(Clause::unit(true_lit));
    let false_lit = vars.add("false");
    formula.and_assign_clause(Clause::unit(!false_lit));

    // g[k][i][j], 0 <= i < j < n. In symmetric mode the mirror pair with the
    // smaller index owns the variable.
    let mut g: Vec<Vec<Vec<Lit>>> = Vec::with_capacity(d);
    for k in 0..d {
        let mut layer_vars = vec![vec![invalid; n]; n];
        for i in 0..n {
            for j in i + 1..n {
                if symmetric {
                    let i_sym = n - 1 - i;
                    let j_sym = n - 1 - j;
                    if j_sym < i {
                        let mirror = layer_vars[j_sym][i_sym];
                        layer_vars[i][j] = mirror;
                        continue;
                    }
                }
                layer_vars[i][j] = vars.add(format!("g_{k}_{i}_{j}"));
            }
        }
        g.push(layer_vars);
    }

    // Matching: each channel is an endpoint of at most one comparator per
    // layer.
    for k in 0..d {
        for i in 0..n {
            for j0 in 0..n {
                if j0 == i {
                    continue;
                }
                for j1 in j0 + 1..n {
                    if j1 == i {
                        continue;
                    }
                    let no_i_j0 = !g[k][i.min(j0)][i.max(j0)];
                    let no_i_j1 = !g[k][i.min(j1)][i.max(j1)];
                    formula.and_assign_clause(Clause::or(&[no_i_j0, no_i_j1]));
                }
            }
        }
    }

    let mut used: Vec<Vec<Lit>> = Vec::with_capacity(d);
    for k in 0..d {
        let mut layer_used = vec![invalid; n];
        for i in 0..n {
            if symmetric {
                let i_sym = n - 1 - i;
                if i_sym < i {
                    layer_used[i] = layer_used[i_sym];
                    continue;
                }
            }
            layer_used[i] = vars.add(format!("used_{k}_{i}"));
        }
        used.push(layer_used);
    }

    // used[k][i] <-> some comparator in layer k touches i.
    for k in 0..d {
        for i in 0..n {
            let mut touching = Clause::empty();
            for j in 0..n {
                if i < j {
                    touching.literals.push(g[k][i][j]);
                } else if i > j {
                    touching.literals.push(g[k][j][i]);
                }
            }
            formula.and_assign(
                Formula::from(Clause::unit(used[k][i])).iff(&Formula::from(touching)),
            );
        }
    }

    // one_down[k][i][j] <-> exists g[k][i][l] with i < l <= j;
    // one_up[k][i][j] <-> exists g[k][l][j] with i <= l < j.
    let mut one_down: Vec<Vec<Vec<Lit>>> = vec![vec![vec![invalid; n]; n]; d];
    let mut one_up: Vec<Vec<Vec<Lit>>> = vec![vec![vec![invalid; n]; n]; d];
    for k in 0..d {
        for i in 0..n {
            for j in i..n {
                let down = vars.add(format!("one_down_{k}_{i}_{j}"));
                one_down[k][i][j] = down;
                let mut down_clause = Clause::empty();
                for l in i + 1..=j {
                    down_clause.literals.push(g[k][i][l]);
                }
                formula.and_assign(
                    Formula::from(Clause::unit(down)).iff(&Formula::from(down_clause)),
                );
                if symmetric {
                    one_up[k][n - 1 - j][n - 1 - i] = down;
                    continue;
                }
                let up = vars.add(format!("one_up_{k}_{i}_{j}"));
                one_up[k][i][j] = up;
                let mut up_clause = Clause::empty();
                for l in i..j {
                    up_clause.literals.push(g[k][l][j]);
                }
                formula
                    .and_assign(Formula::from(Clause::unit(up)).iff(&Formula::from(up_clause)));
            }
        }
    }

    // Non-redundant comparators in the last layer are adjacent.
    for i in 0..n {
        for j in i + 2..n {
            formula.and_assign_clause(Clause::unit(!g[d - 1][i][j]));
        }
    }

    // Second-to-last layer spans at most three channels.
    if d >= 2 {
        for i in 0..n {
            for j in i + 4..n {
                formula.and_assign_clause(Clause::unit(!g[d - 2][i][j]));
            }
        }
    }

    // A span-3 comparator in the second-to-last layer forces the adjacent
    // pair on each side of it in the last layer.
    if d >= 2 {
        for i in 0..n.saturating_sub(3) {
            formula.and_assign_clause(Clause::implies(g[d - 2][i][i + 3], g[d - 1][i][i + 1]));
            formula
                .and_assign_clause(Clause::implies(g[d - 2][i][i + 3], g[d - 1][i + 2][i + 3]));
        }
    }

    // A span-2 comparator there forces one of the two adjacent pairs under
    // it.
    if d >= 2 {
        for i in 0..n.saturating_sub(2) {
            formula.and_assign_clause(Clause::or(&[
                !g[d - 2][i][i + 2],
                g[d - 1][i][i + 1],
                g[d - 1][i + 1][i + 2],
            ]));
        }
    }

    // No two adjacent channels both idle in the last layer.
    for i in 0..n - 1 {
        formula.and_assign_clause(Clause::or(&[used[d - 1][i], used[d - 1][i + 1]]));
    }

    // A lone adjacent comparator at the edge of the last layer could move up
    // a layer; exclude those models.
    if d >= 2 {
        for i in 0..n.saturating_sub(2) {
            formula.and_assign_clause(Clause::or(&[
                !g[d - 1][i][i + 1],
                used[d - 1][i + 2],
                used[d - 2][i],
                used[d - 2][i + 1],
            ]));
            formula.and_assign_clause(Clause::or(&[
                !g[d - 1][i + 1][i + 2],
                used[d - 1][i],
                used[d - 2][i + 1],
                used[d - 2][i + 2],
            ]));
        }
    }

    // The suffix must sort every prefix-reachable output.
    for (m, &output) in prefix.outputs.iter().enumerate() {
        let binary_string: Vec<u8> = to_binary_string(n, output).into_bytes();
        let num_0s = binary_string.iter().filter(|&&b| b == b'0').count();

        let channel_begin = binary_string.iter().take_while(|&&b| b == b'0').count();
        let channel_end = n - binary_string.iter().rev().take_while(|&&b| b == b'1').count();

        if let Some(limit) = subnet_channels {
            if channel_end.saturating_sub(channel_begin) > limit {
                continue;
            }
        }

        // v[k][i]: channel value entering suffix layer k; the window margins
        // are constant.
        let mut v: Vec<Vec<Lit>> = Vec::with_capacity(d + 1);
        for k in 0..=d {
            let mut row = Vec::with_capacity(n);
            for i in 0..n {
                if i < channel_begin {
                    row.push(false_lit);
                } else if i < channel_end {
                    row.push(vars.add(format!("v_{m}_{k}_{i}")));
                } else {
                    row.push(true_lit);
                }
            }
            v.push(row);
        }

        for i in channel_begin..channel_end {
            if binary_string[i] == b'1' {
                formula.and_assign_clause(Clause::unit(v[0][i]));
            } else {
                formula.and_assign_clause(Clause::unit(!v[0][i]));
            }
        }

        for k in 0..d {
            for i in channel_begin..channel_end {
                // A zero stays zero unless a comparator reaches i from above.
                formula.and_assign_clause(Clause::or(&[
                    v[k][i],
                    one_up[k][channel_begin][i],
                    !v[k + 1][i],
                ]));
                for j in channel_begin..i {
                    formula.and_assign(implies_eq_or(g[k][j][i], v[k + 1][i], v[k][j], v[k][i]));
                }
                // A one stays one unless a comparator leaves i downward.
                formula.and_assign_clause(Clause::or(&[
                    !v[k][i],
                    one_down[k][i][channel_end - 1],
                    v[k + 1][i],
                ]));
                for j in i + 1..channel_end {
                    formula.and_assign(implies_eq_and(g[k][i][j], v[k + 1][i], v[k][i], v[k][j]));
                }
            }
        }

        // Sorted exit: num_0s zeros followed by ones.
        for i in channel_begin..channel_end {
            if i < num_0s {
                formula.and_assign_clause(Clause::unit(!v[d][i]));
            } else {
                formula.and_assign_clause(Clause::unit(v[d][i]));
            }
        }
    }

    assert!(
        !formula.mentions(invalid.variable()),
        "invalid sentinel leaked into the formula"
    );

    formula
}

/// Writes the CNF for one prefix as `NNNN.cnf.gz` under `cnf_dir`, via a
/// temp-file rename so partially written files never look finished.
/// Returns false without writing when a `.cnf` or `.cnf.gz` already exists,
/// which makes interrupted batch runs resumable.
pub fn write_prefix_cnf(
    n: usize,
    total_depth: usize,
    prefix_idx: usize,
    prefix: &Network,
    cnf_dir: &Path,
    subnet_channels: Option<usize>,
    symmetric: bool,
) -> Result<bool> {
    let plain = cnf_dir.join(format!("{prefix_idx:04}.cnf"));
    let gzipped = cnf_dir.join(format!("{prefix_idx:04}.cnf.gz"));
    if plain.exists() || gzipped.exists() {
        return Ok(false);
    }

    let suffix_depth = total_depth
        .checked_sub(prefix.layers.len())
        .expect("prefix deeper than target depth");
    let mut vars = VarTable::new();
    let formula = build_suffix_formula(n, suffix_depth, prefix, subnet_channels, &mut vars, symmetric);

    let tmp = cnf_dir.join(format!("{prefix_idx:04}.cnf.tmp.gz"));
    formula.write_dimacs(&tmp, &vars)?;
    std::fs::rename(&tmp, &gzipped)
        .with_context(|| format!("renaming {} into place", tmp.display()))?;
    Ok(true)
}
