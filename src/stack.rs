// SPDX-License-Identifier: Apache-2.0

//! Channel-disjoint product of two networks.

use crate::network::{Network, UNMATCHED};
use crate::output::Output;

/// Stacks `net_a` and `net_b` into one network on n_a + n_b channels.
///
/// Non-symmetric mode keeps A on the low channels and shifts B above it.
/// Symmetric mode splits A around its midpoint and nests B in between, which
/// keeps the result reflection-symmetric when both inputs are. Layer k of
/// the result is the union of layer k of each input; the output set is the
/// Cartesian OR of the two (disjoint) permuted output sets.
pub fn stack_networks(net_a: &Network, net_b: &Network, symmetric: bool) -> Network {
    let n_a = net_a.n;
    let n_b = net_b.n;

    let mut perm_a: Vec<usize> = (0..n_a).collect();
    let mut perm_b: Vec<usize> = (0..n_b).collect();
    if symmetric {
        assert_eq!(n_a % 2, 0);
        assert_eq!(n_b % 2, 0);
        for (i, p) in perm_a.iter_mut().enumerate() {
            *p = if i < n_a / 2 { i } else { i + n_b };
        }
        for (i, p) in perm_b.iter_mut().enumerate() {
            *p = i + n_a / 2;
        }
    } else {
        for (i, p) in perm_b.iter_mut().enumerate() {
            *p = i + n_a;
        }
    }

    let n = n_a + n_b;
    let mut result = Network::new(n, net_a.layers.len().max(net_b.layers.len()));
    for (source, perm) in [(net_a, &perm_a), (net_b, &perm_b)] {
        for (l, layer) in source.layers.iter().enumerate() {
            for (i, &j) in layer.matching.iter().enumerate() {
                if j > i as i32 {
                    let new_i = perm[i];
                    let new_j = perm[j as usize];
                    let result_layer = &mut result.layers[l];
                    assert_eq!(result_layer.matching[new_i], UNMATCHED);
                    assert_eq!(result_layer.matching[new_j], UNMATCHED);
                    result_layer.matching[new_i] = new_j as i32;
                    result_layer.matching[new_j] = new_i as i32;
                }
            }
        }
    }

    let spread = |outputs: &[Output], perm: &[usize]| -> Vec<Output> {
        outputs
            .iter()
            .map(|&x| {
                let mut y = 0;
                for (i, &p) in perm.iter().enumerate() {
                    y |= ((x >> i) & 1) << p;
                }
                y
            })
            .collect()
    };
    let outputs_a = spread(&net_a.outputs, &perm_a);
    let outputs_b = spread(&net_b.outputs, &perm_b);
    for &a in &outputs_a {
        for &b in &outputs_b {
            assert_eq!(a & b, 0);
            result.outputs.push(a | b);
        }
    }
    result.outputs.sort_unstable();
    result
}
