// SPDX-License-Identifier: Apache-2.0

//! Layered comparator networks.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::output::{apply_comparator, has_inverse, Output};

/// Sentinel for a channel not touched by any comparator in a layer.
pub const UNMATCHED: i32 = -1;

/// A comparator between channels i and j, i < j.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Comparator {
    i: usize,
    j: usize,
}

impl Comparator {
    pub fn new(i: usize, j: usize) -> Comparator {
        assert!(i < j, "comparator requires i < j, got ({i},{j})");
        Comparator { i, j }
    }

    pub fn i(&self) -> usize {
        self.i
    }

    pub fn j(&self) -> usize {
        self.j
    }
}

/// One layer of a network: a matching on the n channels.
///
/// `matching[i] = j` means a comparator joins channels i and j (stored on
/// both endpoints); [`UNMATCHED`] means channel i is free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub matching: Vec<i32>,
}

impl Layer {
    pub fn new(n: usize) -> Layer {
        Layer {
            matching: vec![UNMATCHED; n],
        }
    }

    pub fn n(&self) -> usize {
        self.matching.len()
    }

    pub fn is_empty_layer(&self) -> bool {
        self.matching.iter().all(|&j| j == UNMATCHED)
    }

    /// Renders the comparators as `(i,j),(k,l)` with i < j.
    pub fn to_bracket(&self) -> String {
        let mut s = String::new();
        for (i, &j) in self.matching.iter().enumerate() {
            if j > i as i32 {
                let _ = write!(s, "({},{}),", i, j);
            }
        }
        s.pop();
        s
    }
}

/// A comparator network: n channels and a sequence of layers, with an
/// optionally cached reachable-output set (empty = not computed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub n: usize,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl Network {
    pub fn new(n: usize, num_layers: usize) -> Network {
        Network {
            n,
            layers: vec![Layer::new(n); num_layers],
            outputs: Vec::new(),
        }
    }

    /// Total comparator count across all layers.
    pub fn size(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|layer| layer.matching.iter().enumerate())
            .filter(|&(i, &j)| j > i as i32)
            .count()
    }

    /// Renders a `# n=…` header followed by one `[…]` per layer, either one
    /// layer per line or all layers on a single comma-separated line.
    pub fn render(&self, one_line: bool) -> String {
        let mut s = format!(
            "# n={}, depth={}, size={}\n",
            self.n,
            self.layers.len(),
            self.size()
        );
        let separator = if one_line { ',' } else { '\n' };
        for layer in &self.layers {
            let _ = write!(s, "[{}]{}", layer.to_bracket(), separator);
        }
        if one_line {
            s.pop();
            s.push('\n');
        }
        s
    }

    /// True iff every layer is invariant under the channel reflection
    /// i ↦ n−1−i.
    pub fn is_symmetric(&self) -> bool {
        self.layers.iter().all(|layer| {
            (0..self.n).all(|i| {
                let j = layer.matching[i];
                let reflected_j = if j == UNMATCHED {
                    UNMATCHED
                } else {
                    self.n as i32 - 1 - j
                };
                layer.matching[self.n - 1 - i] == reflected_j
            })
        })
    }

    /// True iff some cached output has bit i = 1 and bit j = 0. Requires
    /// i < j and cached outputs.
    pub fn has_inverse(&self, i: usize, j: usize) -> bool {
        has_inverse(&self.outputs, i, j)
    }

    pub fn add_empty_layer(&mut self) {
        self.layers.push(Layer::new(self.n));
    }

    /// Places a comparator in the last layer; both endpoints must be free.
    /// The cached outputs, if present, are updated in place.
    pub fn add_comparator(&mut self, comparator: Comparator) {
        let layer = self.layers.last_mut().expect("network has no layers");
        assert_eq!(layer.matching[comparator.i()], UNMATCHED);
        assert_eq!(layer.matching[comparator.j()], UNMATCHED);
        layer.matching[comparator.i()] = comparator.j() as i32;
        layer.matching[comparator.j()] = comparator.i() as i32;
        self.outputs = apply_comparator(&self.outputs, comparator.i(), comparator.j());
    }

    /// True iff the cached outputs are exactly the n+1 sorted vectors
    /// (k ones packed at the top, 0 ≤ k ≤ n).
    pub fn is_sorting_network(&self) -> bool {
        if self.outputs.len() != self.n + 1 {
            return false;
        }
        self.outputs
            .iter()
            .enumerate()
            .all(|(k, &x)| x == ((1 << k) - 1) << (self.n - k))
    }

    /// Rewrites every comparator (i, j) to (perm[i], perm[j]).
    ///
    /// When an image pair comes out reversed the comparator reorders those
    /// two wires, so the permutation entries are swapped along with the
    /// endpoints to keep later layers consistent. The returned network has
    /// no cached outputs.
    pub fn permute_channels(&self, perm: &[usize]) -> Network {
        assert_eq!(perm.len(), self.n);
        let mut perm = perm.to_vec();
        let mut permuted = Network::new(self.n, self.layers.len());
        for (l, layer) in self.layers.iter().enumerate() {
            for i in 0..self.n {
                let j = layer.matching[i];
                if j > i as i32 {
                    let j = j as usize;
                    let mut new_i = perm[i];
                    let mut new_j = perm[j];
                    if new_i > new_j {
                        std::mem::swap(&mut new_i, &mut new_j);
                        perm.swap(i, j);
                    }
                    let new_layer = &mut permuted.layers[l];
                    assert_eq!(new_layer.matching[new_i], UNMATCHED);
                    assert_eq!(new_layer.matching[new_j], UNMATCHED);
                    new_layer.matching[new_i] = new_j as i32;
                    new_layer.matching[new_j] = new_i as i32;
                }
            }
        }
        permuted
    }
}
