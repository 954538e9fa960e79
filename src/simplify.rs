// SPDX-License-Identifier: Apache-2.0

//! Removal of comparators that never fire.

use crate::container::network_outputs;
use crate::network::{Comparator, Network};

/// Rebuilds `network` layer by layer, keeping a comparator only when the
/// rebuilt prefix still reaches an output with that pair inverted. Layer 0
/// is kept verbatim. The output set is unchanged, so the result sorts iff
/// the input does.
pub fn simplify(network: &Network) -> Network {
    if network.layers.is_empty() {
        return network.clone();
    }

    let n = network.n;
    let mut simplified = Network::new(n, 0);
    simplified.layers.push(network.layers[0].clone());
    simplified.outputs = network_outputs(&simplified);

    for layer in &network.layers[1..] {
        simplified.add_empty_layer();
        for (i, &j) in layer.matching.iter().enumerate() {
            if j > i as i32 && simplified.has_inverse(i, j as usize) {
                simplified.add_comparator(Comparator::new(i, j as usize));
            }
        }
    }

    simplified
}
