// SPDX-License-Identifier: Apache-2.0

//! Budgeted pruning of an extended-network collection.

use rand::rngs::StdRng;

use crate::container::remove_redundant_networks;
use crate::network::Network;

/// Reduces `networks` to at most `keep_best_count` survivors that are
/// mutually non-redundant under the full pruner, sorted ascending by
/// |outputs|.
///
/// A fast pruning pass goes first; the full pruner then runs on a prefilter
/// of the smallest survivors. The prefilter grows and the full pass repeats
/// whenever the cut turns out to have excluded candidates that could still
/// belong to the top keep_best_count, so a survivor of this function is
/// always a survivor of the full pruner over the whole input.
pub fn clean_up(
    networks: Vec<Network>,
    symmetric: bool,
    keep_best_count: usize,
    rng: &mut StdRng,
) -> Vec<Network> {
    if networks.is_empty() {
        return networks;
    }
    assert!(keep_best_count > 0);
    if keep_best_count >= networks.len() {
        return remove_redundant_networks(networks, symmetric, false, rng);
    }
    let networks = remove_redundant_networks(networks, symmetric, true, rng);

    const PRE_FILTER_FACTOR: f64 = 2.0;
    let mut filter_count = (keep_best_count as f64 * PRE_FILTER_FACTOR).ceil() as usize;
    loop {
        let is_filtered = networks.len() > filter_count;
        let filtered: Vec<Network> = if is_filtered {
            networks[..filter_count].to_vec()
        } else {
            networks.clone()
        };
        let mut filtered = remove_redundant_networks(filtered, symmetric, false, rng);
        debug_assert!(filtered.is_sorted_by_key(|network| network.outputs.len()));

        let enough = !is_filtered
            || (filtered.len() > keep_best_count
                && filtered.last().unwrap().outputs.len()
                    > filtered[keep_best_count - 1].outputs.len());
        if enough {
            let threshold =
                filtered[keep_best_count.min(filtered.len()) - 1].outputs.len();
            while filtered.last().unwrap().outputs.len() > threshold {
                filtered.pop();
            }
            return filtered;
        }

        // The prefilter was too aggressive: everything in it survived, so the
        // true top keep_best_count may extend past the cut. Grow and retry.
        const GROWTH_FACTOR: f64 = 1.5;
        filter_count = (GROWTH_FACTOR
            * filter_count as f64
            * keep_best_count.max(filtered.len()) as f64
            / filtered.len() as f64)
            .ceil() as usize;
        log::info!("clean_up: growing prefilter to {filter_count} and retrying");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::create_first_layer;
    use crate::extend::extend_networks;
    use rand::SeedableRng;

    /// All depth-2 extensions for n=6, cleaned with a tight budget: the
    /// result respects the budget up to the |outputs| tie at the cut and
    /// every survivor also survives the unbudgeted pruner.
    #[test]
    fn budgeted_result_is_prefix_of_full_result() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut networks = create_first_layer(6, false);
        for network in &mut networks {
            network.add_empty_layer();
        }
        let all = extend_networks(6, &networks, false, false, usize::MAX, &mut rng);
        assert_eq!(all.len(), 5);

        let mut rng = StdRng::seed_from_u64(0);
        let mut networks = create_first_layer(6, false);
        for network in &mut networks {
            network.add_empty_layer();
        }
        let budgeted = extend_networks(6, &networks, false, false, 2, &mut rng);
        assert!(budgeted.len() >= 2);
        let threshold = budgeted[1].outputs.len();
        assert!(budgeted.iter().all(|network| network.outputs.len() <= threshold));
        let full_sizes: Vec<usize> = all.iter().map(|network| network.outputs.len()).collect();
        for network in &budgeted {
            assert!(full_sizes.contains(&network.outputs.len()));
        }
    }

    #[test]
    fn large_budget_equals_full_pruning() {
        let mut rng = StdRng::seed_from_u64(3);
        let networks = create_first_layer(4, false);
        let cleaned = clean_up(networks.clone(), false, 100, &mut rng);
        assert_eq!(cleaned.len(), networks.len());
    }
}
