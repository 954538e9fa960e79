// SPDX-License-Identifier: Apache-2.0

//! Loading, saving, and collection-level maintenance of networks.
//!
//! Two container encodings carry full fidelity (n, matchings, optional
//! outputs): bincode behind a `.bin` extension and JSON behind `.json`.
//! The bracket text format is one network per line with no n prefix; the
//! caller supplies n.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::isomorphism::find_redundant_outputs;
use crate::network::{Layer, Network, UNMATCHED};
use crate::output::Output;
use crate::output_bitset::OutputBitset;

/// The reachable-output set of `network`: the cached copy when present,
/// otherwise recomputed densely from the universe.
pub fn network_outputs(network: &Network) -> Vec<Output> {
    if !network.outputs.is_empty() {
        return network.outputs.clone();
    }
    let mut bitset = OutputBitset::new(network.n);
    for layer in &network.layers {
        for (i, &j) in layer.matching.iter().enumerate() {
            if j > i as i32 {
                bitset.add_comparator(i, j as usize);
            }
        }
    }
    bitset.to_sparse()
}

/// Fills missing cached outputs across the collection, in parallel.
pub fn fill_outputs(networks: &mut [Network]) {
    log::info!("filling outputs for {} networks", networks.len());
    networks.par_iter_mut().for_each(|network| {
        if network.outputs.is_empty() {
            network.outputs = network_outputs(network);
        }
    });
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}

/// Loads a collection from a `.bin` (bincode) or `.json` container.
/// `expected_n = Some(n)` enforces a channel count; missing outputs are
/// recomputed in parallel.
pub fn load_collection(path: &Path, expected_n: Option<usize>) -> Result<Vec<Network>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut networks: Vec<Network> = match extension(path) {
        "bin" => bincode::deserialize_from(reader)
            .with_context(|| format!("decoding binary container {}", path.display()))?,
        "json" => serde_json::from_reader(reader)
            .with_context(|| format!("decoding JSON container {}", path.display()))?,
        other => bail!("unsupported container extension {other:?} ({})", path.display()),
    };
    for network in &networks {
        if let Some(n) = expected_n {
            if network.n != n {
                bail!("{}: network has n={}, expected {n}", path.display(), network.n);
            }
        }
        for layer in &network.layers {
            if layer.n() != network.n {
                bail!("{}: layer width {} does not match n={}", path.display(), layer.n(), network.n);
            }
        }
    }
    if networks.iter().any(|network| network.outputs.is_empty()) {
        log::info!("outputs missing in {}; recomputing", path.display());
        fill_outputs(&mut networks);
    }
    Ok(networks)
}

/// Saves a collection to a `.bin` or `.json` container chosen by extension.
pub fn save_collection(networks: &[Network], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    match extension(path) {
        "bin" => bincode::serialize_into(&mut writer, networks)
            .with_context(|| format!("encoding binary container {}", path.display()))?,
        "json" => serde_json::to_writer_pretty(&mut writer, networks)
            .with_context(|| format!("encoding JSON container {}", path.display()))?,
        other => bail!("unsupported container extension {other:?} ({})", path.display()),
    }
    writer.flush()?;
    Ok(())
}

fn parse_bracket_line(n: usize, line: &str, line_number: usize) -> Result<Vec<Layer>> {
    let mut layers = Vec::new();
    let bytes = line.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        while pos < bytes.len() && bytes[pos] != b'[' {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }
        pos += 1;
        let mut layer = Layer::new(n);
        while pos < bytes.len() && bytes[pos] != b']' {
            while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b',') {
                pos += 1;
            }
            if pos >= bytes.len() || bytes[pos] == b']' {
                break;
            }
            if bytes[pos] != b'(' {
                bail!("line {line_number}: expected '(' at column {pos}: {line}");
            }
            pos += 1;
            let comma = line[pos..]
                .find(',')
                .map(|k| pos + k)
                .ok_or_else(|| anyhow!("line {line_number}: expected ',' in pair: {line}"))?;
            let i: usize = line[pos..comma]
                .trim()
                .parse()
                .with_context(|| format!("line {line_number}: bad index in {line}"))?;
            pos = comma + 1;
            let close = line[pos..]
                .find(')')
                .map(|k| pos + k)
                .ok_or_else(|| anyhow!("line {line_number}: expected ')' in pair: {line}"))?;
            let j: usize = line[pos..close]
                .trim()
                .parse()
                .with_context(|| format!("line {line_number}: bad index in {line}"))?;
            pos = close + 1;

            if i >= n || j >= n {
                bail!("line {line_number}: comparator ({i},{j}) out of range for n={n}");
            }
            if i == j {
                bail!("line {line_number}: comparator endpoints must differ: ({i},{j})");
            }
            if layer.matching[i] != UNMATCHED {
                bail!("line {line_number}: channel {i} already matched in layer");
            }
            if layer.matching[j] != UNMATCHED {
                bail!("line {line_number}: channel {j} already matched in layer");
            }
            layer.matching[i] = j as i32;
            layer.matching[j] = i as i32;
        }
        if pos < bytes.len() && bytes[pos] == b']' {
            pos += 1;
        }
        layers.push(layer);
    }
    Ok(layers)
}

/// Loads networks from bracket text: one network per line like
/// `[(0,2),(1,3)],[(0,1),(2,3)],[(1,2)]`. Lines starting with `#` and blank
/// lines are skipped.
pub fn load_bracket(n: usize, path: &Path, fill: bool) -> Result<Vec<Network>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut networks = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let layers = parse_bracket_line(n, line, idx + 1)?;
        if !layers.is_empty() {
            let mut network = Network::new(n, 0);
            network.layers = layers;
            networks.push(network);
        }
    }
    if fill {
        fill_outputs(&mut networks);
    }
    Ok(networks)
}

/// Saves networks in bracket text, one line per network with a `#` header.
pub fn save_bracket(networks: &[Network], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for network in networks {
        writer.write_all(network.render(true).as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// The canonical starting prefixes of depth 1.
///
/// Non-symmetric mode has a single representative, the adjacent matching
/// `[(0,1),(2,3),…]`. Symmetric mode yields one network per k ≤ n/4: k
/// leading adjacent pairs (mirrored at the top) with the remaining middle
/// channels matched to their reflections.
pub fn create_first_layer(n: usize, symmetric: bool) -> Vec<Network> {
    if symmetric {
        assert_eq!(n % 2, 0);
        let mut networks = Vec::new();
        for k in 0..=n / 4 {
            let mut layer = Layer::new(n);
            for i in 0..k {
                layer.matching[i * 2] = (i * 2 + 1) as i32;
                layer.matching[i * 2 + 1] = (i * 2) as i32;
                layer.matching[n - 1 - i * 2] = (n - 1 - (i * 2 + 1)) as i32;
                layer.matching[n - 1 - (i * 2 + 1)] = (n - 1 - i * 2) as i32;
            }
            for i in k * 2..n / 2 {
                layer.matching[i] = (n - 1 - i) as i32;
                layer.matching[n - 1 - i] = i as i32;
            }
            let mut network = Network::new(n, 1);
            network.layers[0] = layer;
            network.outputs = network_outputs(&network);
            networks.push(network);
        }
        networks
    } else {
        let mut network = Network::new(n, 1);
        let mut i = 0;
        while i + 1 < n {
            network.layers[0].matching[i] = (i + 1) as i32;
            network.layers[0].matching[i + 1] = i as i32;
            i += 2;
        }
        network.outputs = network_outputs(&network);
        vec![network]
    }
}

/// Drops every network whose output set is covered by a smaller one (per the
/// pruner in [`find_redundant_outputs`]) and returns the survivors sorted
/// ascending by |outputs|, stable in source order.
pub fn remove_redundant_networks(
    mut networks: Vec<Network>,
    symmetric: bool,
    fast: bool,
    rng: &mut StdRng,
) -> Vec<Network> {
    if networks.len() <= 1 {
        return networks;
    }
    fill_outputs(&mut networks);
    let n = networks[0].n;
    let outputs: Vec<Vec<Output>> = networks.iter().map(|nw| nw.outputs.clone()).collect();
    let redundant = find_redundant_outputs(n, outputs, fast, symmetric, rng);
    let mut survivors: Vec<Network> = networks
        .into_iter()
        .zip(redundant)
        .filter(|(_, r)| !r)
        .map(|(network, _)| network)
        .collect();
    survivors.sort_by_key(|network| network.outputs.len());
    survivors
}

/// Audits a collection that is supposed to already be non-redundant.
/// Panics with the offending indices when the full pruner disagrees; this
/// means an upstream stage produced a broken prefix file.
pub fn check_redundancy(networks: &[Network], symmetric: bool, rng: &mut StdRng) {
    if networks.len() <= 1 {
        return;
    }
    let n = networks[0].n;
    let outputs: Vec<Vec<Output>> = networks.iter().map(network_outputs).collect();
    let redundant = find_redundant_outputs(n, outputs, false, symmetric, rng);
    let offenders: Vec<usize> = redundant
        .iter()
        .enumerate()
        .filter(|(_, &r)| r)
        .map(|(i, _)| i)
        .collect();
    assert!(offenders.is_empty(), "found redundant prefixes at indices {offenders:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn first_layer_non_symmetric_is_adjacent_matching() {
        let networks = create_first_layer(5, false);
        assert_eq!(networks.len(), 1);
        let layer = &networks[0].layers[0];
        assert_eq!(layer.matching, vec![1, 0, 3, 2, UNMATCHED]);
        assert!(!networks[0].outputs.is_empty());
    }

    #[test]
    fn first_layer_symmetric_family() {
        let networks = create_first_layer(6, true);
        assert_eq!(networks.len(), 2);
        for network in &networks {
            assert!(network.is_symmetric());
            assert!(crate::output::is_symmetric(6, &network.outputs));
        }
        // k = 0: pure reflection matching.
        assert_eq!(networks[0].layers[0].matching, vec![5, 4, 3, 2, 1, 0]);
        // k = 1: one adjacent pair at each end, reflection in the middle.
        assert_eq!(networks[1].layers[0].matching, vec![1, 0, 3, 2, 5, 4]);
    }

    #[test]
    fn bracket_parsing_rejects_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("networks.txt");
        std::fs::write(&path, "[(0,1),(1,2)]\n").unwrap();
        let err = load_bracket(3, &path, false).unwrap_err();
        assert!(err.to_string().contains("already matched"), "{err}");
    }

    #[test]
    fn bracket_roundtrip_with_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("networks.txt");
        std::fs::write(&path, "# a comment\n\n[(0,2),(1,3)],[(0,1),(2,3)],[(1,2)]\n").unwrap();
        let networks = load_bracket(4, &path, true).unwrap();
        assert_eq!(networks.len(), 1);
        assert!(networks[0].is_sorting_network());

        let out = dir.path().join("out.txt");
        save_bracket(&networks, &out).unwrap();
        let reloaded = load_bracket(4, &out, true).unwrap();
        assert_eq!(reloaded[0].layers, networks[0].layers);
    }

    #[test]
    fn binary_and_json_containers_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut networks = create_first_layer(4, false);
        networks[0].add_empty_layer();
        for ext in ["bin", "json"] {
            let path = dir.path().join(format!("collection.{ext}"));
            save_collection(&networks, &path).unwrap();
            let loaded = load_collection(&path, Some(4)).unwrap();
            assert_eq!(loaded, networks);
            assert!(load_collection(&path, Some(5)).is_err());
        }
    }

    #[test]
    fn loading_without_outputs_recomputes_them() {
        let dir = tempfile::tempdir().unwrap();
        let mut networks = create_first_layer(4, false);
        let expected = networks[0].outputs.clone();
        networks[0].outputs.clear();
        let path = dir.path().join("collection.bin");
        save_collection(&networks, &path).unwrap();
        let loaded = load_collection(&path, None).unwrap();
        assert_eq!(loaded[0].outputs, expected);
    }

    #[test]
    fn remove_redundant_keeps_one_of_equal_pair() {
        let mut rng = StdRng::seed_from_u64(1);
        let networks = create_first_layer(4, false);
        let duplicated = vec![networks[0].clone(), networks[0].clone()];
        let survivors = remove_redundant_networks(duplicated, false, false, &mut rng);
        assert_eq!(survivors.len(), 1);
    }
}
