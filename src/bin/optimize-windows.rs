// SPDX-License-Identifier: Apache-2.0

//! Permutes the channels of each prefix's output set to shrink its unsorted
//! windows, recording the permutations so decode-solution can undo them.
//! The output collection keeps only the permuted outputs; the layer
//! structure is cleared since the CNF stage reads outputs alone.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sortnet::container::{load_collection, save_collection};
use sortnet::network::Network;
use sortnet::output::is_symmetric;
use sortnet::window::optimize_window_size;

#[derive(Debug, Parser)]
#[command(name = "optimize-windows")]
#[command(about = "Minimize output windows by channel permutation")]
struct Args {
    /// Number of channels.
    #[arg(long)]
    n: usize,

    /// Input prefix collection (.bin or .json).
    #[arg(long)]
    input_path: PathBuf,

    /// Output collection; the permutations land next to it in a .perm file.
    #[arg(long)]
    output_path: PathBuf,

    /// Keep reflection symmetry while permuting.
    #[arg(long)]
    symmetric: bool,

    /// Process only the first N networks.
    #[arg(long)]
    limit: Option<usize>,

    /// RNG seed for the greedy scan order.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.n > 0, "--n must be positive");

    let mut networks = load_collection(&args.input_path, Some(args.n))?;
    if let Some(limit) = args.limit {
        if networks.len() > limit {
            log::info!("limiting to the first {limit} networks");
            networks.truncate(limit);
        }
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut permutations = Vec::with_capacity(networks.len());
    for (idx, network) in networks.iter_mut().enumerate() {
        log::info!("optimizing network {idx}");
        if args.symmetric {
            ensure!(
                is_symmetric(args.n, &network.outputs),
                "network {idx} outputs are not symmetric"
            );
        }
        let (optimized, perm) =
            optimize_window_size(args.n, &network.outputs, &mut rng, args.symmetric);
        assert_eq!(optimized.len(), network.outputs.len());
        let depth = network.layers.len();
        *network = Network::new(args.n, depth);
        network.outputs = optimized;
        permutations.push(perm);
    }

    save_collection(&networks, &args.output_path)?;
    let perm_path = PathBuf::from(format!("{}.perm", args.output_path.display()));
    let file = File::create(&perm_path).with_context(|| format!("creating {}", perm_path.display()))?;
    let mut writer = BufWriter::new(file);
    for perm in &permutations {
        for p in perm {
            write!(writer, "{p} ")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    log::info!("wrote permutations to {}", perm_path.display());
    Ok(())
}
