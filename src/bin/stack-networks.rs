// SPDX-License-Identifier: Apache-2.0

//! Stacks every pair from two collections into channel-disjoint products.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;

use sortnet::container::{load_collection, save_collection};
use sortnet::output::is_symmetric;
use sortnet::stack::stack_networks;

#[derive(Debug, Parser)]
#[command(name = "stack-networks")]
#[command(about = "Stack two network collections pairwise")]
struct Args {
    /// Nest the second network inside the first, preserving reflection
    /// symmetry.
    #[arg(long)]
    symmetric: bool,

    /// Channels in the first collection.
    #[arg(long)]
    n_a: usize,

    /// First input collection (.bin or .json).
    #[arg(long)]
    input_path_a: PathBuf,

    /// Channels in the second collection.
    #[arg(long)]
    n_b: usize,

    /// Second input collection (.bin or .json).
    #[arg(long)]
    input_path_b: PathBuf,

    /// Output collection (.bin or .json).
    #[arg(long)]
    output_path: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    ensure!(args.n_a > 0 && args.n_b > 0, "channel counts must be positive");
    if args.symmetric {
        ensure!(args.n_a % 2 == 0, "--n-a must be even in symmetric mode");
        ensure!(args.n_b % 2 == 0, "--n-b must be even in symmetric mode");
    }

    let networks_a = load_collection(&args.input_path_a, Some(args.n_a))?;
    log::info!("loaded {} networks from {}", networks_a.len(), args.input_path_a.display());
    let networks_b = load_collection(&args.input_path_b, Some(args.n_b))?;
    log::info!("loaded {} networks from {}", networks_b.len(), args.input_path_b.display());

    if args.symmetric {
        for network in networks_a.iter().chain(&networks_b) {
            ensure!(network.is_symmetric(), "symmetric mode requires symmetric inputs");
        }
    }

    let mut stacked = Vec::with_capacity(networks_a.len() * networks_b.len());
    for net_a in &networks_a {
        for net_b in &networks_b {
            let network = stack_networks(net_a, net_b, args.symmetric);
            if args.symmetric {
                assert!(network.is_symmetric());
                assert!(is_symmetric(network.n, &network.outputs));
            }
            stacked.push(network);
        }
    }

    log::info!("saving {} stacked networks to {}", stacked.len(), args.output_path.display());
    save_collection(&stacked, &args.output_path)?;
    Ok(())
}
