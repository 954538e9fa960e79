// SPDX-License-Identifier: Apache-2.0

//! Prints structure, symmetry, and sorting status for every network in a
//! file, optionally truncated to a prefix depth first.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sortnet::container::{check_redundancy, load_bracket, load_collection, network_outputs};

#[derive(Debug, Parser)]
#[command(name = "network-info")]
#[command(about = "Inspect and verify network collections")]
struct Args {
    /// Number of channels (required for bracket input).
    #[arg(long)]
    n: Option<usize>,

    /// Input container (.bin or .json).
    #[arg(long)]
    container_path: Option<PathBuf>,

    /// Input bracket file.
    #[arg(long)]
    bracket_path: Option<PathBuf>,

    /// Truncate each network to this depth before inspecting.
    #[arg(long)]
    prefix_depth: Option<usize>,

    /// Also run the full pruner and abort if any network is redundant.
    #[arg(long)]
    check_redundancy: bool,

    /// Treat the collection as reflection-symmetric for the redundancy
    /// audit.
    #[arg(long)]
    symmetric: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    ensure!(
        args.container_path.is_some() != args.bracket_path.is_some(),
        "exactly one of --container-path and --bracket-path is required"
    );

    let mut networks = if let Some(path) = &args.container_path {
        load_collection(path, args.n)?
    } else {
        let Some(n) = args.n else {
            anyhow::bail!("--n is required with --bracket-path");
        };
        load_bracket(n, args.bracket_path.as_ref().unwrap(), true)?
    };

    for (idx, network) in networks.iter_mut().enumerate() {
        if let Some(depth) = args.prefix_depth {
            if network.layers.len() > depth {
                network.layers.truncate(depth);
                network.outputs.clear();
                network.outputs = network_outputs(network);
            }
        }
        println!("i={idx}");
        println!("network: {}", network.render(false));
        println!("is symmetric: {}", network.is_symmetric());
        println!("is sorting network: {}", network.is_sorting_network());
        println!();
    }

    if args.check_redundancy {
        let mut rng = StdRng::seed_from_u64(0);
        check_redundancy(&networks, args.symmetric, &mut rng);
        println!("no redundant networks found");
    }
    Ok(())
}
