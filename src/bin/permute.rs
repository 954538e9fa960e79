// SPDX-License-Identifier: Apache-2.0

//! Applies a fixed channel permutation to every network in a bracket file.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;

use sortnet::container::{load_bracket, save_bracket};
use sortnet::perm::parse_permutation;

#[derive(Debug, Parser)]
#[command(name = "permute")]
#[command(about = "Permute the channels of bracket-format networks")]
struct Args {
    /// Number of channels.
    #[arg(long)]
    n: usize,

    /// Input bracket file.
    #[arg(long)]
    input_network: PathBuf,

    /// The permutation, e.g. 2,0,1 for n=3.
    #[arg(long)]
    permutation: String,

    /// Output bracket file (default: <input>.permuted).
    #[arg(long)]
    output_network: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.n > 2, "--n must be at least 3");

    let permutation = parse_permutation(&args.permutation, args.n)?;
    let output_network = args.output_network.clone().unwrap_or_else(|| {
        PathBuf::from(format!("{}.permuted", args.input_network.display()))
    });

    let mut networks = load_bracket(args.n, &args.input_network, false)?;
    for network in &mut networks {
        *network = network.permute_channels(&permutation);
    }
    save_bracket(&networks, &output_network)?;
    log::info!("wrote {} permuted networks to {}", networks.len(), output_network.display());
    Ok(())
}
