// SPDX-License-Identifier: Apache-2.0

//! Extends every prefix by one comparator at a time, pruning between
//! placements: the greedy companion to add-layers.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;

use sortnet::container::{load_collection, save_collection};
use sortnet::extend::extend_networks;

#[derive(Debug, Parser)]
#[command(name = "add-comparators")]
#[command(about = "Extend prefixes one comparator at a time")]
struct Args {
    /// Build reflection-symmetric networks.
    #[arg(long)]
    symmetric: bool,

    /// Input prefix collection (.bin or .json).
    #[arg(long)]
    input_path: PathBuf,

    /// Output prefix collection (.bin or .json).
    #[arg(long)]
    output_path: PathBuf,

    /// Keep-best budget applied after each comparator round.
    #[arg(long, default_value_t = usize::MAX)]
    keep_best_count: usize,

    /// Worker threads (default: all cores).
    #[arg(long)]
    jobs: Option<usize>,

    /// RNG seed for canonicalization tie-breaks.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(jobs) = args.jobs {
        ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .map_err(anyhow::Error::from)?;
    }

    let mut networks = load_collection(&args.input_path, None)?;
    ensure!(!networks.is_empty(), "input collection is empty");

    let n = networks[0].n;
    let depth = networks[0].layers.len();
    log::info!("adding one layer on top of depth {depth}");
    for network in &mut networks {
        if args.symmetric {
            ensure!(network.is_symmetric(), "input network is not symmetric");
        }
        ensure!(network.n == n, "mixed channel counts in input");
        ensure!(network.layers.len() == depth, "mixed depths in input");
        network.add_empty_layer();
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    for round in 0..n / 2 {
        log::info!("placing comparator {} of at most {}", round + 1, n / 2);
        networks = extend_networks(
            n,
            &networks,
            args.symmetric,
            true,
            args.keep_best_count,
            &mut rng,
        );
        log::info!("after cleanup: {} prefixes", networks.len());
    }

    log::info!("saving {} prefixes to {}", networks.len(), args.output_path.display());
    save_collection(&networks, &args.output_path)?;
    Ok(())
}
