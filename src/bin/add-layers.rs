// SPDX-License-Identifier: Apache-2.0

//! Enumerates sorting-network prefixes layer by layer: extend every prefix
//! with all admissible fillings of a fresh layer, prune, repeat.

use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::ThreadPoolBuilder;

use sortnet::container::{create_first_layer, load_collection, save_collection};
use sortnet::extend::extend_networks;

#[derive(Debug, Parser)]
#[command(name = "add-layers")]
#[command(about = "Extend network prefixes depth by depth")]
struct Args {
    /// Number of channels.
    #[arg(long)]
    n: usize,

    /// Build reflection-symmetric networks.
    #[arg(long)]
    symmetric: bool,

    /// Depth of the input prefixes. Depth 1 generates the canonical first
    /// layer instead of reading a file.
    #[arg(long, default_value_t = 1)]
    input_depth: usize,

    /// Input prefix collection (.bin or .json); required unless
    /// --input-depth=1.
    #[arg(long)]
    input_path: Option<PathBuf>,

    /// Depth of the output prefixes.
    #[arg(long)]
    output_depth: usize,

    /// Output prefix collection (.bin or .json).
    #[arg(long)]
    output_path: PathBuf,

    /// Comma-separated keep-best budget per added depth; an empty entry
    /// keeps everything.
    #[arg(long, default_value = "")]
    keep_best_count: String,

    /// Worker threads (default: all cores).
    #[arg(long)]
    jobs: Option<usize>,

    /// RNG seed for canonicalization tie-breaks.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn parse_keep_best_counts(text: &str, added_depths: usize) -> Result<Vec<usize>> {
    if text.is_empty() {
        return Ok(vec![usize::MAX; added_depths]);
    }
    let counts: Vec<usize> = text
        .split(',')
        .map(|token| {
            if token.is_empty() {
                Ok(usize::MAX)
            } else {
                token
                    .parse()
                    .with_context(|| format!("bad keep-best entry {token:?}"))
            }
        })
        .collect::<Result<_>>()?;
    ensure!(
        counts.len() == added_depths,
        "keep-best-count has {} entries, expected {added_depths}",
        counts.len()
    );
    Ok(counts)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    ensure!(args.n > 0, "--n must be positive");
    ensure!(
        args.output_depth > args.input_depth,
        "--output-depth must exceed --input-depth"
    );
    if let Some(jobs) = args.jobs {
        ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .map_err(anyhow::Error::from)?;
    }

    let mut networks = if args.input_depth == 1 {
        ensure!(
            args.input_path.is_none(),
            "--input-path conflicts with --input-depth=1"
        );
        create_first_layer(args.n, args.symmetric)
    } else {
        let Some(input_path) = args.input_path.as_ref() else {
            bail!("--input-path is required when --input-depth > 1");
        };
        load_collection(input_path, Some(args.n))?
    };
    for network in &networks {
        ensure!(
            network.layers.len() == args.input_depth,
            "input network has depth {}, expected {}",
            network.layers.len(),
            args.input_depth
        );
    }
    log::info!("loaded {} prefixes of depth {}", networks.len(), args.input_depth);

    let keep_best_counts =
        parse_keep_best_counts(&args.keep_best_count, args.output_depth - args.input_depth)?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    for depth in args.input_depth..args.output_depth {
        log::info!("extending from depth {depth} to {}", depth + 1);
        for network in &mut networks {
            network.add_empty_layer();
        }
        networks = extend_networks(
            args.n,
            &networks,
            args.symmetric,
            false,
            keep_best_counts[depth - args.input_depth],
            &mut rng,
        );
        log::info!("depth {}: {} prefixes survive", depth + 1, networks.len());
    }

    log::info!("saving {} prefixes to {}", networks.len(), args.output_path.display());
    save_collection(&networks, &args.output_path)?;
    Ok(())
}
