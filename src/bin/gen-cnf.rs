// SPDX-License-Identifier: Apache-2.0

//! Emits one DIMACS CNF per prefix whose models are the sorting suffixes of
//! the target depth. Existing output files are skipped, so interrupted runs
//! can simply be restarted.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Result};
use clap::Parser;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use sortnet::container::load_collection;
use sortnet::encode::write_prefix_cnf;

#[derive(Debug, Parser)]
#[command(name = "gen-cnf")]
#[command(about = "Generate CNF instances for prefix completion")]
struct Args {
    /// Number of channels.
    #[arg(long)]
    n: usize,

    /// Target depth of the completed network, prefix included.
    #[arg(long)]
    depth: usize,

    /// Input prefix collection (.bin or .json).
    #[arg(long)]
    input_path: PathBuf,

    /// Output directory for NNNN.cnf.gz files (default:
    /// dimacs/n<n>.d<depth>[.sym][.sc<limit>]).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Worker threads (default: all cores).
    #[arg(long)]
    jobs: Option<usize>,

    /// Skip prefix outputs whose unsorted window exceeds this many channels.
    #[arg(long)]
    subnet_channels: Option<usize>,

    /// Encode only the first N prefixes.
    #[arg(long)]
    limit: Option<usize>,

    /// Search reflection-symmetric suffixes only.
    #[arg(long)]
    symmetric: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    ensure!(args.n > 0, "--n must be positive");
    ensure!(args.depth > 0, "--depth must be positive");
    if let Some(jobs) = args.jobs {
        ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .map_err(anyhow::Error::from)?;
    }

    let cnf_dir = args.output_dir.clone().unwrap_or_else(|| {
        let mut name = format!("n{}.d{}", args.n, args.depth);
        if args.symmetric {
            name.push_str(".sym");
        }
        if let Some(limit) = args.subnet_channels {
            name.push_str(&format!(".sc{limit}"));
        }
        PathBuf::from("dimacs").join(name)
    });
    if cnf_dir.exists() {
        log::warn!(
            "{} already exists; existing CNF files will be kept",
            cnf_dir.display()
        );
    }
    std::fs::create_dir_all(&cnf_dir)?;

    let prefixes = load_collection(&args.input_path, Some(args.n))?;
    ensure!(!prefixes.is_empty(), "input collection is empty");
    log::info!("loaded {} prefixes from {}", prefixes.len(), args.input_path.display());

    let prefix_depth = prefixes[0].layers.len();
    ensure!(prefix_depth > 0, "prefixes must have at least one layer");
    ensure!(prefix_depth < args.depth, "--depth must exceed the prefix depth");
    for prefix in &prefixes {
        ensure!(prefix.layers.len() == prefix_depth, "mixed prefix depths in input");
    }

    let count = args.limit.unwrap_or(prefixes.len()).min(prefixes.len());
    let start = Instant::now();
    let written: usize = prefixes[..count]
        .par_iter()
        .enumerate()
        .map(|(idx, prefix)| {
            let wrote = write_prefix_cnf(
                args.n,
                args.depth,
                idx,
                prefix,
                &cnf_dir,
                args.subnet_channels,
                args.symmetric,
            )
            .unwrap_or_else(|e| panic!("prefix {idx}: {e:#}"));
            if wrote {
                log::info!("prefix {idx}/{count} encoded");
            }
            wrote as usize
        })
        .sum();

    log::info!(
        "wrote {written} CNF files ({} skipped) to {} in {:.1?}",
        count - written,
        cnf_dir.display(),
        start.elapsed()
    );
    Ok(())
}
