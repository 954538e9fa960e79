// SPDX-License-Identifier: Apache-2.0

//! Turns SAT solver output back into verified sorting networks.
//!
//! Walks a directory of NNNN.sol files, pairs each with its NNNN.cnf[.gz],
//! rebuilds the suffix from the assignment, undoes the window-optimization
//! permutation, and concatenates with the prefix. UNSAT files are skipped;
//! a reconstruction that fails verification aborts.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;

use sortnet::container::{load_collection, save_bracket, save_collection};
use sortnet::decode::{
    parse_cnf_comparator_vars, parse_permutation_file, parse_solution, reconstruct_network,
};

#[derive(Debug, Parser)]
#[command(name = "decode-solution")]
#[command(about = "Decode SAT solutions into sorting networks")]
struct Args {
    /// The prefixes the CNFs were generated from (.bin or .json).
    #[arg(long)]
    prefix_file: PathBuf,

    /// Optional window-permuted prefixes for an independent verification in
    /// the solved channel order.
    #[arg(long)]
    permuted_prefix_file: Option<PathBuf>,

    /// Directory holding NNNN.sol and NNNN.cnf[.gz] files.
    #[arg(long)]
    cnf_dir: PathBuf,

    /// Permutation file from the window-optimization stage.
    #[arg(long)]
    permutation_file: PathBuf,

    /// Output collection (.bin or .json).
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Output bracket text file.
    #[arg(long)]
    output_bracket_path: Option<PathBuf>,

    /// The suffixes were searched in reflection-symmetric mode.
    #[arg(long)]
    symmetric: bool,

    /// Drop no-op comparators from the decoded networks.
    #[arg(long)]
    simplify: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let prefixes = load_collection(&args.prefix_file, None)?;
    let permuted_prefixes = match &args.permuted_prefix_file {
        Some(path) => {
            let permuted = load_collection(path, None)?;
            ensure!(
                permuted.len() == prefixes.len(),
                "permuted prefix count does not match prefix count"
            );
            Some(permuted)
        }
        None => None,
    };
    let permutations = parse_permutation_file(&args.permutation_file)?;

    let mut sol_paths: Vec<PathBuf> = std::fs::read_dir(&args.cnf_dir)
        .with_context(|| format!("reading {}", args.cnf_dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|e| e == "sol").unwrap_or(false))
        .collect();
    sol_paths.sort();
    log::info!("found {} solution files", sol_paths.len());

    let mut decoded = Vec::new();
    for sol_path in &sol_paths {
        log::info!("parsing {}", sol_path.display());
        let Some(assignment) = parse_solution(sol_path)? else {
            log::info!("{}: UNSAT, skipping", sol_path.display());
            continue;
        };
        let index: usize = sol_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse().ok())
            .with_context(|| format!("{}: file name is not a prefix index", sol_path.display()))?;
        ensure!(index < prefixes.len(), "solution index {index} out of range");
        ensure!(
            index < permutations.len(),
            "no permutation recorded for prefix {index}"
        );

        let mut cnf_path = sol_path.with_extension("cnf");
        if !cnf_path.exists() {
            cnf_path = sol_path.with_extension("cnf.gz");
        }
        let var_to_comparator = parse_cnf_comparator_vars(&cnf_path)?;

        let network = reconstruct_network(
            &prefixes[index],
            permuted_prefixes.as_ref().map(|p| &p[index]),
            &permutations[index],
            &var_to_comparator,
            &assignment,
            args.symmetric,
            args.simplify,
        );
        log::info!("decoded sorting network:\n{}", network.render(false));
        decoded.push(network);
    }

    log::info!("decoded {} sorting networks", decoded.len());
    if let Some(path) = &args.output_path {
        save_collection(&decoded, path)?;
    }
    if let Some(path) = &args.output_bracket_path {
        save_bracket(&decoded, path)?;
    }
    Ok(())
}
