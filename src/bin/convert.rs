// SPDX-License-Identifier: Apache-2.0

//! Converts between bracket text and the structured container formats.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;

use sortnet::container::{load_bracket, load_collection, save_bracket, save_collection};

#[derive(Debug, Parser)]
#[command(name = "convert")]
#[command(about = "Convert networks between bracket and container formats")]
struct Args {
    /// Number of channels.
    #[arg(long)]
    n: usize,

    /// The bracket-format side of the conversion.
    #[arg(long)]
    bracket_path: PathBuf,

    /// The container side of the conversion (.bin or .json).
    #[arg(long)]
    container_path: PathBuf,

    /// Convert bracket text into a container.
    #[arg(long)]
    bracket_to_container: bool,

    /// Convert a container into bracket text.
    #[arg(long)]
    container_to_bracket: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    ensure!(args.n > 0, "--n must be positive");
    ensure!(
        args.bracket_to_container != args.container_to_bracket,
        "exactly one of --bracket-to-container and --container-to-bracket is required"
    );

    if args.container_to_bracket {
        let networks = load_collection(&args.container_path, Some(args.n))?;
        log::info!("loaded {} networks from {}", networks.len(), args.container_path.display());
        save_bracket(&networks, &args.bracket_path)?;
    } else {
        let networks = load_bracket(args.n, &args.bracket_path, true)?;
        log::info!("loaded {} networks from {}", networks.len(), args.bracket_path.display());
        save_collection(&networks, &args.container_path)?;
    }
    log::info!("conversion complete");
    Ok(())
}
