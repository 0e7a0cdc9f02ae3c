//! skycut: cut sky-centred regions out of FITS images and fit WCS solutions.

mod cli;
mod cut;
mod fit;
mod limits;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use skycut::Config;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    match &cli.command {
        Commands::Cut(args) => cut::run(args, &config),
        Commands::Limits(args) => limits::run(args),
        Commands::Fit(args) => fit::run(args, &config),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
