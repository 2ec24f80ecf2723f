use anyhow::{Context, Result};
use clap::Parser;
use dhouse::config::EngineConfig;
use dhouse::eval::nnue::{install, loader};
use dhouse::uci::UciEngine;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "dhouse UCI chess engine", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transposition table size in MB
    #[arg(long)]
    hash: Option<usize>,

    /// Number of search threads
    #[arg(long)]
    threads: Option<usize>,

    /// Evaluator weight file (built-in material network when absent)
    #[arg(long)]
    eval_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(hash) = args.hash {
        config.hash_mb = hash;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if args.eval_file.is_some() {
        config.eval_file = args.eval_file;
    }
    let config = config.clamped();
    log::info!("starting with {config:?}");

    // The network must be in place before the first position is built.
    if let Some(path) = &config.eval_file {
        let net = loader::load(path)?;
        install(net).with_context(|| format!("could not install {}", path.display()))?;
        log::info!("loaded evaluator weights from {}", path.display());
    }

    let mut engine = UciEngine::new(config)?;
    engine.run_loop()
}
