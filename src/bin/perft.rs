use anyhow::{Context, Result};
use clap::Parser;
use dhouse::board::Position;
use dhouse::perft::perft;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "perft", about = "Perft driver for dhouse")]
struct Args {
    /// Search depth
    #[arg(value_name = "DEPTH")]
    depth: u32,
    /// FEN string or "startpos"
    #[arg(value_name = "FEN", default_value = "startpos")]
    fen: String,
    /// Number of threads for root-split
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Print the node count below every root move
    #[arg(long, default_value_t = false)]
    divide: bool,
    /// Report elapsed time and NPS
    #[arg(long, default_value_t = false)]
    nps: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let pos = if args.fen == "startpos" {
        Position::startpos()
    } else {
        Position::from_fen(&args.fen).with_context(|| format!("invalid FEN: {}", args.fen))?
    };
    let depth = args.depth;
    if depth == 0 {
        println!("nodes: 1");
        return Ok(());
    }

    let root_moves = dhouse::board::legal_moves(&pos);
    let bar = ProgressBar::new(root_moves.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} root moves [{elapsed_precise}]")
            .context("progress template")?,
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.max(1))
        .build()
        .context("thread pool")?;
    let t0 = Instant::now();
    let counts: Vec<_> = pool.install(|| {
        root_moves
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|&mv| {
                let nodes = perft(&pos.do_move(mv), depth - 1);
                bar.inc(1);
                (mv, nodes)
            })
            .collect()
    });
    let dt = t0.elapsed().as_secs_f64();
    bar.finish_and_clear();

    if args.divide {
        for (mv, nodes) in &counts {
            println!("{mv}: {nodes}");
        }
    }
    let nodes: u64 = counts.iter().map(|&(_, n)| n).sum();
    if args.nps {
        println!("nodes: {nodes} elapsed: {:.3}s nps: {:.1}", dt, nodes as f64 / dt.max(f64::EPSILON));
    } else {
        println!("nodes: {nodes}");
    }
    Ok(())
}
