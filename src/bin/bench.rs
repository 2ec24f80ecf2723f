use anyhow::{Context, Result};
use clap::Parser;
use dhouse::board::Position;
use dhouse::search::{SearchParams, Searcher};
use serde::Serialize;
use std::time::Instant;

const SUITE: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
];

#[derive(Parser, Debug)]
#[command(name = "dhouse-bench", version, about = "Fixed-depth search benchmark for dhouse")]
struct Args {
    /// Search depth for every position
    #[arg(long, default_value_t = 8)]
    depth: i32,

    /// Transposition table size in MB
    #[arg(long, default_value_t = 16)]
    hash_mb: usize,

    /// Emit one JSON line per position instead of plain text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct Record<'a> {
    fen: &'a str,
    bestmove: String,
    score: i32,
    nodes: u64,
    ms: u128,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut searcher = Searcher::new(1, args.hash_mb)?;

    let mut total_nodes = 0u64;
    let t0 = Instant::now();
    for fen in SUITE {
        let pos = Position::from_fen(fen).with_context(|| format!("suite position {fen}"))?;
        searcher.new_game();
        let start = Instant::now();
        let res = searcher.search_with_params(&pos, &SearchParams::depth(args.depth));
        let rec = Record {
            fen,
            bestmove: res.bestmove.map_or_else(|| "(none)".to_string(), |m| m.to_string()),
            score: res.score,
            nodes: res.nodes,
            ms: start.elapsed().as_millis(),
        };
        if args.json {
            println!("{}", serde_json::to_string(&rec)?);
        } else {
            println!("{:<70} {} {:>6} {:>10}", rec.fen, rec.bestmove, rec.score, rec.nodes);
        }
        total_nodes += res.nodes;
    }
    let dt = t0.elapsed().as_secs_f64();
    println!("{total_nodes} nodes {:.0} nps", total_nodes as f64 / dt.max(f64::EPSILON));
    Ok(())
}
