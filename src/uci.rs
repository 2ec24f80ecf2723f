//! UCI protocol loop.
//!
//! Searches run on a background thread that owns the [`Searcher`] and hands
//! it back when joined, so `stop` and `quit` are read while thinking.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};

use crate::board::{Color, Position};
use crate::config::EngineConfig;
use crate::eval::evaluate;
use crate::perft::perft_divide;
use crate::search::threads::{MAX_THREADS, MIN_THREADS};
use crate::search::time::MAX_MOVE_OVERHEAD_MS;
use crate::search::{SearchInfo, SearchParams, Searcher, Tt};

pub type Output = Arc<Mutex<dyn Write + Send>>;

fn emit(out: &Output, line: &str) {
    if let Ok(mut w) = out.lock() {
        let _ = writeln!(w, "{line}");
        let _ = w.flush();
    }
}

pub fn format_info(info: &SearchInfo) -> String {
    let pv: Vec<String> = info.pv.iter().map(|m| m.to_string()).collect();
    format!(
        "info depth {} seldepth {} score {} nodes {} nps {} hashfull {} time {} pv {}",
        info.depth,
        info.seldepth,
        info.score,
        info.nodes,
        info.nps(),
        info.hashfull,
        info.elapsed.as_millis(),
        pv.join(" ")
    )
}

/// Play UCI move tokens from `pos`.
pub fn apply_moves<'a>(mut pos: Position, moves: impl IntoIterator<Item = &'a str>) -> Result<Position> {
    for token in moves {
        let mv = pos.parse_move(token).with_context(|| format!("bad move {token}"))?;
        pos = pos.do_move(mv);
    }
    Ok(pos)
}

/// Parse the arguments of a `position` command.
pub fn parse_position(args: &str) -> Result<Position> {
    let mut tokens = args.split_whitespace().peekable();
    let pos = match tokens.next() {
        Some("startpos") => Position::startpos(),
        Some("fen") => {
            let mut fields = Vec::new();
            while let Some(&t) = tokens.peek() {
                if t == "moves" {
                    break;
                }
                fields.push(t);
                tokens.next();
            }
            Position::from_fen(&fields.join(" "))?
        }
        Some(other) => bail!("unknown position kind {other}"),
        None => bail!("empty position command"),
    };
    match tokens.next() {
        Some("moves") => apply_moves(pos, tokens),
        Some(other) => Err(anyhow!("unexpected token {other}")),
        None => Ok(pos),
    }
}

/// What a `go` command asked for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoCommand {
    pub params: SearchParams,
    pub perft: Option<u32>,
}

pub fn parse_go(args: &str, side: Color) -> GoCommand {
    let mut go = GoCommand::default();
    let mut tokens = args.split_whitespace();
    let ms = |v: Option<&str>| v.and_then(|s| s.parse::<i64>().ok()).map(|n| Duration::from_millis(n.max(0) as u64));
    while let Some(tok) = tokens.next() {
        match tok {
            "depth" => go.params.depth = tokens.next().and_then(|s| s.parse().ok()),
            "movetime" => go.params.movetime = ms(tokens.next()),
            "nodes" => go.params.max_nodes = tokens.next().and_then(|s| s.parse().ok()),
            "movestogo" => go.params.movestogo = tokens.next().and_then(|s| s.parse().ok()),
            "infinite" => go.params.infinite = true,
            "perft" => go.perft = tokens.next().and_then(|s| s.parse().ok()),
            "wtime" | "btime" => {
                let value = ms(tokens.next());
                if (tok == "wtime") == (side == Color::White) {
                    go.params.time_left = value;
                }
            }
            "winc" | "binc" => {
                let value = ms(tokens.next());
                if (tok == "winc") == (side == Color::White) {
                    go.params.increment = value.unwrap_or_default();
                }
            }
            other => log::warn!("ignoring go token {other}"),
        }
    }
    go
}

struct SearchJob {
    handle: JoinHandle<Searcher>,
    release: Option<Sender<()>>,
}

pub struct UciEngine {
    pos: Position,
    searcher: Option<Searcher>,
    job: Option<SearchJob>,
    stop: Arc<AtomicBool>,
    config: EngineConfig,
    out: Output,
}

impl UciEngine {
    /// Engine printing to stdout.
    pub fn new(config: EngineConfig) -> Result<Self> { Self::with_output(config, Arc::new(Mutex::new(io::stdout()))) }

    pub fn with_output(config: EngineConfig, out: Output) -> Result<Self> {
        let config = config.clamped();
        let mut searcher = Searcher::new(config.threads, config.hash_mb)?;
        searcher.set_move_overhead(Duration::from_millis(config.move_overhead_ms));
        Ok(UciEngine { pos: Position::startpos(), stop: searcher.stop_handle(), searcher: Some(searcher), job: None, config, out })
    }

    pub fn position(&self) -> &Position { &self.pos }

    fn say(&self, line: &str) { emit(&self.out, line); }

    /// Block until the running search (if any) has printed its best move.
    /// An infinite search is stopped first, since it would never finish.
    pub fn wait(&mut self) {
        let Some(job) = self.job.take() else { return };
        if let Some(release) = job.release {
            self.stop.store(true, Ordering::Relaxed);
            drop(release);
        }
        match job.handle.join() {
            Ok(searcher) => self.searcher = Some(searcher),
            Err(_) => {
                log::error!("search thread panicked; starting a fresh searcher");
                match Searcher::new(self.config.threads, self.config.hash_mb) {
                    Ok(s) => {
                        self.stop = s.stop_handle();
                        self.searcher = Some(s);
                    }
                    Err(e) => log::error!("{e:#}"),
                }
            }
        }
    }

    fn cmd_uci(&self) {
        self.say(concat!("id name dhouse ", env!("CARGO_PKG_VERSION")));
        self.say("id author D-House Team");
        self.say(&format!(
            "option name Hash type spin default {} min {} max {}",
            self.config.hash_mb,
            Tt::MIN_MB,
            Tt::MAX_MB
        ));
        self.say(&format!(
            "option name Threads type spin default {} min {MIN_THREADS} max {MAX_THREADS}",
            self.config.threads
        ));
        self.say("option name Clear Hash type button");
        self.say(&format!(
            "option name Move Overhead type spin default {} min 0 max {MAX_MOVE_OVERHEAD_MS}",
            self.config.move_overhead_ms
        ));
        self.say("uciok");
    }

    fn cmd_ucinewgame(&mut self) {
        self.wait();
        self.pos = Position::startpos();
        if let Some(s) = self.searcher.as_mut() {
            s.new_game();
        }
    }

    fn cmd_setoption(&mut self, args: &str) {
        self.wait();
        let (name, value) = match args.split_once(" value ") {
            Some((n, v)) => (n, Some(v.trim())),
            None => (args, None),
        };
        let name = name.trim().strip_prefix("name").unwrap_or(name).trim().to_ascii_lowercase();
        let Some(searcher) = self.searcher.as_mut() else { return };
        let number = value.and_then(|v| v.parse::<u64>().ok());

        match (name.as_str(), number) {
            ("hash", Some(mb)) => {
                let mb = (mb as usize).clamp(Tt::MIN_MB, Tt::MAX_MB);
                searcher.set_hash_mb(mb);
                self.config.hash_mb = mb;
                log::info!("hash set to {mb} MB");
            }
            ("threads", Some(n)) => {
                let n = (n as usize).clamp(MIN_THREADS, MAX_THREADS);
                match searcher.set_threads(n) {
                    Ok(()) => {
                        self.config.threads = n;
                        log::info!("threads set to {n}");
                    }
                    Err(e) => log::warn!("could not set threads: {e:#}"),
                }
            }
            ("move overhead", Some(ms)) => {
                let ms = ms.min(MAX_MOVE_OVERHEAD_MS);
                searcher.set_move_overhead(Duration::from_millis(ms));
                self.config.move_overhead_ms = ms;
                log::info!("move overhead set to {ms} ms");
            }
            ("clear hash", _) => searcher.clear_hash(),
            _ => log::warn!("unsupported option: {args}"),
        }
    }

    fn cmd_position(&mut self, args: &str) {
        self.wait();
        match parse_position(args) {
            Ok(pos) => self.pos = pos,
            Err(e) => log::warn!("rejected position {args}: {e:#}"),
        }
    }

    fn cmd_go(&mut self, args: &str) {
        self.wait();
        let go = parse_go(args, self.pos.side_to_move());
        if let Some(depth) = go.perft {
            self.run_perft(depth);
            return;
        }
        let Some(mut searcher) = self.searcher.take() else {
            log::warn!("no searcher available");
            return;
        };

        self.stop.store(false, Ordering::Relaxed);
        let (release, waiter) = if go.params.infinite {
            let (tx, rx) = mpsc::channel::<()>();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let pos = self.pos.clone();
        let out = Arc::clone(&self.out);
        let handle = thread::spawn(move || {
            let info_out = Arc::clone(&out);
            let result = searcher.think(&pos, &go.params, &mut |info| emit(&info_out, &format_info(info)));
            // An infinite search holds its answer until told to stop.
            if let Some(rx) = waiter {
                let _ = rx.recv();
            }
            let best = result.bestmove.map_or_else(|| "0000".to_string(), |m| m.to_string());
            emit(&out, &format!("bestmove {best}"));
            searcher
        });
        self.job = Some(SearchJob { handle, release });
    }

    fn cmd_stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.wait();
    }

    fn run_perft(&self, depth: u32) {
        let start = Instant::now();
        let mut total = 0;
        for (mv, nodes) in perft_divide(&self.pos, depth) {
            self.say(&format!("{mv}: {nodes}"));
            total += nodes;
        }
        self.say(&format!("\nNodes searched: {total} ({} ms)", start.elapsed().as_millis()));
    }

    fn cmd_display(&self) {
        self.say(&self.pos.to_string());
        self.say(&format!("Eval: {}", evaluate(&self.pos)));
    }

    /// Handle one protocol line. Returns `false` on `quit`.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match cmd {
            "" => {}
            "uci" => self.cmd_uci(),
            "isready" => self.say("readyok"),
            "ucinewgame" => self.cmd_ucinewgame(),
            "setoption" => self.cmd_setoption(rest),
            "position" => self.cmd_position(rest),
            "go" => self.cmd_go(rest),
            "stop" => self.cmd_stop(),
            "d" => self.cmd_display(),
            "quit" => {
                self.cmd_stop();
                return false;
            }
            _ => log::warn!("unknown command: {line}"),
        }
        true
    }

    pub fn run_loop(&mut self) -> Result<()> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line.context("failed to read stdin")?;
            if !self.handle_line(&line) {
                return Ok(());
            }
        }
        self.cmd_stop();
        Ok(())
    }
}
