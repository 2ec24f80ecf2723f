//! Lazy SMP driver: every worker runs the same iterative deepening on the
//! same root, sharing only the transposition table and the stop flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::board::{legal_moves, Position};

use super::alphabeta::{any_legal_move, SearchInfo, SearchParams, SearchResult, ThreadData, Worker};
use super::score::{CHECKMATE, DRAW_SCORE, MAX_DEPTH};
use super::time::{TimeManager, DEFAULT_MOVE_OVERHEAD};
use super::tt::Tt;

pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 64;
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

pub struct Searcher {
    tt: Tt,
    threads: Vec<ThreadData>,
    pool: ThreadPool,
    stop: Arc<AtomicBool>,
    move_overhead: Duration,
}

fn build_pool(threads: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .stack_size(WORKER_STACK_SIZE)
        .thread_name(|i| format!("search-{i}"))
        .build()
        .context("failed to start search threads")
}

impl Searcher {
    pub fn new(threads: usize, hash_mb: usize) -> Result<Self> {
        let threads = threads.clamp(MIN_THREADS, MAX_THREADS);
        Ok(Searcher {
            tt: Tt::new(hash_mb),
            threads: (0..threads).map(|_| ThreadData::new()).collect(),
            pool: build_pool(threads)?,
            stop: Arc::new(AtomicBool::new(false)),
            move_overhead: DEFAULT_MOVE_OVERHEAD,
        })
    }

    pub fn get_threads(&self) -> usize { self.threads.len() }

    /// Resize the worker pool. Per-thread histories start fresh.
    pub fn set_threads(&mut self, threads: usize) -> Result<()> {
        let threads = threads.clamp(MIN_THREADS, MAX_THREADS);
        if threads == self.threads.len() {
            return Ok(());
        }
        self.pool = build_pool(threads)?;
        self.threads = (0..threads).map(|_| ThreadData::new()).collect();
        log::debug!("search threads set to {threads}");
        Ok(())
    }

    pub fn set_hash_mb(&mut self, mb: usize) { self.tt.set_capacity_mb(mb); }

    pub fn tt(&self) -> &Tt { &self.tt }

    pub fn clear_hash(&self) { self.tt.clear(); }

    /// Forget everything learned from previous games.
    pub fn new_game(&mut self) {
        self.tt.clear();
        for data in &mut self.threads {
            data.clear();
        }
    }

    pub fn set_move_overhead(&mut self, overhead: Duration) { self.move_overhead = overhead; }

    /// Shared flag that aborts a running search when set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> { Arc::clone(&self.stop) }

    /// Search `pos` under `params`, printing nothing.
    pub fn search_with_params(&mut self, pos: &Position, params: &SearchParams) -> SearchResult {
        self.stop.store(false, Ordering::Relaxed);
        self.think(pos, params, &mut |_| {})
    }

    /// Run a search without resetting the stop flag; `report` sees every
    /// iteration completed by the main worker.
    pub fn think(
        &mut self,
        pos: &Position,
        params: &SearchParams,
        report: &mut (dyn FnMut(&SearchInfo) + Send),
    ) -> SearchResult {
        if legal_moves(pos).is_empty() {
            let score = if pos.in_check() { -CHECKMATE } else { DRAW_SCORE };
            return SearchResult { score, ..Default::default() };
        }

        let clock = if params.infinite {
            TimeManager::unlimited()
        } else {
            TimeManager::new(params.movetime, params.time_left, params.increment, params.movestogo, self.move_overhead)
        };
        let max_depth = if params.infinite { MAX_DEPTH } else { params.max_depth() };
        let max_nodes = if params.infinite { None } else { params.max_nodes };
        log::debug!(
            "search: depth {max_depth} budget {:?} nodes {max_nodes:?} threads {}",
            clock.allocation(),
            self.threads.len()
        );

        let counters: Vec<AtomicU64> = (0..self.threads.len()).map(|_| AtomicU64::new(0)).collect();
        let tt = &self.tt;
        let stop: &AtomicBool = &self.stop;
        let counters_ref = &counters[..];
        let Some((main, helpers)) = self.threads.split_first_mut() else {
            return SearchResult::default();
        };

        let mut result = self.pool.scope(|s| {
            for (i, data) in helpers.iter_mut().enumerate() {
                s.spawn(move |_| {
                    let mut worker = Worker::new(i + 1, data, tt, stop, counters_ref, None, None);
                    worker.iterate(pos, MAX_DEPTH, &mut |_| {});
                });
            }
            let mut worker = Worker::new(0, main, tt, stop, counters_ref, Some(clock), max_nodes);
            worker.iterate(pos, max_depth, report)
        });

        if result.bestmove.is_none() {
            result.bestmove = any_legal_move(pos);
        }
        result.nodes = counters.iter().map(|n| n.load(Ordering::Relaxed)).sum();
        result
    }
}
