//! Principal-variation alpha-beta search run by every worker thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::board::{legal_moves, Move, Position};
use crate::eval::evaluate;

use super::history::Histories;
use super::movepick::{MovePicker, Stage};
use super::score::{value_from_tt, value_to_tt, Score, CHECKMATE, DRAW_SCORE, MATE_BOUND, MAX_DEPTH, MAX_PLY, UNKNOWN, WIN_BOUND};
use super::see::see;
use super::stack::{PvTable, SearchStack};
use super::tables::*;
use super::time::TimeManager;
use super::tt::{Bound, Tt};

/// Limits for one search. Unset fields mean "no limit".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub depth: Option<i32>,
    pub movetime: Option<Duration>,
    /// Clock time left for the side to move.
    pub time_left: Option<Duration>,
    pub increment: Duration,
    pub movestogo: Option<u32>,
    pub max_nodes: Option<u64>,
    pub infinite: bool,
}

impl SearchParams {
    pub fn depth(depth: i32) -> Self { SearchParams { depth: Some(depth), ..Default::default() } }

    pub fn movetime(movetime: Duration) -> Self { SearchParams { movetime: Some(movetime), ..Default::default() } }

    pub(crate) fn max_depth(&self) -> i32 { self.depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub bestmove: Option<Move>,
    pub score: i32,
    /// Deepest fully completed iteration.
    pub depth: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

/// Progress report emitted after each completed iteration.
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: i32,
    pub seldepth: usize,
    pub score: Score,
    pub nodes: u64,
    pub elapsed: Duration,
    pub hashfull: usize,
    pub pv: Vec<Move>,
}

impl SearchInfo {
    pub fn nps(&self) -> u64 {
        let ms = self.elapsed.as_millis().max(1) as u64;
        self.nodes * 1000 / ms
    }
}

/// Search was asked to stop; unwinds the whole tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Stopped;

/// Per-thread state kept between searches.
pub struct ThreadData {
    pub(crate) histories: Box<Histories>,
    pub(crate) stack: Box<SearchStack>,
    pub(crate) pv: Box<PvTable>,
}

impl ThreadData {
    pub fn new() -> Self {
        ThreadData { histories: Box::new(Histories::new()), stack: Box::new(SearchStack::new()), pv: Box::new(PvTable::new()) }
    }

    pub fn clear(&mut self) {
        self.histories.clear();
        self.stack.reset();
    }
}

impl Default for ThreadData {
    fn default() -> Self { Self::new() }
}

const POLL_INTERVAL: u64 = 1024;

pub(crate) struct Worker<'a> {
    id: usize,
    data: &'a mut ThreadData,
    tt: &'a Tt,
    stop: &'a AtomicBool,
    node_counters: &'a [AtomicU64],
    /// Only the main worker watches the clock and the node limit.
    clock: Option<TimeManager>,
    max_nodes: Option<u64>,
    helper_nodes: u64,
    nodes: u64,
    seldepth: usize,
}

impl<'a> Worker<'a> {
    pub(crate) fn new(
        id: usize,
        data: &'a mut ThreadData,
        tt: &'a Tt,
        stop: &'a AtomicBool,
        node_counters: &'a [AtomicU64],
        clock: Option<TimeManager>,
        max_nodes: Option<u64>,
    ) -> Self {
        Worker { id, data, tt, stop, node_counters, clock, max_nodes, helper_nodes: 0, nodes: 0, seldepth: 0 }
    }

    #[inline]
    fn is_main(&self) -> bool { self.id == 0 }

    fn publish_nodes(&self) { self.node_counters[self.id].store(self.nodes, Ordering::Relaxed); }

    fn total_nodes(&self) -> u64 { self.node_counters.iter().map(|n| n.load(Ordering::Relaxed)).sum() }

    #[inline]
    fn poll(&mut self) -> Result<(), Stopped> {
        if self.nodes % POLL_INTERVAL == 0 {
            self.publish_nodes();
            if self.is_main() {
                self.helper_nodes = self.total_nodes() - self.nodes;
                if self.clock.as_ref().is_some_and(TimeManager::out_of_time) {
                    self.stop.store(true, Ordering::Relaxed);
                }
            }
        }
        if self.is_main() && self.max_nodes.is_some_and(|max| self.nodes + self.helper_nodes >= max) {
            self.stop.store(true, Ordering::Relaxed);
        }
        if self.stop.load(Ordering::Relaxed) {
            Err(Stopped)
        } else {
            Ok(())
        }
    }

    /// Iterative deepening from depth 1 to `max_depth`. The main worker
    /// reports each completed iteration and raises the stop flag when done.
    pub(crate) fn iterate(&mut self, root: &Position, max_depth: i32, report: &mut dyn FnMut(&SearchInfo)) -> SearchResult {
        self.data.stack.reset();
        self.data.pv.clear(0);

        let mut result = SearchResult::default();
        let mut values = Vec::new();
        let mut best_moves = Vec::new();
        let mut value = 0;

        for depth in 1..=max_depth {
            self.seldepth = 0;
            match self.aspiration(root, value, depth) {
                Ok(v) => value = v,
                Err(Stopped) => {
                    // An interrupted first iteration still leaves the best
                    // root move found so far.
                    if result.bestmove.is_none() {
                        result.bestmove = self.data.pv.line(0).first().copied();
                    }
                    break;
                }
            }
            let pv = self.data.pv.line(0).to_vec();
            let Some(&best) = pv.first() else { break };
            values.push(value);
            best_moves.push(best);
            result.bestmove = Some(best);
            result.score = value;
            result.depth = depth;
            result.pv = pv;

            if self.is_main() {
                self.publish_nodes();
                let info = SearchInfo {
                    depth,
                    seldepth: self.seldepth,
                    score: Score::from_value(value),
                    nodes: self.total_nodes(),
                    elapsed: self.clock.as_ref().map_or(Duration::ZERO, TimeManager::elapsed),
                    hashfull: self.tt.hashfull(),
                    pv: result.pv.clone(),
                };
                log::debug!("depth {depth} score {value} nodes {}", info.nodes);
                report(&info);

                let soft_stop = self.clock.as_mut().is_some_and(|c| c.iteration_completed(&values, &best_moves));
                if soft_stop || self.clock.as_ref().is_some_and(TimeManager::out_of_time) {
                    break;
                }
            }
        }

        self.publish_nodes();
        if self.is_main() {
            self.stop.store(true, Ordering::Relaxed);
        }
        result.nodes = self.nodes;
        result
    }

    fn aspiration(&mut self, root: &Position, prev: i32, depth: i32) -> Result<i32, Stopped> {
        let (mut alpha, mut beta, mut delta) = if depth > ASPIRATION_DEPTH && prev.abs() <= 1000 {
            ((prev - ASPIRATION_WINDOW).max(-CHECKMATE), (prev + ASPIRATION_WINDOW).min(CHECKMATE), ASPIRATION_WINDOW)
        } else {
            (-CHECKMATE, CHECKMATE, CHECKMATE)
        };
        let mut search_depth = depth;

        loop {
            let value = self.negamax(root, alpha, beta, search_depth, false, 0)?;
            if alpha <= -CHECKMATE && beta >= CHECKMATE {
                return Ok(value);
            }
            if value > alpha && value < beta {
                return Ok(value);
            }
            log::trace!("aspiration re-search at depth {search_depth}: {value} outside [{alpha}, {beta}]");
            if value <= alpha {
                alpha = (alpha - delta).max(-CHECKMATE);
                beta = (alpha + beta).div_euclid(2);
            } else if value >= beta {
                beta = (beta + delta).min(CHECKMATE);
                if value.abs() < WIN_BOUND {
                    search_depth = (search_depth - 1).max(1);
                }
            }
            delta = (delta + delta / 2).min(CHECKMATE);
        }
    }

    fn draw_score(&self) -> i32 { DRAW_SCORE + 2 - (self.nodes & 3) as i32 }

    pub(crate) fn negamax(
        &mut self,
        pos: &Position,
        mut alpha: i32,
        mut beta: i32,
        mut depth: i32,
        cut_node: bool,
        ply: usize,
    ) -> Result<i32, Stopped> {
        if depth <= 0 {
            return self.quiescence(pos, alpha, beta, ply);
        }
        self.nodes += 1;
        self.poll()?;
        self.data.pv.clear(ply);
        self.seldepth = self.seldepth.max(ply);

        let t = tables();
        let root = ply == 0;
        let pv_node = beta - alpha != 1;
        let old_alpha = alpha;
        let excluded = self.data.stack.at(ply).excluded;

        if !root {
            if pos.is_draw() {
                return Ok(self.draw_score());
            }
            if ply >= MAX_PLY {
                return Ok(evaluate(pos));
            }
            // Mate distance pruning.
            alpha = alpha.max(-CHECKMATE + ply as i32);
            beta = beta.min(CHECKMATE - ply as i32 - 1);
            if alpha >= beta {
                return Ok(alpha);
            }
        }

        let tte = if excluded.is_null() { self.tt.probe(pos.key()) } else { None };
        let tt_move = tte.map_or(Move::NULL, |e| e.mv);
        let tt_value = tte.map_or(UNKNOWN, |e| value_from_tt(e.value, ply));
        if let Some(e) = tte {
            if !pv_node && e.depth >= depth && e.bound.cuts(tt_value, alpha, beta) {
                return Ok(tt_value);
            }
        }

        // Internal iterative reduction.
        if depth >= 4 && tt_move.is_null() && excluded.is_null() {
            depth -= 1;
        }

        let masks = pos.masks();
        let in_check = masks.in_check();
        let mut eval = if !excluded.is_null() {
            self.data.stack.at(ply).eval
        } else if in_check {
            UNKNOWN
        } else {
            evaluate(pos)
        };
        self.data.stack.at_mut(ply).eval = eval;
        let improving = !in_check && ply >= 2 && {
            let earlier = self.data.stack.back(ply, 2).eval;
            earlier == UNKNOWN || earlier < eval
        };

        {
            let next = self.data.stack.at_mut(ply + 1);
            next.excluded = Move::NULL;
            next.killers = [Move::NULL; 2];
        }

        if !pv_node && !in_check {
            if let Some(e) = tte {
                if e.depth >= depth {
                    let sharper = if tt_value > eval { Bound::Lower } else { Bound::Upper };
                    if e.bound == sharper {
                        eval = tt_value;
                    }
                }
            }

            // Reverse futility pruning.
            if depth < RFP_MAX_DEPTH
                && excluded.is_null()
                && eval < MATE_BOUND
                && eval - RFP_MARGIN * (depth - improving as i32) - 10 >= beta
            {
                return Ok(eval);
            }

            // Null move pruning.
            if depth > 2
                && excluded.is_null()
                && pos.has_non_pawn_material(pos.side_to_move())
                && !self.data.stack.back(ply, 1).mv.is_null()
                && eval - 10 * improving as i32 >= beta
            {
                let r = depth.min(4 + depth / 6 + ((eval - beta) / 256).min(3));
                self.data.stack.at_mut(ply).mv = Move::NULL;
                let child = pos.do_null_move();
                let value = -self.negamax(&child, -beta, -beta + 1, depth - r, !cut_node, ply + 1)?;
                if value >= beta {
                    return Ok(beta);
                }
            }

            // Probcut: a winning tactical that beats beta by a margin in a
            // reduced search almost surely beats it at full depth.
            let prob_beta = beta + PROBCUT_MARGIN;
            let tt_says_no = tte.is_some_and(|e| e.depth >= depth - 3 && tt_value < prob_beta);
            if depth > 4 && beta.abs() < MATE_BOUND && !tt_says_no {
                let mut picker = MovePicker::quiescence(pos, &masks, 0);
                while let Some(mv) = picker.next(&self.data.histories, &self.data.stack, ply) {
                    if picker.stage() > Stage::GoodTacticals {
                        break;
                    }
                    if mv == excluded {
                        continue;
                    }
                    self.data.stack.at_mut(ply).mv = mv;
                    let child = pos.do_move(mv);
                    let mut value = -self.quiescence(&child, -prob_beta, -prob_beta + 1, ply + 1)?;
                    if value >= prob_beta {
                        value = -self.negamax(&child, -prob_beta, -prob_beta + 1, depth - 4, !cut_node, ply + 1)?;
                    }
                    if value >= prob_beta {
                        return Ok(value);
                    }
                }
            }
        }

        let killers = self.data.stack.at(ply).killers;
        let counter = self.data.histories.counter_move(self.data.stack.back(ply, 1).mv);
        let mut picker = MovePicker::new(pos, &masks, tt_move, killers, counter);

        let mut tried_tacticals: Vec<Move> = Vec::with_capacity(16);
        let mut tried_quiets: Vec<Move> = Vec::with_capacity(32);
        let mut move_count = 0usize;
        let mut searched = 0usize;
        let mut skip_quiets = false;
        let mut best_value = -CHECKMATE;
        let mut best_move = Move::NULL;
        let side = pos.side_to_move();

        while let Some(mv) = picker.next(&self.data.histories, &self.data.stack, ply) {
            if mv == excluded {
                continue;
            }
            let tactical = mv.is_tactical();
            if skip_quiets && !tactical && !in_check {
                continue;
            }
            move_count += 1;

            let (counter_hist, quiet_hist, special) = if tactical {
                (0, 0, false)
            } else {
                (
                    self.data.histories.counter_score(&self.data.stack, ply, mv),
                    self.data.histories.quiet_score(side, &self.data.stack, ply, mv),
                    picker.is_special(mv),
                )
            };

            if best_value > -MATE_BOUND {
                // Late move pruning.
                if !tactical && !in_check && !pv_node && depth <= LMP_MAX_DEPTH && move_count > t.lmp(improving, depth) {
                    skip_quiets = true;
                    picker.skip_quiets();
                    continue;
                }
                // Quiet history pruning.
                if depth < QUIET_SKIP_MAX_DEPTH
                    && !tactical
                    && !in_check
                    && eval + QUIET_SKIP_MARGIN * depth <= alpha
                    && quiet_hist < QUIET_SKIP_HISTORY / (1 + improving as i32)
                {
                    skip_quiets = true;
                    picker.skip_quiets();
                }
                // Counter history pruning.
                if depth < COUNTER_PRUNE_MAX_DEPTH && !tactical && !special && counter_hist <= COUNTER_PRUNE_HISTORY {
                    continue;
                }
                // SEE pruning.
                if !tactical && see(pos, mv) < t.quiet_see(depth) {
                    continue;
                }
                if tactical && picker.stage() > Stage::GoodTacticals && see(pos, mv) < t.tactical_see(depth) {
                    continue;
                }
            }

            searched += 1;
            if tactical {
                tried_tacticals.push(mv);
            } else {
                tried_quiets.push(mv);
            }

            let mut extension = 0;
            let singular_candidate = tte.is_some_and(|e| {
                depth > SINGULAR_MIN_DEPTH
                    && !root
                    && excluded.is_null()
                    && mv == tt_move
                    && e.depth >= depth - 3
                    && e.bound == Bound::Lower
                    && tt_value.abs() < MATE_BOUND
            });
            if singular_candidate {
                let s_beta = (tt_value - 3 * depth / 2).max(-CHECKMATE);
                let s_depth = depth / 2 - 1;
                self.data.stack.at_mut(ply).excluded = mv;
                let value = self.negamax(pos, s_beta - 1, s_beta, s_depth, cut_node, ply);
                self.data.stack.at_mut(ply).excluded = Move::NULL;
                let value = value?;
                if value < s_beta {
                    extension = 1 + (!pv_node && value < s_beta - DOUBLE_EXTENSION_MARGIN) as i32;
                } else if s_beta >= beta {
                    // Multicut: even without the hash move we beat beta.
                    return Ok(s_beta);
                }
            } else if tte.is_some() && depth > SINGULAR_MIN_DEPTH && !root && mv == tt_move && quiet_hist >= HISTORY_EXTENSION {
                extension = 1;
            } else {
                let prev = self.data.stack.back(ply, 1).mv;
                if pv_node && !root && mv.is_capture() && prev.is_capture() && mv.to() == prev.to() {
                    extension = 1;
                }
            }

            self.data.stack.at_mut(ply).mv = mv;
            let child = pos.do_move(mv);
            let gives_check = child.in_check();
            let new_depth = depth + extension.max((in_check && depth < CHECK_EXTENSION_MAX_DEPTH) as i32);

            let mut r = 1;
            if depth > 2 && searched > 1 {
                if tactical {
                    let th = self.data.histories.tactical_score(pos, mv);
                    r = 1 - (4 * th).div_euclid(th.abs() + LMR_TACTICAL_HISTORY_OFFSET) + cut_node as i32;
                } else {
                    r = t.lmr(depth, searched);
                    r += !pv_node as i32;
                    r += !improving as i32;
                    r -= 2 * special as i32;
                    r += cut_node as i32;
                    r += gives_check as i32;
                    r -= quiet_hist.div_euclid(LMR_QUIET_HISTORY_DIV);
                }
                r = r.max(1).min(depth - 1);
            }

            let value = if pv_node && searched == 1 {
                -self.negamax(&child, -beta, -alpha, new_depth - 1, false, ply + 1)?
            } else {
                let mut v = -self.negamax(&child, -alpha - 1, -alpha, new_depth - r, true, ply + 1)?;
                if v > alpha && r != 1 {
                    v = -self.negamax(&child, -alpha - 1, -alpha, new_depth - 1, !cut_node, ply + 1)?;
                }
                if v > alpha && (root || v < beta) {
                    v = -self.negamax(&child, -beta, -alpha, new_depth - 1, false, ply + 1)?;
                }
                v
            };

            if value > best_value {
                best_value = value;
                best_move = mv;
                if value > alpha {
                    alpha = value;
                    self.data.pv.update(ply, mv);
                }
                if alpha >= beta {
                    let bonus_depth = depth + (best_value > beta + 100) as i32;
                    self.data.histories.update(
                        pos,
                        &mut self.data.stack,
                        ply,
                        mv,
                        bonus_depth,
                        &tried_tacticals,
                        &tried_quiets,
                    );
                    break;
                }
            }
        }

        if move_count == 0 {
            // Every move was the excluded one: fail low for the verification search.
            if !excluded.is_null() {
                return Ok(alpha);
            }
            return Ok(if in_check { -CHECKMATE + ply as i32 } else { DRAW_SCORE });
        }

        if excluded.is_null() {
            let bound = if best_value >= beta {
                Bound::Lower
            } else if best_value <= old_alpha {
                Bound::Upper
            } else {
                Bound::Exact
            };
            self.tt.store(pos.key(), value_to_tt(best_value, ply), depth, bound, best_move);
        }
        Ok(best_value)
    }

    pub(crate) fn quiescence(&mut self, pos: &Position, mut alpha: i32, beta: i32, ply: usize) -> Result<i32, Stopped> {
        self.nodes += 1;
        self.poll()?;
        self.data.pv.clear(ply);
        self.seldepth = self.seldepth.max(ply);

        if pos.is_draw() {
            return Ok(DRAW_SCORE);
        }
        if ply >= MAX_PLY {
            return Ok(evaluate(pos));
        }

        let tte = self.tt.probe(pos.key());
        let tt_value = tte.map_or(UNKNOWN, |e| value_from_tt(e.value, ply));
        if let Some(e) = tte {
            if e.bound.cuts(tt_value, alpha, beta) {
                return Ok(tt_value);
            }
        }

        let old_alpha = alpha;
        let masks = pos.masks();
        let in_check = masks.in_check();
        let mut best_value = -CHECKMATE + ply as i32;
        let mut best_move = Move::NULL;

        let mut eval = if in_check { UNKNOWN } else { evaluate(pos) };
        self.data.stack.at_mut(ply).eval = eval;
        let mut see_cutoff = 0;
        if !in_check {
            if let Some(e) = tte {
                let sharper = if tt_value > eval { Bound::Lower } else { Bound::Upper };
                if e.bound == sharper {
                    eval = tt_value;
                }
            }
            if eval >= beta {
                return Ok(eval);
            }
            alpha = alpha.max(eval);
            best_value = eval;
            // Only captures that can lift the score back to alpha.
            see_cutoff = (alpha - eval - DELTA_MARGIN).max(0);
        }

        let mut picker = MovePicker::quiescence(pos, &masks, see_cutoff);
        while let Some(mv) = picker.next(&self.data.histories, &self.data.stack, ply) {
            if !in_check && picker.stage() > Stage::GoodTacticals {
                break;
            }
            self.data.stack.at_mut(ply).mv = mv;
            let child = pos.do_move(mv);
            let value = -self.quiescence(&child, -beta, -alpha, ply + 1)?;
            if value > best_value {
                best_value = value;
                best_move = mv;
                if value > alpha {
                    alpha = value;
                    self.data.pv.update(ply, mv);
                }
                if alpha >= beta {
                    break;
                }
            }
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if best_value <= old_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.tt.store(pos.key(), value_to_tt(best_value, ply), 0, bound, best_move);
        Ok(best_value)
    }
}

/// Fallback when no iteration produced a move: the first legal move.
pub(crate) fn any_legal_move(pos: &Position) -> Option<Move> { legal_moves(pos).first().copied() }
