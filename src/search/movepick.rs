//! Staged move ordering.
//!
//! Moves come out in phases: hash move, winning tacticals, killers, counter
//! move, history-sorted quiets, then losing tacticals. Each phase generates
//! lazily, so a cutoff on the hash move never pays for move generation.

use crate::board::movegen::{gen_quiets, gen_tacticals, is_legal};
use crate::board::{Move, MoveFlag, MoveList, MoveMasks, PieceType, Position};
use crate::board::moves::MAX_MOVES;

use super::history::Histories;
use super::see::see;
use super::stack::SearchStack;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    TtMove,
    GenTacticals,
    GoodTacticals,
    Killer1,
    Killer2,
    Counter,
    GenQuiets,
    Quiets,
    BadTacticals,
    Done,
}

/// Moves with scores, handed out best first by partial selection sort.
struct ScoredMoves {
    moves: MoveList,
    scores: [i32; MAX_MOVES],
    next: usize,
}

impl ScoredMoves {
    fn new() -> Self { ScoredMoves { moves: MoveList::new(), scores: [0; MAX_MOVES], next: 0 } }

    fn push(&mut self, mv: Move, score: i32) {
        self.scores[self.moves.len()] = score;
        self.moves.push(mv);
    }

    fn pick_best(&mut self) -> Option<(Move, i32)> {
        let len = self.moves.len();
        if self.next >= len {
            return None;
        }
        let mut best = self.next;
        for i in self.next + 1..len {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.next, best);
        self.scores.swap(self.next, best);
        let picked = (self.moves[self.next], self.scores[self.next]);
        self.next += 1;
        Some(picked)
    }
}

pub struct MovePicker<'a> {
    pos: &'a Position,
    masks: &'a MoveMasks,
    stage: Stage,
    quiescence: bool,
    /// Minimum SEE for a tactical to count as good.
    see_cutoff: i32,
    tt_move: Move,
    killers: [Move; 2],
    counter: Move,
    skip_quiets: bool,
    tacticals: ScoredMoves,
    quiets: ScoredMoves,
    bad: ScoredMoves,
}

impl<'a> MovePicker<'a> {
    /// Picker for a main-search node.
    pub fn new(pos: &'a Position, masks: &'a MoveMasks, tt_move: Move, killers: [Move; 2], counter: Move) -> Self {
        MovePicker {
            pos,
            masks,
            stage: Stage::TtMove,
            quiescence: false,
            see_cutoff: 0,
            tt_move,
            killers,
            counter,
            skip_quiets: false,
            tacticals: ScoredMoves::new(),
            quiets: ScoredMoves::new(),
            bad: ScoredMoves::new(),
        }
    }

    /// Picker for quiescence and probcut: tacticals only, plus evasions in
    /// check. No hash move, killers or counter move.
    pub fn quiescence(pos: &'a Position, masks: &'a MoveMasks, see_cutoff: i32) -> Self {
        let mut picker = MovePicker::new(pos, masks, Move::NULL, [Move::NULL; 2], Move::NULL);
        picker.quiescence = true;
        picker.see_cutoff = see_cutoff;
        picker
    }

    #[inline]
    pub fn stage(&self) -> Stage { self.stage }

    /// Stop handing out quiet moves from now on.
    pub fn skip_quiets(&mut self) { self.skip_quiets = true; }

    /// Killer or counter move.
    #[inline]
    pub fn is_special(&self, mv: Move) -> bool { mv == self.killers[0] || mv == self.killers[1] || mv == self.counter }

    /// Moves already handed out by the single-move stages.
    #[inline]
    fn already_tried(&self, mv: Move) -> bool { !self.quiescence && (mv == self.tt_move || self.is_special(mv)) }

    fn try_special(&self, mv: Move) -> bool {
        !self.quiescence
            && !self.skip_quiets
            && !mv.is_null()
            && mv != self.tt_move
            && !mv.is_tactical()
            && is_legal(self.pos, self.masks, mv)
    }

    pub fn next(&mut self, histories: &Histories, stack: &SearchStack, ply: usize) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::GenTacticals;
                    if !self.quiescence && !self.tt_move.is_null() && is_legal(self.pos, self.masks, self.tt_move) {
                        return Some(self.tt_move);
                    }
                }
                Stage::GenTacticals => {
                    let mut list = MoveList::new();
                    gen_tacticals(self.pos, self.masks, &mut list);
                    for &mv in list.iter() {
                        let victim = victim_kind(self.pos, mv).map_or(0, PieceType::value);
                        self.tacticals.push(mv, victim * 32 + histories.tactical_score(self.pos, mv));
                    }
                    self.stage = Stage::GoodTacticals;
                }
                Stage::GoodTacticals => {
                    while let Some((mv, _)) = self.tacticals.pick_best() {
                        if !self.quiescence && mv == self.tt_move {
                            continue;
                        }
                        let value = see(self.pos, mv);
                        if value >= self.see_cutoff {
                            return Some(mv);
                        }
                        // With a non-positive cutoff, a capture whose attacker is
                        // no more valuable than its victim is still tried early.
                        let attacker = mv.piece().kind();
                        let not_overtaking = victim_kind(self.pos, mv).is_some_and(|v| attacker <= v);
                        if self.see_cutoff <= 0 && not_overtaking {
                            return Some(mv);
                        }
                        self.bad.push(mv, value);
                    }
                    self.stage = Stage::Killer1;
                }
                Stage::Killer1 => {
                    self.stage = Stage::Killer2;
                    let k = self.killers[0];
                    if self.try_special(k) {
                        return Some(k);
                    }
                }
                Stage::Killer2 => {
                    self.stage = Stage::Counter;
                    let k = self.killers[1];
                    if k != self.killers[0] && self.try_special(k) {
                        return Some(k);
                    }
                }
                Stage::Counter => {
                    self.stage = Stage::GenQuiets;
                    let c = self.counter;
                    if c != self.killers[0] && c != self.killers[1] && self.try_special(c) {
                        return Some(c);
                    }
                }
                Stage::GenQuiets => {
                    if !self.skip_quiets && (!self.quiescence || self.masks.in_check()) {
                        let mut list = MoveList::new();
                        gen_quiets(self.pos, self.masks, &mut list);
                        let side = self.pos.side_to_move();
                        for &mv in list.iter() {
                            self.quiets.push(mv, histories.quiet_score(side, stack, ply, mv));
                        }
                    }
                    self.stage = Stage::Quiets;
                }
                Stage::Quiets => {
                    if !self.skip_quiets {
                        while let Some((mv, _)) = self.quiets.pick_best() {
                            if self.already_tried(mv) {
                                continue;
                            }
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::BadTacticals;
                }
                Stage::BadTacticals => {
                    if let Some((mv, _)) = self.bad.pick_best() {
                        return Some(mv);
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }
}

/// Kind of the piece a tactical removes; `None` for a quiet promotion.
fn victim_kind(pos: &Position, mv: Move) -> Option<PieceType> {
    if mv.flag() == MoveFlag::EnPassant {
        Some(PieceType::Pawn)
    } else {
        pos.piece_at(mv.to()).map(|p| p.kind())
    }
}
