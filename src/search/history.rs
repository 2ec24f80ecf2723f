//! Move-ordering statistics learned during search.

use crate::board::{Color, Move, MoveFlag, PieceType, Position};

use super::stack::SearchStack;

const SQUARES: usize = 64;
const KINDS: usize = 6;
const CONT_SIZE: usize = KINDS * SQUARES * KINDS * SQUARES;

/// Largest depth-derived bonus a single cutoff can give.
const MAX_BONUS: i32 = 576;

/// Pull `stat` towards `64 * bonus`, saturating as it grows.
#[inline]
fn update_stat(stat: &mut i32, bonus: i32) {
    *stat += 64 * bonus - (*stat * bonus.abs()).div_euclid(1024);
}

#[inline]
fn cont_index(prev: Move, mv: Move) -> usize {
    ((prev.piece().kind().index() * SQUARES + prev.to().index()) * KINDS + mv.piece().kind().index()) * SQUARES
        + mv.to().index()
}

/// Type of the piece a tactical move removes (pawn for en passant and
/// non-capturing promotions).
#[inline]
fn captured_kind(pos: &Position, mv: Move) -> PieceType {
    if !mv.is_capture() || mv.flag() == MoveFlag::EnPassant {
        return PieceType::Pawn;
    }
    pos.piece_at(mv.to()).map_or(PieceType::Pawn, |p| p.kind())
}

pub struct Histories {
    /// Butterfly history: [side][from * 64 + to].
    quiet: Vec<i32>,
    /// Keyed by the previous move's (piece, to) and this move's (piece, to).
    counter: Vec<i32>,
    /// Same shape as `counter`, keyed by the move two plies back.
    follow_up: Vec<i32>,
    /// [attacker][to][captured].
    tactical: Vec<i32>,
    /// Refutation of the previous move, indexed by its from/to.
    counter_moves: Vec<Move>,
}

impl Histories {
    pub fn new() -> Self {
        Histories {
            quiet: vec![0; 2 * SQUARES * SQUARES],
            counter: vec![0; CONT_SIZE],
            follow_up: vec![0; CONT_SIZE],
            tactical: vec![0; KINDS * SQUARES * KINDS],
            counter_moves: vec![Move::NULL; SQUARES * SQUARES],
        }
    }

    pub fn clear(&mut self) {
        self.quiet.fill(0);
        self.counter.fill(0);
        self.follow_up.fill(0);
        self.tactical.fill(0);
        self.counter_moves.fill(Move::NULL);
    }

    #[inline]
    fn quiet_index(side: Color, mv: Move) -> usize { side.index() * SQUARES * SQUARES + mv.from_to() }

    #[inline]
    fn tactical_index(pos: &Position, mv: Move) -> usize {
        (mv.piece().kind().index() * SQUARES + mv.to().index()) * KINDS + captured_kind(pos, mv).index()
    }

    /// Continuation history against the previous move.
    pub fn counter_score(&self, stack: &SearchStack, ply: usize, mv: Move) -> i32 {
        let prev = stack.back(ply, 1).mv;
        if prev.is_null() {
            0
        } else {
            self.counter[cont_index(prev, mv)]
        }
    }

    /// Butterfly plus both continuation histories.
    pub fn quiet_score(&self, side: Color, stack: &SearchStack, ply: usize, mv: Move) -> i32 {
        let mut score = self.quiet[Self::quiet_index(side, mv)] + self.counter_score(stack, ply, mv);
        let grand = stack.back(ply, 2).mv;
        if !grand.is_null() {
            score += self.follow_up[cont_index(grand, mv)];
        }
        score
    }

    pub fn tactical_score(&self, pos: &Position, mv: Move) -> i32 { self.tactical[Self::tactical_index(pos, mv)] }

    pub fn counter_move(&self, prev: Move) -> Move {
        if prev.is_null() {
            Move::NULL
        } else {
            self.counter_moves[prev.from_to()]
        }
    }

    /// Reward `best` after a beta cutoff and penalise the moves of the same
    /// class tried before it. A quiet cutoff also penalises every tactical
    /// tried and refreshes killers and the counter move.
    pub fn update(
        &mut self,
        pos: &Position,
        stack: &mut SearchStack,
        ply: usize,
        best: Move,
        depth: i32,
        tacticals: &[Move],
        quiets: &[Move],
    ) {
        let bonus = (depth * depth).min(MAX_BONUS);

        if best.is_tactical() {
            update_stat(&mut self.tactical[Self::tactical_index(pos, best)], bonus);
        } else {
            let side = pos.side_to_move();
            let prev = stack.back(ply, 1).mv;
            let grand = stack.back(ply, 2).mv;

            let entry = stack.at_mut(ply);
            if entry.killers[0] != best {
                entry.killers[1] = entry.killers[0];
                entry.killers[0] = best;
            }
            if !prev.is_null() {
                self.counter_moves[prev.from_to()] = best;
            }

            for &mv in quiets {
                let b = if mv == best { bonus } else { -bonus };
                update_stat(&mut self.quiet[Self::quiet_index(side, mv)], b);
                if !prev.is_null() {
                    update_stat(&mut self.counter[cont_index(prev, mv)], b);
                }
                if !grand.is_null() {
                    update_stat(&mut self.follow_up[cont_index(grand, mv)], b);
                }
            }
        }

        for &mv in tacticals {
            if mv != best {
                update_stat(&mut self.tactical[Self::tactical_index(pos, mv)], -bonus);
            }
        }
    }
}

impl Default for Histories {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_saturates() {
        let mut s = 0;
        for _ in 0..200 {
            update_stat(&mut s, MAX_BONUS);
        }
        assert!(s > 0 && s <= 64 * 1024, "stat {s} escaped its bound");
        let mut n = 0;
        update_stat(&mut n, -16);
        assert_eq!(n, -1024);
    }

    #[test]
    fn quiet_cutoff_sets_killer_and_counter() {
        let pos = Position::startpos();
        let mut h = Histories::new();
        let mut stack = SearchStack::new();
        let prev = pos.parse_move("e2e4").unwrap();
        let child = pos.do_move(prev);
        stack.at_mut(0).mv = prev;
        let best = child.parse_move("g8f6").unwrap();
        let other = child.parse_move("a7a6").unwrap();
        h.update(&child, &mut stack, 1, best, 5, &[], &[other, best]);
        assert_eq!(stack.at(1).killers[0], best);
        assert_eq!(h.counter_move(prev), best);
        assert!(h.quiet_score(child.side_to_move(), &stack, 1, best) > 0);
        assert!(h.quiet_score(child.side_to_move(), &stack, 1, other) < 0);
        assert!(h.counter_score(&stack, 1, best) > 0);
    }
}
