use crate::board::Move;

use super::score::{MAX_PLY, UNKNOWN};

/// Sentinel entries before ply 0 so `ply - 1` and `ply - 2` are always valid.
pub const STACK_OFFSET: usize = 2;

#[derive(Clone, Copy, Debug)]
pub struct StackEntry {
    /// Move played from this ply (null for a null move).
    pub mv: Move,
    /// Move skipped by a singular-extension verification search.
    pub excluded: Move,
    /// Static eval, `UNKNOWN` when in check.
    pub eval: i32,
    pub killers: [Move; 2],
}

impl Default for StackEntry {
    fn default() -> Self { StackEntry { mv: Move::NULL, excluded: Move::NULL, eval: UNKNOWN, killers: [Move::NULL; 2] } }
}

pub struct SearchStack {
    entries: [StackEntry; MAX_PLY + 2 * STACK_OFFSET],
}

impl SearchStack {
    pub fn new() -> Self { SearchStack { entries: [StackEntry::default(); MAX_PLY + 2 * STACK_OFFSET] } }

    pub fn reset(&mut self) { self.entries.fill(StackEntry::default()); }

    #[inline]
    pub fn at(&self, ply: usize) -> &StackEntry { &self.entries[ply + STACK_OFFSET] }

    #[inline]
    pub fn at_mut(&mut self, ply: usize) -> &mut StackEntry { &mut self.entries[ply + STACK_OFFSET] }

    /// Entry `back` plies above `ply` (at most [`STACK_OFFSET`]).
    #[inline]
    pub fn back(&self, ply: usize, back: usize) -> &StackEntry {
        debug_assert!(back <= STACK_OFFSET);
        &self.entries[ply + STACK_OFFSET - back]
    }
}

impl Default for SearchStack {
    fn default() -> Self { Self::new() }
}

/// Triangular principal-variation table.
pub struct PvTable {
    moves: [[Move; MAX_PLY + 1]; MAX_PLY + 1],
    len: [usize; MAX_PLY + 1],
}

impl PvTable {
    pub fn new() -> Self { PvTable { moves: [[Move::NULL; MAX_PLY + 1]; MAX_PLY + 1], len: [0; MAX_PLY + 1] } }

    #[inline]
    pub fn clear(&mut self, ply: usize) {
        if ply <= MAX_PLY {
            self.len[ply] = 0;
        }
    }

    /// `mv` followed by the child's line becomes the line at `ply`.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        let child_len = self.len[ply + 1].min(MAX_PLY - ply);
        let (head, tail) = self.moves.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line[0] = mv;
        line[1..=child_len].copy_from_slice(&tail[0][..child_len]);
        self.len[ply] = child_len + 1;
    }

    pub fn line(&self, ply: usize) -> &[Move] { &self.moves[ply][..self.len[ply]] }
}

impl Default for PvTable {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    #[test]
    fn pv_collects_child_line() {
        let pos = Position::startpos();
        let a = pos.parse_move("e2e4").unwrap();
        let b = pos.do_move(a).parse_move("e7e5").unwrap();
        let mut pv = PvTable::new();
        pv.clear(2);
        pv.update(1, b);
        pv.update(0, a);
        assert_eq!(pv.line(0), &[a, b]);
        pv.clear(0);
        assert!(pv.line(0).is_empty());
    }

    #[test]
    fn sentinels_precede_root() {
        let mut stack = SearchStack::new();
        stack.at_mut(0).eval = 12;
        assert_eq!(stack.back(2, 2).eval, 12);
        assert!(stack.back(0, 2).mv.is_null());
    }
}
