use rayon::prelude::*;

use crate::board::{legal_moves, Move, Position};

/// Count leaf nodes of the legal move tree to `depth`.
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves.iter().map(|&mv| perft(&pos.do_move(mv), depth - 1)).sum()
}

/// Per-root-move node counts, in generation order.
pub fn perft_divide(pos: &Position, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    legal_moves(pos).iter().map(|&mv| (mv, perft(&pos.do_move(mv), depth - 1))).collect()
}

/// Same count as [`perft`], with root moves split across the current rayon pool.
pub fn perft_parallel(pos: &Position, depth: u32) -> u64 {
    if depth <= 1 {
        return perft(pos, depth);
    }
    let moves: Vec<Move> = legal_moves(pos).iter().copied().collect();
    moves.par_iter().map(|&mv| perft(&pos.do_move(mv), depth - 1)).sum()
}
