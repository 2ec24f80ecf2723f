//! Lone-king endings: drive the bare king to a mating corner.

use crate::board::{Bitboard, Color, PieceType, Position, Square};
use crate::search::score::WIN_BOUND;

const DARK_SQUARES: Bitboard = Bitboard(0xAA55_AA55_AA55_AA55);
const DARK_CORNERS: [Square; 2] = [Square::A1, Square::H8];
const LIGHT_CORNERS: [Square; 2] = [Square::A8, Square::H1];
const ALL_CORNERS: [Square; 4] = [Square::A1, Square::H8, Square::A8, Square::H1];

fn distance(a: Square, b: Square) -> i32 {
    (a.rank() as i32 - b.rank() as i32).abs() + (a.file() as i32 - b.file() as i32).abs()
}

/// Score for positions where one side has only its king and the other has
/// at least one piece. `None` everywhere else.
pub fn evaluate(pos: &Position) -> Option<i32> {
    let weak = [Color::White, Color::Black].into_iter().find(|&c| pos.colors(c).popcount() == 1)?;
    let strong = !weak;
    if !pos.has_non_pawn_material(strong) {
        return None;
    }

    let count = |kind| pos.pieces_of(strong, kind).popcount() as i32;
    let heavy = count(PieceType::Rook) + count(PieceType::Queen) > 0;
    let mut v = if heavy { WIN_BOUND } else { 0 };
    for kind in [PieceType::Pawn, PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
        v += count(kind) * kind.value();
    }
    for sq in pos.pieces_of(strong, PieceType::Pawn) {
        let rank = sq.relative(strong).rank() as i32;
        v += 6 * rank * rank;
    }

    let bishops = pos.pieces_of(strong, PieceType::Bishop);
    let corners: &[Square] = if bishops.is_empty() {
        &ALL_CORNERS
    } else if !(bishops & DARK_SQUARES).is_empty() {
        &DARK_CORNERS
    } else {
        &LIGHT_CORNERS
    };
    let weak_king = pos.king_square(weak);
    let king_distance = distance(pos.king_square(strong), weak_king);
    let corner_distance = corners.iter().map(|&c| distance(weak_king, c)).min().unwrap_or(0);
    v += 3 * (14 - king_distance) + 2 * (6 - corner_distance);

    Some(if pos.side_to_move() == strong { v } else { -v })
}
