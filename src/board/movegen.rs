//! Legal move generation.
//!
//! Moves are produced in two passes, tacticals (captures, en passant and
//! every promotion) and quiets (everything else), so the search can try the
//! first group before paying for the second. Legality comes from the check
//! and pin masks: no move is ever made and then tested.

use super::attacks::{between, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
use super::bitboard::Bitboard;
use super::moves::{Move, MoveFlag, MoveList};
use super::position::{MoveMasks, Position, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE, WHITE_QUEENSIDE};
use super::types::{Color, Piece, PieceType, Square};

const PROMOTIONS: [PieceType; 4] = [PieceType::Queen, PieceType::Knight, PieceType::Rook, PieceType::Bishop];

#[inline]
fn push_promotions(list: &mut MoveList, from: Square, to: Square, pawn: Piece, capture: bool) {
    for kind in PROMOTIONS {
        list.push(Move::new(from, to, pawn, capture, MoveFlag::promotion(kind)));
    }
}

#[inline]
fn piece_attacks(kind: PieceType, sq: Square, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceType::Knight => knight_attacks(sq),
        PieceType::Bishop => bishop_attacks(sq, occupied),
        PieceType::Rook => rook_attacks(sq, occupied),
        PieceType::Queen => queen_attacks(sq, occupied),
        PieceType::King => king_attacks(sq),
        PieceType::Pawn => Bitboard::EMPTY,
    }
}

/// Legal captures, en passant and promotions.
pub fn gen_tacticals(pos: &Position, masks: &MoveMasks, list: &mut MoveList) {
    let us = pos.side_to_move();
    let them = !us;
    let enemies = pos.colors(them);
    let king_sq = pos.king_square(us);
    let king = Piece::new(us, PieceType::King);

    for to in king_attacks(king_sq) & enemies & !masks.attacked {
        list.push(Move::new(king_sq, to, king, true, MoveFlag::None));
    }
    if masks.double_check() {
        return;
    }

    let occupied = pos.occupied();
    let empty = !occupied;
    let promo_rank = Bitboard::promotion_rank(us);
    let pawn = Piece::new(us, PieceType::Pawn);

    for from in pos.pieces(pawn) {
        let allowed = masks.pin_masks[from.index()] & masks.check_mask;

        let push = from.offset(us.forward());
        if promo_rank.contains(push) && empty.contains(push) && allowed.contains(push) {
            push_promotions(list, from, push, pawn, false);
        }

        for to in pawn_attacks(us, from) & enemies & allowed {
            if promo_rank.contains(to) {
                push_promotions(list, from, to, pawn, true);
            } else {
                list.push(Move::new(from, to, pawn, true, MoveFlag::None));
            }
        }

        if let Some(ep) = pos.ep_square() {
            if pawn_attacks(us, from).contains(ep) && ep_is_legal(pos, masks, from, ep) {
                list.push(Move::new(from, ep, pawn, true, MoveFlag::EnPassant));
            }
        }
    }

    for kind in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
        let piece = Piece::new(us, kind);
        for from in pos.pieces(piece) {
            let targets = piece_attacks(kind, from, occupied) & enemies & masks.pin_masks[from.index()] & masks.check_mask;
            for to in targets {
                list.push(Move::new(from, to, piece, true, MoveFlag::None));
            }
        }
    }
}

/// En passant needs more than the masks: the captured pawn leaves the board
/// too, which can open a rank or diagonal onto our king.
fn ep_is_legal(pos: &Position, masks: &MoveMasks, from: Square, ep: Square) -> bool {
    let us = pos.side_to_move();
    let them = !us;
    let captured = ep.offset(-us.forward());

    if !masks.pin_masks[from.index()].contains(ep) {
        return false;
    }
    if !masks.check_mask.contains(ep) && !masks.check_mask.contains(captured) {
        return false;
    }

    let king = pos.king_square(us);
    let occupied = pos.occupied();
    let queens = pos.pieces_of(them, PieceType::Queen);

    // Both pawns leave the king's rank at once: exactly those two may stand
    // between the king and a rook or queen on it.
    if king.rank() == from.rank() {
        let sliders = (pos.pieces_of(them, PieceType::Rook) | queens) & Bitboard::rank(king.rank());
        let pair = Bitboard::from_square(from) | captured;
        for slider in sliders {
            if between(king, slider) & occupied == pair {
                return false;
            }
        }
    }

    // The captured pawn alone may have been shielding a diagonal.
    let after = (occupied ^ from ^ captured) | ep;
    let diagonal = pos.pieces_of(them, PieceType::Bishop) | queens;
    (bishop_attacks(king, after) & diagonal & !Bitboard::from_square(captured)).is_empty()
}

/// Legal non-capturing, non-promoting moves, castling included.
pub fn gen_quiets(pos: &Position, masks: &MoveMasks, list: &mut MoveList) {
    let us = pos.side_to_move();
    let occupied = pos.occupied();
    let empty = !occupied;
    let king_sq = pos.king_square(us);
    let king = Piece::new(us, PieceType::King);

    for to in king_attacks(king_sq) & empty & !masks.attacked {
        list.push(Move::new(king_sq, to, king, false, MoveFlag::None));
    }
    if masks.double_check() {
        return;
    }

    if !masks.in_check() {
        gen_castling(pos, masks, list);
    }

    let promo_rank = Bitboard::promotion_rank(us);
    let double_rank = Bitboard::double_push_rank(us);
    let pawn = Piece::new(us, PieceType::Pawn);
    for from in pos.pieces(pawn) {
        let allowed = masks.pin_masks[from.index()] & masks.check_mask;
        let push = from.offset(us.forward());
        if !empty.contains(push) || promo_rank.contains(push) {
            continue;
        }
        if allowed.contains(push) {
            list.push(Move::new(from, push, pawn, false, MoveFlag::None));
        }
        let double = Bitboard::from_square(push).forward(us) & double_rank & empty & allowed;
        if !double.is_empty() {
            list.push(Move::new(from, double.lsb(), pawn, false, MoveFlag::DoublePush));
        }
    }

    for kind in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
        let piece = Piece::new(us, kind);
        for from in pos.pieces(piece) {
            let targets = piece_attacks(kind, from, occupied) & empty & masks.pin_masks[from.index()] & masks.check_mask;
            for to in targets {
                list.push(Move::new(from, to, piece, false, MoveFlag::None));
            }
        }
    }
}

struct CastleSide {
    right: u8,
    king_from: Square,
    king_to: Square,
    must_be_safe: [Square; 3],
    must_be_empty: &'static [Square],
}

const CASTLES: [CastleSide; 4] = [
    CastleSide {
        right: WHITE_KINGSIDE,
        king_from: Square::E1,
        king_to: Square::G1,
        must_be_safe: [Square::E1, Square::F1, Square::G1],
        must_be_empty: &[Square::F1, Square::G1],
    },
    CastleSide {
        right: WHITE_QUEENSIDE,
        king_from: Square::E1,
        king_to: Square::C1,
        must_be_safe: [Square::E1, Square::D1, Square::C1],
        must_be_empty: &[Square::D1, Square::C1, Square::B1],
    },
    CastleSide {
        right: BLACK_KINGSIDE,
        king_from: Square::E8,
        king_to: Square::G8,
        must_be_safe: [Square::E8, Square::F8, Square::G8],
        must_be_empty: &[Square::F8, Square::G8],
    },
    CastleSide {
        right: BLACK_QUEENSIDE,
        king_from: Square::E8,
        king_to: Square::C8,
        must_be_safe: [Square::E8, Square::D8, Square::C8],
        must_be_empty: &[Square::D8, Square::C8, Square::B8],
    },
];

fn gen_castling(pos: &Position, masks: &MoveMasks, list: &mut MoveList) {
    let us = pos.side_to_move();
    let own_rights = match us {
        Color::White => WHITE_KINGSIDE | WHITE_QUEENSIDE,
        Color::Black => BLACK_KINGSIDE | BLACK_QUEENSIDE,
    };
    let rights = pos.castling_rights() & own_rights;
    if rights == 0 {
        return;
    }
    let occupied = pos.occupied();
    let king = Piece::new(us, PieceType::King);
    for side in CASTLES.iter().filter(|c| rights & c.right != 0) {
        let unsafe_path = side.must_be_safe.iter().any(|&sq| masks.attacked.contains(sq));
        let blocked = side.must_be_empty.iter().any(|&sq| occupied.contains(sq));
        if !unsafe_path && !blocked {
            list.push(Move::new(side.king_from, side.king_to, king, false, MoveFlag::Castle));
        }
    }
}

/// Every legal move, tacticals first.
pub fn legal_moves(pos: &Position) -> MoveList {
    let masks = pos.masks();
    let mut list = MoveList::new();
    gen_tacticals(pos, &masks, &mut list);
    gen_quiets(pos, &masks, &mut list);
    list
}

/// Whether a move from an untrusted source (hash table, killer slot,
/// counter-move table) is legal in this position.
pub fn is_legal(pos: &Position, masks: &MoveMasks, mv: Move) -> bool {
    if !mv.is_well_formed() {
        return false;
    }
    let us = pos.side_to_move();
    let piece = mv.piece();
    let (from, to) = (mv.from(), mv.to());
    if piece.color() != us || pos.piece_at(from) != Some(piece) {
        return false;
    }
    if pos.colors(us).contains(to) {
        return false;
    }

    let kind = piece.kind();
    if mv.flag() != MoveFlag::None {
        // Special moves are rare enough to check against the generator.
        let mut list = MoveList::new();
        if mv.is_tactical() {
            gen_tacticals(pos, masks, &mut list);
        } else {
            gen_quiets(pos, masks, &mut list);
        }
        return list.contains(&mv);
    }

    if mv.is_capture() != pos.colors(!us).contains(to) {
        return false;
    }
    if kind == PieceType::King {
        return king_attacks(from).contains(to) && !masks.attacked.contains(to);
    }
    if masks.double_check() {
        return false;
    }
    let allowed = masks.pin_masks[from.index()] & masks.check_mask;
    if !allowed.contains(to) {
        return false;
    }
    match kind {
        PieceType::Pawn => {
            if Bitboard::promotion_rank(us).contains(to) {
                return false;
            }
            if mv.is_capture() {
                pawn_attacks(us, from).contains(to)
            } else {
                to == from.offset(us.forward())
            }
        }
        _ => piece_attacks(kind, from, pos.occupied()).contains(to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_has_twenty_moves() {
        let pos = Position::startpos();
        let moves = legal_moves(&pos);
        assert_eq!(moves.len(), 20);
        assert!(moves.iter().all(|m| !m.is_tactical()));
    }

    #[test]
    fn is_legal_agrees_with_generator() {
        let pos = Position::startpos();
        let masks = pos.masks();
        for &mv in legal_moves(&pos).iter() {
            assert!(is_legal(&pos, &masks, mv), "{mv} should be legal");
        }
        let sideways = Move::new(Square::E2, Square::E5, Piece::WhitePawn, false, MoveFlag::None);
        assert!(!is_legal(&pos, &masks, sideways));
        let wrong_side = Move::new(Square::E7, Square::E6, Piece::BlackPawn, false, MoveFlag::None);
        assert!(!is_legal(&pos, &masks, wrong_side));
        assert!(!is_legal(&pos, &masks, Move::NULL));
    }
}
