use std::fmt;
use std::sync::Arc;

use super::attacks::{between, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use super::bitboard::Bitboard;
use super::moves::{Move, MoveFlag};
use super::types::{Color, Piece, PieceType, Square};
use super::zobrist;
use crate::eval::nnue::{self, Accumulator, FeatureUpdate};

pub const WHITE_KINGSIDE: u8 = 1;
pub const WHITE_QUEENSIDE: u8 = 2;
pub const BLACK_KINGSIDE: u8 = 4;
pub const BLACK_QUEENSIDE: u8 = 8;

/// Rights kept when a move touches a square: moving the king or a rook,
/// or capturing on a rook's home square, drops the matching rights.
const CASTLE_MASK: [u8; 64] = {
    let mut m = [15u8; 64];
    m[Square::A1.index()] = 15 & !WHITE_QUEENSIDE;
    m[Square::E1.index()] = 15 & !(WHITE_KINGSIDE | WHITE_QUEENSIDE);
    m[Square::H1.index()] = 15 & !WHITE_KINGSIDE;
    m[Square::A8.index()] = 15 & !BLACK_QUEENSIDE;
    m[Square::E8.index()] = 15 & !(BLACK_KINGSIDE | BLACK_QUEENSIDE);
    m[Square::H8.index()] = 15 & !BLACK_KINGSIDE;
    m
};

/// Additive weight of one piece in the material key; one nibble per colored
/// piece kind, kings contribute nothing.
#[inline]
const fn material_weight(piece: Piece) -> u64 {
    match piece.kind() {
        PieceType::King => 0,
        _ => 1 << (4 * piece.index()),
    }
}

const WN: u64 = material_weight(Piece::WhiteKnight);
const BN: u64 = material_weight(Piece::BlackKnight);
const WB: u64 = material_weight(Piece::WhiteBishop);
const BB: u64 = material_weight(Piece::BlackBishop);

/// Material keys where neither side can force mate.
const INSUFFICIENT_MATERIAL: [u64; 9] = [0, WN, WB, BN, BB, WN + BN, WN + BB, WB + BN, WB + BB];

/// Keys of earlier positions since the last irreversible move, most recent
/// first. Shared between parent and child positions.
#[derive(Clone, Default)]
pub struct KeyHistory {
    head: Option<Arc<KeyLink>>,
    len: u32,
}

struct KeyLink {
    key: u64,
    prev: Option<Arc<KeyLink>>,
}

impl KeyHistory {
    /// History with `len` plies of unknown keys, as imported from a FEN
    /// halfmove clock.
    pub fn with_clock(len: u32) -> Self { KeyHistory { head: None, len } }

    fn push(&mut self, key: u64) {
        let prev = self.head.take();
        self.head = Some(Arc::new(KeyLink { key, prev }));
        self.len += 1;
    }

    fn clear(&mut self) {
        self.head = None;
        self.len = 0;
    }

    /// Plies since the last pawn move or capture.
    #[inline]
    pub fn len(&self) -> u32 { self.len }

    #[inline]
    pub fn is_empty(&self) -> bool { self.len == 0 }

    pub fn contains(&self, key: u64) -> bool {
        let mut link = self.head.as_deref();
        while let Some(l) = link {
            if l.key == key {
                return true;
            }
            link = l.prev.as_deref();
        }
        false
    }
}

impl Drop for KeyHistory {
    // Unlink iteratively so long shuffling games cannot overflow the stack.
    fn drop(&mut self) {
        let mut link = self.head.take();
        while let Some(l) = link {
            match Arc::try_unwrap(l) {
                Ok(mut owned) => link = owned.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Squares and restrictions that legal move generation needs, derived from
/// the side to move's king safety.
#[derive(Clone, Debug)]
pub struct MoveMasks {
    /// Squares attacked by the opponent, computed with our king lifted so
    /// sliders see through it.
    pub attacked: Bitboard,
    /// Opponent pieces giving check.
    pub checkers: Bitboard,
    /// Destinations that resolve a single check; full when not in check,
    /// empty in double check.
    pub check_mask: Bitboard,
    /// Per square, the line a pinned piece on it may move along; full for
    /// unpinned squares.
    pub pin_masks: [Bitboard; 64],
}

impl MoveMasks {
    #[inline]
    pub fn in_check(&self) -> bool { !self.checkers.is_empty() }

    #[inline]
    pub fn double_check(&self) -> bool { self.checkers.more_than_one() }
}

/// Immutable-by-convention chess position. Making a move produces a new
/// position; the parent stays valid.
#[derive(Clone)]
pub struct Position {
    board: [Option<Piece>; 64],
    colors: [Bitboard; 2],
    pieces: [Bitboard; 12],
    side: Color,
    castling: u8,
    ep_square: Option<Square>,
    key: u64,
    material_key: u64,
    history: KeyHistory,
    fullmove: u32,
    accumulator: Accumulator,
}

impl Position {
    pub(crate) fn empty() -> Self {
        Position {
            board: [None; 64],
            colors: [Bitboard::EMPTY; 2],
            pieces: [Bitboard::EMPTY; 12],
            side: Color::White,
            castling: 0,
            ep_square: None,
            key: 0,
            material_key: 0,
            history: KeyHistory::default(),
            fullmove: 1,
            accumulator: Accumulator::new(nnue::network()),
        }
    }

    pub fn startpos() -> Self {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        let mut pos = Position::empty();
        for (file, kind) in BACK_RANK.into_iter().enumerate() {
            let file = file as u8;
            pos.put_piece(Piece::new(Color::White, kind), Square::new(file, 0));
            pos.put_piece(Piece::WhitePawn, Square::new(file, 1));
            pos.put_piece(Piece::BlackPawn, Square::new(file, 6));
            pos.put_piece(Piece::new(Color::Black, kind), Square::new(file, 7));
        }
        pos.set_castling(WHITE_KINGSIDE | WHITE_QUEENSIDE | BLACK_KINGSIDE | BLACK_QUEENSIDE);
        pos.refresh_accumulator();
        pos
    }

    // ----- construction helpers shared with FEN import -----

    pub(crate) fn put_piece(&mut self, piece: Piece, sq: Square) {
        debug_assert!(self.board[sq.index()].is_none());
        self.board[sq.index()] = Some(piece);
        self.colors[piece.color().index()] |= sq;
        self.pieces[piece.index()] |= sq;
        self.key ^= zobrist::piece_key(piece, sq);
        self.material_key += material_weight(piece);
    }

    pub(crate) fn remove_piece(&mut self, piece: Piece, sq: Square) {
        debug_assert_eq!(self.board[sq.index()], Some(piece));
        self.board[sq.index()] = None;
        self.colors[piece.color().index()] ^= sq;
        self.pieces[piece.index()] ^= sq;
        self.key ^= zobrist::piece_key(piece, sq);
        self.material_key -= material_weight(piece);
    }

    pub(crate) fn set_side(&mut self, side: Color) {
        if side != self.side {
            self.key ^= zobrist::side_key();
            self.side = side;
        }
    }

    pub(crate) fn set_castling(&mut self, rights: u8) {
        self.key ^= zobrist::castling_key(self.castling) ^ zobrist::castling_key(rights);
        self.castling = rights;
    }

    pub(crate) fn set_ep_square(&mut self, ep: Option<Square>) {
        if let Some(old) = self.ep_square {
            self.key ^= zobrist::ep_key(old);
        }
        if let Some(new) = ep {
            self.key ^= zobrist::ep_key(new);
        }
        self.ep_square = ep;
    }

    pub(crate) fn set_clocks(&mut self, halfmove: u32, fullmove: u32) {
        self.history = KeyHistory::with_clock(halfmove);
        self.fullmove = fullmove.max(1);
    }

    pub(crate) fn refresh_accumulator(&mut self) {
        let placed = Square::all().filter_map(|sq| self.board[sq.index()].map(|p| (p, sq)));
        self.accumulator = Accumulator::refresh(nnue::network(), placed);
    }

    // ----- accessors -----

    #[inline]
    pub fn side_to_move(&self) -> Color { self.side }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> { self.board[sq.index()] }

    #[inline]
    pub fn occupied(&self) -> Bitboard { self.colors[0] | self.colors[1] }

    #[inline]
    pub fn colors(&self, color: Color) -> Bitboard { self.colors[color.index()] }

    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard { self.pieces[piece.index()] }

    #[inline]
    pub fn pieces_of(&self, color: Color, kind: PieceType) -> Bitboard { self.pieces[Piece::new(color, kind).index()] }

    /// Both colors' pieces of one kind.
    #[inline]
    pub fn kind_bb(&self, kind: PieceType) -> Bitboard {
        self.pieces_of(Color::White, kind) | self.pieces_of(Color::Black, kind)
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square { self.pieces_of(color, PieceType::King).lsb() }

    #[inline]
    pub fn castling_rights(&self) -> u8 { self.castling }

    #[inline]
    pub fn ep_square(&self) -> Option<Square> { self.ep_square }

    #[inline]
    pub fn key(&self) -> u64 { self.key }

    #[inline]
    pub fn material_key(&self) -> u64 { self.material_key }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 { self.history.len() }

    #[inline]
    pub fn fullmove_number(&self) -> u32 { self.fullmove }

    #[inline]
    pub fn accumulator(&self) -> &Accumulator { &self.accumulator }

    /// Recomputes the key from scratch; used to check the incremental one.
    pub fn compute_key(&self) -> u64 {
        let mut key = 0u64;
        for sq in Square::all() {
            if let Some(p) = self.board[sq.index()] {
                key ^= zobrist::piece_key(p, sq);
            }
        }
        if self.side == Color::Black {
            key ^= zobrist::side_key();
        }
        if let Some(ep) = self.ep_square {
            key ^= zobrist::ep_key(ep);
        }
        key ^ zobrist::castling_key(self.castling)
    }

    /// Recomputes the material key from scratch.
    pub fn compute_material_key(&self) -> u64 { self.board.iter().flatten().map(|&p| material_weight(p)).sum() }

    // ----- attacks -----

    /// Pieces of both colors attacking `sq` given occupancy `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let diagonal = self.kind_bb(PieceType::Bishop) | self.kind_bb(PieceType::Queen);
        let straight = self.kind_bb(PieceType::Rook) | self.kind_bb(PieceType::Queen);
        (pawn_attacks(Color::White, sq) & self.pieces(Piece::BlackPawn))
            | (pawn_attacks(Color::Black, sq) & self.pieces(Piece::WhitePawn))
            | (knight_attacks(sq) & self.kind_bb(PieceType::Knight))
            | (king_attacks(sq) & self.kind_bb(PieceType::King))
            | (bishop_attacks(sq, occupied) & diagonal)
            | (rook_attacks(sq, occupied) & straight)
    }

    /// Every square `by` attacks given occupancy `occupied`.
    pub fn attacked_squares(&self, by: Color, occupied: Bitboard) -> Bitboard {
        let pawns = self.pieces_of(by, PieceType::Pawn).0;
        let not_a = !Bitboard::FILE_A.0;
        let not_h = !Bitboard::FILE_H.0;
        let mut attacked = match by {
            Color::White => Bitboard((pawns << 7) & not_h | (pawns << 9) & not_a),
            Color::Black => Bitboard((pawns >> 7) & not_a | (pawns >> 9) & not_h),
        };
        for sq in self.pieces_of(by, PieceType::Knight) {
            attacked |= knight_attacks(sq);
        }
        let queens = self.pieces_of(by, PieceType::Queen);
        for sq in self.pieces_of(by, PieceType::Bishop) | queens {
            attacked |= bishop_attacks(sq, occupied);
        }
        for sq in self.pieces_of(by, PieceType::Rook) | queens {
            attacked |= rook_attacks(sq, occupied);
        }
        attacked | king_attacks(self.king_square(by))
    }

    #[inline]
    pub fn checkers(&self) -> Bitboard {
        let king = self.king_square(self.side);
        self.attackers_to(king, self.occupied()) & self.colors(!self.side)
    }

    #[inline]
    pub fn in_check(&self) -> bool { !self.checkers().is_empty() }

    pub fn masks(&self) -> MoveMasks {
        let us = self.side;
        let them = !us;
        let king = self.king_square(us);
        let occupied = self.occupied();

        let attacked = self.attacked_squares(them, occupied.without(king));
        let checkers = self.attackers_to(king, occupied) & self.colors(them);
        let check_mask = if checkers.is_empty() {
            Bitboard::FULL
        } else if checkers.more_than_one() {
            Bitboard::EMPTY
        } else {
            between(king, checkers.lsb()) | checkers
        };

        let mut pin_masks = [Bitboard::FULL; 64];
        let ours = self.colors(us);
        let queens = self.pieces_of(them, PieceType::Queen);
        let lines: [(fn(Square, Bitboard) -> Bitboard, Bitboard); 2] = [
            (rook_attacks, self.pieces_of(them, PieceType::Rook) | queens),
            (bishop_attacks, self.pieces_of(them, PieceType::Bishop) | queens),
        ];
        for (attacks, sliders) in lines {
            let direct = attacks(king, occupied);
            let xray = attacks(king, occupied & !direct);
            for pinner in xray & sliders & !direct {
                let line = between(king, pinner);
                let blockers = line & occupied;
                if !blockers.more_than_one() && !(blockers & ours).is_empty() {
                    pin_masks[blockers.lsb().index()] = line | pinner;
                }
            }
        }

        MoveMasks { attacked, checkers, check_mask, pin_masks }
    }

    /// Whether `color` has anything besides pawns and king.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let pawns_and_king = self.pieces_of(color, PieceType::Pawn) | self.pieces_of(color, PieceType::King);
        !(self.colors(color) & !pawns_and_king).is_empty()
    }

    // ----- draws -----

    #[inline]
    pub fn is_material_draw(&self) -> bool { INSUFFICIENT_MATERIAL.contains(&self.material_key) }

    #[inline]
    pub fn is_repetition(&self) -> bool { self.history.contains(self.key) }

    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool { self.history.len() > 99 }

    #[inline]
    pub fn is_draw(&self) -> bool { self.is_material_draw() || self.is_fifty_move_draw() || self.is_repetition() }

    // ----- making moves -----

    /// Position after `mv`, which must be legal here.
    pub fn do_move(&self, mv: Move) -> Position {
        let mut next = self.clone();
        next.make(mv);
        next
    }

    /// Position with the turn passed. Only valid when not in check.
    pub fn do_null_move(&self) -> Position {
        let mut next = self.clone();
        next.set_ep_square(None);
        next.history.clear();
        next.side = !self.side;
        next.key ^= zobrist::side_key();
        next
    }

    fn make(&mut self, mv: Move) {
        let us = self.side;
        let from = mv.from();
        let to = mv.to();
        let piece = mv.piece();
        let parent_key = self.key;
        let mut changes = FeatureUpdate::default();

        self.set_ep_square(None);

        if mv.is_capture() {
            let target = match mv.flag() {
                MoveFlag::EnPassant => to.offset(-us.forward()),
                _ => to,
            };
            if let Some(captured) = self.board[target.index()] {
                self.remove_piece(captured, target);
                changes.remove(captured, target);
            }
        }

        self.remove_piece(piece, from);
        changes.remove(piece, from);
        let placed = mv.promotion().map_or(piece, |kind| Piece::new(us, kind));
        self.put_piece(placed, to);
        changes.add(placed, to);

        match mv.flag() {
            MoveFlag::DoublePush => self.set_ep_square(Some(from.offset(us.forward()))),
            MoveFlag::Castle => {
                let rank = from.rank();
                let (rook_from, rook_to) = if to.file() == 6 {
                    (Square::new(7, rank), Square::new(5, rank))
                } else {
                    (Square::new(0, rank), Square::new(3, rank))
                };
                let rook = Piece::new(us, PieceType::Rook);
                self.remove_piece(rook, rook_from);
                self.put_piece(rook, rook_to);
                changes.remove(rook, rook_from);
                changes.add(rook, rook_to);
            }
            _ => {}
        }

        let rights = self.castling & CASTLE_MASK[from.index()] & CASTLE_MASK[to.index()];
        if rights != self.castling {
            self.set_castling(rights);
        }

        if piece.kind() == PieceType::Pawn || mv.is_capture() {
            self.history.clear();
        } else {
            self.history.push(parent_key);
        }

        if us == Color::Black {
            self.fullmove += 1;
        }
        self.side = !us;
        self.key ^= zobrist::side_key();
        self.accumulator.update(nnue::network(), &changes);
    }
}

impl Default for Position {
    fn default() -> Self { Position::startpos() }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                let c = self.board[Square::new(file, rank).index()].map_or('.', Piece::to_char);
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        writeln!(f)?;
        writeln!(f, "FEN: {}", self.to_fen())?;
        write!(f, "Key: {:016x}", self.key)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Position({})", self.to_fen()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_keys_match_recomputation() {
        let pos = Position::startpos();
        assert_eq!(pos.key(), pos.compute_key());
        assert_eq!(pos.material_key(), pos.compute_material_key());
        assert!(!pos.in_check());
        assert!(!pos.is_material_draw());
        assert_eq!(pos.occupied().popcount(), 32);
    }

    #[test]
    fn insufficient_material_keys() {
        assert!(INSUFFICIENT_MATERIAL.contains(&0));
        assert!(INSUFFICIENT_MATERIAL.contains(&(WB + BN)));
        assert!(!INSUFFICIENT_MATERIAL.contains(&(WN + WN)));
        assert!(!INSUFFICIENT_MATERIAL.contains(&material_weight(Piece::WhitePawn)));
    }

    #[test]
    fn history_shares_links_between_children() {
        let mut a = KeyHistory::default();
        a.push(1);
        a.push(2);
        let mut b = a.clone();
        b.push(3);
        assert!(b.contains(1) && b.contains(3));
        assert!(!a.contains(3));
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 3);
        b.clear();
        assert!(b.is_empty());
        assert!(a.contains(2));
    }
}
