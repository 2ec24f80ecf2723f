use std::fmt;
use std::ops::Deref;

use super::types::{Piece, PieceType, Square};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MoveFlag {
    None = 0,
    Castle = 1,
    DoublePush = 2,
    EnPassant = 3,
    PromoteKnight = 4,
    PromoteBishop = 5,
    PromoteRook = 6,
    PromoteQueen = 7,
}

impl MoveFlag {
    const ALL: [MoveFlag; 8] = [
        MoveFlag::None,
        MoveFlag::Castle,
        MoveFlag::DoublePush,
        MoveFlag::EnPassant,
        MoveFlag::PromoteKnight,
        MoveFlag::PromoteBishop,
        MoveFlag::PromoteRook,
        MoveFlag::PromoteQueen,
    ];

    pub const fn promotion(kind: PieceType) -> MoveFlag {
        match kind {
            PieceType::Knight => MoveFlag::PromoteKnight,
            PieceType::Bishop => MoveFlag::PromoteBishop,
            PieceType::Rook => MoveFlag::PromoteRook,
            _ => MoveFlag::PromoteQueen,
        }
    }
}

const FROM_SHIFT: u32 = 0;
const TO_SHIFT: u32 = 6;
const PIECE_SHIFT: u32 = 12;
const CAPTURE_SHIFT: u32 = 16;
const FLAG_SHIFT: u32 = 17;

/// Number of meaningful bits in a packed move.
pub const MOVE_BITS: u32 = 20;

/// A move packed into 20 bits: from (6), to (6), moving piece (4),
/// capture (1), flag (3). The all-zero word is the null move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move(u32);

impl Move {
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square, piece: Piece, capture: bool, flag: MoveFlag) -> Move {
        Move(
            (from.index() as u32) << FROM_SHIFT
                | (to.index() as u32) << TO_SHIFT
                | (piece as u32) << PIECE_SHIFT
                | (capture as u32) << CAPTURE_SHIFT
                | (flag as u32) << FLAG_SHIFT,
        )
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Move { Move(raw & ((1 << MOVE_BITS) - 1)) }

    #[inline]
    pub const fn raw(self) -> u32 { self.0 }

    #[inline]
    pub const fn is_null(self) -> bool { self.0 == 0 }

    #[inline]
    pub const fn from(self) -> Square { Square::from_index((self.0 >> FROM_SHIFT & 63) as u8) }

    #[inline]
    pub const fn to(self) -> Square { Square::from_index((self.0 >> TO_SHIFT & 63) as u8) }

    /// Combined from/to index in `0..4096`, used by butterfly tables.
    #[inline]
    pub const fn from_to(self) -> usize { (self.0 & 0xFFF) as usize }

    #[inline]
    pub const fn piece_bits(self) -> usize { (self.0 >> PIECE_SHIFT & 15) as usize }

    /// Moving piece. Only meaningful for moves that came out of move generation
    /// or passed [`Move::is_well_formed`].
    #[inline]
    pub fn piece(self) -> Piece { Piece::ALL[self.piece_bits().min(11)] }

    #[inline]
    pub const fn is_capture(self) -> bool { self.0 >> CAPTURE_SHIFT & 1 != 0 }

    #[inline]
    pub const fn flag(self) -> MoveFlag { MoveFlag::ALL[(self.0 >> FLAG_SHIFT & 7) as usize] }

    #[inline]
    pub const fn is_promotion(self) -> bool { self.0 >> FLAG_SHIFT & 7 >= MoveFlag::PromoteKnight as u32 }

    pub const fn promotion(self) -> Option<PieceType> {
        match self.flag() {
            MoveFlag::PromoteKnight => Some(PieceType::Knight),
            MoveFlag::PromoteBishop => Some(PieceType::Bishop),
            MoveFlag::PromoteRook => Some(PieceType::Rook),
            MoveFlag::PromoteQueen => Some(PieceType::Queen),
            _ => None,
        }
    }

    /// Captures and promotions.
    #[inline]
    pub const fn is_tactical(self) -> bool { self.is_capture() || self.is_promotion() }

    /// Structural sanity for moves decoded from untrusted bits (e.g. the
    /// transposition table): valid piece, distinct squares, flag consistent
    /// with the moving piece.
    pub fn is_well_formed(self) -> bool {
        if self.is_null() || self.piece_bits() > 11 || self.from() == self.to() {
            return false;
        }
        let kind = self.piece().kind();
        match self.flag() {
            MoveFlag::None => true,
            MoveFlag::Castle => kind == PieceType::King && !self.is_capture(),
            MoveFlag::DoublePush => kind == PieceType::Pawn && !self.is_capture(),
            MoveFlag::EnPassant => kind == PieceType::Pawn && self.is_capture(),
            _ => kind == PieceType::Pawn,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(kind) = self.promotion() {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(self, f) }
}

/// Upper bound on legal moves in any reachable position.
pub const MAX_MOVES: usize = 256;

/// Fixed-capacity move buffer.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    #[inline]
    pub fn new() -> Self { MoveList { moves: [Move::NULL; MAX_MOVES], len: 0 } }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn clear(&mut self) { self.len = 0; }

    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) { self.moves.swap(a, b); }
}

impl Default for MoveList {
    fn default() -> Self { Self::new() }
}

impl Deref for MoveList {
    type Target = [Move];

    #[inline]
    fn deref(&self) -> &[Move] { &self.moves[..self.len] }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl fmt::Debug for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_list().entries(self.iter()).finish() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::Color;

    #[test]
    fn packs_fields() {
        let mv = Move::new(Square::E7, Square::D8, Piece::new(Color::White, PieceType::Pawn), true, MoveFlag::PromoteQueen);
        assert_eq!(mv.from(), Square::E7);
        assert_eq!(mv.to(), Square::D8);
        assert_eq!(mv.piece(), Piece::WhitePawn);
        assert!(mv.is_capture());
        assert_eq!(mv.promotion(), Some(PieceType::Queen));
        assert!(mv.is_tactical());
        assert!(mv.is_well_formed());
        assert_eq!(mv.to_string(), "e7d8q");
        assert_eq!(Move::from_raw(mv.raw()), mv);
        assert!(mv.raw() < 1 << MOVE_BITS);
    }

    #[test]
    fn null_and_garbage() {
        assert_eq!(Move::NULL.to_string(), "0000");
        assert!(!Move::NULL.is_well_formed());
        let bad_piece = Move::from_raw(0xE << PIECE_SHIFT | 1 << TO_SHIFT);
        assert!(!bad_piece.is_well_formed());
        let knight_castle = Move::new(Square::G1, Square::F3, Piece::WhiteKnight, false, MoveFlag::Castle);
        assert!(!knight_castle.is_well_formed());
    }
}
