use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use super::types::{Color, Square};

/// A set of squares, bit `i` standing for square index `i`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(pub u64);

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);
    pub const FULL: Bitboard = Bitboard(!0);

    pub const FILE_A: Bitboard = Bitboard(0x0101_0101_0101_0101);
    pub const FILE_H: Bitboard = Bitboard(0x8080_8080_8080_8080);
    pub const RANK_1: Bitboard = Bitboard(0x0000_0000_0000_00FF);
    pub const RANK_2: Bitboard = Bitboard(0x0000_0000_0000_FF00);
    pub const RANK_4: Bitboard = Bitboard(0x0000_0000_FF00_0000);
    pub const RANK_5: Bitboard = Bitboard(0x0000_00FF_0000_0000);
    pub const RANK_7: Bitboard = Bitboard(0x00FF_0000_0000_0000);
    pub const RANK_8: Bitboard = Bitboard(0xFF00_0000_0000_0000);

    #[inline]
    pub const fn from_square(sq: Square) -> Bitboard { Bitboard(1u64 << sq.index()) }

    #[inline]
    pub const fn file(file: u8) -> Bitboard { Bitboard(Self::FILE_A.0 << file) }

    #[inline]
    pub const fn rank(rank: u8) -> Bitboard { Bitboard(Self::RANK_1.0 << (rank * 8)) }

    /// Rank on which pawns of `color` promote.
    #[inline]
    pub const fn promotion_rank(color: Color) -> Bitboard {
        match color {
            Color::White => Self::RANK_8,
            Color::Black => Self::RANK_1,
        }
    }

    /// Rank a double push of `color` lands on.
    #[inline]
    pub const fn double_push_rank(color: Color) -> Bitboard {
        match color {
            Color::White => Self::RANK_4,
            Color::Black => Self::RANK_5,
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool { self.0 == 0 }

    #[inline]
    pub const fn popcount(self) -> u32 { self.0.count_ones() }

    #[inline]
    pub const fn more_than_one(self) -> bool { self.0 & self.0.wrapping_sub(1) != 0 }

    #[inline]
    pub const fn contains(self, sq: Square) -> bool { self.0 & (1u64 << sq.index()) != 0 }

    /// Lowest set square. Must not be called on an empty set.
    #[inline]
    pub const fn lsb(self) -> Square {
        debug_assert!(self.0 != 0);
        Square::from_index(self.0.trailing_zeros() as u8)
    }

    /// Highest set square. Must not be called on an empty set.
    #[inline]
    pub const fn msb(self) -> Square {
        debug_assert!(self.0 != 0);
        Square::from_index(63 - self.0.leading_zeros() as u8)
    }

    #[inline]
    pub fn pop_lsb(&mut self) -> Square {
        let sq = self.lsb();
        self.0 &= self.0 - 1;
        sq
    }

    #[inline]
    pub const fn with(self, sq: Square) -> Bitboard { Bitboard(self.0 | 1u64 << sq.index()) }

    #[inline]
    pub const fn without(self, sq: Square) -> Bitboard { Bitboard(self.0 & !(1u64 << sq.index())) }

    /// Every square shifted one rank towards `color`'s promotion rank.
    #[inline]
    pub const fn forward(self, color: Color) -> Bitboard {
        match color {
            Color::White => Bitboard(self.0 << 8),
            Color::Black => Bitboard(self.0 >> 8),
        }
    }

    #[inline]
    pub fn iter(self) -> BitboardIter { BitboardIter(self) }
}

pub struct BitboardIter(Bitboard);

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Square> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.pop_lsb())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.popcount() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;

    #[inline]
    fn into_iter(self) -> BitboardIter { BitboardIter(self) }
}

impl From<Square> for Bitboard {
    #[inline]
    fn from(sq: Square) -> Bitboard { Bitboard::from_square(sq) }
}

macro_rules! bit_ops {
    ($($trait:ident, $fn:ident, $assign_trait:ident, $assign_fn:ident, $op:tt;)*) => {$(
        impl $trait for Bitboard {
            type Output = Bitboard;
            #[inline]
            fn $fn(self, rhs: Bitboard) -> Bitboard { Bitboard(self.0 $op rhs.0) }
        }

        impl $trait<Square> for Bitboard {
            type Output = Bitboard;
            #[inline]
            fn $fn(self, rhs: Square) -> Bitboard { Bitboard(self.0 $op (1u64 << rhs.index())) }
        }

        impl $assign_trait for Bitboard {
            #[inline]
            fn $assign_fn(&mut self, rhs: Bitboard) { self.0 = self.0 $op rhs.0; }
        }

        impl $assign_trait<Square> for Bitboard {
            #[inline]
            fn $assign_fn(&mut self, rhs: Square) { self.0 = self.0 $op (1u64 << rhs.index()); }
        }
    )*};
}

bit_ops! {
    BitAnd, bitand, BitAndAssign, bitand_assign, &;
    BitOr, bitor, BitOrAssign, bitor_assign, |;
    BitXor, bitxor, BitXorAssign, bitxor_assign, ^;
}

impl Not for Bitboard {
    type Output = Bitboard;

    #[inline]
    fn not(self) -> Bitboard { Bitboard(!self.0) }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitboard({:#018x})", self.0)?;
        for rank in (0..8).rev() {
            for file in 0..8 {
                let mark = if self.contains(Square::new(file, rank)) { 'X' } else { '.' };
                write!(f, " {mark}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_ascending_order() {
        let bb = Bitboard::EMPTY | Square::H8 | Square::A1 | Square::E4;
        let squares: Vec<Square> = bb.into_iter().collect();
        assert_eq!(squares, vec![Square::A1, Square::E4, Square::H8]);
        assert_eq!(bb.lsb(), Square::A1);
        assert_eq!(bb.msb(), Square::H8);
        assert!(bb.more_than_one());
        assert!(!Bitboard::from_square(Square::C3).more_than_one());
    }

    #[test]
    fn forward_shift_drops_edge_ranks() {
        assert_eq!(Bitboard::RANK_8.forward(Color::White), Bitboard::EMPTY);
        assert_eq!(Bitboard::RANK_2.forward(Color::White), Bitboard::rank(2));
        assert_eq!(Bitboard::RANK_7.forward(Color::Black), Bitboard::rank(5));
    }
}
