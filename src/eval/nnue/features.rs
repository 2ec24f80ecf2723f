use crate::board::types::{Color, Piece, Square};

/// Input width: 12 colored piece kinds over 64 squares.
pub const INPUTS: usize = 768;

/// Input index of `piece` on `sq` seen from `perspective`. Pieces are split
/// into "ours" and "theirs" and squares are mirrored for Black, so both
/// perspectives share one set of weights.
#[inline]
pub fn feature_index(perspective: Color, piece: Piece, sq: Square) -> usize {
    let side = (piece.color() != perspective) as usize;
    64 * (piece.kind().index() + 6 * side) + sq.relative(perspective).index()
}

/// Pieces placed and lifted by one move. A move touches at most two of each
/// (castling moves king and rook, en passant and capture-promotions lift two).
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureUpdate {
    added: [Option<(Piece, Square)>; 2],
    removed: [Option<(Piece, Square)>; 2],
}

impl FeatureUpdate {
    #[inline]
    pub fn add(&mut self, piece: Piece, sq: Square) { push(&mut self.added, (piece, sq)); }

    #[inline]
    pub fn remove(&mut self, piece: Piece, sq: Square) { push(&mut self.removed, (piece, sq)); }

    pub fn added(&self) -> impl Iterator<Item = (Piece, Square)> + '_ { self.added.iter().flatten().copied() }

    pub fn removed(&self) -> impl Iterator<Item = (Piece, Square)> + '_ { self.removed.iter().flatten().copied() }
}

#[inline]
fn push(slots: &mut [Option<(Piece, Square)>; 2], entry: (Piece, Square)) {
    match slots.iter_mut().find(|s| s.is_none()) {
        Some(slot) => *slot = Some(entry),
        None => debug_assert!(false, "more than two feature changes in one move"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspectives_mirror() {
        let white = feature_index(Color::White, Piece::WhiteKnight, Square::G1);
        let black = feature_index(Color::Black, Piece::BlackKnight, Square::G8);
        assert_eq!(white, black);
        assert!(feature_index(Color::White, Piece::BlackKing, Square::H8) < INPUTS);
        assert_eq!(feature_index(Color::White, Piece::WhitePawn, Square::A1), 0);
    }
}
