use crate::board::types::{Color, Piece, Square};

use super::features::{feature_index, FeatureUpdate};
use super::network::{Network, HIDDEN};

/// First-layer sums for both perspectives, bias included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Accumulator {
    values: [[i32; HIDDEN]; 2],
}

impl Accumulator {
    /// Accumulator of an empty board.
    pub fn new(net: &Network) -> Self {
        let mut row = [0i32; HIDDEN];
        for (v, &b) in row.iter_mut().zip(net.feature_bias.iter()) {
            *v = b as i32;
        }
        Accumulator { values: [row; 2] }
    }

    /// Recompute from scratch for the given pieces.
    pub fn refresh(net: &Network, pieces: impl IntoIterator<Item = (Piece, Square)>) -> Self {
        let mut acc = Accumulator::new(net);
        for (piece, sq) in pieces {
            acc.add(net, piece, sq);
        }
        acc
    }

    #[inline]
    pub fn values(&self, perspective: Color) -> &[i32; HIDDEN] { &self.values[perspective.index()] }

    pub fn add(&mut self, net: &Network, piece: Piece, sq: Square) { self.apply(net, piece, sq, 1); }

    pub fn remove(&mut self, net: &Network, piece: Piece, sq: Square) { self.apply(net, piece, sq, -1); }

    /// Apply every change a move produced.
    pub fn update(&mut self, net: &Network, changes: &FeatureUpdate) {
        for (piece, sq) in changes.removed() {
            self.remove(net, piece, sq);
        }
        for (piece, sq) in changes.added() {
            self.add(net, piece, sq);
        }
    }

    #[inline]
    fn apply(&mut self, net: &Network, piece: Piece, sq: Square, sign: i32) {
        for perspective in Color::ALL {
            let row = net.feature_row(feature_index(perspective, piece, sq));
            for (v, &w) in self.values[perspective.index()].iter_mut().zip(row) {
                *v += sign * w as i32;
            }
        }
    }
}
