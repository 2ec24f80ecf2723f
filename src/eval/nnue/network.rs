use std::sync::OnceLock;

use crate::board::types::{Color, PieceType};
use crate::error::NetworkError;

use super::accumulator::Accumulator;
use super::features::INPUTS;

/// Width of the hidden layer, per perspective.
pub const HIDDEN: usize = 32;

/// Feature transformer followed by a single output neuron fed with the
/// side-to-move half and the opponent half of the accumulator.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    /// `INPUTS` rows of `HIDDEN` weights.
    pub feature_weights: Vec<i16>,
    pub feature_bias: [i16; HIDDEN],
    pub our_weights: [i16; HIDDEN],
    pub their_weights: [i16; HIDDEN],
    pub output_bias: i32,
    pub scale: i32,
}

impl Network {
    #[inline]
    pub fn feature_row(&self, feature: usize) -> &[i16] {
        &self.feature_weights[feature * HIDDEN..(feature + 1) * HIDDEN]
    }

    pub fn evaluate(&self, acc: &Accumulator, side: Color) -> i32 {
        let ours = acc.values(side);
        let theirs = acc.values(!side);
        let mut out = self.output_bias;
        for i in 0..HIDDEN {
            out += ours[i].max(0) * self.our_weights[i] as i32;
            out += theirs[i].max(0) * self.their_weights[i] as i32;
        }
        out / self.scale
    }

    /// Hand-set network that reproduces a material plus piece-square score.
    /// Neuron 0 sums our pieces, neuron 1 theirs; the output takes the
    /// difference from both halves and halves it back.
    pub fn material() -> Network {
        const MATERIAL: [i16; 6] = [100, 320, 330, 500, 900, 0];
        const BASE: i16 = 1000;

        let mut feature_weights = vec![0i16; INPUTS * HIDDEN];
        for side in 0..2 {
            for kind in PieceType::ALL {
                for sq in 0..64usize {
                    let feature = 64 * (kind.index() + 6 * side) + sq;
                    // Tables are laid out rank 8 first, from the owner's side.
                    let table_sq = if side == 0 { sq ^ 56 } else { sq };
                    let bonus = PST[kind.index()][table_sq];
                    feature_weights[feature * HIDDEN + side] = MATERIAL[kind.index()] + bonus;
                }
            }
        }

        let mut feature_bias = [0i16; HIDDEN];
        feature_bias[0] = BASE;
        feature_bias[1] = BASE;
        let mut our_weights = [0i16; HIDDEN];
        our_weights[0] = 1;
        our_weights[1] = -1;
        let mut their_weights = [0i16; HIDDEN];
        their_weights[0] = -1;
        their_weights[1] = 1;

        Network { feature_weights, feature_bias, our_weights, their_weights, output_bias: 0, scale: 2 }
    }
}

static NETWORK: OnceLock<Network> = OnceLock::new();

/// Process-wide network, defaulting to [`Network::material`].
#[inline]
pub fn network() -> &'static Network { NETWORK.get_or_init(Network::material) }

/// Install a network for the rest of the process. Must run before the
/// first position is built; fails once a network is in place.
pub fn install(net: Network) -> Result<(), NetworkError> {
    if net.scale == 0 {
        return Err(NetworkError::ZeroScale);
    }
    NETWORK.set(net).map_err(|_| NetworkError::AlreadyInstalled)
}

#[rustfmt::skip]
const PST: [[i16; 64]; 6] = [
    [
          0,   0,   0,   0,   0,   0,   0,   0,
         50,  50,  50,  50,  50,  50,  50,  50,
         10,  10,  20,  30,  30,  20,  10,  10,
          5,   5,  10,  25,  25,  10,   5,   5,
          0,   0,   0,  20,  20,   0,   0,   0,
          5,  -5, -10,   0,   0, -10,  -5,   5,
          5,  10,  10, -20, -20,  10,  10,   5,
          0,   0,   0,   0,   0,   0,   0,   0,
    ],
    [
        -50, -40, -30, -30, -30, -30, -40, -50,
        -40, -20,   0,   0,   0,   0, -20, -40,
        -30,   0,  10,  15,  15,  10,   0, -30,
        -30,   5,  15,  20,  20,  15,   5, -30,
        -30,   0,  15,  20,  20,  15,   0, -30,
        -30,   5,  10,  15,  15,  10,   5, -30,
        -40, -20,   0,   5,   5,   0, -20, -40,
        -50, -40, -30, -30, -30, -30, -40, -50,
    ],
    [
        -20, -10, -10, -10, -10, -10, -10, -20,
        -10,   0,   0,   0,   0,   0,   0, -10,
        -10,   0,   5,  10,  10,   5,   0, -10,
        -10,   5,   5,  10,  10,   5,   5, -10,
        -10,   0,  10,  10,  10,  10,   0, -10,
        -10,  10,  10,  10,  10,  10,  10, -10,
        -10,   5,   0,   0,   0,   0,   5, -10,
        -20, -10, -10, -10, -10, -10, -10, -20,
    ],
    [
          0,   0,   0,   0,   0,   0,   0,   0,
          5,  10,  10,  10,  10,  10,  10,   5,
         -5,   0,   0,   0,   0,   0,   0,  -5,
         -5,   0,   0,   0,   0,   0,   0,  -5,
         -5,   0,   0,   0,   0,   0,   0,  -5,
         -5,   0,   0,   0,   0,   0,   0,  -5,
         -5,   0,   0,   0,   0,   0,   0,  -5,
          0,   0,   0,   5,   5,   0,   0,   0,
    ],
    [
        -20, -10, -10,  -5,  -5, -10, -10, -20,
        -10,   0,   0,   0,   0,   0,   0, -10,
        -10,   0,   5,   5,   5,   5,   0, -10,
         -5,   0,   5,   5,   5,   5,   0,  -5,
          0,   0,   5,   5,   5,   5,   0,  -5,
        -10,   5,   5,   5,   5,   5,   0, -10,
        -10,   0,   5,   0,   0,   0,   0, -10,
        -20, -10, -10,  -5,  -5, -10, -10, -20,
    ],
    [
        -30, -40, -40, -50, -50, -40, -40, -30,
        -30, -40, -40, -50, -50, -40, -40, -30,
        -30, -40, -40, -50, -50, -40, -40, -30,
        -30, -40, -40, -50, -50, -40, -40, -30,
        -20, -30, -30, -40, -40, -30, -30, -20,
        -10, -20, -20, -20, -20, -20, -20, -10,
         20,  20,   0,   0,   0,   0,  20,  20,
         20,  30,  10,   0,   0,  10,  30,  20,
    ],
];
