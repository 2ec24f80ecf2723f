use std::sync::OnceLock;

use super::types::{Piece, Square};

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub struct ZobristKeys {
    pieces: [[u64; 64]; 12],
    castling: [u64; 16],
    ep_file: [u64; 8],
    side: u64,
}

fn keys() -> &'static ZobristKeys {
    static KEYS: OnceLock<ZobristKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut seed = 0xF00D_F00D_DEAD_BEEF;
        let mut next = || {
            seed = splitmix64(seed);
            seed
        };
        let mut pieces = [[0u64; 64]; 12];
        for row in pieces.iter_mut() {
            for v in row.iter_mut() {
                *v = next();
            }
        }
        let mut castling = [0u64; 16];
        // No rights hashes to zero.
        for v in castling.iter_mut().skip(1) {
            *v = next();
        }
        let mut ep_file = [0u64; 8];
        for v in ep_file.iter_mut() {
            *v = next();
        }
        let side = next();
        ZobristKeys { pieces, castling, ep_file, side }
    })
}

#[inline]
pub fn piece_key(piece: Piece, sq: Square) -> u64 { keys().pieces[piece.index()][sq.index()] }

#[inline]
pub fn castling_key(rights: u8) -> u64 { keys().castling[rights as usize & 15] }

#[inline]
pub fn ep_key(sq: Square) -> u64 { keys().ep_file[sq.file() as usize] }

#[inline]
pub fn side_key() -> u64 { keys().side }
