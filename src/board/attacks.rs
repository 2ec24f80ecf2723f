//! Precomputed attack tables.
//!
//! Leaper attacks are plain per-square arrays. Slider attacks use magic
//! indexing: the occupancy bits under a square's relevant mask are hashed
//! into a dense slot of one flat table shared by all squares. Magics are
//! searched once at startup with a fixed seed, so every run builds the
//! same tables.

use std::sync::OnceLock;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::bitboard::Bitboard;
use super::types::{Color, Square};

const MAGIC_SEED: u64 = 0x5EED_D0_C0FFEE;

const KNIGHT_STEPS: [(i8, i8); 8] = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_STEPS: [(i8, i8); 8] = [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Clone, Copy, Default)]
struct Magic {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline]
    fn index(&self, occupied: Bitboard) -> usize {
        ((occupied.0 & self.mask).wrapping_mul(self.magic) >> self.shift) as usize + self.offset
    }
}

pub struct AttackTables {
    pawn: [[Bitboard; 64]; 2],
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    bishop: [Magic; 64],
    rook: [Magic; 64],
    sliders: Vec<Bitboard>,
    between: Vec<Bitboard>,
}

impl AttackTables {
    fn build() -> Self {
        let mut pawn = [[Bitboard::EMPTY; 64]; 2];
        let mut knight = [Bitboard::EMPTY; 64];
        let mut king = [Bitboard::EMPTY; 64];
        for sq in Square::all() {
            pawn[Color::White.index()][sq.index()] = leaper(sq, &[(-1, 1), (1, 1)]);
            pawn[Color::Black.index()][sq.index()] = leaper(sq, &[(-1, -1), (1, -1)]);
            knight[sq.index()] = leaper(sq, &KNIGHT_STEPS);
            king[sq.index()] = leaper(sq, &KING_STEPS);
        }

        let mut rng = SmallRng::seed_from_u64(MAGIC_SEED);
        let mut sliders = Vec::new();
        let mut bishop = [Magic::default(); 64];
        let mut rook = [Magic::default(); 64];
        for sq in Square::all() {
            bishop[sq.index()] = find_magic(sq, &BISHOP_DIRS, &mut rng, &mut sliders);
        }
        for sq in Square::all() {
            rook[sq.index()] = find_magic(sq, &ROOK_DIRS, &mut rng, &mut sliders);
        }
        log::debug!("slider attack table built with {} entries", sliders.len());

        let mut between = vec![Bitboard::EMPTY; 64 * 64];
        for from in Square::all() {
            for &(df, dr) in KING_STEPS.iter() {
                let mut path = Bitboard::EMPTY;
                let mut cur = from;
                while let Some(next) = cur.try_step(df, dr) {
                    between[from.index() * 64 + next.index()] = path;
                    path |= next;
                    cur = next;
                }
            }
        }

        AttackTables { pawn, knight, king, bishop, rook, sliders, between }
    }
}

fn leaper(sq: Square, steps: &[(i8, i8)]) -> Bitboard {
    steps
        .iter()
        .filter_map(|&(df, dr)| sq.try_step(df, dr))
        .fold(Bitboard::EMPTY, |bb, s| bb | s)
}

/// Ray attacks computed square by square, stopping at (and including) blockers.
fn slow_slider_attacks(sq: Square, dirs: &[(i8, i8)], occupied: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(df, dr) in dirs {
        let mut cur = sq;
        while let Some(next) = cur.try_step(df, dr) {
            attacks |= next;
            if occupied.contains(next) {
                break;
            }
            cur = next;
        }
    }
    attacks
}

/// Squares whose occupancy can change the slider's attack set: every ray
/// square except the last one before the edge.
fn relevant_mask(sq: Square, dirs: &[(i8, i8)]) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    for &(df, dr) in dirs {
        let mut cur = sq;
        while let Some(next) = cur.try_step(df, dr) {
            if next.try_step(df, dr).is_none() {
                break;
            }
            mask |= next;
            cur = next;
        }
    }
    mask
}

fn find_magic(sq: Square, dirs: &[(i8, i8)], rng: &mut SmallRng, table: &mut Vec<Bitboard>) -> Magic {
    let mask = relevant_mask(sq, dirs);
    let bits = mask.popcount();
    let size = 1usize << bits;

    // Enumerate every subset of the mask (carry-rippler).
    let mut occupancies = Vec::with_capacity(size);
    let mut attacks = Vec::with_capacity(size);
    let mut subset = 0u64;
    loop {
        occupancies.push(subset);
        attacks.push(slow_slider_attacks(sq, dirs, Bitboard(subset)));
        subset = subset.wrapping_sub(mask.0) & mask.0;
        if subset == 0 {
            break;
        }
    }

    let shift = 64 - bits;
    let mut used = vec![Bitboard::EMPTY; size];
    let mut epoch = vec![0u32; size];
    let mut attempt = 0u32;
    loop {
        let magic = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if (mask.0.wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }
        attempt += 1;
        let collision_free = occupancies.iter().zip(attacks.iter()).all(|(&occ, &att)| {
            let idx = (occ.wrapping_mul(magic) >> shift) as usize;
            if epoch[idx] < attempt {
                epoch[idx] = attempt;
                used[idx] = att;
                true
            } else {
                used[idx] == att
            }
        });
        if collision_free {
            let offset = table.len();
            table.extend_from_slice(&used);
            return Magic { mask: mask.0, magic, shift, offset };
        }
    }
}

fn tables() -> &'static AttackTables {
    static TABLES: OnceLock<AttackTables> = OnceLock::new();
    TABLES.get_or_init(AttackTables::build)
}

/// Force table construction up front so the first search does not pay for it.
pub fn init() {
    tables();
}

#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard { tables().pawn[color.index()][sq.index()] }

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard { tables().knight[sq.index()] }

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard { tables().king[sq.index()] }

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let t = tables();
    t.sliders[t.bishop[sq.index()].index(occupied)]
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let t = tables();
    t.sliders[t.rook[sq.index()].index(occupied)]
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

/// Squares strictly between `a` and `b` when they share a line, else empty.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard { tables().between[a.index() * 64 + b.index()] }
