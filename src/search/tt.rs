//! Shared transposition table.
//!
//! One 64-bit word per slot, read and written with relaxed atomics. Worker
//! threads race freely; a torn or stale entry can only cost a bad hint,
//! since the stored move is re-validated before use and the key tag must
//! match.
//!
//! Word layout, high to low:
//! `value:16 | depth:6 | bound:2 | move:20 | tag:20`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::board::moves::MOVE_BITS;
use crate::board::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Lower = 1,
    Exact = 2,
    Upper = 3,
}

impl Bound {
    fn from_bits(bits: u64) -> Option<Bound> {
        match bits {
            1 => Some(Bound::Lower),
            2 => Some(Bound::Exact),
            3 => Some(Bound::Upper),
            _ => None,
        }
    }

    /// Whether a stored `value` with this bound settles a window.
    #[inline]
    pub fn cuts(self, value: i32, alpha: i32, beta: i32) -> bool {
        match self {
            Bound::Exact => true,
            Bound::Lower => value >= beta,
            Bound::Upper => value <= alpha,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub value: i32,
    pub depth: i32,
    pub bound: Bound,
    pub mv: Move,
}

const TAG_BITS: u32 = 20;
const TAG_MASK: u64 = (1 << TAG_BITS) - 1;
const MOVE_SHIFT: u32 = TAG_BITS;
const MOVE_MASK: u64 = (1 << MOVE_BITS) - 1;
const BOUND_SHIFT: u32 = MOVE_SHIFT + MOVE_BITS;
const DEPTH_SHIFT: u32 = BOUND_SHIFT + 2;
const VALUE_SHIFT: u32 = 48;
const MAX_STORED_DEPTH: i32 = 63;

#[inline]
fn tag_of(key: u64) -> u64 { key >> (64 - TAG_BITS) }

#[inline]
fn pack(value: i32, depth: i32, bound: Bound, mv: Move, tag: u64) -> u64 {
    (value as i16 as u16 as u64) << VALUE_SHIFT
        | (depth.clamp(0, MAX_STORED_DEPTH) as u64) << DEPTH_SHIFT
        | (bound as u64) << BOUND_SHIFT
        | (mv.raw() as u64 & MOVE_MASK) << MOVE_SHIFT
        | tag
}

pub struct Tt {
    slots: Vec<AtomicU64>,
}

impl Tt {
    pub const MIN_MB: usize = 1;
    pub const MAX_MB: usize = 1024;
    pub const DEFAULT_MB: usize = 16;

    pub fn new(mb: usize) -> Self {
        let mut tt = Tt { slots: Vec::new() };
        tt.set_capacity_mb(mb);
        tt
    }

    pub fn with_entries(entries: usize) -> Self {
        let mut slots = Vec::with_capacity(entries.max(1));
        slots.resize_with(entries.max(1), || AtomicU64::new(0));
        Tt { slots }
    }

    /// Reallocate to `mb` megabytes (clamped), discarding all entries.
    pub fn set_capacity_mb(&mut self, mb: usize) {
        let mb = mb.clamp(Self::MIN_MB, Self::MAX_MB);
        let entries = mb * 1024 * 1024 / std::mem::size_of::<AtomicU64>();
        *self = Self::with_entries(entries);
        log::debug!("transposition table resized to {mb} MB ({entries} entries)");
    }

    pub fn clear(&self) {
        for slot in &self.slots {
            slot.store(0, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn len(&self) -> usize { self.slots.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    #[inline]
    fn slot(&self, key: u64) -> &AtomicU64 { &self.slots[(key % self.slots.len() as u64) as usize] }

    pub fn probe(&self, key: u64) -> Option<Entry> {
        let word = self.slot(key).load(Ordering::Relaxed);
        if word == 0 || word & TAG_MASK != tag_of(key) {
            return None;
        }
        let bound = Bound::from_bits(word >> BOUND_SHIFT & 3)?;
        Some(Entry {
            value: (word >> VALUE_SHIFT) as u16 as i16 as i32,
            depth: (word >> DEPTH_SHIFT & 63) as i32,
            bound,
            mv: Move::from_raw((word >> MOVE_SHIFT & MOVE_MASK) as u32),
        })
    }

    /// Store unless the slot holds a deeper non-exact entry for the same
    /// position. A null `mv` keeps the move already stored for it.
    pub fn store(&self, key: u64, value: i32, depth: i32, bound: Bound, mv: Move) {
        let slot = self.slot(key);
        let old = slot.load(Ordering::Relaxed);
        let tag = tag_of(key);
        let same_position = old != 0 && old & TAG_MASK == tag;
        let old_depth = (old >> DEPTH_SHIFT & 63) as i32;
        if same_position && bound != Bound::Exact && depth < old_depth {
            return;
        }
        let mv = if mv.is_null() && same_position {
            Move::from_raw((old >> MOVE_SHIFT & MOVE_MASK) as u32)
        } else {
            mv
        };
        slot.store(pack(value, depth, bound, mv, tag), Ordering::Relaxed);
    }

    /// Permille of the first thousand slots in use.
    pub fn hashfull(&self) -> usize {
        let sample = self.slots.len().min(1000);
        if sample == 0 {
            return 0;
        }
        let used = self.slots[..sample].iter().filter(|s| s.load(Ordering::Relaxed) != 0).count();
        used * 1000 / sample
    }
}

impl Default for Tt {
    fn default() -> Self { Tt::new(Tt::DEFAULT_MB) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_values_survive_packing() {
        let tt = Tt::with_entries(64);
        tt.store(0xABCD_0000_0000_0005, -31_000, 7, Bound::Upper, Move::NULL);
        let e = tt.probe(0xABCD_0000_0000_0005).unwrap();
        assert_eq!(e.value, -31_000);
        assert_eq!(e.depth, 7);
        assert_eq!(e.bound, Bound::Upper);
        assert!(e.mv.is_null());
    }

    #[test]
    fn bound_cuts() {
        assert!(Bound::Exact.cuts(0, 10, 20));
        assert!(Bound::Lower.cuts(25, 10, 20));
        assert!(!Bound::Lower.cuts(15, 10, 20));
        assert!(Bound::Upper.cuts(5, 10, 20));
    }
}
