//! Search tuning constants and the tables derived from them.

use std::sync::OnceLock;

/// Half-width of the first aspiration window.
pub const ASPIRATION_WINDOW: i32 = 12;
/// Minimum depth before aspiration windows are used.
pub const ASPIRATION_DEPTH: i32 = 6;

pub const RFP_MAX_DEPTH: i32 = 7;
pub const RFP_MARGIN: i32 = 50;

pub const PROBCUT_MARGIN: i32 = 110;

pub const QUIET_SKIP_MAX_DEPTH: i32 = 9;
pub const QUIET_SKIP_MARGIN: i32 = 100;
pub const QUIET_SKIP_HISTORY: i32 = 50_000;

pub const COUNTER_PRUNE_MAX_DEPTH: i32 = 3;
pub const COUNTER_PRUNE_HISTORY: i32 = -4096;

pub const LMP_MAX_DEPTH: i32 = 8;

pub const HISTORY_EXTENSION: i32 = 98_304;
pub const CHECK_EXTENSION_MAX_DEPTH: i32 = 7;

pub const SINGULAR_MIN_DEPTH: i32 = 6;
pub const DOUBLE_EXTENSION_MARGIN: i32 = 50;

/// Quiescence: captures must win at least `alpha - eval - DELTA_MARGIN`.
pub const DELTA_MARGIN: i32 = 150;

pub const LMR_QUIET_HISTORY_DIV: i32 = 20_480;
pub const LMR_TACTICAL_HISTORY_OFFSET: i32 = 24_576;

const TABLE_SIZE: usize = 64;

pub struct SearchTables {
    lmr: [[i32; TABLE_SIZE]; TABLE_SIZE],
    lmp: [[usize; TABLE_SIZE]; 2],
    quiet_see: [i32; TABLE_SIZE],
    tactical_see: [i32; TABLE_SIZE],
}

impl SearchTables {
    fn build() -> Self {
        let mut lmr = [[0i32; TABLE_SIZE]; TABLE_SIZE];
        for (depth, row) in lmr.iter_mut().enumerate().skip(1) {
            for (moves, r) in row.iter_mut().enumerate().skip(1) {
                let v = 0.8 + (depth as f64).ln() * (1.2 * moves as f64).ln() / 2.5;
                *r = v as i32;
            }
        }
        let mut lmp = [[0usize; TABLE_SIZE]; 2];
        for depth in 0..TABLE_SIZE {
            let d = depth * depth;
            lmp[0][depth] = (3 + d) / 2;
            lmp[1][depth] = 3 + d;
        }
        let mut quiet_see = [0i32; TABLE_SIZE];
        let mut tactical_see = [0i32; TABLE_SIZE];
        for depth in 0..TABLE_SIZE {
            let d = depth as i32;
            quiet_see[depth] = -20 * d * d;
            tactical_see[depth] = -80 * d;
        }
        SearchTables { lmr, lmp, quiet_see, tactical_see }
    }

    #[inline]
    pub fn lmr(&self, depth: i32, moves: usize) -> i32 { self.lmr[clamp_index(depth)][moves.min(TABLE_SIZE - 1)] }

    /// Quiet moves searched before the rest are pruned.
    #[inline]
    pub fn lmp(&self, improving: bool, depth: i32) -> usize { self.lmp[improving as usize][clamp_index(depth)] }

    #[inline]
    pub fn quiet_see(&self, depth: i32) -> i32 { self.quiet_see[clamp_index(depth)] }

    #[inline]
    pub fn tactical_see(&self, depth: i32) -> i32 { self.tactical_see[clamp_index(depth)] }
}

#[inline]
fn clamp_index(depth: i32) -> usize { depth.clamp(0, TABLE_SIZE as i32 - 1) as usize }

pub fn tables() -> &'static SearchTables {
    static TABLES: OnceLock<SearchTables> = OnceLock::new();
    TABLES.get_or_init(SearchTables::build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reductions_grow_with_depth_and_moves() {
        let t = tables();
        assert_eq!(t.lmr(1, 1), 0);
        assert!(t.lmr(10, 30) > t.lmr(3, 3));
        assert!(t.lmp(true, 4) > t.lmp(false, 4));
        assert_eq!(t.quiet_see(3), -180);
        assert_eq!(t.tactical_see(2), -160);
    }
}
