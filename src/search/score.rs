use std::fmt;

// Mate scoring
pub const CHECKMATE: i32 = 32_256;
pub const UNKNOWN: i32 = 32_257;
pub const MATE_BOUND: i32 = 30_000;
pub const WIN_BOUND: i32 = 20_000;
pub const DRAW_SCORE: i32 = 0;

pub const MAX_PLY: usize = 64;
pub const MAX_DEPTH: i32 = 32;

#[inline]
pub fn is_mate_score(v: i32) -> bool { v.abs() >= MATE_BOUND && v.abs() <= CHECKMATE }

/// Make a mate score relative to the node it is stored from.
#[inline]
pub fn value_to_tt(v: i32, ply: usize) -> i32 {
    if v >= MATE_BOUND {
        v + ply as i32
    } else if v <= -MATE_BOUND {
        v - ply as i32
    } else {
        v
    }
}

/// Inverse of [`value_to_tt`] for a probe at `ply`.
#[inline]
pub fn value_from_tt(v: i32, ply: usize) -> i32 {
    if v >= MATE_BOUND {
        v - ply as i32
    } else if v <= -MATE_BOUND {
        v + ply as i32
    } else {
        v
    }
}

/// Score as reported over UCI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Moves (not plies) to mate; negative when we are getting mated.
    Mate(i32),
}

impl Score {
    pub fn from_value(v: i32) -> Score {
        if v >= MATE_BOUND {
            Score::Mate((CHECKMATE - v + 1) / 2)
        } else if v <= -MATE_BOUND {
            Score::Mate(-(CHECKMATE + v) / 2)
        } else {
            Score::Cp(v)
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "cp {cp}"),
            Score::Mate(n) => write!(f, "mate {n}"),
        }
    }
}
