use std::time::{Duration, Instant};

use crate::board::Move;

pub const DEFAULT_MOVE_OVERHEAD: Duration = Duration::from_millis(100);
pub const MAX_MOVE_OVERHEAD_MS: u64 = 5000;
const DEFAULT_MOVES_TO_GO: u32 = 30;
const MAX_MOVES_TO_GO: u32 = 40;

/// Decides when an iterative-deepening search should stop.
///
/// A fixed `movetime` is used as is. With a clock, the budget is
/// `time / movestogo + inc / 2` (never more than the time left), and it is
/// revisited after every completed iteration from depth 5 on: swings in the
/// score stretch it, a stable best move lets the search stop early.
#[derive(Clone, Debug)]
pub struct TimeManager {
    start: Instant,
    alloc: Option<Duration>,
    overhead: Duration,
    clock_based: bool,
    completed: u32,
    stability: f64,
}

impl TimeManager {
    pub fn new(movetime: Option<Duration>, time_left: Option<Duration>, inc: Duration, movestogo: Option<u32>, overhead: Duration) -> Self {
        let movestogo = movestogo.filter(|&m| m > 0).map_or(DEFAULT_MOVES_TO_GO, |m| m.min(MAX_MOVES_TO_GO));
        let alloc = match (movetime, time_left) {
            (Some(mt), _) => Some(mt),
            (None, Some(time)) => Some((time / movestogo + inc / 2).min(time)),
            (None, None) => None,
        };
        TimeManager {
            start: Instant::now(),
            alloc,
            overhead,
            clock_based: movetime.is_none() && time_left.is_some(),
            completed: 0,
            stability: 0.0,
        }
    }

    /// No time limit at all.
    pub fn unlimited() -> Self { Self::new(None, None, Duration::ZERO, None, Duration::ZERO) }

    #[inline]
    pub fn elapsed(&self) -> Duration { self.start.elapsed() }

    pub fn allocation(&self) -> Option<Duration> { self.alloc }

    /// Hard stop. Never fires before the first iteration completes.
    pub fn out_of_time(&self) -> bool {
        match self.alloc {
            Some(alloc) => self.completed > 0 && self.elapsed() + self.overhead >= alloc,
            None => false,
        }
    }

    /// Record a finished iteration. `values` and `best_moves` hold one entry
    /// per completed depth. Returns `true` when the search should stop now.
    pub fn iteration_completed(&mut self, values: &[i32], best_moves: &[Move]) -> bool {
        self.completed += 1;
        if self.completed < 5 || !self.clock_based || values.len() < 2 || best_moves.len() < 2 {
            return false;
        }

        let n = best_moves.len();
        if best_moves[n - 1] == best_moves[n - 2] {
            self.stability = (self.stability + 0.14).min(1.0);
        } else {
            self.stability = 0.0;
        }

        let last = values[values.len() - 1];
        let difference = last - values[values.len() - 2];
        if difference.abs() <= 8 {
            return false;
        }
        let steps = f64::from((difference.abs()).div_euclid(8));
        let factor = if difference < 0 { (1.04 * steps).min(1.16) } else { (1.02 * steps).min(1.04) };
        if let Some(alloc) = self.alloc.as_mut() {
            *alloc = alloc.mul_f64(factor);
        }

        let soft_limit = self.alloc.map(|a| a.mul_f64((2.0 - self.stability) / 2.0));
        last < 1000 && soft_limit.is_some_and(|limit| self.elapsed() > limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_allocation() {
        let tm = TimeManager::new(None, Some(Duration::from_secs(60)), Duration::from_secs(2), None, Duration::ZERO);
        assert_eq!(tm.allocation(), Some(Duration::from_secs(3)));
        let tm = TimeManager::new(None, Some(Duration::from_secs(60)), Duration::ZERO, Some(100), Duration::ZERO);
        assert_eq!(tm.allocation(), Some(Duration::from_millis(1500)));
        let tm = TimeManager::new(None, Some(Duration::from_millis(100)), Duration::from_secs(10), None, Duration::ZERO);
        assert_eq!(tm.allocation(), Some(Duration::from_millis(100)));
        assert_eq!(TimeManager::unlimited().allocation(), None);
    }

    #[test]
    fn waits_for_first_iteration() {
        let mut tm = TimeManager::new(Some(Duration::ZERO), None, Duration::ZERO, None, DEFAULT_MOVE_OVERHEAD);
        assert!(!tm.out_of_time());
        tm.iteration_completed(&[0], &[Move::NULL]);
        assert!(tm.out_of_time());
        assert!(!TimeManager::unlimited().out_of_time());
    }
}
