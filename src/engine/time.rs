//! Time management: turn a UCI `go` request into soft and hard
//! deadlines.
//!
//! The soft limit is the target think time, checked between iterations;
//! the hard limit is the never-exceed backstop, polled inside the search
//! via the stop flag.

use crate::board::Color;

/// Search limits as parsed from a `go` command. Everything is optional;
/// absent fields simply do not constrain the search.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoLimits {
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u64>,
    pub infinite: bool,
    pub ponder: bool,
}

impl GoLimits {
    /// Remaining clock and increment for the side to move.
    #[must_use]
    pub fn clock_for(&self, side: Color) -> (Option<u64>, u64) {
        match side {
            Color::White => (self.wtime, self.winc.unwrap_or(0)),
            Color::Black => (self.btime, self.binc.unwrap_or(0)),
        }
    }
}

/// Time-allocation tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct TimeConfig {
    /// Reserved for transport latency, subtracted from the clock.
    pub move_overhead_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        TimeConfig {
            move_overhead_ms: 30,
        }
    }
}

/// Moves-to-go estimate when the GUI does not provide one.
const DEFAULT_MOVES_TO_GO: u64 = 30;

/// Below this remaining time the allocation turns defensive.
const PANIC_THRESHOLD_MS: u64 = 2000;

/// Soft and hard think time in milliseconds, or `None` for an unbounded
/// search (infinite, pondering, or depth/node-limited only).
#[must_use]
pub fn compute_deadlines(
    limits: &GoLimits,
    side: Color,
    config: &TimeConfig,
) -> Option<(u64, u64)> {
    if limits.infinite || limits.ponder {
        return None;
    }

    if let Some(movetime) = limits.movetime {
        // An explicit movetime is a promise, not a budget to manage.
        let t = movetime.saturating_sub(config.move_overhead_ms).max(1);
        return Some((t, t));
    }

    let (time_left, inc) = limits.clock_for(side);
    let time_left = time_left?;

    let safe = time_left.saturating_sub(config.move_overhead_ms).max(1);

    if safe < PANIC_THRESHOLD_MS {
        // Nearly flagged: spend a sliver and bank the increment.
        let soft = (safe / 20 + inc / 2).clamp(1, (safe / 2).max(1));
        let hard = (safe / 4).max(soft).max(1);
        return Some((soft, hard));
    }

    let moves_to_go = limits.movestogo.unwrap_or(DEFAULT_MOVES_TO_GO).max(2);
    let base = safe / moves_to_go + inc * 3 / 4;

    let soft = base.min(safe / 2).max(1);
    let hard = (base * 4).min(safe * 4 / 5).max(soft);

    Some((soft, hard))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TimeConfig {
        TimeConfig {
            move_overhead_ms: 30,
        }
    }

    #[test]
    fn infinite_and_ponder_are_unbounded() {
        let limits = GoLimits {
            infinite: true,
            ..Default::default()
        };
        assert!(compute_deadlines(&limits, Color::White, &config()).is_none());

        let limits = GoLimits {
            ponder: true,
            wtime: Some(60_000),
            ..Default::default()
        };
        assert!(compute_deadlines(&limits, Color::White, &config()).is_none());
    }

    #[test]
    fn movetime_is_used_directly() {
        let limits = GoLimits {
            movetime: Some(5000),
            ..Default::default()
        };
        let (soft, hard) = compute_deadlines(&limits, Color::White, &config()).unwrap();
        assert_eq!(soft, 4970);
        assert_eq!(hard, 4970);
    }

    #[test]
    fn depth_only_search_is_unbounded() {
        let limits = GoLimits {
            depth: Some(8),
            ..Default::default()
        };
        assert!(compute_deadlines(&limits, Color::White, &config()).is_none());
    }

    #[test]
    fn allocation_respects_the_clock() {
        let limits = GoLimits {
            wtime: Some(60_000),
            winc: Some(1000),
            ..Default::default()
        };
        let (soft, hard) = compute_deadlines(&limits, Color::White, &config()).unwrap();
        assert!(soft > 0);
        assert!(hard >= soft);
        assert!(hard < 60_000);
    }

    #[test]
    fn uses_black_clock_for_black() {
        let limits = GoLimits {
            wtime: Some(1),
            btime: Some(60_000),
            ..Default::default()
        };
        let white = compute_deadlines(&limits, Color::White, &config()).unwrap();
        let black = compute_deadlines(&limits, Color::Black, &config()).unwrap();
        assert!(black.0 > white.0);
    }

    #[test]
    fn movestogo_stretches_allocation() {
        let few = GoLimits {
            wtime: Some(60_000),
            movestogo: Some(5),
            ..Default::default()
        };
        let many = GoLimits {
            wtime: Some(60_000),
            movestogo: Some(40),
            ..Default::default()
        };
        let few = compute_deadlines(&few, Color::White, &config()).unwrap();
        let many = compute_deadlines(&many, Color::White, &config()).unwrap();
        assert!(few.0 > many.0);
    }

    #[test]
    fn low_clock_stays_defensive() {
        let limits = GoLimits {
            wtime: Some(500),
            ..Default::default()
        };
        let (soft, hard) = compute_deadlines(&limits, Color::White, &config()).unwrap();
        assert!(hard <= 500);
        assert!(soft <= hard);
    }
}
