//! Tunable search parameters. Everything the pruning and reduction logic
//! keys off lives here rather than as scattered literals.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchParams {
    /// Initial aspiration half-window in centipawns.
    pub aspiration_delta: i32,
    /// Aspiration failures before the window opens fully.
    pub aspiration_max_fails: u32,

    /// Reverse futility: maximum depth and per-depth margin.
    pub rfp_depth: i32,
    pub rfp_margin: i32,

    /// Razoring: maximum depth and per-depth margin.
    pub razor_depth: i32,
    pub razor_margin: i32,

    /// Null move: minimum depth, and the depth from which a fail-high is
    /// verified by a reduced re-search.
    pub null_min_depth: i32,
    pub null_verify_depth: i32,

    /// Multi-cut: minimum depth, candidates tried, cutoffs required, and
    /// the reduction applied to the trial searches.
    pub multicut_depth: i32,
    pub multicut_tries: usize,
    pub multicut_cuts: usize,
    pub multicut_reduction: i32,

    /// Internal iterative deepening kicks in at this depth when the
    /// transposition table has no move to suggest.
    pub iid_depth: i32,

    /// Futility pruning of quiets near the leaves.
    pub futility_depth: i32,
    pub futility_margin: i32,

    /// Late-move pruning of quiets at shallow depth.
    pub lmp_depth: i32,
    pub lmp_base: usize,

    /// History pruning of late quiets with clearly bad history.
    pub history_prune_depth: i32,
    pub history_prune_threshold: i32,

    /// Late-move reductions start after this many moves at this depth.
    pub lmr_min_depth: i32,
    pub lmr_min_moves: usize,

    /// Singular extension: minimum depth and per-depth margin.
    pub singular_depth: i32,
    pub singular_margin: i32,

    /// Quiescence delta-pruning safety margin.
    pub qs_delta_margin: i32,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            aspiration_delta: 50,
            aspiration_max_fails: 4,
            rfp_depth: 6,
            rfp_margin: 120,
            razor_depth: 3,
            razor_margin: 240,
            null_min_depth: 3,
            null_verify_depth: 10,
            multicut_depth: 8,
            multicut_tries: 6,
            multicut_cuts: 3,
            multicut_reduction: 4,
            iid_depth: 6,
            futility_depth: 6,
            futility_margin: 120,
            lmp_depth: 3,
            lmp_base: 3,
            history_prune_depth: 3,
            history_prune_threshold: -4096,
            lmr_min_depth: 3,
            lmr_min_moves: 4,
            singular_depth: 8,
            singular_margin: 2,
            qs_delta_margin: 200,
        }
    }
}
