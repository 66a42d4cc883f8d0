//! Search core: principal-variation alpha-beta with iterative deepening,
//! a shared transposition table and Lazy-SMP parallelism.
//!
//! Per-worker scratch state lives in [`SearchThread`]; the only shared
//! pieces are the transposition table, the stop flag, the global node
//! counter and the clock. Cancellation is cooperative: workers poll the
//! stop flag and unwind by returning sentinel scores that the driver
//! discards.

mod alphabeta;
mod iterative;
mod ordering;
mod params;
mod pruning;
mod quiescence;
pub mod smp;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::board::{Board, Color, Move};
use crate::eval::Evaluator;
use crate::tt::TranspositionTable;

pub use iterative::{InfoCallback, IterationInfo, RootLine};
pub use ordering::MovePicker;
pub use params::SearchParams;
pub use smp::{SearchReport, SmpConfig};

/// Maximum search ply; killers and the eval stack are sized by this.
pub const MAX_PLY: usize = 128;

/// Window bound beyond any achievable score.
pub const INFINITY: i32 = 32_000;

/// Mate scores are encoded as `MATE - ply`.
pub const MATE: i32 = 31_000;

/// Scores at or beyond this are mate scores.
pub const MATE_IN_MAX: i32 = MATE - MAX_PLY as i32;

/// Killer moves per ply: quiet moves that produced a β-cutoff at the same
/// ply. Insert shifts slot 0 into slot 1.
pub struct KillerTable {
    slots: [[Move; 2]; MAX_PLY],
}

impl KillerTable {
    #[must_use]
    pub fn new() -> Self {
        KillerTable {
            slots: [[Move::NULL; 2]; MAX_PLY],
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, ply: usize) -> [Move; 2] {
        if ply < MAX_PLY {
            self.slots[ply]
        } else {
            [Move::NULL; 2]
        }
    }

    pub fn insert(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY || self.slots[ply][0] == mv {
            return;
        }
        self.slots[ply][1] = self.slots[ply][0];
        self.slots[ply][0] = mv;
    }

    pub fn clear(&mut self) {
        self.slots = [[Move::NULL; 2]; MAX_PLY];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        KillerTable::new()
    }
}

/// Butterfly history, per side: quiet moves that caused cutoffs gain
/// `depth²`, quiets that failed to cut lose it. Scores are bounded.
pub struct HistoryTable {
    scores: [[i32; 64 * 64]; 2],
}

/// History scores stay within this bound.
const HISTORY_MAX: i32 = 1 << 14;

impl HistoryTable {
    #[must_use]
    pub fn new() -> Self {
        HistoryTable {
            scores: [[0; 64 * 64]; 2],
        }
    }

    #[inline]
    fn index(mv: Move) -> usize {
        mv.from().index() * 64 + mv.to().index()
    }

    #[inline]
    #[must_use]
    pub fn score(&self, side: Color, mv: Move) -> i32 {
        self.scores[side.index()][Self::index(mv)]
    }

    pub fn reward(&mut self, side: Color, mv: Move, depth: i32) {
        let entry = &mut self.scores[side.index()][Self::index(mv)];
        *entry = (*entry + depth * depth).min(HISTORY_MAX);
    }

    pub fn penalize(&mut self, side: Color, mv: Move, depth: i32) {
        let entry = &mut self.scores[side.index()][Self::index(mv)];
        *entry = (*entry - depth * depth).max(-HISTORY_MAX);
    }

    /// Halve everything between searches so old patterns fade.
    pub fn decay(&mut self) {
        for side in &mut self.scores {
            for entry in side.iter_mut() {
                *entry /= 2;
            }
        }
    }

    pub fn clear(&mut self) {
        self.scores = [[0; 64 * 64]; 2];
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        HistoryTable::new()
    }
}

/// Counter moves: the quiet refutation most recently seen for an opponent
/// move ending on each square, per side to move.
pub struct CounterMoveTable {
    moves: [[Move; 64]; 2],
}

impl CounterMoveTable {
    #[must_use]
    pub fn new() -> Self {
        CounterMoveTable {
            moves: [[Move::NULL; 64]; 2],
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, side: Color, prev: Move) -> Move {
        if prev.is_null() {
            Move::NULL
        } else {
            self.moves[side.index()][prev.to().index()]
        }
    }

    pub fn set(&mut self, side: Color, prev: Move, mv: Move) {
        if !prev.is_null() {
            self.moves[side.index()][prev.to().index()] = mv;
        }
    }

    pub fn clear(&mut self) {
        self.moves = [[Move::NULL; 64]; 2];
    }
}

impl Default for CounterMoveTable {
    fn default() -> Self {
        CounterMoveTable::new()
    }
}

/// Deadlines shared between the driver and its workers. Pondering starts
/// with both deadlines disarmed; `ponder_hit` arms them mid-search.
pub struct SearchClock {
    start: Mutex<Instant>,
    soft: Mutex<Option<Instant>>,
    hard: Mutex<Option<Instant>>,
}

impl SearchClock {
    #[must_use]
    pub fn new() -> Self {
        SearchClock {
            start: Mutex::new(Instant::now()),
            soft: Mutex::new(None),
            hard: Mutex::new(None),
        }
    }

    pub fn restart(&self, soft: Option<Instant>, hard: Option<Instant>) {
        *self.start.lock() = Instant::now();
        *self.soft.lock() = soft;
        *self.hard.lock() = hard;
    }

    /// Arm (or re-arm) the deadlines without touching the start time.
    pub fn arm(&self, soft: Option<Instant>, hard: Option<Instant>) {
        *self.soft.lock() = soft;
        *self.hard.lock() = hard;
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.lock().elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn soft_expired(&self) -> bool {
        self.soft.lock().is_some_and(|d| Instant::now() >= d)
    }

    #[must_use]
    pub fn hard_expired(&self) -> bool {
        self.hard.lock().is_some_and(|d| Instant::now() >= d)
    }
}

impl Default for SearchClock {
    fn default() -> Self {
        SearchClock::new()
    }
}

/// Everything a single search worker owns or borrows.
///
/// The board is an exclusive copy; killers, history and counters are
/// thread-local so workers diversify naturally. Only `tt`, `stop`,
/// `shared_nodes` and `clock` are shared.
pub struct SearchThread<'a> {
    pub id: usize,
    pub board: Board,
    pub tt: &'a TranspositionTable,
    pub evaluator: &'a dyn Evaluator,
    pub params: SearchParams,
    pub killers: KillerTable,
    pub history: HistoryTable,
    pub counters: CounterMoveTable,
    pub stop: &'a AtomicBool,
    pub shared_nodes: &'a AtomicU64,
    pub clock: &'a SearchClock,
    pub node_limit: u64,
    pub contempt: i32,
    pub root_color: Color,
    /// Disable null-move pruning on this worker (SMP diversification).
    pub disable_null: bool,

    pub nodes: u64,
    pub seldepth: u32,
    pub aborted: bool,
    pub root_depth: i32,
    pub(crate) static_eval: [i32; MAX_PLY],
}

impl<'a> SearchThread<'a> {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: usize,
        board: Board,
        tt: &'a TranspositionTable,
        evaluator: &'a dyn Evaluator,
        stop: &'a AtomicBool,
        shared_nodes: &'a AtomicU64,
        clock: &'a SearchClock,
    ) -> Self {
        let root_color = board.side_to_move();
        SearchThread {
            id,
            board,
            tt,
            evaluator,
            params: SearchParams::default(),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            counters: CounterMoveTable::new(),
            stop,
            shared_nodes,
            clock,
            node_limit: 0,
            contempt: 0,
            root_color,
            disable_null: false,
            nodes: 0,
            seldepth: 0,
            aborted: false,
            root_depth: 1,
            static_eval: [0; MAX_PLY],
        }
    }

    /// Poll all stop conditions. Cheap checks every node, the clock every
    /// 1024 nodes. Once true it stays true for this search.
    #[inline]
    pub(crate) fn should_stop(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        if self.stop.load(Ordering::Relaxed) {
            self.aborted = true;
            return true;
        }
        if self.node_limit > 0 && self.nodes >= self.node_limit {
            self.abort_all();
            return true;
        }
        if self.nodes % 1024 == 0 && self.clock.hard_expired() {
            self.abort_all();
            return true;
        }
        false
    }

    /// Trip the shared stop flag so every worker unwinds.
    pub(crate) fn abort_all(&mut self) {
        self.aborted = true;
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn count_node(&mut self) {
        self.nodes += 1;
        self.shared_nodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Draw score with contempt applied from the engine's point of view:
    /// positions the engine must hold are slightly worse than zero for it.
    #[inline]
    #[must_use]
    pub(crate) fn draw_score(&self) -> i32 {
        if self.board.side_to_move() == self.root_color {
            -self.contempt
        } else {
            self.contempt
        }
    }

    /// Reset per-search scratch state while keeping learned tables warm.
    pub fn new_search(&mut self) {
        self.nodes = 0;
        self.seldepth = 0;
        self.aborted = false;
        self.root_color = self.board.side_to_move();
        self.history.decay();
        self.killers.clear();
        self.counters.clear();
    }
}

/// Shift mate scores from root-relative to node-relative before they go
/// into the transposition table.
#[inline]
#[must_use]
pub(crate) fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_IN_MAX {
        score + ply as i32
    } else if score <= -MATE_IN_MAX {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`].
#[inline]
#[must_use]
pub(crate) fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_IN_MAX {
        score - ply as i32
    } else if score <= -MATE_IN_MAX {
        score + ply as i32
    } else {
        score
    }
}

/// Is this a mate-for-us / mate-against-us score?
#[inline]
#[must_use]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_IN_MAX
}

/// Full moves until mate, signed, for UCI `score mate N` output.
#[must_use]
pub fn mate_distance(score: i32) -> Option<i32> {
    if !is_mate_score(score) {
        return None;
    }
    let plies = MATE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{MoveKind, Square};

    fn mv(from: Square, to: Square) -> Move {
        Move::new(from, to, MoveKind::Quiet)
    }

    #[test]
    fn killers_shift_on_insert() {
        let mut killers = KillerTable::new();
        let a = mv(Square::A1, Square::A8);
        let b = mv(Square::B1, Square::B8);
        killers.insert(3, a);
        assert_eq!(killers.get(3), [a, Move::NULL]);
        killers.insert(3, b);
        assert_eq!(killers.get(3), [b, a]);
        // Re-inserting the primary killer must not duplicate it.
        killers.insert(3, b);
        assert_eq!(killers.get(3), [b, a]);
    }

    #[test]
    fn history_is_bounded() {
        let mut history = HistoryTable::new();
        let m = mv(Square::E1, Square::E8);
        for _ in 0..10_000 {
            history.reward(Color::White, m, 10);
        }
        assert_eq!(history.score(Color::White, m), HISTORY_MAX);
        assert_eq!(history.score(Color::Black, m), 0);
        for _ in 0..20_000 {
            history.penalize(Color::White, m, 10);
        }
        assert_eq!(history.score(Color::White, m), -HISTORY_MAX);
    }

    #[test]
    fn history_decay_halves() {
        let mut history = HistoryTable::new();
        let m = mv(Square::E1, Square::E8);
        history.reward(Color::White, m, 10);
        let before = history.score(Color::White, m);
        history.decay();
        assert_eq!(history.score(Color::White, m), before / 2);
    }

    #[test]
    fn counter_moves_key_on_destination() {
        let mut counters = CounterMoveTable::new();
        let prev = mv(Square::E8, Square::E4);
        let reply = mv(Square::D1, Square::E2);
        counters.set(Color::White, prev, reply);
        assert_eq!(counters.get(Color::White, prev), reply);
        let other_prev = mv(Square::A8, Square::E4);
        // Same destination square, same counter.
        assert_eq!(counters.get(Color::White, other_prev), reply);
        assert_eq!(counters.get(Color::Black, prev), Move::NULL);
        assert_eq!(counters.get(Color::White, Move::NULL), Move::NULL);
    }

    #[test]
    fn mate_score_tt_shift_round_trips() {
        let mate_in_3 = MATE - 3;
        let shifted = score_to_tt(mate_in_3, 5);
        assert_eq!(score_from_tt(shifted, 5), mate_in_3);
        let mated_in_2 = -(MATE - 2);
        let shifted = score_to_tt(mated_in_2, 7);
        assert_eq!(score_from_tt(shifted, 7), mated_in_2);
        assert_eq!(score_to_tt(123, 9), 123);
    }

    #[test]
    fn mate_distance_in_moves() {
        assert_eq!(mate_distance(MATE - 1), Some(1));
        assert_eq!(mate_distance(MATE - 2), Some(1));
        assert_eq!(mate_distance(MATE - 3), Some(2));
        assert_eq!(mate_distance(-(MATE - 4)), Some(-2));
        assert_eq!(mate_distance(150), None);
    }
}
