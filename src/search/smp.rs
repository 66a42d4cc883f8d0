//! Lazy-SMP driver.
//!
//! N workers run independent iterative deepening on their own board
//! copies with their own killer/history/counter tables. They share only
//! the transposition table, the stop flag, the node counter and the
//! clock; that sharing alone is the source of the speedup. Helper
//! workers diversify by starting depth, aspiration width and null-move
//! use, so they populate the table with different subtrees.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use log::debug;
use parking_lot::Mutex;

use crate::board::{Board, Move};
use crate::eval::Evaluator;
use crate::tt::{TranspositionTable, TtProbe};

use super::iterative::{InfoCallback, IterativeConfig, RootLine};
use super::{SearchClock, SearchParams, SearchThread};

/// Stack size for search threads; the recursion is deep.
const WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Driver configuration for one `go`.
#[derive(Clone)]
pub struct SmpConfig {
    pub threads: usize,
    pub max_depth: i32,
    pub node_limit: u64,
    pub multipv: usize,
    pub contempt: i32,
    pub params: SearchParams,
    pub info: Option<InfoCallback>,
}

impl Default for SmpConfig {
    fn default() -> Self {
        SmpConfig {
            threads: 1,
            max_depth: super::MAX_PLY as i32 - 1,
            node_limit: 0,
            multipv: 1,
            contempt: 0,
            params: SearchParams::default(),
            info: None,
        }
    }
}

/// Final result of a search.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// `None` when the root position has no legal moves.
    pub best_move: Option<Move>,
    /// Expected reply, for pondering.
    pub ponder_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
    pub time_ms: u64,
}

/// Run a full search: spawn the workers, wait for them, and report the
/// primary worker's last completed iteration.
pub fn search(
    board: &Board,
    evaluator: Arc<dyn Evaluator>,
    tt: Arc<TranspositionTable>,
    stop: Arc<AtomicBool>,
    clock: Arc<SearchClock>,
    config: SmpConfig,
) -> SearchReport {
    let threads = config.threads.max(1);
    let nodes = Arc::new(AtomicU64::new(0));
    let best_slot: Arc<Mutex<Option<RootLine>>> = Arc::new(Mutex::new(None));

    tt.new_generation();
    debug!("search start: {} worker(s), depth {}", threads, config.max_depth);

    let mut results: Vec<Option<RootLine>> = Vec::with_capacity(threads);
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads);
        for id in 0..threads {
            let worker_board = board.clone();
            let evaluator = Arc::clone(&evaluator);
            let tt = Arc::clone(&tt);
            let stop = Arc::clone(&stop);
            let clock = Arc::clone(&clock);
            let nodes = Arc::clone(&nodes);
            let best_slot = Arc::clone(&best_slot);
            let config = config.clone();

            let handle = thread::Builder::new()
                .name(format!("search-{id}"))
                .stack_size(WORKER_STACK_SIZE)
                .spawn_scoped(scope, move || {
                    run_worker(
                        id,
                        worker_board,
                        evaluator.as_ref(),
                        &tt,
                        &stop,
                        &clock,
                        &nodes,
                        best_slot,
                        &config,
                    )
                })
                .expect("failed to spawn search worker");
            handles.push(handle);
        }

        for handle in handles {
            results.push(handle.join().unwrap_or(None));
        }
    });

    // The stop flag is consumed: leave it clear for the next go.
    stop.store(false, Ordering::Relaxed);

    // The primary worker's published line wins; helper results only fill
    // in if the primary never completed an iteration.
    let line = best_slot
        .lock()
        .clone()
        .or_else(|| {
            results
                .into_iter()
                .flatten()
                .max_by_key(|line| line.depth)
        });

    let total_nodes = nodes.load(Ordering::Relaxed);
    let time_ms = clock.elapsed_ms();
    debug!("search done: {} nodes in {} ms", total_nodes, time_ms);

    match line {
        Some(line) => {
            let ponder_move = ponder_from_line(board, &tt, &line);
            SearchReport {
                best_move: Some(line.mv),
                ponder_move,
                score: line.score,
                depth: line.depth,
                nodes: total_nodes,
                time_ms,
            }
        }
        None => SearchReport {
            best_move: None,
            ponder_move: None,
            score: 0,
            depth: 0,
            nodes: total_nodes,
            time_ms,
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    id: usize,
    board: Board,
    evaluator: &dyn Evaluator,
    tt: &TranspositionTable,
    stop: &AtomicBool,
    clock: &SearchClock,
    nodes: &AtomicU64,
    best_slot: Arc<Mutex<Option<RootLine>>>,
    config: &SmpConfig,
) -> Option<RootLine> {
    let mut thread = SearchThread::new(id, board, tt, evaluator, stop, nodes, clock);
    thread.params = config.params.clone();
    thread.node_limit = config.node_limit;
    thread.contempt = config.contempt;
    thread.new_search();

    let primary = id == 0;
    // Diversification: odd helpers start one ply deeper, helpers widen
    // their aspiration windows, and every fourth worker searches without
    // null-move pruning to cover zugzwang-flavored trees.
    let start_depth = 1 + (id % 2) as i32;
    let aspiration_delta = thread.params.aspiration_delta + 16 * (id % 4) as i32;
    thread.disable_null = id % 4 == 3;

    let cfg = IterativeConfig {
        max_depth: config.max_depth.max(start_depth),
        start_depth,
        multipv: if primary { config.multipv } else { 1 },
        aspiration_delta,
        primary,
        info: if primary { config.info.clone() } else { None },
        best_slot: primary.then(|| Arc::clone(&best_slot)),
    };

    let result = thread.iterative_deepening(&cfg);

    // Whichever worker finishes its budget first stops the rest.
    if primary {
        stop.store(true, Ordering::Relaxed);
    }
    result
}

/// Ponder move: the table's reply to the chosen best move, validated for
/// legality in the resulting position.
fn ponder_from_line(board: &Board, tt: &TranspositionTable, line: &RootLine) -> Option<Move> {
    if line.pv.len() >= 2 {
        return Some(line.pv[1]);
    }
    let mut board = board.clone();
    if !board.is_legal(line.mv) {
        return None;
    }
    board.make_move(line.mv);
    let reply = match tt.probe(board.zobrist_key(), 0) {
        TtProbe::Hit(data) => data.mv,
        TtProbe::Miss { mv } => mv,
    };
    (!reply.is_null() && board.is_legal(reply)).then_some(reply)
}
