//! Iterative deepening with aspiration windows, root move management,
//! MultiPV and principal-variation extraction.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::board::Move;
use crate::tt::{Bound, TtProbe};

use super::ordering::MovePicker;
use super::{is_mate_score, mate_distance, score_to_tt, SearchThread, INFINITY, MATE};

/// One root line: the move, its score and the variation behind it.
#[derive(Clone, Debug)]
pub struct RootLine {
    pub mv: Move,
    pub score: i32,
    pub depth: i32,
    pub pv: Vec<Move>,
}

/// Everything one `info` record carries.
#[derive(Clone, Debug)]
pub struct IterationInfo {
    pub depth: i32,
    pub seldepth: u32,
    pub multipv: usize,
    pub score: i32,
    pub mate_in: Option<i32>,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

/// Sink for per-iteration info records.
pub type InfoCallback = Arc<dyn Fn(&IterationInfo) + Send + Sync>;

/// Driver configuration for one worker's deepening loop.
pub struct IterativeConfig {
    pub max_depth: i32,
    pub start_depth: i32,
    pub multipv: usize,
    /// Initial aspiration half-window; diversified across SMP workers.
    pub aspiration_delta: i32,
    /// Only the primary worker reports and respects the soft limit.
    pub primary: bool,
    pub info: Option<InfoCallback>,
    /// Shared slot the primary worker publishes its best line into after
    /// every completed iteration.
    pub best_slot: Option<Arc<Mutex<Option<RootLine>>>>,
}

impl SearchThread<'_> {
    /// Run iterative deepening to `max_depth` or until stopped. Returns
    /// the best line of the deepest fully completed iteration.
    pub fn iterative_deepening(&mut self, cfg: &IterativeConfig) -> Option<RootLine> {
        let root_moves = self.board.generate_legal();
        if root_moves.is_empty() {
            return None;
        }
        // A position that is already drawn by rule scores zero no matter
        // what the tree says.
        let root_draw = self.board.is_draw();

        let multipv = cfg.multipv.max(1).min(root_moves.len());
        let mut best: Option<RootLine> = None;
        let mut prev_scores = vec![self.evaluator.evaluate(&self.board); multipv];
        let mut stability = 0u32;

        for depth in cfg.start_depth..=cfg.max_depth {
            self.root_depth = depth;
            let mut excluded: Vec<Move> = Vec::with_capacity(multipv);
            let mut iteration_best: Option<RootLine> = None;

            for line_idx in 0..multipv {
                let Some(mut line) =
                    self.aspirate(depth, prev_scores[line_idx], cfg.aspiration_delta, &excluded)
                else {
                    break;
                };
                if root_draw {
                    line.score = 0;
                }
                prev_scores[line_idx] = line.score;
                excluded.push(line.mv);
                if line_idx == 0 {
                    iteration_best = Some(line.clone());
                }

                if let Some(info) = &cfg.info {
                    info(&self.iteration_info(&line, line_idx + 1));
                }
            }

            // Partial iterations are discarded wholesale.
            let Some(line) = iteration_best else { break };
            if self.aborted {
                break;
            }

            match &best {
                Some(prev) if prev.mv == line.mv => stability += 1,
                _ => stability = 0,
            }
            let mate_proven = is_mate_score(line.score) && MATE - line.score.abs() <= depth;
            best = Some(line);

            if let Some(slot) = &cfg.best_slot {
                *slot.lock() = best.clone();
            }

            if mate_proven {
                break;
            }

            // Soft limit: between iterations, and only once the choice
            // has settled.
            if cfg.primary && self.clock.soft_expired() && stability >= 1 {
                self.abort_all();
                break;
            }
        }

        best
    }

    /// Aspiration-window wrapper around the root search: a tight window
    /// around the previous score, widened on failure, fully opened after
    /// repeated failures.
    fn aspirate(
        &mut self,
        depth: i32,
        prev_score: i32,
        initial_delta: i32,
        excluded: &[Move],
    ) -> Option<RootLine> {
        let mut delta = initial_delta;
        let (mut alpha, mut beta) = if depth <= 3 || is_mate_score(prev_score) {
            (-INFINITY, INFINITY)
        } else {
            (prev_score - delta, prev_score + delta)
        };
        let mut fails = 0;

        loop {
            let (score, mv) = self.search_root(depth, alpha, beta, excluded);
            if self.aborted {
                // A completed move from an aborted window is unreliable.
                return None;
            }

            if score <= alpha {
                alpha = alpha.saturating_sub(delta);
                delta *= 2;
                fails += 1;
            } else if score >= beta {
                beta = beta.saturating_add(delta);
                delta *= 2;
                fails += 1;
            } else {
                let pv = self.extract_pv(mv, depth as usize);
                return Some(RootLine {
                    mv,
                    score,
                    depth,
                    pv,
                });
            }

            if fails >= self.params.aspiration_max_fails {
                alpha = -INFINITY;
                beta = INFINITY;
            }
        }
    }

    /// The root node: a full-width PVS loop with no pruning, tracking the
    /// best move directly instead of via the table.
    fn search_root(
        &mut self,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        excluded: &[Move],
    ) -> (i32, Move) {
        let moves = self.board.generate_legal();
        let key = self.board.zobrist_key();
        let tt_move = match self.tt.probe(key, 0) {
            TtProbe::Hit(data) => data.mv,
            TtProbe::Miss { mv } => mv,
        };
        let mut picker = MovePicker::new(&moves, tt_move, self.killers.get(0), Move::NULL);

        let orig_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = Move::NULL;
        let mut move_count = 0usize;

        while let Some((mv, _)) = picker.next(&self.board, &self.history) {
            if excluded.contains(&mv) {
                continue;
            }

            let undo = self.board.make_move(mv);
            let gives_check = self.board.in_check();
            move_count += 1;
            let new_depth = if gives_check { depth } else { depth - 1 };

            let mut score;
            if move_count == 1 {
                score = -self.alphabeta(new_depth, -beta, -alpha, 1, true);
            } else {
                score = -self.alphabeta(new_depth, -alpha - 1, -alpha, 1, true);
                if score > alpha && score < beta {
                    score = -self.alphabeta(new_depth, -beta, -alpha, 1, true);
                }
            }
            self.board.unmake_move(mv, undo);

            if self.aborted {
                return (best_score, best_move);
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        if move_count > 0 && !self.aborted {
            let bound = if best_score >= beta {
                Bound::Lower
            } else if best_score > orig_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt
                .store(key, depth, score_to_tt(best_score, 0), bound, best_move);
        }

        (best_score, best_move)
    }

    /// Rebuild the principal variation by walking transposition-table
    /// best moves, stopping at the iteration depth, a probe miss, an
    /// illegal suggestion or a repetition.
    fn extract_pv(&mut self, first: Move, max_len: usize) -> Vec<Move> {
        let mut pv = Vec::with_capacity(max_len.max(1));
        let mut undos = Vec::with_capacity(max_len.max(1));
        let mut seen_keys = Vec::with_capacity(max_len.max(1));

        if !self.board.is_legal(first) {
            return pv;
        }
        seen_keys.push(self.board.zobrist_key());
        pv.push(first);
        undos.push((first, self.board.make_move(first)));

        while pv.len() < max_len {
            let key = self.board.zobrist_key();
            if seen_keys.contains(&key) {
                break;
            }
            seen_keys.push(key);

            let mv = match self.tt.probe(key, 0) {
                TtProbe::Hit(data) => data.mv,
                TtProbe::Miss { mv } => mv,
            };
            if mv.is_null() || !self.board.is_legal(mv) {
                break;
            }
            pv.push(mv);
            undos.push((mv, self.board.make_move(mv)));
        }

        for (mv, undo) in undos.into_iter().rev() {
            self.board.unmake_move(mv, undo);
        }
        pv
    }

    fn iteration_info(&self, line: &RootLine, multipv: usize) -> IterationInfo {
        let time_ms = self.clock.elapsed_ms();
        let nodes = self.shared_nodes.load(std::sync::atomic::Ordering::Relaxed);
        let nps = if time_ms > 0 {
            nodes * 1000 / time_ms
        } else {
            0
        };
        IterationInfo {
            depth: line.depth,
            seldepth: self.seldepth,
            multipv,
            score: line.score,
            mate_in: mate_distance(line.score),
            nodes,
            nps,
            time_ms,
            hashfull: self.tt.hashfull_per_mille(),
            pv: line.pv.clone(),
        }
    }
}
