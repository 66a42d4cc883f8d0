//! The principal-variation alpha-beta node.
//!
//! Per node: terminal checks, transposition probe, static evaluation,
//! node-level pruning, then the staged move loop with extensions,
//! late-move reductions and PVS re-searches, and finally the table
//! store. The stop flag short-circuits everything; its sentinel scores
//! never reach the table.

use std::sync::OnceLock;

use crate::board::{Move, PieceKind};
use crate::tt::{Bound, TtProbe};

use super::ordering::{MovePicker, Stage};
use super::{score_from_tt, score_to_tt, SearchThread, INFINITY, MATE, MATE_IN_MAX, MAX_PLY};

/// Reduction table indexed by depth and move number, both clamped.
const LMR_DEPTHS: usize = 64;
const LMR_MOVES: usize = 64;

fn lmr_reduction(depth: i32, move_count: usize) -> i32 {
    static TABLE: OnceLock<[[i32; LMR_MOVES]; LMR_DEPTHS]> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        let mut t = [[0i32; LMR_MOVES]; LMR_DEPTHS];
        for (d, row) in t.iter_mut().enumerate().skip(1) {
            for (m, cell) in row.iter_mut().enumerate().skip(1) {
                let r = 0.5 + (d as f64).ln() * (m as f64).ln() / 2.25;
                *cell = r as i32;
            }
        }
        t
    });
    let d = (depth.max(0) as usize).min(LMR_DEPTHS - 1);
    let m = move_count.min(LMR_MOVES - 1);
    table[d][m]
}

impl SearchThread<'_> {
    /// Search a non-root node. `allow_null` is cleared inside null-move
    /// subtrees so the pass cannot recurse.
    pub(crate) fn alphabeta(
        &mut self,
        depth: i32,
        alpha: i32,
        beta: i32,
        ply: usize,
        allow_null: bool,
    ) -> i32 {
        self.alphabeta_excluded(depth, alpha, beta, ply, allow_null, Move::NULL)
    }

    /// Full node implementation. A non-null `excluded` move is skipped in
    /// the move loop; that variant is only used by the singular-extension
    /// verification search and bypasses the transposition table.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn alphabeta_excluded(
        &mut self,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        allow_null: bool,
        excluded: Move,
    ) -> i32 {
        if self.should_stop() {
            return 0;
        }

        // Fifty-move, repetition and dead-material draws end the line.
        if self.board.halfmove_clock() >= 100
            || self.board.is_repetition()
            || self.board.is_insufficient_material()
        {
            return self.draw_score();
        }

        if depth <= 0 {
            return self.quiesce(alpha, beta, ply, 0);
        }

        self.count_node();
        if ply as u32 + 1 > self.seldepth {
            self.seldepth = ply as u32 + 1;
        }
        if ply >= MAX_PLY - 1 {
            return self.evaluator.evaluate(&self.board);
        }

        let is_pv = beta - alpha > 1;
        let excluded_active = !excluded.is_null();

        // Mate-distance pruning: no line from here can beat an already
        // proven shorter mate.
        alpha = alpha.max(-MATE + ply as i32);
        beta = beta.min(MATE - ply as i32 - 1);
        if alpha >= beta {
            return alpha;
        }

        let key = self.board.zobrist_key();

        let mut tt_move = Move::NULL;
        let mut tt_score = -INFINITY;
        let mut tt_bound: Option<Bound> = None;
        if !excluded_active {
            match self.tt.probe(key, depth) {
                TtProbe::Hit(data) => {
                    tt_move = data.mv;
                    tt_score = score_from_tt(data.score, ply);
                    tt_bound = Some(data.bound);
                    let cutoff = match data.bound {
                        Bound::Exact => true,
                        Bound::Lower => tt_score >= beta,
                        Bound::Upper => tt_score <= alpha,
                    };
                    if cutoff && !is_pv {
                        return tt_score;
                    }
                }
                TtProbe::Miss { mv } => tt_move = mv,
            }
        }

        let in_check = self.board.in_check();
        let eval = if in_check {
            -INFINITY
        } else {
            self.evaluator.evaluate(&self.board)
        };
        self.static_eval[ply] = eval;
        let improving = !in_check && ply >= 2 && eval > self.static_eval[ply - 2];

        // Move generation up front: mate/stalemate detection needs the
        // full list anyway, and multi-cut samples it.
        let moves = self.board.generate_legal();
        if moves.is_empty() {
            return if in_check {
                -MATE + ply as i32
            } else {
                self.draw_score()
            };
        }

        if !is_pv && !in_check && !excluded_active {
            if let Some(score) = self.reverse_futility(depth, beta, eval) {
                return score;
            }
            if let Some(score) = self.razor(depth, alpha, eval, ply) {
                return score;
            }
            if allow_null {
                if let Some(score) = self.null_move(depth, beta, eval, ply) {
                    return score;
                }
            }
            if let Some(score) = self.multi_cut(&moves, depth, beta, ply) {
                return score;
            }
            if self.aborted {
                return 0;
            }
        }

        // Internal iterative deepening: a PV node with no table move is
        // worth a shallow pre-search just to get the ordering right.
        if is_pv && tt_move.is_null() && depth >= self.params.iid_depth && !excluded_active {
            self.alphabeta(depth - 2, alpha, beta, ply, false);
            if self.aborted {
                return 0;
            }
            tt_move = match self.tt.probe(key, i32::MAX) {
                TtProbe::Hit(data) => data.mv,
                TtProbe::Miss { mv } => mv,
            };
        }

        // Singular extension: if every alternative to a trusted table
        // move fails well below its score, that move is forced in spirit
        // and earns an extra ply.
        let mut singular = false;
        if !excluded_active
            && depth >= self.params.singular_depth
            && !tt_move.is_null()
            && tt_score.abs() < MATE_IN_MAX
            && matches!(tt_bound, Some(Bound::Lower | Bound::Exact))
        {
            let margin = self.params.singular_margin * depth;
            let singular_beta = tt_score - margin;
            let singular_depth = (depth - 1) / 2;
            let score = self.alphabeta_excluded(
                singular_depth,
                singular_beta - 1,
                singular_beta,
                ply,
                false,
                tt_move,
            );
            if self.aborted {
                return 0;
            }
            singular = score < singular_beta;
        }

        let us = self.board.side_to_move();
        let prev_move = self.board.last_move();
        let counter = self.counters.get(us, prev_move);
        let mut picker = MovePicker::new(&moves, tt_move, self.killers.get(ply), counter);

        let orig_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = Move::NULL;
        let mut move_count = 0usize;
        let mut quiet_count = 0usize;
        let mut quiets_tried = [Move::NULL; 64];
        let mut quiets_len = 0usize;

        let futile = !in_check
            && depth <= self.params.futility_depth
            && eval + self.params.futility_margin * depth <= alpha;
        let lmp_limit = self.params.lmp_base + (depth * depth) as usize;

        while let Some((mv, stage)) = picker.next(&self.board, &self.history) {
            if mv == excluded {
                continue;
            }
            let is_quiet = mv.is_quiet();

            // Shallow pruning of quiets once something already scores
            // above a mate-for-them floor.
            if !is_pv && !in_check && is_quiet && best_score > -MATE_IN_MAX {
                if futile && move_count > 0 {
                    continue;
                }
                if depth <= self.params.lmp_depth && quiet_count >= lmp_limit {
                    continue;
                }
                if depth <= self.params.history_prune_depth
                    && quiet_count > 2
                    && self.history.score(us, mv) < self.params.history_prune_threshold
                {
                    continue;
                }
            }

            let moving_kind = self
                .board
                .piece_at(mv.from())
                .map_or(PieceKind::Pawn, |p| p.kind);

            let undo = self.board.make_move(mv);
            let gives_check = self.board.in_check();
            move_count += 1;
            if is_quiet {
                quiet_count += 1;
                if quiets_len < quiets_tried.len() {
                    quiets_tried[quiets_len] = mv;
                    quiets_len += 1;
                }
            }

            // Extensions, at most one ply per node.
            let mut extension = 0;
            if gives_check {
                extension = 1;
            } else if singular && mv == tt_move {
                extension = 1;
            } else if mv.is_capture() && prev_move.is_capture() && mv.to() == prev_move.to() {
                // Recapture on the same square.
                extension = 1;
            } else if moving_kind == PieceKind::Pawn && mv.to().relative_rank(us) >= 6 {
                // A pawn reaching the seventh (or promoting) is forcing.
                extension = 1;
            }
            let new_depth = depth - 1 + extension;

            // Late-move reductions for unremarkable quiets.
            let mut reduction = 0;
            if is_quiet
                && depth >= self.params.lmr_min_depth
                && move_count > self.params.lmr_min_moves
                && !in_check
                && !gives_check
                && mv != tt_move
                && !matches!(stage, Stage::Killers | Stage::CounterMove)
            {
                reduction = lmr_reduction(depth, move_count);
                if is_pv {
                    reduction -= 1;
                }
                if !improving {
                    reduction += 1;
                }
                reduction = reduction.clamp(0, new_depth - 1);
            }

            let mut score;
            if move_count == 1 {
                score = -self.alphabeta(new_depth, -beta, -alpha, ply + 1, true);
            } else {
                // Scout with a null window, re-search on promise.
                score =
                    -self.alphabeta(new_depth - reduction, -alpha - 1, -alpha, ply + 1, true);
                if score > alpha && reduction > 0 {
                    score = -self.alphabeta(new_depth, -alpha - 1, -alpha, ply + 1, true);
                }
                if score > alpha && score < beta {
                    score = -self.alphabeta(new_depth, -beta, -alpha, ply + 1, true);
                }
            }
            self.board.unmake_move(mv, undo);

            if self.aborted {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        self.record_cutoff(mv, ply, depth, us, prev_move, &quiets_tried[..quiets_len]);
                        if !excluded_active {
                            self.tt.store(
                                key,
                                depth,
                                score_to_tt(best_score, ply),
                                Bound::Lower,
                                best_move,
                            );
                        }
                        return best_score;
                    }
                }
            }
        }

        // Only reachable when the excluded move was the sole legal reply.
        if move_count == 0 {
            return alpha;
        }

        if !excluded_active && !self.aborted {
            let bound = if best_score > orig_alpha {
                Bound::Exact
            } else {
                Bound::Upper
            };
            self.tt
                .store(key, depth, score_to_tt(best_score, ply), bound, best_move);
        }
        best_score
    }

    /// β-cutoff bookkeeping: killers and counter move for quiets, history
    /// reward for the cutter and penalties for the quiets tried first.
    fn record_cutoff(
        &mut self,
        mv: Move,
        ply: usize,
        depth: i32,
        us: crate::board::Color,
        prev_move: Move,
        quiets_tried: &[Move],
    ) {
        if !mv.is_quiet() {
            return;
        }
        self.killers.insert(ply, mv);
        self.counters.set(us, prev_move, mv);
        self.history.reward(us, mv, depth);
        for &quiet in quiets_tried {
            if quiet != mv {
                self.history.penalize(us, quiet, depth);
            }
        }
    }
}
