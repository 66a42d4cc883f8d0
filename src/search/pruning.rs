//! Node-level pruning that can cut a subtree before the move loop runs.
//! All of it is gated on non-PV, not-in-check nodes by the caller.

use crate::board::MoveList;

use super::{SearchThread, MATE_IN_MAX};

impl SearchThread<'_> {
    /// Reverse futility (static null move): when the static eval beats
    /// beta by a depth-scaled margin, trust it.
    pub(super) fn reverse_futility(&self, depth: i32, beta: i32, eval: i32) -> Option<i32> {
        if depth <= self.params.rfp_depth
            && beta.abs() < MATE_IN_MAX
            && eval - self.params.rfp_margin * depth >= beta
        {
            return Some(beta);
        }
        None
    }

    /// Razoring: when the eval is hopelessly below alpha near the leaves,
    /// drop straight into quiescence and accept its verdict if it agrees.
    pub(super) fn razor(
        &mut self,
        depth: i32,
        alpha: i32,
        eval: i32,
        ply: usize,
    ) -> Option<i32> {
        if depth <= self.params.razor_depth
            && alpha.abs() < MATE_IN_MAX
            && eval + self.params.razor_margin * depth < alpha
        {
            let score = self.quiesce(alpha, alpha + 1, ply, 0);
            if self.aborted {
                return Some(0);
            }
            if score <= alpha {
                return Some(score);
            }
        }
        None
    }

    /// Null-move pruning: hand the opponent a free move; if the reduced
    /// search still fails high, the real position is almost certainly a
    /// cutoff. Guarded against zugzwang by the non-pawn-material test and
    /// verified with a reduced normal search at high depth.
    pub(super) fn null_move(
        &mut self,
        depth: i32,
        beta: i32,
        eval: i32,
        ply: usize,
    ) -> Option<i32> {
        if self.disable_null
            || depth < self.params.null_min_depth
            || depth >= self.root_depth
            || eval < beta
            || !self.board.has_non_pawn_material(self.board.side_to_move())
        {
            return None;
        }

        let reduction = 3 + depth / 6;
        let reduced = (depth - 1 - reduction).max(0);

        let undo = self.board.make_null_move();
        let score = -self.alphabeta(reduced, -beta, -beta + 1, ply + 1, false);
        self.board.unmake_null_move(undo);

        if self.aborted {
            return Some(0);
        }
        if score < beta {
            return None;
        }

        // Deep nodes verify the fail-high without the null move, to catch
        // zugzwang lines the material test misses.
        if depth >= self.params.null_verify_depth {
            let verification = self.alphabeta(reduced, beta - 1, beta, ply, false);
            if self.aborted {
                return Some(0);
            }
            if verification < beta {
                return None;
            }
        }

        // Never convert a null-move result into a mate claim.
        Some(beta.min(MATE_IN_MAX - 1))
    }

    /// Multi-cut: if several of the first few moves already refute beta
    /// at reduced depth, declare the node a cut node without a full
    /// search.
    pub(super) fn multi_cut(
        &mut self,
        moves: &MoveList,
        depth: i32,
        beta: i32,
        ply: usize,
    ) -> Option<i32> {
        if depth < self.params.multicut_depth {
            return None;
        }

        let reduced = (depth - self.params.multicut_reduction).max(1);
        let mut cutoffs = 0;

        for &mv in moves.iter().take(self.params.multicut_tries) {
            let undo = self.board.make_move(mv);
            let score = -self.alphabeta(reduced - 1, -beta, -beta + 1, ply + 1, true);
            self.board.unmake_move(mv, undo);

            if self.aborted {
                return Some(0);
            }
            if score >= beta {
                cutoffs += 1;
                if cutoffs >= self.params.multicut_cuts {
                    return Some(beta);
                }
            }
        }

        None
    }
}
