//! Staged move ordering.
//!
//! Moves are handed out in phases so a β-cutoff never pays for scoring
//! the tail: hash move, winning captures (MVV-LVA, SEE-verified), killer
//! moves, the counter move, history-ordered quiets, and finally the
//! losing captures. Each phase deduplicates against earlier ones.

use crate::board::{see_value, Board, Color, Move, MoveList, PieceKind, MAX_MOVES};
use crate::eval::pst::PST_MG;

use super::HistoryTable;

/// Where in the pick order a move came from. The search uses this to
/// exempt tactical and killer moves from reductions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stage {
    HashMove,
    GoodCaptures,
    Killers,
    CounterMove,
    Quiets,
    BadCaptures,
    Done,
}

#[derive(Clone, Copy)]
struct ScoredMove {
    mv: Move,
    score: i32,
}

/// Staged selector over a pre-generated legal move list.
pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    killers: [Move; 2],
    counter: Move,
    killer_idx: usize,

    captures: [ScoredMove; MAX_MOVES],
    n_captures: usize,
    bad_captures: [Move; MAX_MOVES],
    n_bad: usize,
    bad_idx: usize,

    quiets: [ScoredMove; MAX_MOVES],
    n_quiets: usize,
    quiets_scored: bool,
}

impl MovePicker {
    /// Build a picker over `moves`. The hash move, killers and counter
    /// are yielded from their own stages and skipped elsewhere.
    #[must_use]
    pub fn new(moves: &MoveList, tt_move: Move, killers: [Move; 2], counter: Move) -> Self {
        let mut picker = MovePicker {
            stage: Stage::HashMove,
            tt_move: if moves.contains(tt_move) {
                tt_move
            } else {
                Move::NULL
            },
            killers,
            counter,
            killer_idx: 0,
            captures: [ScoredMove {
                mv: Move::NULL,
                score: 0,
            }; MAX_MOVES],
            n_captures: 0,
            bad_captures: [Move::NULL; MAX_MOVES],
            n_bad: 0,
            bad_idx: 0,
            quiets: [ScoredMove {
                mv: Move::NULL,
                score: 0,
            }; MAX_MOVES],
            n_quiets: 0,
            quiets_scored: false,
        };

        for &mv in moves {
            if mv == picker.tt_move {
                continue;
            }
            if mv.is_capture() || mv.is_promotion() {
                picker.captures[picker.n_captures] = ScoredMove { mv, score: 0 };
                picker.n_captures += 1;
            } else {
                picker.quiets[picker.n_quiets] = ScoredMove { mv, score: 0 };
                picker.n_quiets += 1;
            }
        }

        picker
    }

    /// The next move to search, or `None` when exhausted.
    pub fn next(&mut self, board: &Board, history: &HistoryTable) -> Option<(Move, Stage)> {
        loop {
            match self.stage {
                Stage::HashMove => {
                    self.stage = Stage::GoodCaptures;
                    self.score_captures(board);
                    if !self.tt_move.is_null() {
                        return Some((self.tt_move, Stage::HashMove));
                    }
                }
                Stage::GoodCaptures => {
                    while let Some(mv) = self.pop_best_capture() {
                        // Promotions always count as winning tactics; plain
                        // captures must survive an exchange check.
                        if !mv.is_promotion() && board.see(mv) < 0 {
                            self.bad_captures[self.n_bad] = mv;
                            self.n_bad += 1;
                            continue;
                        }
                        return Some((mv, Stage::GoodCaptures));
                    }
                    self.stage = Stage::Killers;
                }
                Stage::Killers => {
                    while self.killer_idx < 2 {
                        let killer = self.killers[self.killer_idx];
                        self.killer_idx += 1;
                        if let Some(idx) = self.find_quiet(killer) {
                            self.remove_quiet(idx);
                            return Some((killer, Stage::Killers));
                        }
                    }
                    self.stage = Stage::CounterMove;
                }
                Stage::CounterMove => {
                    self.stage = Stage::Quiets;
                    let counter = self.counter;
                    if counter != self.killers[0] && counter != self.killers[1] {
                        if let Some(idx) = self.find_quiet(counter) {
                            self.remove_quiet(idx);
                            return Some((counter, Stage::CounterMove));
                        }
                    }
                }
                Stage::Quiets => {
                    if !self.quiets_scored {
                        self.score_quiets(board, history);
                        self.quiets_scored = true;
                    }
                    if let Some(mv) = self.pop_best_quiet() {
                        return Some((mv, Stage::Quiets));
                    }
                    self.stage = Stage::BadCaptures;
                }
                Stage::BadCaptures => {
                    if self.bad_idx < self.n_bad {
                        let mv = self.bad_captures[self.bad_idx];
                        self.bad_idx += 1;
                        return Some((mv, Stage::BadCaptures));
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }

    /// MVV-LVA: victim value dominates, attacker value breaks ties.
    fn score_captures(&mut self, board: &Board) {
        for entry in &mut self.captures[..self.n_captures] {
            let mv = entry.mv;
            let victim = if mv.is_en_passant() {
                PieceKind::Pawn
            } else {
                board.piece_at(mv.to()).map_or(PieceKind::Pawn, |p| p.kind)
            };
            let attacker = board
                .piece_at(mv.from())
                .map_or(PieceKind::Pawn, |p| p.kind);
            let mut score = see_value(victim) * 1000 - see_value(attacker);
            if let Some(promo) = mv.promotion() {
                score += see_value(promo) * 1000;
            }
            entry.score = score;
        }
    }

    /// History plus a small positional delta from the piece-square table.
    fn score_quiets(&mut self, board: &Board, history: &HistoryTable) {
        let side = board.side_to_move();
        for entry in &mut self.quiets[..self.n_quiets] {
            let mv = entry.mv;
            let pst_delta = board.piece_at(mv.from()).map_or(0, |piece| {
                let (from_idx, to_idx) = match side {
                    Color::White => (mv.from().index(), mv.to().index()),
                    Color::Black => (mv.from().flip_rank().index(), mv.to().flip_rank().index()),
                };
                let table = PST_MG[piece.kind.index()];
                table[to_idx] - table[from_idx]
            });
            entry.score = history.score(side, mv) + pst_delta;
        }
    }

    fn pop_best_capture(&mut self) -> Option<Move> {
        if self.n_captures == 0 {
            return None;
        }
        let mut best = 0;
        for i in 1..self.n_captures {
            if self.captures[i].score > self.captures[best].score {
                best = i;
            }
        }
        let mv = self.captures[best].mv;
        self.n_captures -= 1;
        self.captures[best] = self.captures[self.n_captures];
        Some(mv)
    }

    fn pop_best_quiet(&mut self) -> Option<Move> {
        if self.n_quiets == 0 {
            return None;
        }
        let mut best = 0;
        for i in 1..self.n_quiets {
            if self.quiets[i].score > self.quiets[best].score {
                best = i;
            }
        }
        let mv = self.quiets[best].mv;
        self.remove_quiet(best);
        Some(mv)
    }

    fn find_quiet(&self, mv: Move) -> Option<usize> {
        if mv.is_null() || mv == self.tt_move {
            return None;
        }
        (0..self.n_quiets).find(|&i| self.quiets[i].mv == mv)
    }

    fn remove_quiet(&mut self, idx: usize) {
        self.n_quiets -= 1;
        self.quiets[idx] = self.quiets[self.n_quiets];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;

    fn drain(board: &mut Board, tt_move: Move, killers: [Move; 2], counter: Move) -> Vec<(Move, Stage)> {
        let moves = board.generate_legal();
        let mut picker = MovePicker::new(&moves, tt_move, killers, counter);
        let history = HistoryTable::new();
        let mut out = Vec::new();
        while let Some(pick) = picker.next(board, &history) {
            out.push(pick);
        }
        out
    }

    #[test]
    fn yields_every_move_exactly_once() {
        let mut board: Board =
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
                .parse()
                .unwrap();
        let legal = board.generate_legal();
        let picked = drain(&mut board, Move::NULL, [Move::NULL; 2], Move::NULL);
        assert_eq!(picked.len(), legal.len());
        let mut seen = std::collections::HashSet::new();
        for (mv, _) in &picked {
            assert!(seen.insert(*mv), "{mv} yielded twice");
            assert!(legal.contains(*mv));
        }
    }

    #[test]
    fn hash_move_comes_first() {
        let mut board = Board::new();
        let tt_move = board.parse_move("d2d4").unwrap();
        let picked = drain(&mut board, tt_move, [Move::NULL; 2], Move::NULL);
        assert_eq!(picked[0], (tt_move, Stage::HashMove));
    }

    #[test]
    fn killers_come_before_other_quiets() {
        let mut board = Board::new();
        let killer = board.parse_move("h2h3").unwrap();
        let picked = drain(&mut board, Move::NULL, [killer, Move::NULL], Move::NULL);
        // No captures in the start position, so the killer leads.
        assert_eq!(picked[0], (killer, Stage::Killers));
    }

    #[test]
    fn counter_follows_killers() {
        let mut board = Board::new();
        let killer = board.parse_move("h2h3").unwrap();
        let counter = board.parse_move("a2a3").unwrap();
        let picked = drain(&mut board, Move::NULL, [killer, Move::NULL], counter);
        assert_eq!(picked[0], (killer, Stage::Killers));
        assert_eq!(picked[1], (counter, Stage::CounterMove));
    }

    #[test]
    fn losing_captures_come_last() {
        // Queen can capture a defended pawn (losing) or an undefended one.
        let mut board: Board = "4k3/8/2p5/3p4/8/8/3Q4/4K3 w - - 0 1".parse().unwrap();
        let picked = drain(&mut board, Move::NULL, [Move::NULL; 2], Move::NULL);
        let qxd5 = board.parse_move("d2d5").unwrap();
        let last = picked.last().unwrap();
        assert_eq!(last.0, qxd5);
        assert_eq!(last.1, Stage::BadCaptures);
    }

    #[test]
    fn stale_hash_move_is_ignored() {
        let mut board = Board::new();
        // A hash move that is not legal here must not surface.
        let fake = Move::new(
            "a7".parse().unwrap(),
            "a8".parse().unwrap(),
            crate::board::MoveKind::PromoQueen,
        );
        let picked = drain(&mut board, fake, [Move::NULL; 2], Move::NULL);
        assert!(picked.iter().all(|&(mv, _)| mv != fake));
        assert_eq!(picked.len(), 20);
    }
}
