//! Position evaluation.
//!
//! The classical evaluator accumulates separate middlegame and endgame
//! scores per side, then blends them by a material-based phase value in
//! [0, 24]. Scores are centipawns from the side-to-move's perspective.

mod endgame;
mod king_safety;
mod pawns;
pub mod pst;
mod threats;

use crate::board::{attacks, Bitboard, Board, Color, PieceKind};
use crate::board::bitboard::CENTER;

/// Anything that can score a position. The search is written against this
/// trait so a neural-network evaluator can slot in behind the same
/// interface.
pub trait Evaluator: Send + Sync {
    /// Centipawn score of the position from the side-to-move's view.
    fn evaluate(&self, board: &Board) -> i32;
}

/// The classical hand-written evaluation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Classic;

/// Bonus for owning both bishops.
const BISHOP_PAIR_BONUS: i32 = 50;

/// Rook bonuses: file state and the seventh rank.
const ROOK_OPEN_FILE_BONUS: i32 = 20;
const ROOK_SEMI_OPEN_FILE_BONUS: i32 = 10;
const ROOK_ON_SEVENTH_MG: i32 = 20;
const ROOK_ON_SEVENTH_EG: i32 = 30;

/// Knight outpost bonus (advanced, pawn-backed, unevictable).
const KNIGHT_OUTPOST_MG: i32 = 25;
const KNIGHT_OUTPOST_EG: i32 = 15;

/// Mobility weight per pseudo-legal move, by piece kind.
const MOBILITY_WEIGHTS: [i32; 6] = [0, 4, 3, 2, 1, 0];

/// Bonus per own piece on one of the four central squares.
const CENTER_CONTROL_BONUS: i32 = 30;

/// Middlegame bonus for having the move.
const TEMPO_BONUS: i32 = 10;

impl Evaluator for Classic {
    fn evaluate(&self, board: &Board) -> i32 {
        // Dead-material positions are exact draws regardless of anything
        // else on the card.
        if board.is_insufficient_material() {
            return 0;
        }

        let mut mg = [0i32; 2];
        let mut eg = [0i32; 2];

        for color in [Color::White, Color::Black] {
            let c = color.index();
            material_and_pst(board, color, &mut mg[c], &mut eg[c]);
            pawns::pawn_structure(board, color, &mut mg[c], &mut eg[c]);
            minor_and_major_terms(board, color, &mut mg[c], &mut eg[c]);
            mobility_and_center(board, color, &mut mg[c], &mut eg[c]);
            mg[c] += king_safety::king_safety(board, color);

            let threat_score = threats::threats(board, color);
            mg[c] += threat_score;
            eg[c] += threat_score;

            if board.phase() <= endgame::ENDGAME_PHASE {
                eg[c] += endgame::endgame_terms(board, color);
            }
        }

        // Tempo is a middlegame effect, and means little while in check.
        if !board.in_check() {
            mg[board.side_to_move().index()] += TEMPO_BONUS;
        }

        let phase = board.phase();
        let mg_total = mg[0] - mg[1];
        let eg_total = eg[0] - eg[1];
        let white_score = (mg_total * phase + eg_total * (24 - phase)) / 24;

        match board.side_to_move() {
            Color::White => white_score,
            Color::Black => -white_score,
        }
    }
}

fn material_and_pst(board: &Board, color: Color, mg: &mut i32, eg: &mut i32) {
    for kind in crate::board::PIECE_KINDS {
        for sq in board.pieces(color, kind) {
            // Tables are white-oriented; mirror for Black.
            let idx = match color {
                Color::White => sq.index(),
                Color::Black => sq.flip_rank().index(),
            };
            *mg += pst::MATERIAL[kind.index()] + pst::PST_MG[kind.index()][idx];
            *eg += pst::MATERIAL[kind.index()] + pst::PST_EG[kind.index()][idx];
        }
    }
}

fn minor_and_major_terms(board: &Board, color: Color, mg: &mut i32, eg: &mut i32) {
    if board.pieces(color, PieceKind::Bishop).popcount() >= 2 {
        *mg += BISHOP_PAIR_BONUS;
        *eg += BISHOP_PAIR_BONUS;
    }

    let own_pawns = board.pieces(color, PieceKind::Pawn);
    let enemy_pawns = board.pieces(color.opponent(), PieceKind::Pawn);
    for sq in board.pieces(color, PieceKind::Rook) {
        let file = Bitboard::file(sq.file());
        let bonus = if (file & (own_pawns | enemy_pawns)).is_empty() {
            ROOK_OPEN_FILE_BONUS
        } else if (file & own_pawns).is_empty() {
            ROOK_SEMI_OPEN_FILE_BONUS
        } else {
            0
        };
        *mg += bonus;
        *eg += bonus;

        // A rook on the seventh ties the enemy king to its back rank and
        // eats pawns from behind.
        if sq.relative_rank(color) == 6 {
            *mg += ROOK_ON_SEVENTH_MG;
            *eg += ROOK_ON_SEVENTH_EG;
        }
    }

    // Knight outposts: advanced, pawn-supported, and out of reach of
    // enemy pawns for the rest of the game.
    for sq in board.pieces(color, PieceKind::Knight) {
        let advanced = (3..=5).contains(&sq.relative_rank(color));
        let supported = (attacks::pawn_attacks(color.opponent(), sq) & own_pawns).any();
        if advanced && supported && pawns::safe_from_pawn_attacks(sq, color, enemy_pawns) {
            *mg += KNIGHT_OUTPOST_MG;
            *eg += KNIGHT_OUTPOST_EG;
        }
    }
}

fn mobility_and_center(board: &Board, color: Color, mg: &mut i32, eg: &mut i32) {
    let own = board.occupied(color);
    let all = board.occupied_all();

    let mut mobility = 0;
    for sq in board.pieces(color, PieceKind::Knight) {
        mobility += (attacks::knight_attacks(sq) & !own).popcount() as i32
            * MOBILITY_WEIGHTS[PieceKind::Knight.index()];
    }
    for sq in board.pieces(color, PieceKind::Bishop) {
        mobility += (attacks::bishop_attacks(sq, all) & !own).popcount() as i32
            * MOBILITY_WEIGHTS[PieceKind::Bishop.index()];
    }
    for sq in board.pieces(color, PieceKind::Rook) {
        mobility += (attacks::rook_attacks(sq, all) & !own).popcount() as i32
            * MOBILITY_WEIGHTS[PieceKind::Rook.index()];
    }
    for sq in board.pieces(color, PieceKind::Queen) {
        mobility += (attacks::queen_attacks(sq, all) & !own).popcount() as i32
            * MOBILITY_WEIGHTS[PieceKind::Queen.index()];
    }
    *mg += mobility;
    *eg += mobility;

    let center = (own & CENTER).popcount() as i32 * CENTER_CONTROL_BONUS;
    *mg += center;
    *eg += center;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;

    fn evaluate(fen: &str) -> i32 {
        Classic.evaluate(&fen.parse::<Board>().unwrap())
    }

    /// Mirror a FEN vertically and swap colors: ranks reverse, piece case
    /// flips, side/castling/en-passant swap sides. Evaluation from the
    /// new side-to-move's perspective must be unchanged.
    fn mirrored_fen(fen: &str) -> String {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let placement = fields[0]
            .split('/')
            .rev()
            .map(|rank| {
                rank.chars()
                    .map(|c| {
                        if c.is_ascii_alphabetic() {
                            if c.is_ascii_uppercase() {
                                c.to_ascii_lowercase()
                            } else {
                                c.to_ascii_uppercase()
                            }
                        } else {
                            c
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("/");
        let side = if fields[1] == "w" { "b" } else { "w" };
        let castling: String = if fields[2] == "-" {
            "-".to_string()
        } else {
            let mut flipped: Vec<char> = fields[2]
                .chars()
                .map(|c| {
                    if c.is_ascii_uppercase() {
                        c.to_ascii_lowercase()
                    } else {
                        c.to_ascii_uppercase()
                    }
                })
                .collect();
            flipped.sort_by_key(|c| match c {
                'K' => 0,
                'Q' => 1,
                'k' => 2,
                _ => 3,
            });
            flipped.into_iter().collect()
        };
        let ep = if fields[3] == "-" {
            "-".to_string()
        } else {
            let sq: Square = fields[3].parse().unwrap();
            sq.flip_rank().to_string()
        };
        format!("{placement} {side} {castling} {ep} 0 1")
    }

    fn assert_mirror_symmetric(fen: &str) {
        let board: Board = fen.parse().unwrap();
        let flipped: Board = mirrored_fen(fen).parse().unwrap();
        assert_eq!(
            Classic.evaluate(&board),
            Classic.evaluate(&flipped),
            "evaluation asymmetry for {fen}"
        );
    }

    #[test]
    fn startpos_is_balanced() {
        // White's only edge in the initial position is the tempo bonus.
        let score = evaluate("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(score, TEMPO_BONUS);
    }

    #[test]
    fn material_advantage_shows() {
        // White is up a clean rook.
        let score = evaluate("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert!(score > 400, "rook-up score was {score}");
        // Same position from Black's perspective is as bad.
        let score = evaluate("4k3/8/8/8/8/8/8/R3K3 b - - 0 1");
        assert!(score < -400);
    }

    #[test]
    fn evaluation_is_mirror_symmetric() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1",
            "4k3/8/8/3p4/8/8/3P4/4K3 b - - 0 1",
        ] {
            assert_mirror_symmetric(fen);
        }
    }

    #[test]
    fn insufficient_material_evaluates_to_zero() {
        assert_eq!(evaluate("8/8/8/4k3/8/8/8/4K3 w - - 0 1"), 0);
        assert_eq!(evaluate("8/8/8/4k3/8/8/8/3BK3 w - - 0 1"), 0);
    }

    #[test]
    fn bishop_pair_is_worth_something() {
        let pair = evaluate("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1");
        let single = evaluate("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1");
        assert!(pair > single + 300, "pair {pair} vs single {single}");
    }

    #[test]
    fn rook_prefers_open_files() {
        // Rook on an open file versus behind its own pawn.
        let open = evaluate("4k3/6p1/8/8/8/8/4P3/R3K3 w - - 0 1");
        let closed = evaluate("4k3/6p1/8/8/8/8/P3P3/R3K3 w - - 0 1");
        // The closed position has an extra pawn yet the rook is buried;
        // the file bonus and mobility claw back most of the pawn.
        assert!(closed - open < 110, "closed {closed} open {open}");
    }

    #[test]
    fn deterministic() {
        let board: Board =
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
                .parse()
                .unwrap();
        assert_eq!(Classic.evaluate(&board), Classic.evaluate(&board));
    }
}
