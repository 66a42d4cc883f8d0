//! Tactical-safety terms: hanging pieces, outnumbered defenders and
//! exposed queens.

use crate::board::{see_value, Board, Color, PieceKind};

/// Hanging-piece penalty as a fraction of the piece value (times 0.8).
const HANGING_NUM: i32 = 4;
const HANGING_DEN: i32 = 5;

/// Penalty for a valuable piece with more attackers than defenders.
const OUTNUMBERED_DIVISOR: i32 = 8;

/// Penalty for a queen with fewer than this many safe retreat squares.
const QUEEN_TRAPPED_PENALTY: i32 = 40;
const QUEEN_MIN_ESCAPES: u32 = 3;

/// Penalty for an unsupported queen deep in enemy territory.
const QUEEN_OVEREXTENDED_PENALTY: i32 = 30;

/// Accumulate threat scores for `color`'s pieces. The returned value is a
/// penalty total (≤ 0) applied to both game phases.
pub(super) fn threats(board: &Board, color: Color) -> i32 {
    let them = color.opponent();
    let occupancy = board.occupied_all();
    let mut score = 0;

    for kind in [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        for sq in board.pieces(color, kind) {
            let attackers = board.attackers_to(sq, occupancy);
            let enemy_attackers = (attackers & board.occupied(them)).popcount();
            if enemy_attackers == 0 {
                continue;
            }
            let defenders = (attackers & board.occupied(color)).popcount();
            if defenders == 0 {
                // Attacked and undefended: most of the piece is forfeit.
                score -= see_value(kind) * HANGING_NUM / HANGING_DEN;
            } else if see_value(kind) >= see_value(PieceKind::Bishop)
                && enemy_attackers > defenders
            {
                score -= see_value(kind) / OUTNUMBERED_DIVISOR;
            }
        }
    }

    score += queen_safety(board, color);
    score
}

/// Queens with no air or no support are tactical liabilities long before
/// the search can prove the loss.
fn queen_safety(board: &Board, color: Color) -> i32 {
    use crate::board::attacks;

    let them = color.opponent();
    let occupancy = board.occupied_all();
    let own = board.occupied(color);
    let mut score = 0;

    for sq in board.pieces(color, PieceKind::Queen) {
        // Escape-square count only matters once the queen is under fire.
        if board.square_attacked(sq, them, occupancy) {
            let moves = attacks::queen_attacks(sq, occupancy) & !own;
            let mut escapes = 0u32;
            for to in moves {
                if !board.square_attacked(to, them, occupancy) {
                    escapes += 1;
                    if escapes >= QUEEN_MIN_ESCAPES {
                        break;
                    }
                }
            }
            if escapes < QUEEN_MIN_ESCAPES {
                score -= QUEEN_TRAPPED_PENALTY;
            }
        }

        if sq.relative_rank(color) >= 4 {
            let defenders = board.attackers_to(sq, occupancy) & own;
            if defenders.is_empty() {
                score -= QUEEN_OVEREXTENDED_PENALTY;
            }
        }
    }

    score
}
