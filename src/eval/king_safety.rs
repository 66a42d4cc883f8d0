//! King-safety scoring. A middlegame concern; once the queens come off
//! the endgame tables and king-activity terms take over.

use crate::board::{attacks, Bitboard, Board, Color, PieceKind, Square};

/// Bonus per friendly pawn in the 3x3 box around the king.
const SHIELD_PAWN_BONUS: i32 = 30;

/// Penalty per file adjacent to the king with no friendly pawn on it.
const OPEN_FLANK_PENALTY: i32 = 20;

/// Penalty per enemy piece within Chebyshev distance 2 of the king,
/// indexed like `PieceKind` (pawns and kings score zero).
const TROPISM_PENALTY: [i32; 6] = [0, 25, 20, 30, 50, 0];

/// Bonus when the king actually sits on a castled square.
const CASTLED_BONUS: i32 = 50;

/// Middlegame king-safety score for `color`.
pub(super) fn king_safety(board: &Board, color: Color) -> i32 {
    let ksq = board.king_square(color);
    let own_pawns = board.pieces(color, PieceKind::Pawn);
    let mut score = 0;

    // Pawn shield: friendly pawns in the king's immediate box.
    let zone = attacks::king_attacks(ksq) | Bitboard::from_square(ksq);
    score += (zone & own_pawns).popcount() as i32 * SHIELD_PAWN_BONUS;

    // Open flanks next to the king invite rook and queen pressure.
    let kf = ksq.file();
    for file in [kf.checked_sub(1), if kf < 7 { Some(kf + 1) } else { None }]
        .into_iter()
        .flatten()
    {
        if (own_pawns & Bitboard::file(file)).is_empty() {
            score -= OPEN_FLANK_PENALTY;
        }
    }

    // Enemy piece tropism: anything but pawns loitering near the king.
    let them = color.opponent();
    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        for sq in board.pieces(them, kind) {
            if ksq.distance(sq) <= 2 {
                score -= TROPISM_PENALTY[kind.index()];
            }
        }
    }

    if is_castled_square(ksq, color) {
        score += CASTLED_BONUS;
    }

    score
}

/// The squares a completed castle puts the king on.
fn is_castled_square(ksq: Square, color: Color) -> bool {
    ksq.rank() == color.back_rank() && (ksq.file() == 6 || ksq.file() == 2)
}
