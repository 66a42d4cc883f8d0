//! Endgame knowledge, consulted only once most of the material is gone.

use crate::board::{Board, Color, PieceKind, Square};

/// Phase at or below which the endgame hooks activate.
pub(super) const ENDGAME_PHASE: i32 = 6;

/// Endgame bonus per step of king centralization.
const KING_ACTIVITY_BONUS: i32 = 8;

/// Bonus for a pawn the defending king can no longer catch.
const UNSTOPPABLE_PAWN_BONUS: i32 = 300;

/// Bonus for holding the opposition in a king-and-pawn ending.
const OPPOSITION_BONUS: i32 = 20;

/// Endgame-only adjustments for `color`, added to the endgame component.
pub(super) fn endgame_terms(board: &Board, color: Color) -> i32 {
    let mut eg = 0;

    // An active king is a fighting piece in the endgame.
    let ksq = board.king_square(color);
    eg += (3 - center_distance(ksq)).max(0) * KING_ACTIVITY_BONUS;

    eg += king_pawn_terms(board, color);

    eg
}

/// Chebyshev distance from the four central squares.
fn center_distance(sq: Square) -> i32 {
    let file = sq.file() as i32;
    let rank = sq.rank() as i32;
    let df = (3 - file).max(file - 4).max(0);
    let dr = (3 - rank).max(rank - 4).max(0);
    df.max(dr)
}

/// Rule-of-the-square and opposition heuristics for K+P endings.
fn king_pawn_terms(board: &Board, color: Color) -> i32 {
    let them = color.opponent();
    let own_pawns = board.pieces(color, PieceKind::Pawn);

    // Only the pure K+P(s) vs K shape is scored here; anything richer is
    // left to the search.
    if board.has_non_pawn_material(color)
        || board.has_non_pawn_material(them)
        || board.pieces(them, PieceKind::Pawn).any()
    {
        return 0;
    }

    let mut eg = 0;
    let defender = board.king_square(them);
    let defender_to_move = board.side_to_move() == them;

    for pawn in own_pawns {
        if pawn_is_unstoppable(pawn, color, defender, defender_to_move) {
            eg += UNSTOPPABLE_PAWN_BONUS;
        }
    }

    // Direct opposition belongs to the side that does NOT have to move.
    let own_king = board.king_square(color);
    if in_direct_opposition(own_king, defender) && board.side_to_move() == them {
        eg += OPPOSITION_BONUS;
    }

    eg
}

/// Rule of the square: can the defending king still reach the promotion
/// square in time?
fn pawn_is_unstoppable(
    pawn: Square,
    color: Color,
    defender: Square,
    defender_to_move: bool,
) -> bool {
    let promo_rank = match color {
        Color::White => 7,
        Color::Black => 0,
    };
    let promo = Square::from_file_rank(pawn.file(), promo_rank);
    // The pawn may start with a double step.
    let mut pawn_steps = pawn.relative_rank(color).abs_diff(7) as i32;
    if pawn.relative_rank(color) == 1 {
        pawn_steps -= 1;
    }
    let defender_steps = defender.distance(promo) as i32 - i32::from(defender_to_move);
    pawn_steps < defender_steps
}

/// Kings facing each other with exactly one square between them.
fn in_direct_opposition(a: Square, b: Square) -> bool {
    (a.file() == b.file() && a.rank().abs_diff(b.rank()) == 2)
        || (a.rank() == b.rank() && a.file().abs_diff(b.file()) == 2)
}
