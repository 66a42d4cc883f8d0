//! Static exchange evaluation.
//!
//! Simulates the full alternating capture sequence on one square, always
//! capturing with the least valuable attacker and letting either side
//! stand pat, and returns the resulting material swing for the side
//! making the first capture. X-ray attackers are folded in as pieces
//! vacate the line.

use super::attacks;
use super::bitboard::Bitboard;
use super::moves::Move;
use super::state::Board;
use super::types::{Color, PieceKind};

/// Piece values used by the exchange simulation.
pub(crate) const SEE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20000];

/// Exchange value of a piece kind, shared with move ordering and
/// quiescence delta pruning.
#[inline]
#[must_use]
pub fn see_value(kind: PieceKind) -> i32 {
    SEE_VALUES[kind.index()]
}

impl Board {
    /// Material swing of the capture `mv`, in centipawns, positive when
    /// the exchange favors the mover. Non-captures score 0.
    #[must_use]
    pub fn see(&self, mv: Move) -> i32 {
        let from = mv.from();
        let to = mv.to();

        let Some(attacker) = self.piece_at(from) else {
            return 0;
        };
        let victim = match self.piece_at(to) {
            Some(piece) => piece.kind,
            // En passant: the victim is the pawn behind the target square.
            None if mv.is_en_passant() => PieceKind::Pawn,
            None => return 0,
        };

        const MAX_EXCHANGE: usize = 32;
        let mut gain = [0i32; MAX_EXCHANGE];
        let mut depth = 0;

        let mut occupancy = self.occupied_all();
        let mut attackers = self.attackers_to(to, occupancy);
        let mut side = self.side_to_move();
        let mut from_bb = Bitboard::from_square(from);
        let mut attacker_kind = attacker.kind;

        gain[0] = see_value(victim);

        loop {
            depth += 1;
            if depth >= MAX_EXCHANGE {
                break;
            }
            gain[depth] = see_value(attacker_kind) - gain[depth - 1];

            // Neither continuing nor standing pat can turn a lost exchange
            // around from here.
            if gain[depth].max(-gain[depth - 1]) < 0 {
                break;
            }

            // Remove the capturer and reveal anything x-raying through it.
            occupancy ^= from_bb;
            attackers ^= from_bb;
            attackers |= attacks::bishop_attacks(to, occupancy) & self.diagonal_sliders();
            attackers |= attacks::rook_attacks(to, occupancy) & self.straight_sliders();
            attackers &= occupancy;

            side = side.opponent();
            match self.least_valuable_attacker(attackers, side) {
                Some((bb, kind)) => {
                    // A king may only recapture if that does not leave it
                    // capturable in turn.
                    if kind == PieceKind::King && (attackers & self.occupied(side.opponent())).any()
                    {
                        break;
                    }
                    from_bb = bb;
                    attacker_kind = kind;
                }
                None => break,
            }
        }

        // Collapse the gain list back into a single score, applying the
        // stand-pat choice at every level.
        while depth > 1 {
            depth -= 1;
            gain[depth - 1] = -gain[depth].max(-gain[depth - 1]);
        }
        gain[0]
    }

    /// The least valuable piece of `side` among `attackers`, as a
    /// single-bit board plus its kind.
    fn least_valuable_attacker(
        &self,
        attackers: Bitboard,
        side: Color,
    ) -> Option<(Bitboard, PieceKind)> {
        for kind in [
            PieceKind::Pawn,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
            PieceKind::King,
        ] {
            let subset = attackers & self.pieces(side, kind);
            if subset.any() {
                return Some((Bitboard::from_square(subset.lsb()), kind));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(board: &mut Board, uci: &str) -> Move {
        board.parse_move(uci).unwrap()
    }

    #[test]
    fn knight_takes_undefended_pawn() {
        let mut board: Board = "4k3/8/3p4/8/4N3/8/8/4K3 w - - 0 1".parse().unwrap();
        let mv = capture(&mut board, "e4d6");
        assert_eq!(board.see(mv), 100);
    }

    #[test]
    fn pawn_takes_defended_pawn_is_even() {
        // e4 pawn takes d5 pawn, d5 defended by c6 pawn: PxP, PxP = 0.
        let mut board: Board = "4k3/8/2p5/3p4/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
        let mv = capture(&mut board, "e4d5");
        assert_eq!(board.see(mv), 0);
    }

    #[test]
    fn queen_takes_defended_pawn_loses_queen() {
        // Queen takes a pawn defended by a pawn: +100 - 900 = -800.
        let mut board: Board = "4k3/8/2p5/3p4/8/8/3Q4/4K3 w - - 0 1".parse().unwrap();
        let mv = capture(&mut board, "d2d5");
        assert_eq!(board.see(mv), 100 - 900);
    }

    #[test]
    fn rook_takes_undefended_pawn_wins_pawn() {
        let mut board: Board = "4k3/8/8/3p4/8/8/3R4/4K3 w - - 0 1".parse().unwrap();
        let mv = capture(&mut board, "d2d5");
        assert_eq!(board.see(mv), 100);
    }

    #[test]
    fn xray_support_counts() {
        // White rooks doubled on the d-file versus rook + pawn defense:
        // RxP, RxR, RxR leaves White up a pawn after the dust settles.
        let mut board: Board = "3r1k2/8/8/3p4/8/8/3R4/3RK3 w - - 0 1".parse().unwrap();
        let mv = capture(&mut board, "d2d5");
        assert_eq!(board.see(mv), 100 - 500 + 500);
    }

    #[test]
    fn non_capture_scores_zero() {
        let mut board = Board::new();
        let mv = board.parse_move("e2e4").unwrap();
        assert_eq!(board.see(mv), 0);
    }
}
