//! Legal move generation.
//!
//! Generation runs in two phases: pseudo-legal enumeration per piece kind,
//! then a legality filter that plays each candidate and rejects it if the
//! mover's king is attacked. The filter also covers the awkward cases
//! (pins, en-passant discovered checks) without special-casing them.
//!
//! For a given position the output order is deterministic; the search
//! reorders moves itself.

use super::attacks;
use super::bitboard::Bitboard;
use super::moves::{Move, MoveKind, MoveList};
use super::state::Board;
use super::types::{CastlingRights, Color, PieceKind, Square};

impl Board {
    // ------------------------------------------------------------------
    // Attack queries
    // ------------------------------------------------------------------

    /// Is `sq` attacked by any piece of `by`, with `occupancy` as blockers?
    #[must_use]
    pub(crate) fn square_attacked(&self, sq: Square, by: Color, occupancy: Bitboard) -> bool {
        if (attacks::pawn_attacks(by.opponent(), sq) & self.pieces(by, PieceKind::Pawn)).any() {
            return true;
        }
        if (attacks::knight_attacks(sq) & self.pieces(by, PieceKind::Knight)).any() {
            return true;
        }
        if (attacks::king_attacks(sq) & self.pieces(by, PieceKind::King)).any() {
            return true;
        }
        let diag = self.pieces(by, PieceKind::Bishop) | self.pieces(by, PieceKind::Queen);
        if (attacks::bishop_attacks(sq, occupancy) & diag).any() {
            return true;
        }
        let straight = self.pieces(by, PieceKind::Rook) | self.pieces(by, PieceKind::Queen);
        (attacks::rook_attacks(sq, occupancy) & straight).any()
    }

    /// All pieces of both colors attacking `sq` under the given occupancy.
    /// Used by static exchange evaluation.
    #[must_use]
    pub(crate) fn attackers_to(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        let mut attackers = Bitboard::EMPTY;
        attackers |= attacks::pawn_attacks(Color::Black, sq)
            & self.pieces(Color::White, PieceKind::Pawn);
        attackers |= attacks::pawn_attacks(Color::White, sq)
            & self.pieces(Color::Black, PieceKind::Pawn);
        attackers |= attacks::knight_attacks(sq)
            & (self.pieces(Color::White, PieceKind::Knight)
                | self.pieces(Color::Black, PieceKind::Knight));
        attackers |= attacks::king_attacks(sq)
            & (self.pieces(Color::White, PieceKind::King)
                | self.pieces(Color::Black, PieceKind::King));
        attackers |= attacks::bishop_attacks(sq, occupancy) & self.diagonal_sliders();
        attackers |= attacks::rook_attacks(sq, occupancy) & self.straight_sliders();
        attackers & occupancy
    }

    /// Is `color`'s king currently attacked?
    #[inline]
    #[must_use]
    pub fn king_attacked(&self, color: Color) -> bool {
        self.square_attacked(self.king_square(color), color.opponent(), self.occupied_all())
    }

    /// Is the side to move in check?
    #[inline]
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.king_attacked(self.side_to_move())
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    /// All legal moves for the side to move.
    #[must_use]
    pub fn generate_legal(&mut self) -> MoveList {
        let mut pseudo = MoveList::new();
        self.pseudo_legal(&mut pseudo, false);
        self.filter_legal(pseudo)
    }

    /// The tactical subset: captures (including en passant) and
    /// promotions. Used by quiescence and the capture stages of move
    /// ordering.
    #[must_use]
    pub fn generate_captures(&mut self) -> MoveList {
        let mut pseudo = MoveList::new();
        self.pseudo_legal(&mut pseudo, true);
        self.filter_legal(pseudo)
    }

    fn filter_legal(&mut self, pseudo: MoveList) -> MoveList {
        let mut legal = MoveList::new();
        let us = self.side_to_move();
        for &mv in &pseudo {
            let undo = self.make_move(mv);
            if !self.king_attacked(us) {
                legal.push(mv);
            }
            self.unmake_move(mv, undo);
        }
        legal
    }

    /// Is `mv` legal here? Used to validate moves pulled from the
    /// transposition table before they are trusted.
    #[must_use]
    pub fn is_legal(&mut self, mv: Move) -> bool {
        !mv.is_null() && self.generate_legal().contains(mv)
    }

    fn pseudo_legal(&self, list: &mut MoveList, captures_only: bool) {
        let us = self.side_to_move();
        let own = self.occupied(us);
        let enemy = self.occupied(us.opponent());
        let all = self.occupied_all();

        self.pawn_moves(list, captures_only);

        for from in self.pieces(us, PieceKind::Knight) {
            let targets = attacks::knight_attacks(from) & !own;
            push_piece_moves(list, from, targets, enemy, captures_only);
        }
        for from in self.pieces(us, PieceKind::Bishop) {
            let targets = attacks::bishop_attacks(from, all) & !own;
            push_piece_moves(list, from, targets, enemy, captures_only);
        }
        for from in self.pieces(us, PieceKind::Rook) {
            let targets = attacks::rook_attacks(from, all) & !own;
            push_piece_moves(list, from, targets, enemy, captures_only);
        }
        for from in self.pieces(us, PieceKind::Queen) {
            let targets = attacks::queen_attacks(from, all) & !own;
            push_piece_moves(list, from, targets, enemy, captures_only);
        }

        let king = self.king_square(us);
        let targets = attacks::king_attacks(king) & !own;
        push_piece_moves(list, king, targets, enemy, captures_only);

        if !captures_only {
            self.castling_moves(list);
        }
    }

    fn pawn_moves(&self, list: &mut MoveList, captures_only: bool) {
        let us = self.side_to_move();
        let enemy = self.occupied(us.opponent());
        let all = self.occupied_all();
        let (forward, home_rank, promo_rank) = match us {
            Color::White => (1i8, 1u8, 7u8),
            Color::Black => (-1i8, 6u8, 0u8),
        };

        for from in self.pieces(us, PieceKind::Pawn) {
            // Pushes. The pawn always has a forward square; pawns cannot
            // stand on the back ranks.
            let push = from.offset(0, forward).expect("pawn on back rank");
            if !all.contains(push) {
                if push.rank() == promo_rank {
                    push_promotions(list, from, push, false);
                } else if !captures_only {
                    list.push(Move::new(from, push, MoveKind::Quiet));
                    if from.rank() == home_rank {
                        let double = push.offset(0, forward).expect("double push off board");
                        if !all.contains(double) {
                            list.push(Move::new(from, double, MoveKind::DoublePush));
                        }
                    }
                }
            }

            // Diagonal captures and en passant.
            let attack_set = attacks::pawn_attacks(us, from);
            for to in attack_set & enemy {
                if to.rank() == promo_rank {
                    push_promotions(list, from, to, true);
                } else {
                    list.push(Move::new(from, to, MoveKind::Capture));
                }
            }
            if let Some(ep) = self.en_passant() {
                if attack_set.contains(ep) {
                    list.push(Move::new(from, ep, MoveKind::EnPassant));
                }
            }
        }
    }

    fn castling_moves(&self, list: &mut MoveList) {
        let us = self.side_to_move();
        let them = us.opponent();
        let all = self.occupied_all();
        let rank = us.back_rank();
        let king = Square::from_file_rank(4, rank);

        // A castling right guarantees king and rook are on their home
        // squares (board invariant), so only emptiness and attacks need
        // checking here.
        if self.castling_rights().has(CastlingRights::kingside_bit(us)) {
            let f = Square::from_file_rank(5, rank);
            let g = Square::from_file_rank(6, rank);
            if !all.contains(f)
                && !all.contains(g)
                && !self.square_attacked(king, them, all)
                && !self.square_attacked(f, them, all)
                && !self.square_attacked(g, them, all)
            {
                list.push(Move::new(king, g, MoveKind::KingCastle));
            }
        }
        if self.castling_rights().has(CastlingRights::queenside_bit(us)) {
            let b = Square::from_file_rank(1, rank);
            let c = Square::from_file_rank(2, rank);
            let d = Square::from_file_rank(3, rank);
            if !all.contains(b)
                && !all.contains(c)
                && !all.contains(d)
                && !self.square_attacked(king, them, all)
                && !self.square_attacked(d, them, all)
                && !self.square_attacked(c, them, all)
            {
                list.push(Move::new(king, c, MoveKind::QueenCastle));
            }
        }
    }

    // ------------------------------------------------------------------
    // Perft
    // ------------------------------------------------------------------

    /// Count leaf nodes of the legal move tree at the given depth.
    #[must_use]
    pub fn perft(&mut self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.generate_legal();
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut nodes = 0;
        for &mv in &moves {
            let undo = self.make_move(mv);
            nodes += self.perft(depth - 1);
            self.unmake_move(mv, undo);
        }
        nodes
    }

    /// Perft split by root move, for debugging the generator against a
    /// reference engine.
    #[must_use]
    pub fn perft_divide(&mut self, depth: usize) -> Vec<(Move, u64)> {
        let moves = self.generate_legal();
        let mut results = Vec::with_capacity(moves.len());
        for &mv in &moves {
            let undo = self.make_move(mv);
            let nodes = if depth > 1 { self.perft(depth - 1) } else { 1 };
            self.unmake_move(mv, undo);
            results.push((mv, nodes));
        }
        results
    }
}

fn push_piece_moves(
    list: &mut MoveList,
    from: Square,
    targets: Bitboard,
    enemy: Bitboard,
    captures_only: bool,
) {
    for to in targets & enemy {
        list.push(Move::new(from, to, MoveKind::Capture));
    }
    if !captures_only {
        for to in targets & !enemy {
            list.push(Move::new(from, to, MoveKind::Quiet));
        }
    }
}

fn push_promotions(list: &mut MoveList, from: Square, to: Square, capture: bool) {
    for kind in [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ] {
        list.push(Move::new(from, to, MoveKind::promotion_kind(kind, capture)));
    }
}
