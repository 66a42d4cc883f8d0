//! Destructive move execution and its exact inverse.
//!
//! `make_move` mutates the board in place and returns an [`Undo`] record
//! holding everything `unmake_move` needs to restore the previous state
//! bit-for-bit, including the Zobrist key and the clocks. The search keeps
//! these records on its ply stack.

use super::attacks;
use super::moves::{Move, MoveKind};
use super::state::Board;
use super::types::{CastlingRights, Color, Piece, PieceKind, Square};
use super::zobrist::{piece_key, ZOBRIST};

/// State captured by `make_move` so the move can be reversed.
#[derive(Clone, Copy, Debug)]
pub struct Undo {
    captured: Option<Piece>,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    key: u64,
    last_move: Move,
}

/// State captured by `make_null_move`.
#[derive(Clone, Copy, Debug)]
pub struct NullUndo {
    en_passant: Option<Square>,
    key: u64,
    last_move: Move,
}

impl Board {
    /// Play `mv`, which must be legal in the current position.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let mut undo = Undo {
            captured: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            key: self.key,
            last_move: self.last_move,
        };

        self.history.push(self.key);

        let mover = self.side_to_move;
        let from = mv.from();
        let to = mv.to();
        let piece = self.mailbox[from.index()].expect("make_move from an empty square");
        debug_assert_eq!(piece.color, mover);

        // Remove the captured piece first so the destination is free.
        if mv.is_capture() {
            let capture_sq = if mv.is_en_passant() {
                // The captured pawn sits behind the destination square.
                Square::from_file_rank(to.file(), from.rank())
            } else {
                to
            };
            let captured = self.take_piece(capture_sq);
            debug_assert_eq!(captured.color, mover.opponent());
            self.key ^= piece_key(captured, capture_sq);
            undo.captured = Some(captured);
        }

        // Move the piece, swapping in the promotion piece if any.
        self.take_piece(from);
        self.key ^= piece_key(piece, from);
        let placed = match mv.promotion() {
            Some(kind) => Piece::new(mover, kind),
            None => piece,
        };
        self.put_piece(to, placed);
        self.key ^= piece_key(placed, to);

        // Castling also moves the rook.
        if mv.is_castle() {
            let (rook_from, rook_to) = rook_castle_squares(mv.kind(), mover);
            let rook = self.take_piece(rook_from);
            self.key ^= piece_key(rook, rook_from);
            self.put_piece(rook_to, rook);
            self.key ^= piece_key(rook, rook_to);
        }

        // Castling rights fall off when the king or a home rook moves, or
        // when something captures onto a home rook square.
        let old_rights = self.castling;
        if piece.kind == PieceKind::King {
            self.castling.revoke(CastlingRights::side_bits(mover));
        }
        for sq in [from, to] {
            match sq {
                Square::A1 => self.castling.revoke(CastlingRights::WHITE_QUEEN),
                Square::H1 => self.castling.revoke(CastlingRights::WHITE_KING),
                Square::A8 => self.castling.revoke(CastlingRights::BLACK_QUEEN),
                Square::H8 => self.castling.revoke(CastlingRights::BLACK_KING),
                _ => {}
            }
        }
        if self.castling != old_rights {
            self.key ^= ZOBRIST.castling_keys[old_rights.zobrist_index()];
            self.key ^= ZOBRIST.castling_keys[self.castling.zobrist_index()];
        }

        // En passant: clear the old target, set a new one on a double push
        // if an enemy pawn could actually use it.
        if let Some(old_ep) = self.en_passant {
            self.key ^= ZOBRIST.ep_file_keys[old_ep.file() as usize];
        }
        self.en_passant = None;
        if mv.is_double_push() {
            let ep = Square::from_file_rank(from.file(), u8::midpoint(from.rank(), to.rank()));
            let enemy_pawns = self.pieces(mover.opponent(), PieceKind::Pawn);
            if (attacks::pawn_attacks(mover, ep) & enemy_pawns).any() {
                self.en_passant = Some(ep);
                self.key ^= ZOBRIST.ep_file_keys[ep.file() as usize];
            }
        }

        if piece.kind == PieceKind::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if mover == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = mover.opponent();
        self.key ^= ZOBRIST.side_key;
        self.last_move = mv;

        undo
    }

    /// Reverse `mv`, which must be the most recently made move.
    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        self.history.pop();

        let mover = self.side_to_move.opponent();
        self.side_to_move = mover;
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.key = undo.key;
        self.last_move = undo.last_move;
        if mover == Color::Black {
            self.fullmove_number -= 1;
        }

        let from = mv.from();
        let to = mv.to();

        // Walk the piece back, undoing any promotion.
        let moved = self.take_piece(to);
        let original = if mv.is_promotion() {
            Piece::new(mover, PieceKind::Pawn)
        } else {
            moved
        };
        self.put_piece(from, original);

        if let Some(captured) = undo.captured {
            let capture_sq = if mv.is_en_passant() {
                Square::from_file_rank(to.file(), from.rank())
            } else {
                to
            };
            self.put_piece(capture_sq, captured);
        }

        if mv.is_castle() {
            let (rook_from, rook_to) = rook_castle_squares(mv.kind(), mover);
            let rook = self.take_piece(rook_to);
            self.put_piece(rook_from, rook);
        }
    }

    /// Pass the turn: flip the side to move and clear the en-passant
    /// target. Used by null-move pruning only.
    pub fn make_null_move(&mut self) -> NullUndo {
        let undo = NullUndo {
            en_passant: self.en_passant,
            key: self.key,
            last_move: self.last_move,
        };
        if let Some(ep) = self.en_passant {
            self.key ^= ZOBRIST.ep_file_keys[ep.file() as usize];
        }
        self.en_passant = None;
        self.side_to_move = self.side_to_move.opponent();
        self.key ^= ZOBRIST.side_key;
        self.last_move = Move::NULL;
        undo
    }

    pub fn unmake_null_move(&mut self, undo: NullUndo) {
        self.side_to_move = self.side_to_move.opponent();
        self.en_passant = undo.en_passant;
        self.key = undo.key;
        self.last_move = undo.last_move;
    }
}

/// Home and destination squares of the rook in a castling move.
fn rook_castle_squares(kind: MoveKind, color: Color) -> (Square, Square) {
    let rank = color.back_rank();
    match kind {
        MoveKind::KingCastle => (
            Square::from_file_rank(7, rank),
            Square::from_file_rank(5, rank),
        ),
        _ => (
            Square::from_file_rank(0, rank),
            Square::from_file_rank(3, rank),
        ),
    }
}
