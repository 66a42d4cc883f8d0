//! FEN parsing and formatting, plus UCI move-string parsing.
//!
//! Parsing is total: every malformed or structurally impossible input is
//! rejected with a [`FenError`] and the caller's board is left untouched.

use std::str::FromStr;

use super::error::{FenError, MoveParseError};
use super::state::Board;
use super::types::{CastlingRights, Color, Piece, PieceKind, Square};
use super::zobrist;
use super::{attacks, Move};

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Board {
    /// Parse a FEN record.
    ///
    /// Beyond syntax this validates the §7 structural rules: exactly one
    /// king per side, kings not adjacent, the side that just moved not
    /// left in check, no pawns on the back ranks, and castling rights
    /// consistent with king/rook placement.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::TooFewFields {
                found: fields.len(),
            });
        }

        let mut board = Board::empty();

        // Piece placement, rank 8 first.
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount { found: ranks.len() });
        }
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    let kind =
                        PieceKind::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file >= 8 {
                        return Err(FenError::BadRankWidth { rank: rank as usize });
                    }
                    if kind == PieceKind::Pawn && (rank == 0 || rank == 7) {
                        return Err(FenError::PawnOnBackRank);
                    }
                    board.put_piece(Square::from_file_rank(file, rank), Piece::new(color, kind));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::BadRankWidth { rank: rank as usize });
            }
        }

        // Side to move.
        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        // Castling rights, validated against piece placement below.
        if fields[2] != "-" {
            for c in fields[2].chars() {
                let bit = match c {
                    'K' => CastlingRights::WHITE_KING,
                    'Q' => CastlingRights::WHITE_QUEEN,
                    'k' => CastlingRights::BLACK_KING,
                    'q' => CastlingRights::BLACK_QUEEN,
                    _ => return Err(FenError::InvalidCastling { char: c }),
                };
                board.castling.grant(bit);
            }
        }

        // En passant target. Kept only when a capture onto it is actually
        // pseudo-legal, so the stored state (and hash) never carries a
        // phantom target.
        board.en_passant = match fields[3] {
            "-" => None,
            ep_str => {
                let sq: Square = ep_str.parse().map_err(|_| FenError::InvalidEnPassant {
                    found: ep_str.to_string(),
                })?;
                let expected_rank = match board.side_to_move {
                    Color::White => 5,
                    Color::Black => 2,
                };
                if sq.rank() != expected_rank {
                    return Err(FenError::InvalidEnPassant {
                        found: ep_str.to_string(),
                    });
                }
                board.ep_capturable(sq).then_some(sq)
            }
        };

        // Optional clocks.
        if fields.len() >= 5 {
            board.halfmove_clock = fields[4].parse().unwrap_or(0);
        }
        if fields.len() >= 6 {
            board.fullmove_number = fields[5].parse().unwrap_or(1).max(1);
        }

        board.validate_structure()?;

        board.key = zobrist::compute(&board);
        Ok(board)
    }

    /// True when an enemy pawn could capture onto the would-be en-passant
    /// square `ep`.
    pub(crate) fn ep_capturable(&self, ep: Square) -> bool {
        let mover = self.side_to_move;
        // A mover pawn attacks `ep` exactly when it sits on a square the
        // opponent-colored attack set from `ep` reaches.
        (attacks::pawn_attacks(mover.opponent(), ep) & self.pieces(mover, PieceKind::Pawn)).any()
    }

    fn validate_structure(&self) -> Result<(), FenError> {
        for (color, name) in [(Color::White, "white"), (Color::Black, "black")] {
            let kings = self.pieces(color, PieceKind::King).popcount();
            if kings != 1 {
                return Err(FenError::WrongKingCount {
                    color_name: name,
                    found: kings,
                });
            }
        }

        let wk = self.king_square(Color::White);
        let bk = self.king_square(Color::Black);
        if wk.distance(bk) <= 1 {
            return Err(FenError::AdjacentKings);
        }

        // The side that just moved must not still be in check.
        if self.king_attacked(self.side_to_move.opponent()) {
            return Err(FenError::OpponentInCheck);
        }

        for (bit, char, king, rook) in [
            (CastlingRights::WHITE_KING, 'K', Square::E1, Square::H1),
            (CastlingRights::WHITE_QUEEN, 'Q', Square::E1, Square::A1),
            (CastlingRights::BLACK_KING, 'k', Square::E8, Square::H8),
            (CastlingRights::BLACK_QUEEN, 'q', Square::E8, Square::A8),
        ] {
            if !self.castling.has(bit) {
                continue;
            }
            let color = if char.is_ascii_uppercase() {
                Color::White
            } else {
                Color::Black
            };
            let king_ok = self.piece_at(king) == Some(Piece::new(color, PieceKind::King));
            let rook_ok = self.piece_at(rook) == Some(Piece::new(color, PieceKind::Rook));
            if !king_ok || !rook_ok {
                return Err(FenError::ImpossibleCastling { char });
            }
        }

        Ok(())
    }

    /// Format the position as a six-field FEN record.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::from_file_rank(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.kind.to_fen_char(piece.color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        format!(
            "{} {} {} {} {} {}",
            placement,
            match self.side_to_move {
                Color::White => "w",
                Color::Black => "b",
            },
            self.castling,
            self.en_passant.map_or("-".to_string(), |s| s.to_string()),
            self.halfmove_clock,
            self.fullmove_number,
        )
    }

    /// Parse a move in UCI long algebraic notation (`e2e4`, `e7e8q`) and
    /// resolve it against the legal moves of this position.
    pub fn parse_move(&mut self, uci: &str) -> Result<Move, MoveParseError> {
        if !uci.is_ascii() {
            return Err(MoveParseError::InvalidSquare {
                notation: uci.to_string(),
            });
        }
        if uci.len() < 4 || uci.len() > 5 {
            return Err(MoveParseError::InvalidLength { len: uci.len() });
        }

        let from: Square = uci[0..2].parse().map_err(|_| MoveParseError::InvalidSquare {
            notation: uci.to_string(),
        })?;
        let to: Square = uci[2..4].parse().map_err(|_| MoveParseError::InvalidSquare {
            notation: uci.to_string(),
        })?;

        let promotion = match uci.as_bytes().get(4) {
            None => None,
            Some(&c) => {
                let kind = PieceKind::from_char(c as char)
                    .filter(|k| !matches!(k, PieceKind::Pawn | PieceKind::King))
                    .ok_or(MoveParseError::InvalidPromotion { char: c as char })?;
                Some(kind)
            }
        };

        self.generate_legal()
            .iter()
            .copied()
            .find(|m| m.from() == from && m.to() == to && m.promotion() == promotion)
            .ok_or(MoveParseError::IllegalMove {
                notation: uci.to_string(),
            })
    }

    /// Parse a UCI move and play it.
    pub fn make_move_uci(&mut self, uci: &str) -> Result<Move, MoveParseError> {
        let mv = self.parse_move(uci)?;
        self.make_move(mv);
        Ok(mv)
    }
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::from_fen(s)
    }
}
