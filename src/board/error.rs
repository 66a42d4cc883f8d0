//! Error types for board operations.

use std::fmt;

/// Error type for FEN parsing and position-validation failures.
///
/// A failed parse leaves the caller's board unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN record has fewer than the four mandatory fields.
    TooFewFields { found: usize },
    /// Invalid piece character in the placement field.
    InvalidPiece { char: char },
    /// A rank in the placement field does not describe exactly 8 files.
    BadRankWidth { rank: usize },
    /// The placement field does not describe exactly 8 ranks.
    BadRankCount { found: usize },
    /// Side-to-move field is not `w` or `b`.
    InvalidSideToMove { found: String },
    /// Invalid character in the castling field.
    InvalidCastling { char: char },
    /// Invalid en-passant field.
    InvalidEnPassant { found: String },
    /// Each side must have exactly one king.
    WrongKingCount { color_name: &'static str, found: u32 },
    /// The two kings are on adjacent squares.
    AdjacentKings,
    /// The side that just moved is still in check.
    OpponentInCheck,
    /// A castling right is claimed but king or rook is off its home square.
    ImpossibleCastling { char: char },
    /// Pawns can never stand on the first or eighth rank.
    PawnOnBackRank,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewFields { found } => {
                write!(f, "FEN must have at least 4 fields, found {found}")
            }
            FenError::InvalidPiece { char } => {
                write!(f, "invalid piece character '{char}' in FEN")
            }
            FenError::BadRankWidth { rank } => {
                write!(f, "rank {rank} does not describe 8 files")
            }
            FenError::BadRankCount { found } => {
                write!(f, "expected 8 ranks, found {found}")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
            FenError::InvalidCastling { char } => {
                write!(f, "invalid castling character '{char}' in FEN")
            }
            FenError::InvalidEnPassant { found } => {
                write!(f, "invalid en passant square '{found}'")
            }
            FenError::WrongKingCount { color_name, found } => {
                write!(f, "{color_name} must have exactly one king, found {found}")
            }
            FenError::AdjacentKings => write!(f, "kings on adjacent squares"),
            FenError::OpponentInCheck => {
                write!(f, "side not to move is in check")
            }
            FenError::ImpossibleCastling { char } => {
                write!(f, "castling right '{char}' without king and rook on home squares")
            }
            FenError::PawnOnBackRank => write!(f, "pawn on first or eighth rank"),
        }
    }
}

impl std::error::Error for FenError {}

/// Error type for UCI move-string parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    /// Move string must be 4 or 5 characters.
    InvalidLength { len: usize },
    /// Invalid square notation in the move string.
    InvalidSquare { notation: String },
    /// Invalid promotion piece letter.
    InvalidPromotion { char: char },
    /// The move is syntactically valid but not legal in this position.
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => {
                write!(f, "move must be 4-5 characters, found {len}")
            }
            MoveParseError::InvalidSquare { notation } => {
                write!(f, "invalid square notation in '{notation}'")
            }
            MoveParseError::InvalidPromotion { char } => {
                write!(f, "invalid promotion piece '{char}'")
            }
            MoveParseError::IllegalMove { notation } => {
                write!(f, "illegal move '{notation}'")
            }
        }
    }
}

impl std::error::Error for MoveParseError {}

/// Error type for square parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// Not a file letter followed by a rank digit.
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::InvalidNotation { notation } => {
                write!(f, "invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}
