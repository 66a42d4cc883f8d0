//! Zobrist hashing for positions.
//!
//! Key material is generated once from a fixed-seed PRNG so that hashes
//! are stable across runs. The board maintains its key incrementally
//! through make/unmake; `compute` rebuilds it from scratch and is the
//! reference the incremental updates are tested against.

use std::sync::LazyLock;

use rand::prelude::*;

use super::state::Board;
use super::types::{Color, Piece, Square};

/// Seed for the key-material PRNG. Fixed so hashes are reproducible.
const ZOBRIST_SEED: u64 = 202_406;

pub(crate) struct ZobristKeys {
    /// One key per (color, kind, square); indexed by [`piece_index`].
    pub(crate) piece_keys: [[u64; 64]; 12],
    /// XORed in when Black is to move.
    pub(crate) side_key: u64,
    /// One key per 4-bit castling-rights mask.
    pub(crate) castling_keys: [u64; 16],
    /// One key per en-passant file.
    pub(crate) ep_file_keys: [u64; 8],
}

pub(crate) static ZOBRIST: LazyLock<ZobristKeys> = LazyLock::new(|| {
    let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
    let mut piece_keys = [[0u64; 64]; 12];
    for piece in &mut piece_keys {
        for key in piece.iter_mut() {
            *key = rng.gen();
        }
    }
    let side_key = rng.gen();
    let mut castling_keys = [0u64; 16];
    for key in &mut castling_keys {
        *key = rng.gen();
    }
    let mut ep_file_keys = [0u64; 8];
    for key in &mut ep_file_keys {
        *key = rng.gen();
    }
    ZobristKeys {
        piece_keys,
        side_key,
        castling_keys,
        ep_file_keys,
    }
});

/// Row of `piece_keys` for a colored piece.
#[inline]
pub(crate) fn piece_index(piece: Piece) -> usize {
    piece.color.index() * 6 + piece.kind.index()
}

#[inline]
pub(crate) fn piece_key(piece: Piece, sq: Square) -> u64 {
    ZOBRIST.piece_keys[piece_index(piece)][sq.index()]
}

/// Rebuild the position key from scratch.
#[must_use]
pub fn compute(board: &Board) -> u64 {
    let mut key = 0u64;
    for idx in 0..64 {
        let sq = Square::from_index(idx);
        if let Some(piece) = board.piece_at(sq) {
            key ^= piece_key(piece, sq);
        }
    }
    if board.side_to_move() == Color::Black {
        key ^= ZOBRIST.side_key;
    }
    key ^= ZOBRIST.castling_keys[board.castling_rights().zobrist_index()];
    if let Some(ep) = board.en_passant() {
        key ^= ZOBRIST.ep_file_keys[ep.file() as usize];
    }
    key
}
