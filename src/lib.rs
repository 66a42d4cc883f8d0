//! Castellan: a UCI chess engine.
//!
//! The crate is organized as four layers:
//!
//! - [`board`]: bitboard position state, magic-attack move generation,
//!   Zobrist hashing and static exchange evaluation.
//! - [`eval`]: tapered classical evaluation behind the
//!   [`eval::Evaluator`] trait.
//! - [`search`]: principal-variation alpha-beta with a shared
//!   transposition table ([`tt`]) and Lazy-SMP parallelism.
//! - [`engine`] / [`uci`]: the search lifecycle facade and the UCI
//!   protocol front-end built on top of it.
//!
//! # Example
//! ```
//! use castellan::board::Board;
//! use castellan::engine::{time::GoLimits, Engine};
//!
//! let mut engine = Engine::new();
//! engine.set_position(None, &["e2e4", "e7e5"]).unwrap();
//! let report = engine.search_blocking(GoLimits {
//!     depth: Some(4),
//!     ..Default::default()
//! });
//! assert!(report.best_move.is_some());
//! # let _ = Board::new();
//! ```

pub mod board;
pub mod engine;
pub mod eval;
pub mod search;
pub mod tt;
pub mod uci;
