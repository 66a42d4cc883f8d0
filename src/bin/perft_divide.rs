//! Perft divide utility: node counts per root move, for pinning down
//! move-generation bugs against a reference engine.
//!
//! Usage: `perft_divide <depth> [fen]` (defaults to the start position).

use std::time::Instant;

use castellan::board::{Board, START_FEN};

fn main() {
    let mut args = std::env::args().skip(1);
    let depth: usize = match args.next().and_then(|d| d.parse().ok()) {
        Some(depth) => depth,
        None => {
            eprintln!("usage: perft_divide <depth> [fen]");
            std::process::exit(2);
        }
    };
    let fen = args.collect::<Vec<_>>().join(" ");
    let fen = if fen.is_empty() { START_FEN } else { &fen };

    let mut board = match Board::from_fen(fen) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("bad fen: {e}");
            std::process::exit(2);
        }
    };

    let start = Instant::now();
    let mut total = 0u64;
    for (mv, nodes) in board.perft_divide(depth) {
        println!("{mv}: {nodes}");
        total += nodes;
    }
    let elapsed = start.elapsed();

    println!();
    println!("depth {depth}: {total} nodes in {:.3}s", elapsed.as_secs_f64());
    if elapsed.as_secs_f64() > 0.0 {
        println!("{:.0} nodes/s", total as f64 / elapsed.as_secs_f64());
    }
}
