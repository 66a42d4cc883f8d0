//! The UCI front-end loop: reads commands from stdin, drives the engine,
//! writes responses to stdout.

pub mod command;
pub mod report;

use std::io::BufRead;
use std::sync::Arc;

use log::warn;

use crate::engine::{Engine, InfoSink};

use command::UciCommand;

const ENGINE_NAME: &str = concat!("Castellan ", env!("CARGO_PKG_VERSION"));
const ENGINE_AUTHOR: &str = "the castellan authors";

/// Run the UCI loop until `quit` or end of input.
pub fn run() {
    let stdin = std::io::stdin();
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(cmd) = command::parse(&line) else {
            continue;
        };
        if !dispatch(&mut engine, cmd) {
            break;
        }
    }

    // Make sure worker threads are gone before the process exits.
    let _ = engine.stop();
}

/// Handle one command. Returns `false` on `quit`.
fn dispatch(engine: &mut Engine, cmd: UciCommand) -> bool {
    match cmd {
        UciCommand::Uci => {
            println!("id name {ENGINE_NAME}");
            println!("id author {ENGINE_AUTHOR}");
            println!("option name Hash type spin default 64 min 1 max 1024");
            println!("option name Threads type spin default 1 min 1 max 256");
            println!("option name MultiPV type spin default 1 min 1 max 10");
            println!("option name Ponder type check default false");
            println!("option name Move Overhead type spin default 30 min 0 max 5000");
            println!("option name Contempt type spin default 0 min -500 max 500");
            println!("uciok");
        }
        UciCommand::IsReady => println!("readyok"),
        UciCommand::NewGame => engine.new_game(),
        UciCommand::Position { fen, moves } => {
            let moves: Vec<&str> = moves.iter().map(String::as_str).collect();
            if let Err(e) = engine.set_position(fen.as_deref(), &moves) {
                warn!("position rejected: {e}");
                eprintln!("info string error: {e}");
            }
        }
        UciCommand::Go(spec) => {
            let info: InfoSink = Arc::new(|info| {
                println!("{}", report::format_info(info));
            });
            engine.go(
                spec.into(),
                Some(info),
                Box::new(|r| println!("{}", report::format_bestmove(r))),
            );
        }
        UciCommand::Stop => {
            let _ = engine.stop();
        }
        UciCommand::PonderHit => engine.ponder_hit(),
        UciCommand::SetOption { name, value } => {
            if let Err(e) = engine.set_option(&name, &value) {
                warn!("setoption rejected: {e}");
                eprintln!("info string error: {e}");
            }
        }
        UciCommand::Display => println!("{}", engine.board()),
        UciCommand::Perft(depth) => {
            let mut board = engine.board().clone();
            let start = std::time::Instant::now();
            let mut total = 0u64;
            for (mv, nodes) in board.perft_divide(depth) {
                println!("{mv}: {nodes}");
                total += nodes;
            }
            println!("nodes {total} time {} ms", start.elapsed().as_millis());
        }
        UciCommand::Quit => return false,
    }
    true
}
