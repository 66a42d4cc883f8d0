//! Engine facade tests: position handling, options, search lifecycle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use castellan::engine::time::GoLimits;
use castellan::engine::{Engine, OptionError, PositionError};

#[test]
fn set_position_startpos_and_moves() {
    let mut engine = Engine::new();
    engine.set_position(None, &["e2e4", "c7c5"]).unwrap();
    assert_eq!(
        engine.board().to_fen(),
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
    );
}

#[test]
fn bad_fen_leaves_board_unchanged() {
    let mut engine = Engine::new();
    engine.set_position(None, &["e2e4"]).unwrap();
    let before = engine.board().to_fen();
    let err = engine.set_position(Some("not a fen"), &[]).unwrap_err();
    assert!(matches!(err, PositionError::InvalidFen(_)));
    assert_eq!(engine.board().to_fen(), before);
}

#[test]
fn bad_move_keeps_earlier_moves_applied() {
    let mut engine = Engine::new();
    let err = engine
        .set_position(None, &["e2e4", "e7e5", "e4e6"])
        .unwrap_err();
    assert!(matches!(err, PositionError::IllegalMove { .. }));
    // e2e4 and e7e5 are on the board; the bad move is not.
    assert_eq!(
        engine.board().to_fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
    );
}

#[test]
fn option_validation() {
    let mut engine = Engine::new();
    engine.set_option("Hash", "128").unwrap();
    engine.set_option("Threads", "2").unwrap();
    engine.set_option("MultiPV", "3").unwrap();
    engine.set_option("Ponder", "true").unwrap();
    engine.set_option("Move Overhead", "100").unwrap();
    engine.set_option("Contempt", "-20").unwrap();

    assert!(matches!(
        engine.set_option("Hash", "0"),
        Err(OptionError::InvalidValue { .. })
    ));
    assert!(matches!(
        engine.set_option("Hash", "4096"),
        Err(OptionError::InvalidValue { .. })
    ));
    assert!(matches!(
        engine.set_option("MultiPV", "11"),
        Err(OptionError::InvalidValue { .. })
    ));
    assert!(matches!(
        engine.set_option("NoSuchOption", "1"),
        Err(OptionError::UnknownOption { .. })
    ));
}

#[test]
fn stop_interrupts_an_infinite_search() {
    let mut engine = Engine::new();
    engine.set_position(None, &[]).unwrap();
    engine.go(
        GoLimits {
            infinite: true,
            ..Default::default()
        },
        None,
        Box::new(|_| {}),
    );
    std::thread::sleep(Duration::from_millis(100));
    let started = Instant::now();
    let report = engine.stop().expect("search was running");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(report.best_move.is_some());
}

#[test]
fn movetime_is_honored() {
    let mut engine = Engine::new();
    engine.set_position(None, &[]).unwrap();
    let started = Instant::now();
    let report = engine.search_blocking(GoLimits {
        movetime: Some(200),
        ..Default::default()
    });
    assert!(
        started.elapsed() < Duration::from_millis(2000),
        "movetime overshot: {:?}",
        started.elapsed()
    );
    assert!(report.best_move.is_some());
}

#[test]
fn info_callback_fires_per_iteration() {
    let mut engine = Engine::new();
    engine.set_position(None, &[]).unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    let count_in_cb = Arc::clone(&count);
    engine.go(
        GoLimits {
            depth: Some(5),
            ..Default::default()
        },
        Some(Arc::new(move |info| {
            assert!(info.depth >= 1);
            assert!(!info.pv.is_empty());
            count_in_cb.fetch_add(1, Ordering::Relaxed);
        })),
        Box::new(|_| {}),
    );
    let _ = engine.wait();
    assert!(count.load(Ordering::Relaxed) >= 5);
}

#[test]
fn multipv_reports_distinct_lines() {
    let mut engine = Engine::new();
    engine.set_option("MultiPV", "3").unwrap();
    engine.set_position(None, &[]).unwrap();
    let moves = Arc::new(std::sync::Mutex::new(Vec::new()));
    let moves_in_cb = Arc::clone(&moves);
    engine.go(
        GoLimits {
            depth: Some(4),
            ..Default::default()
        },
        Some(Arc::new(move |info| {
            if info.depth == 4 {
                moves_in_cb.lock().unwrap().push((info.multipv, info.pv[0]));
            }
        })),
        Box::new(|_| {}),
    );
    let _ = engine.wait();
    let lines = moves.lock().unwrap().clone();
    let depth4: Vec<_> = lines.iter().map(|&(_, mv)| mv).collect();
    assert!(depth4.len() >= 3, "expected 3 lines, got {depth4:?}");
    assert_ne!(depth4[0], depth4[1]);
    assert_ne!(depth4[1], depth4[2]);
}

#[test]
fn new_game_clears_state_between_searches() {
    let mut engine = Engine::new();
    engine.set_position(None, &["e2e4"]).unwrap();
    let _ = engine.search_blocking(GoLimits {
        depth: Some(4),
        ..Default::default()
    });
    engine.new_game();
    assert_eq!(engine.board().to_fen(), castellan::board::START_FEN);
}
