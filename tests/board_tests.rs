//! Board-level integration tests through the public API.

use castellan::board::{zobrist, Board, Color, PieceKind, START_FEN};

#[test]
fn startpos_has_twenty_moves() {
    let mut board = Board::new();
    assert_eq!(board.generate_legal().len(), 20);
}

#[test]
fn perft_startpos_depth_four() {
    let mut board = Board::new();
    assert_eq!(board.perft(4), 197_281);
}

#[test]
fn perft_kiwipete_depth_three() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    assert_eq!(board.perft(3), 97_862);
}

#[test]
fn fen_round_trip_along_a_game() {
    let mut board = Board::new();
    for mv in ["e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4"] {
        board.make_move_uci(mv).unwrap();
        let fen = board.to_fen();
        let reparsed = Board::from_fen(&fen).unwrap();
        assert_eq!(reparsed.to_fen(), fen, "round trip diverged after {mv}");
        assert_eq!(reparsed.zobrist_key(), board.zobrist_key());
        assert_eq!(reparsed.castling_rights(), board.castling_rights());
        assert_eq!(reparsed.en_passant(), board.en_passant());
    }
}

#[test]
fn zobrist_stays_in_sync() {
    let mut board = Board::from_fen(START_FEN).unwrap();
    for mv in ["d2d4", "g8f6", "c2c4", "e7e6", "b1c3", "f8b4"] {
        board.make_move_uci(mv).unwrap();
        assert_eq!(board.zobrist_key(), zobrist::compute(&board));
    }
}

#[test]
fn illegal_uci_moves_are_rejected() {
    let mut board = Board::new();
    assert!(board.make_move_uci("e2e5").is_err());
    assert!(board.make_move_uci("e7e5").is_err());
    assert!(board.make_move_uci("junk").is_err());
    // Board unchanged by the failures.
    assert_eq!(board.to_fen(), START_FEN);
}

#[test]
fn castling_through_check_is_illegal() {
    // Black rook on f8 covers f1; white may not castle kingside.
    let mut board = Board::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    let moves = board.generate_legal();
    assert!(!moves.iter().any(|m| m.to_string() == "e1g1"));
    assert!(moves.iter().any(|m| m.to_string() == "e1c1"));
}

#[test]
fn en_passant_discovered_check_is_illegal() {
    // Capturing en passant would expose the white king to the h5 rook.
    let mut board = Board::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1").unwrap();
    let moves = board.generate_legal();
    assert!(!moves.iter().any(|m| m.is_en_passant()));
}

#[test]
fn promotion_generates_four_choices() {
    let mut board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let moves = board.generate_legal();
    let promos: Vec<_> = moves.iter().filter(|m| m.is_promotion()).collect();
    assert_eq!(promos.len(), 4);
}

#[test]
fn side_attack_queries() {
    let board = Board::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
    assert!(board.king_attacked(Color::White));
    assert!(!board.king_attacked(Color::Black));
    assert!(board.in_check());
}

#[test]
fn see_on_a_real_exchange() {
    // Bishop takes a knight defended by a pawn: 320 - 330 = -10.
    let mut board =
        Board::from_fen("4k3/8/2p5/3n4/8/5B2/8/4K3 w - - 0 1").unwrap();
    let mv = board.parse_move("f3d5").unwrap();
    assert_eq!(board.see(mv), 320 - 330);
    assert_eq!(
        board.piece_at(mv.to()).map(|p| p.kind),
        Some(PieceKind::Knight)
    );
}
