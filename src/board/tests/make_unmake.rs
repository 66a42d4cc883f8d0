//! Make/unmake round-trip tests: after reversing any legal move the board
//! must be identical field-for-field, including the Zobrist key.

use crate::board::{zobrist, Board, MoveKind, PieceKind};

const ROUND_TRIP_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
    "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
    "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 4 20",
];

#[test]
fn every_legal_move_round_trips() {
    for fen in ROUND_TRIP_FENS {
        let mut board = Board::from_fen(fen).unwrap();
        let before = board.clone();
        for &mv in &board.clone().generate_legal() {
            let undo = board.make_move(mv);
            board.assert_consistent();
            board.unmake_move(mv, undo);
            assert_eq!(board, before, "round trip failed for {mv} in {fen}");
        }
    }
}

#[test]
fn castling_moves_both_pieces() {
    let mut board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
    let mv = board.parse_move("e1g1").unwrap();
    assert_eq!(mv.kind(), MoveKind::KingCastle);
    let undo = board.make_move(mv);
    assert_eq!(
        board.piece_at("g1".parse().unwrap()).map(|p| p.kind),
        Some(PieceKind::King)
    );
    assert_eq!(
        board.piece_at("f1".parse().unwrap()).map(|p| p.kind),
        Some(PieceKind::Rook)
    );
    assert!(board.piece_at("h1".parse().unwrap()).is_none());
    board.unmake_move(mv, undo);
    assert_eq!(board.to_fen(), "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
}

#[test]
fn en_passant_removes_pawn_behind_target() {
    let mut board: Board = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1".parse().unwrap();
    let mv = board.parse_move("e5d6").unwrap();
    assert!(mv.is_en_passant());
    let undo = board.make_move(mv);
    assert!(board.piece_at("d5".parse().unwrap()).is_none());
    assert_eq!(
        board.piece_at("d6".parse().unwrap()).map(|p| p.kind),
        Some(PieceKind::Pawn)
    );
    board.unmake_move(mv, undo);
    assert_eq!(
        board.piece_at("d5".parse().unwrap()).map(|p| p.kind),
        Some(PieceKind::Pawn)
    );
}

#[test]
fn promotion_replaces_pawn() {
    let mut board: Board = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
    let mv = board.parse_move("a7a8q").unwrap();
    let undo = board.make_move(mv);
    assert_eq!(
        board.piece_at("a8".parse().unwrap()).map(|p| p.kind),
        Some(PieceKind::Queen)
    );
    assert!(board.pieces(crate::board::Color::White, PieceKind::Pawn).is_empty());
    board.unmake_move(mv, undo);
    assert_eq!(
        board.piece_at("a7".parse().unwrap()).map(|p| p.kind),
        Some(PieceKind::Pawn)
    );
}

#[test]
fn capturing_home_rook_clears_castling_right() {
    let mut board: Board = "r3k2r/8/8/8/8/8/5n2/R3K2R b KQkq - 0 1".parse().unwrap();
    let mv = board.parse_move("f2h1").unwrap();
    let undo = board.make_move(mv);
    use crate::board::CastlingRights;
    assert!(!board.castling_rights().has(CastlingRights::WHITE_KING));
    assert!(board.castling_rights().has(CastlingRights::WHITE_QUEEN));
    board.unmake_move(mv, undo);
    assert_eq!(board.castling_rights(), CastlingRights::ALL);
}

#[test]
fn incremental_key_matches_recompute_along_a_game() {
    let mut board = Board::new();
    for uci in [
        "e2e4", "c7c5", "g1f3", "d7d6", "d2d4", "c5d4", "f3d4", "g8f6", "b1c3", "a7a6",
        "c1g5", "e7e6", "f2f4", "f8e7", "d1f3", "d8c7", "e1c1", "b8d7",
    ] {
        board.make_move_uci(uci).unwrap();
        assert_eq!(board.zobrist_key(), zobrist::compute(&board), "after {uci}");
    }
}

#[test]
fn fullmove_and_halfmove_clocks_track() {
    let mut board = Board::new();
    board.make_move_uci("g1f3").unwrap();
    assert_eq!(board.halfmove_clock(), 1);
    assert_eq!(board.fullmove_number(), 1);
    board.make_move_uci("g8f6").unwrap();
    assert_eq!(board.halfmove_clock(), 2);
    assert_eq!(board.fullmove_number(), 2);
    board.make_move_uci("e2e4").unwrap();
    assert_eq!(board.halfmove_clock(), 0);
}
