//! Cross-module properties: make/unmake bit-identity, incremental-vs-full
//! hashing and buffer bounds, checked over every node of shallow perft
//! walks from varied positions.

use cobalt_chess::board::position::{Board, STARTING_POSITION_FEN};
use cobalt_chess::movegen::legal_moves::generate_legal_moves;
use cobalt_chess::movegen::moves::MAX_MOVES;

const POSITIONS: [&str; 6] = [
    STARTING_POSITION_FEN,
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "8/k1p5/8/KP5r/8/8/6p1/4R2N w - - 0 1",
];

fn walk(board: &mut Board, depth: u8) {
    let moves = generate_legal_moves(board);
    assert!(moves.len() <= MAX_MOVES);

    for &mv in &moves {
        let before = board.clone();
        board.make_move(mv);

        // The incrementally maintained hash must agree with a recompute at
        // every reachable node.
        assert_eq!(board.hash(), board.full_hash(), "hash drift after {}", mv);

        if depth > 1 {
            walk(board, depth - 1);
        }

        board.unmake_move();
        assert_eq!(*board, before, "unmake not bit-identical for {}", mv);
    }
}

#[test]
fn make_unmake_and_hash_hold_across_perft_walks() {
    for fen in POSITIONS {
        let mut board = Board::from_fen(fen).unwrap();
        walk(&mut board, 3);
    }
}

#[test]
fn en_passant_nodes_round_trip() {
    // Reach positions with a live en-passant target and walk them too.
    let mut board = Board::from_fen(STARTING_POSITION_FEN).unwrap();
    board.make_move_uci("e2e4").unwrap();
    board.make_move_uci("a7a6").unwrap();
    board.make_move_uci("e4e5").unwrap();
    board.make_move_uci("d7d5").unwrap();
    assert!(board.en_passant_target().is_some());
    walk(&mut board, 3);
}
