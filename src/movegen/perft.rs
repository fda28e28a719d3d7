use std::time::Instant;

use crate::board::position::{Board, STARTING_POSITION_FEN};
use crate::movegen::legal_moves::generate_legal_moves;
use crate::movegen::moves::Move;

/// Exhaustive leaf count used to validate the move generator. Depth 1 is
/// answered from the move count without walking the subtree.
pub fn perft(board: &mut Board, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut total = 0;
    for &mv in &moves {
        board.make_move(mv);
        total += perft(board, depth - 1);
        board.unmake_move();
    }
    total
}

/// Per-root-move leaf counts for the `go perft` report.
pub fn perft_divide(board: &mut Board, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    let moves = generate_legal_moves(board);
    let mut results = Vec::with_capacity(moves.len());
    for &mv in &moves {
        board.make_move(mv);
        let count = if depth == 1 {
            1
        } else {
            perft(board, depth - 1)
        };
        board.unmake_move();
        results.push((mv, count));
    }
    results
}

pub struct PerftCase {
    pub fen: &'static str,
    pub depth: u8,
    pub expected: u64,
}

/// Known-good totals from published tables; the engine must reproduce every
/// one of them exactly.
pub const PERFT_BATTERY: [PerftCase; 6] = [
    PerftCase {
        fen: STARTING_POSITION_FEN,
        depth: 6,
        expected: 119_060_324,
    },
    PerftCase {
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0",
        depth: 5,
        expected: 193_690_690,
    },
    PerftCase {
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 0",
        depth: 6,
        expected: 11_030_083,
    },
    PerftCase {
        fen: "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        depth: 5,
        expected: 15_833_292,
    },
    PerftCase {
        fen: "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        depth: 5,
        expected: 89_941_194,
    },
    PerftCase {
        fen: "8/k1p5/8/KP5r/8/8/6p1/4R2N w - - 0 1",
        depth: 6,
        expected: 64_081_091,
    },
];

/// Runs the full battery, printing one line per case. Returns false if any
/// total differs from the published value.
pub fn run_test_battery() -> bool {
    let mut passed = 0u32;
    let mut failed = 0u32;

    for case in &PERFT_BATTERY {
        let mut board = Board::from_fen(case.fen).expect("battery FEN parses");
        let start = Instant::now();
        let total = perft(&mut board, case.depth);
        let elapsed = start.elapsed().as_millis();

        print!("test {} depth {} ", case.fen, case.depth);
        if total == case.expected {
            println!("PASSED ({} in {} ms)", total, elapsed);
            passed += 1;
        } else {
            println!("FAILED (expected {} actual {})", case.expected, total);
            failed += 1;
        }
    }

    println!(
        "Tests run: {}. Passed: {}. Failed: {}",
        passed + failed,
        passed,
        failed
    );
    failed == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::moves::MAX_MOVES;

    fn perft_from(fen: &str, depth: u8) -> u64 {
        let mut board = Board::from_fen(fen).unwrap();
        perft(&mut board, depth)
    }

    #[test]
    fn test_startpos_shallow() {
        assert_eq!(perft_from(STARTING_POSITION_FEN, 1), 20);
        assert_eq!(perft_from(STARTING_POSITION_FEN, 2), 400);
        assert_eq!(perft_from(STARTING_POSITION_FEN, 3), 8_902);
        assert_eq!(perft_from(STARTING_POSITION_FEN, 4), 197_281);
    }

    #[test]
    fn test_kiwipete_shallow() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0";
        assert_eq!(perft_from(fen, 1), 48);
        assert_eq!(perft_from(fen, 2), 2_039);
        assert_eq!(perft_from(fen, 3), 97_862);
    }

    #[test]
    fn test_endgame_position_shallow() {
        let fen = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 0";
        assert_eq!(perft_from(fen, 1), 14);
        assert_eq!(perft_from(fen, 2), 191);
        assert_eq!(perft_from(fen, 3), 2_812);
        assert_eq!(perft_from(fen, 4), 43_238);
        assert_eq!(perft_from(fen, 5), 674_624);
    }

    #[test]
    fn test_promotion_heavy_position_shallow() {
        let fen = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
        assert_eq!(perft_from(fen, 1), 6);
        assert_eq!(perft_from(fen, 2), 264);
        assert_eq!(perft_from(fen, 3), 9_467);
        assert_eq!(perft_from(fen, 4), 422_333);
    }

    #[test]
    fn test_talkchess_position_shallow() {
        let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
        assert_eq!(perft_from(fen, 1), 44);
        assert_eq!(perft_from(fen, 2), 1_486);
        assert_eq!(perft_from(fen, 3), 62_379);
    }

    #[test]
    fn test_divide_sums_to_total() {
        let mut board = Board::from_fen(STARTING_POSITION_FEN).unwrap();
        let divide = perft_divide(&mut board, 3);
        assert_eq!(divide.len(), 20);
        let sum: u64 = divide.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, 8_902);
        // Divide must not disturb the board.
        assert_eq!(board, Board::startpos());
    }

    #[test]
    fn test_move_counts_fit_fixed_buffer() {
        // Exercised implicitly by every perft above; spot-check a dense
        // middlegame too.
        let board =
            Board::from_fen("R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNN1KB1 w - - 0 1").unwrap();
        let moves = generate_legal_moves(&board);
        assert!(moves.len() <= MAX_MOVES);
        assert!(moves.len() > 200);
    }

    #[test]
    #[ignore = "full published totals; minutes of runtime"]
    fn test_full_battery() {
        assert!(run_test_battery());
    }
}
