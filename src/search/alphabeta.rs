use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::board::piece::Color;
use crate::board::position::Board;
use crate::errors::{EngineError, EngineResult};
use crate::eval::evaluate::{piece_value, static_eval};
use crate::movegen::moves::{Move, MoveList};
use crate::search::transposition::{NodeKind, TranspositionTable, DEFAULT_TT_SIZE_MB};

// Plus/minus one so the window endpoints survive negation.
pub const POSITIVE_INFINITY: i32 = i32::MAX - 1;
pub const NEGATIVE_INFINITY: i32 = i32::MIN + 1;

/// Base of the mate scale; a mate found at ply `p` scores `MATE_VALUE - p`
/// from the winner's point of view, so shorter mates always win out.
pub const MATE_VALUE: i32 = 1_000_000;
pub const MAX_SEARCH_DEPTH: u8 = 64;

const PROMOTION_ORDER_BONUS: i32 = 500;
const HASH_MOVE_SCORE: i32 = i32::MAX;

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub positions_evaluated: u64,
    pub tt_hits: u64,
    pub tt_writes: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    pub side_to_move: Color,
    pub best_move: Move,
    pub eval: i32,
    pub depth_searched: u8,
    pub stats: SearchStats,
}

impl SearchResult {
    /// Eval in pawns from White's point of view, for display.
    pub fn standard_eval(&self) -> f64 {
        let white_view = if self.side_to_move == Color::Black {
            -self.eval
        } else {
            self.eval
        };
        white_view as f64 / 100.0
    }
}

/// One search session: owns the transposition table and statistics, and
/// observes a shared stop flag for cooperative cancellation. Tests build
/// independent contexts so nothing leaks between engines.
pub struct SearchContext {
    tt: TranspositionTable,
    stop: Arc<AtomicBool>,
    stats: SearchStats,
}

impl SearchContext {
    pub fn new(tt_size_mb: usize) -> SearchContext {
        SearchContext::with_stop(tt_size_mb, Arc::new(AtomicBool::new(false)))
    }

    pub fn with_stop(tt_size_mb: usize, stop: Arc<AtomicBool>) -> SearchContext {
        SearchContext {
            tt: TranspositionTable::new(tt_size_mb),
            stop,
            stats: SearchStats::default(),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    #[inline(always)]
    fn interrupted(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Fixed-depth negamax from the root. Returns None when the side to
    /// move has no legal moves (mate or stalemate).
    pub fn best_move(&mut self, board: &mut Board, depth: u8) -> Option<SearchResult> {
        self.stats = SearchStats::default();
        let side_to_move = board.side_to_move;

        let mut moves = board.legal_moves();
        if moves.is_empty() {
            return None;
        }
        self.order_moves(board, &mut moves);

        let mut best_move = moves[0];
        let mut best_eval = NEGATIVE_INFINITY;

        for &mv in &moves {
            board.make_move(mv);
            let eval = -self.evaluate(
                board,
                depth.saturating_sub(1),
                1,
                NEGATIVE_INFINITY,
                POSITIVE_INFINITY,
            );
            board.unmake_move();

            if eval > best_eval {
                best_eval = eval;
                best_move = mv;
            }
        }

        Some(SearchResult {
            side_to_move,
            best_move,
            eval: best_eval,
            depth_searched: depth,
            stats: self.stats,
        })
    }

    // Alpha is the best score the side to move can already force; beta is
    // the bound beyond which the opponent has a refutation. Values are from
    // the side to move's point of view and the window flips on recursion.
    fn evaluate(&mut self, board: &mut Board, depth: u8, ply: u8, mut alpha: i32, beta: i32) -> i32 {
        // Cooperative cancellation: once the flag is up, every enclosing
        // call returns immediately and nothing gets published or stored.
        if self.interrupted() {
            return 0;
        }

        if let Some(entry) = self.tt.probe(board.hash()) {
            if entry.depth >= depth {
                self.stats.tt_hits += 1;
                match entry.kind {
                    NodeKind::Exact => return entry.eval,
                    NodeKind::LowerBound if entry.eval > beta => return entry.eval,
                    NodeKind::UpperBound if entry.eval <= alpha => return entry.eval,
                    _ => {}
                }
            }
        }

        if depth == 0 {
            return self.quiescence(board, ply, alpha, beta);
        }

        let mut moves = board.legal_moves();
        if moves.is_empty() {
            if board.is_draw() {
                return 0;
            }
            if board.is_side_in_check(board.side_to_move) {
                // Mates nearer the root score worse for the mated side.
                return -(MATE_VALUE - ply as i32);
            }
            return 0;
        }
        self.order_moves(board, &mut moves);

        // Until a move raises alpha this node is only an upper bound.
        let mut kind = NodeKind::UpperBound;
        let mut best_move = Move::NULL;

        for &mv in &moves {
            board.make_move(mv);
            let eval = -self.evaluate(board, depth - 1, ply + 1, -beta, -alpha);
            board.unmake_move();

            if self.interrupted() {
                return 0;
            }

            if eval >= beta {
                // The opponent has a better option earlier in the tree;
                // this is a lower bound on the true score. Cutoff nodes are
                // deliberately not cached.
                return beta;
            }
            if eval > alpha {
                alpha = eval;
                kind = NodeKind::Exact;
                best_move = mv;
            }
        }

        if kind == NodeKind::Exact && !self.interrupted() {
            self.tt
                .store(NodeKind::Exact, board.hash(), depth, alpha, best_move);
            self.stats.tt_writes += 1;
        }

        alpha
    }

    /// Capture-only extension of the leaves; keeps the horizon effect from
    /// turning hanging pieces into "quiet" evals. Terminates because every
    /// capture strictly shrinks the board.
    fn quiescence(&mut self, board: &mut Board, ply: u8, mut alpha: i32, beta: i32) -> i32 {
        if self.interrupted() {
            return 0;
        }

        self.stats.positions_evaluated += 1;
        let stand_pat = static_eval(board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut captures = board.legal_captures();
        self.order_moves(board, &mut captures);

        for &mv in &captures {
            board.make_move(mv);
            let eval = -self.quiescence(board, ply + 1, -beta, -alpha);
            board.unmake_move();

            if eval >= beta {
                return beta;
            }
            if eval > alpha {
                alpha = eval;
            }
        }

        alpha
    }

    /// Stored best move first, then captures by victim value with a bonus
    /// for promotions. The sort is stable, keeping search deterministic.
    fn order_moves(&mut self, board: &Board, moves: &mut MoveList) {
        let tt_move = self
            .tt
            .probe(board.hash())
            .map(|entry| entry.best_move)
            .unwrap_or(Move::NULL);

        let mut scored: Vec<(i32, Move)> = moves
            .iter()
            .map(|&mv| (move_score(board, mv, tt_move), mv))
            .collect();
        scored.sort_by_key(|&(score, _)| std::cmp::Reverse(score));

        let mut reordered = MoveList::new();
        for (_, mv) in scored {
            reordered.push(mv);
        }
        *moves = reordered;
    }
}

fn move_score(board: &Board, mv: Move, tt_move: Move) -> i32 {
    if !tt_move.is_null() && mv == tt_move {
        return HASH_MOVE_SCORE;
    }

    let mut score = 0;
    let captured = board.piece_at(mv.end());
    if !captured.is_none() {
        score += piece_value(captured.kind());
    } else if mv.is_en_passant() {
        score += piece_value(crate::board::piece::PieceKind::Pawn);
    }
    if mv.is_promotion() {
        score += PROMOTION_ORDER_BONUS;
    }
    score
}

/// Iterative deepening under a wall-clock budget. A background thread
/// deepens one ply at a time and publishes each completed depth; the
/// caller sleeps out the budget, raises the stop flag and joins. The
/// answer is the deepest fully completed search.
pub fn time_limited_search(board: &Board, time_limit: Duration) -> EngineResult<SearchResult> {
    let stop = Arc::new(AtomicBool::new(false));
    let published: Arc<Mutex<Option<SearchResult>>> = Arc::new(Mutex::new(None));

    let worker_stop = Arc::clone(&stop);
    let worker_published = Arc::clone(&published);
    let mut worker_board = board.clone();

    let worker = thread::spawn(move || {
        let mut ctx = SearchContext::with_stop(DEFAULT_TT_SIZE_MB, Arc::clone(&worker_stop));
        for depth in 1..=MAX_SEARCH_DEPTH {
            if worker_stop.load(Ordering::Relaxed) {
                break;
            }
            let Some(result) = ctx.best_move(&mut worker_board, depth) else {
                break;
            };
            if worker_stop.load(Ordering::Relaxed) {
                // Interrupted mid-depth; the partial result is garbage.
                break;
            }
            *worker_published.lock().unwrap() = Some(result);
        }
    });

    thread::sleep(time_limit);
    stop.store(true, Ordering::SeqCst);
    let _ = worker.join();

    let result = published.lock().unwrap().take();
    result.ok_or(EngineError::SearchTimeout)
}

/// Convenience wrapper for fixed-depth search with a fresh context.
pub fn best_move(board: &mut Board, depth: u8) -> Option<SearchResult> {
    SearchContext::new(DEFAULT_TT_SIZE_MB).best_move(board, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as TestInstant;

    #[test]
    fn test_finds_mate_in_one() {
        // Back-rank mate: Ra8#.
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let result = best_move(&mut board, 3).unwrap();
        assert_eq!(result.best_move.to_uci(), "a1a8");
        assert!(result.eval >= MATE_VALUE - 2);
    }

    #[test]
    fn test_prefers_shorter_mate() {
        // Queen and rook vs bare king: mate in two at most. The mate score
        // must be below the mate-in-one band.
        let mut board = Board::from_fen("k7/8/1Q6/8/8/8/8/4K2R w - - 0 1").unwrap();
        let result = best_move(&mut board, 6).unwrap();
        assert!(result.eval > 0);
        let mate_in_one = MATE_VALUE - 1;
        let mate_in_three = MATE_VALUE - 3;
        assert!(result.eval <= mate_in_one);
        assert!(result.eval >= mate_in_three - 2);
    }

    #[test]
    fn test_takes_hanging_queen() {
        let mut board =
            Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/4q3/3P4/PPP1PPPP/RNBQKBNR w KQkq - 0 3")
                .unwrap();
        let result = best_move(&mut board, 3).unwrap();
        assert_eq!(result.best_move.to_uci(), "d3e4");
    }

    #[test]
    fn test_root_with_no_moves_returns_none() {
        let mut mate =
            Board::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
                .unwrap();
        assert!(best_move(&mut mate, 3).is_none());

        let mut stalemate = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(best_move(&mut stalemate, 3).is_none());
    }

    #[test]
    fn test_search_is_deterministic() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut first_board = Board::from_fen(fen).unwrap();
        let first = best_move(&mut first_board, 4).unwrap();
        for _ in 0..3 {
            let mut board = Board::from_fen(fen).unwrap();
            let result = best_move(&mut board, 4).unwrap();
            assert_eq!(result.best_move, first.best_move);
            assert_eq!(result.eval, first.eval);
        }
    }

    #[test]
    fn test_search_leaves_board_unchanged() {
        let fen = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
        let mut board = Board::from_fen(fen).unwrap();
        let before = board.clone();
        best_move(&mut board, 4).unwrap();
        assert_eq!(board, before);
    }

    #[test]
    fn test_quiescence_avoids_horizon_blunder() {
        // At depth 1 a bare material count would love Qxd5 even though the
        // pawn is defended; quiescence sees the recapture.
        let mut board =
            Board::from_fen("k7/8/2p5/3p4/8/8/3Q4/K7 w - - 0 1").unwrap();
        let result = best_move(&mut board, 1).unwrap();
        assert_ne!(result.best_move.to_uci(), "d2d5");
    }

    #[test]
    fn test_stop_flag_interrupts_search() {
        let mut board = Board::startpos();
        let mut ctx = SearchContext::new(1);
        let stop = ctx.stop_flag();
        stop.store(true, Ordering::SeqCst);

        // With the flag already up the search returns essentially at once.
        let start = TestInstant::now();
        let _ = ctx.best_move(&mut board, 12);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_time_limited_search_respects_budget() {
        let board = Board::startpos();
        let start = TestInstant::now();
        let result = time_limited_search(&board, Duration::from_millis(300)).unwrap();
        // At least depth 1 completes within the budget, and the call
        // returns not long after the deadline.
        assert!(result.depth_searched >= 1);
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(!result.best_move.is_null());
    }

    #[test]
    fn test_time_limited_search_on_mated_position_times_out() {
        let board =
            Board::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
                .unwrap();
        let result = time_limited_search(&board, Duration::from_millis(50));
        assert!(matches!(result, Err(EngineError::SearchTimeout)));
    }

    #[test]
    fn test_tt_is_used_across_depths() {
        let mut board = Board::startpos();
        let mut ctx = SearchContext::new(4);
        ctx.best_move(&mut board, 3).unwrap();
        let result = ctx.best_move(&mut board, 4).unwrap();
        assert!(result.stats.tt_hits > 0);
    }
}
