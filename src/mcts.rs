use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::piece::Color;
use crate::board::position::Board;

const REPORT_INTERVAL: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWon,
    BlackWon,
    Draw,
}

/// Outcome counters for one position, keyed by its Zobrist hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeStats {
    pub white_wins: u32,
    pub black_wins: u32,
    pub draws: u32,
}

impl NodeStats {
    #[inline(always)]
    pub fn visits(&self) -> u64 {
        self.white_wins as u64 + self.black_wins as u64 + self.draws as u64
    }
}

/// Owns the UCT tree for one analysis session. Exactly one task touches it;
/// the search's transposition table is never involved.
pub struct MctsContext {
    nodes: HashMap<u64, NodeStats>,
    visited: Vec<u64>,
    rng: StdRng,
}

impl MctsContext {
    pub fn new() -> MctsContext {
        MctsContext::with_seed(rand::thread_rng().gen())
    }

    /// Seeded variant so tests can replay identical rollouts.
    pub fn with_seed(seed: u64) -> MctsContext {
        MctsContext {
            nodes: HashMap::new(),
            visited: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn node(&self, hash: u64) -> NodeStats {
        self.nodes.get(&hash).copied().unwrap_or_default()
    }

    /// Win/loss/draw fractions at a position, if it has been visited.
    pub fn distribution(&self, hash: u64) -> Option<(f64, f64, f64)> {
        let stats = self.nodes.get(&hash)?;
        let visits = stats.visits() as f64;
        if visits == 0.0 {
            return None;
        }
        Some((
            stats.white_wins as f64 / visits,
            stats.black_wins as f64 / visits,
            stats.draws as f64 / visits,
        ))
    }

    /// One selection/expansion/rollout/backpropagation cycle from `board`.
    /// The board is copied; the caller's position is never touched.
    pub fn iteration(&mut self, board: &Board) {
        let mut board = board.clone();
        let side = board.side_to_move;

        self.visited.clear();
        self.visited.push(board.hash());

        let mut legal_moves = board.legal_moves();

        while !legal_moves.is_empty() && !board.is_draw() {
            // UCT selection over the children; an unvisited child is
            // expanded and rolled out on the spot.
            let mut best_score = 0.0f64;
            let mut selected = legal_moves[0];

            let parent_visits = self.node(*self.visited.last().unwrap()).visits() as f64;

            for &mv in &legal_moves {
                board.make_move(mv);
                let child_hash = board.hash();
                let child = self.node(child_hash);

                if child.visits() == 0 {
                    let result = self.rollout(board);
                    self.visited.push(child_hash);
                    self.backpropagate(result);
                    return;
                }

                let visits = child.visits() as f64;
                let wins = match side {
                    Color::White => child.white_wins,
                    Color::Black => child.black_wins,
                } as f64;
                let win_ratio = wins / visits;
                let exploration = (parent_visits.ln() / visits).sqrt();
                let score = win_ratio + std::f64::consts::SQRT_2 * exploration;

                if score > best_score {
                    best_score = score;
                    selected = mv;
                }

                board.unmake_move();
            }

            board.make_move(selected);
            self.visited.push(board.hash());
            legal_moves = board.legal_moves();
        }

        // Terminal position reached inside the tree.
        if board.is_checkmate(Color::White) {
            self.backpropagate(GameResult::BlackWon);
        } else if board.is_checkmate(Color::Black) {
            self.backpropagate(GameResult::WhiteWon);
        } else if board.is_draw() {
            self.backpropagate(GameResult::Draw);
        }
    }

    /// Plays uniformly random legal moves on an owned board until the game
    /// ends.
    fn rollout(&mut self, mut board: Board) -> GameResult {
        loop {
            let moves = board.legal_moves();
            if moves.is_empty() || board.is_draw() {
                break;
            }
            let mv = moves[self.rng.gen_range(0..moves.len())];
            board.make_move(mv);
        }

        if board.is_checkmate(Color::White) {
            GameResult::BlackWon
        } else if board.is_checkmate(Color::Black) {
            GameResult::WhiteWon
        } else {
            GameResult::Draw
        }
    }

    fn backpropagate(&mut self, result: GameResult) {
        for &hash in &self.visited {
            let node = self.nodes.entry(hash).or_default();
            match result {
                GameResult::WhiteWon => node.white_wins += 1,
                GameResult::BlackWon => node.black_wins += 1,
                GameResult::Draw => node.draws += 1,
            }
        }
    }
}

impl Default for MctsContext {
    fn default() -> MctsContext {
        MctsContext::new()
    }
}

fn print_root_report(ctx: &MctsContext, root_hash: u64) {
    if let Some((white, black, draw)) = ctx.distribution(root_hash) {
        println!(
            "mcts {} iterations  w {:.4}  b {:.4}  d {:.4}",
            ctx.node(root_hash).visits(),
            white,
            black,
            draw
        );
    }
}

/// Handle to a background MCTS task. Dropping without `stop()` detaches it;
/// `stop()` raises the flag and joins.
pub struct MctsHandle {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MctsHandle {
    /// Spawns the iteration loop on a background thread. The board is
    /// cloned at entry, so the caller keeps exclusive use of its own copy.
    pub fn spawn(board: &Board) -> MctsHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let board = board.clone();

        let worker = thread::spawn(move || {
            let mut ctx = MctsContext::new();
            let root_hash = board.hash();

            while !worker_stop.load(Ordering::Relaxed) {
                ctx.iteration(&board);
                let iterations = ctx.node(root_hash).visits();
                if iterations % REPORT_INTERVAL == 0 {
                    print_root_report(&ctx, root_hash);
                }
            }

            print_root_report(&ctx, root_hash);
        });

        MctsHandle {
            stop,
            worker: Some(worker),
        }
    }

    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_node_stats_visits() {
        let stats = NodeStats {
            white_wins: 3,
            black_wins: 2,
            draws: 5,
        };
        assert_eq!(stats.visits(), 10);
    }

    #[test]
    fn test_iteration_records_root_visit() {
        let board = Board::startpos();
        let mut ctx = MctsContext::with_seed(7);
        for _ in 0..5 {
            ctx.iteration(&board);
        }
        let root = ctx.node(board.hash());
        assert_eq!(root.visits(), 5);
        let (w, b, d) = ctx.distribution(board.hash()).unwrap();
        assert!((w + b + d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_does_not_touch_caller_board() {
        let board = Board::startpos();
        let before = board.clone();
        let mut ctx = MctsContext::with_seed(11);
        ctx.iteration(&board);
        assert_eq!(board, before);
    }

    #[test]
    fn test_rollout_from_immediate_mate() {
        // Checkmate on the board: the rollout reports the winner without
        // playing a move.
        let board =
            Board::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
                .unwrap();
        let mut ctx = MctsContext::with_seed(3);
        assert_eq!(ctx.rollout(board), GameResult::WhiteWon);
    }

    #[test]
    fn test_rollout_from_stalemate_is_draw() {
        let board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut ctx = MctsContext::with_seed(3);
        assert_eq!(ctx.rollout(board), GameResult::Draw);
    }

    #[test]
    fn test_mate_in_one_is_found_quickly() {
        // White mates with Ra8 almost always once each child has a visit.
        let board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let mut ctx = MctsContext::with_seed(42);
        for _ in 0..300 {
            ctx.iteration(&board);
        }
        // The mating child position has at least one visit and a perfect
        // white score.
        let mut probe = board.clone();
        probe.make_move_uci("a1a8").unwrap();
        let mate_child = ctx.node(probe.hash());
        assert!(mate_child.visits() > 0);
        assert_eq!(mate_child.black_wins, 0);
        assert_eq!(mate_child.draws, 0);
    }

    #[test]
    fn test_background_task_stops_on_flag() {
        let board = Board::startpos();
        let handle = MctsHandle::spawn(&board);
        std::thread::sleep(Duration::from_millis(100));
        handle.stop();
        // Reaching this line means the worker observed the flag and joined.
    }
}
