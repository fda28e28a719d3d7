use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use crate::board::position::{Board, STARTING_POSITION_FEN};
use crate::eval::evaluate::print_eval_breakdown;
use crate::mcts::MctsHandle;
use crate::movegen::perft;
use crate::search::alphabeta::{time_limited_search, SearchContext, SearchResult};
use crate::search::transposition::DEFAULT_TT_SIZE_MB;

const ENGINE_NAME: &str = "cobalt-chess";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

struct UciEngine {
    board: Board,
    mcts: Option<MctsHandle>,
}

/// Line-oriented command loop. Returns the process exit code: zero unless
/// the built-in perft battery reported a failure.
pub fn run_uci() -> i32 {
    println!("{} {}", ENGINE_NAME, ENGINE_VERSION);

    let mut engine = UciEngine {
        board: Board::startpos(),
        mcts: None,
    };

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match engine.handle_command(trimmed) {
            CommandOutcome::Continue => {}
            CommandOutcome::Quit => break,
            CommandOutcome::Exit(code) => return code,
        }
        let _ = io::stdout().flush();
    }

    if let Some(handle) = engine.mcts.take() {
        handle.stop();
    }
    0
}

enum CommandOutcome {
    Continue,
    Quit,
    Exit(i32),
}

impl UciEngine {
    fn handle_command(&mut self, command: &str) -> CommandOutcome {
        let parts: Vec<&str> = command.split_whitespace().collect();

        match parts[0] {
            "position" => self.position_command(&parts),
            "go" => self.go_command(&parts),
            "d" => self.display_command(),
            "test" => {
                if !perft::run_test_battery() {
                    return CommandOutcome::Exit(1);
                }
            }
            "mcts" => {
                if self.mcts.is_none() {
                    self.mcts = Some(MctsHandle::spawn(&self.board));
                }
            }
            "stop" => {
                if let Some(handle) = self.mcts.take() {
                    handle.stop();
                }
            }
            "quit" => return CommandOutcome::Quit,
            _ => println!("Invalid command"),
        }

        CommandOutcome::Continue
    }

    fn position_command(&mut self, parts: &[&str]) {
        let moves_at = parts.iter().position(|&p| p == "moves");

        let loaded = match parts.get(1) {
            Some(&"startpos") => self.board.load_fen(STARTING_POSITION_FEN),
            Some(&"fen") => {
                let fen_end = moves_at.unwrap_or(parts.len());
                let fen = parts[2..fen_end].join(" ");
                self.board.load_fen(&fen)
            }
            _ => {
                println!("Invalid command");
                return;
            }
        };

        if let Err(error) = loaded {
            println!("{error}");
            return;
        }

        if let Some(moves_at) = moves_at {
            for &mv in &parts[moves_at + 1..] {
                if let Err(error) = self.board.make_move_uci(mv) {
                    println!("{error}");
                    return;
                }
            }
        }
    }

    fn go_command(&mut self, parts: &[&str]) {
        match (parts.get(1), parts.get(2)) {
            (Some(&"depth"), Some(depth)) => {
                let Ok(depth) = depth.parse::<u8>() else {
                    println!("Invalid depth");
                    return;
                };
                let start = Instant::now();
                let result =
                    SearchContext::new(DEFAULT_TT_SIZE_MB).best_move(&mut self.board, depth);
                match result {
                    Some(result) => {
                        print_search_result(&result);
                        println!("time: {} ms", start.elapsed().as_millis());
                    }
                    None => println!("bestmove (none)"),
                }
            }
            (Some(&"time"), Some(millis)) => {
                let Ok(millis) = millis.parse::<u64>() else {
                    println!("Invalid time limit");
                    return;
                };
                match time_limited_search(&self.board, Duration::from_millis(millis)) {
                    Ok(result) => print_search_result(&result),
                    Err(error) => println!("{error}"),
                }
            }
            (Some(&"perft"), Some(depth)) => {
                let Ok(depth) = depth.parse::<u8>() else {
                    println!("Invalid depth");
                    return;
                };
                let start = Instant::now();
                let mut board = self.board.clone();
                let divide = perft::perft_divide(&mut board, depth);
                let mut total = 0u64;
                for (mv, count) in divide {
                    println!("{}: {}", mv, count);
                    total += count;
                }
                println!(
                    "{} positions reached in {} ms",
                    total,
                    start.elapsed().as_millis()
                );
            }
            _ => println!("Invalid command"),
        }
    }

    fn display_command(&self) {
        self.board.print();
        println!("--- Evaluation ---");
        print_eval_breakdown(&self.board);
    }
}

fn print_search_result(result: &SearchResult) {
    println!("bestmove {}", result.best_move);
    println!("eval {}", result.standard_eval());
    println!("depth {}", result.depth_searched);
    println!("positions evaluated: {}", result.stats.positions_evaluated);
    println!("TT writes: {}", result.stats.tt_writes);
    println!("TT hits: {}", result.stats.tt_hits);
}
