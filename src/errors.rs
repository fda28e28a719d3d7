use thiserror::Error;

/// Errors surfaced at the engine's command boundary. Internal search
/// recursion never returns these; cancellation is a sentinel value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// FEN string failed to parse or described a board without both kings.
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// UCI move string of the wrong length or with an unknown promotion letter.
    #[error("invalid move: {0}")]
    InvalidMove(String),

    /// Algebraic square outside a1..h8.
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    /// Time-limited search was cancelled before depth 1 completed.
    #[error("search timed out before completing depth 1")]
    SearchTimeout,
}

pub type EngineResult<T> = Result<T, EngineError>;
