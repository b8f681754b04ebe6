//! Error type shared by the parsing and move-lookup entry points.
//!
//! Only caller mistakes surface here. Broken internal invariants (undo stack
//! mismatches, colliding hash keys, unverifiable magic tables) panic instead.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error("invalid FEN `{fen}`: {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("malformed move: {0}")]
    MalformedMove(String),

    #[error("{0} is not a legal move")]
    IllegalMove(String),

    #[error("{0} is ambiguous")]
    AmbiguousMove(String),

    #[error("no legal moves in this position")]
    NoLegalMoves,
}

impl ChessError {
    pub(crate) fn fen(fen: &str, reason: impl Into<String>) -> Self {
        ChessError::InvalidFen {
            fen: fen.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChessError>;
