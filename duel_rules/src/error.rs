// Error type for the chess rules engine.
//
// Every failure is per-request: a bad square, an illegal move, or an
// unparsable FEN never corrupts a `Game`, because `Game::play` only commits
// after the move has been found in the legal move list.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("malformed square: {0:?}")]
    MalformedSquare(String),

    #[error("no piece of the side to move on {0}")]
    NoPieceToMove(String),

    #[error("illegal move {from}{to}")]
    IllegalMove { from: String, to: String },

    #[error("invalid promotion piece: {0:?}")]
    InvalidPromotion(String),

    #[error("malformed FEN ({reason}): {fen:?}")]
    MalformedFen { fen: String, reason: &'static str },
}
