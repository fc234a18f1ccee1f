// Core identifier and state types for the duel protocol.
//
// These are shared by `message.rs` (wire messages) and the relay's session
// components (`duel_relay::session`, `seats`, `turn`, `pipeline`). They are
// game-agnostic: a `SeatColor` is one of two fixed participant slots, and the
// relay maps it onto whatever sides the rules engine uses (White/Black for
// chess).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relay-assigned connection identity (compact u32, unique per relay run).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One of the two seats in a session. `First` moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeatColor {
    First,
    Second,
}

impl SeatColor {
    /// Both seats, in assignment order.
    pub const ALL: [SeatColor; 2] = [SeatColor::First, SeatColor::Second];

    /// The other seat.
    pub fn opponent(self) -> Self {
        match self {
            SeatColor::First => SeatColor::Second,
            SeatColor::Second => SeatColor::First,
        }
    }
}

/// Lifecycle status of the session.
///
/// `Waiting` covers both the lobby (fewer than two seats ever filled) and the
/// frozen state after a participant departs mid-game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    Waiting,
    Active,
    Over,
}

/// Why a move request was refused. Sent only to the requesting connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveRejection {
    /// The session is not `Active` (waiting for players, frozen, or over).
    NotStarted,
    /// The requester is seated but it is the other seat's turn.
    NotYourTurn,
    /// The requester holds no seat.
    UnknownSeat,
    /// The rules engine refused the move or could not parse it.
    InvalidMove,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MoveRejection::NotStarted => "game not started",
            MoveRejection::NotYourTurn => "not your turn",
            MoveRejection::UnknownSeat => "connection holds no seat",
            MoveRejection::InvalidMove => "invalid move",
        };
        f.write_str(text)
    }
}

/// Final result of a finished session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameResult {
    First,
    Second,
    Draw,
}

impl From<SeatColor> for GameResult {
    fn from(winner: SeatColor) -> Self {
        match winner {
            SeatColor::First => GameResult::First,
            SeatColor::Second => GameResult::Second,
        }
    }
}

/// How a finished session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverReason {
    Checkmate,
    Draw,
    /// The rules engine ended the game without reporting checkmate or a draw.
    Other,
}
