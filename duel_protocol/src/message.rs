// Protocol messages for client-relay communication.
//
// Two closed enums define the full event vocabulary:
// - `ClientMessage`: sent by participants to the relay.
// - `ServerMessage`: sent by the relay, either to one connection (the
//   sender of a request) or to every connection in the session room.
//
// Both are externally tagged with kebab-case tags, so a join request is
// `"join"` on the wire and a move is `{"move":{"from":"e2","to":"e4"}}`.
// Supporting structs (`MoveRequest`, `PlayedMove`) are plain data; the relay
// never looks inside the squares itself, it hands them to the rules engine.

use serde::{Deserialize, Serialize};

use crate::types::{GameResult, MoveRejection, OverReason, SeatColor, SessionStatus};

/// Messages sent by a participant to the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Ask for a seat.
    Join,
    /// Submit a move for the current turn.
    Move(MoveRequest),
    /// Discard the current session and start over with empty seats.
    NewGame,
    /// Leaving gracefully. Handled exactly like a transport disconnect.
    Goodbye,
}

/// Messages sent by the relay to participants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Both seats are taken (sender only).
    SessionFull,
    /// The sender now holds `seat_color` (sender only).
    SeatAssigned {
        seat_color: SeatColor,
        board_position: String,
        turn_color: SeatColor,
        seat_count: u8,
        status: SessionStatus,
    },
    /// Both seats are filled and play may begin or resume.
    SessionStart {
        board_position: String,
        turn_color: SeatColor,
    },
    /// Seat occupancy changed after an arrival.
    SeatCountUpdate { seat_count: u8, status: SessionStatus },
    /// A move was accepted and committed.
    MoveMade {
        played: PlayedMove,
        board_position: String,
        turn_color: SeatColor,
        terminal: bool,
        in_check: bool,
        is_checkmate: bool,
        is_draw: bool,
    },
    /// The sender's move was refused (sender only).
    MoveRejected { reason: MoveRejection },
    /// The game reached a terminal condition.
    SessionOver {
        result: GameResult,
        reason: OverReason,
    },
    /// The session was reset; seats are empty and the board is fresh.
    SessionReset,
    /// A seated participant left while the other remains.
    ParticipantDeparted { seat_count: u8, status: SessionStatus },
}

/// A move as submitted by a participant. Squares are algebraic (`"e2"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    /// Promotion piece letter (`"q"`, `"r"`, `"b"`, `"n"`). Defaults to a
    /// queen when a pawn reaches the last rank without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

impl MoveRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, piece: impl Into<String>) -> Self {
        self.promotion = Some(piece.into());
        self
    }
}

/// Description of an accepted move, as broadcast in `MoveMade`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedMove {
    /// Seat that made the move.
    pub color: SeatColor,
    pub from: String,
    pub to: String,
    /// Lowercase piece letter (`p`, `n`, `b`, `r`, `q`, `k`).
    pub piece: char,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
    /// Standard algebraic notation, including check suffixes.
    pub san: String,
}
