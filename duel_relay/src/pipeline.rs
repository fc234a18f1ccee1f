// Move pipeline: authorize → rules engine → commit → classify.
//
// `submit` is the only path by which a move reaches the session. Nothing is
// written until both the turn controller and the rules engine have said yes,
// and then `SessionStore::apply_move` commits board, turn, and status in one
// step. Classification reads only the engine's flags; board geometry stays
// the engine's business.
//
// The outcome carries ready-to-send protocol messages so the lifecycle
// handler can broadcast exactly what was committed.

use duel_protocol::{
    ConnectionId, GameResult, MoveRejection, MoveRequest, OverReason, PlayedMove, SeatColor,
    ServerMessage,
};
use tracing::debug;

use crate::rules::RulesEngine;
use crate::session::SessionStore;
use crate::turn;

/// How the game stands after an accepted move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    InProgress,
    /// Terminal; the mover won.
    Checkmate { winner: SeatColor },
    /// Terminal; stalemate, insufficient material, repetition, fifty moves,
    /// or any other drawing condition the engine reports.
    Draw,
    /// Terminal for a reason the engine did not flag as checkmate or draw.
    Other,
}

impl Classification {
    pub fn is_terminal(self) -> bool {
        self != Classification::InProgress
    }
}

/// Everything observable about a committed move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub played: PlayedMove,
    pub board_position: String,
    /// Seat to move next.
    pub turn_color: SeatColor,
    pub in_check: bool,
    pub is_checkmate: bool,
    pub is_draw: bool,
    pub classification: Classification,
}

impl MoveOutcome {
    pub fn move_made(&self) -> ServerMessage {
        ServerMessage::MoveMade {
            played: self.played.clone(),
            board_position: self.board_position.clone(),
            turn_color: self.turn_color,
            terminal: self.classification.is_terminal(),
            in_check: self.in_check,
            is_checkmate: self.is_checkmate,
            is_draw: self.is_draw,
        }
    }

    /// The `session-over` message, if the move ended the game.
    pub fn session_over(&self) -> Option<ServerMessage> {
        let (result, reason) = match self.classification {
            Classification::InProgress => return None,
            Classification::Checkmate { winner } => (GameResult::from(winner), OverReason::Checkmate),
            Classification::Draw => (GameResult::Draw, OverReason::Draw),
            Classification::Other => (GameResult::Draw, OverReason::Other),
        };
        Some(ServerMessage::SessionOver { result, reason })
    }
}

/// Run `request` from `connection` through the pipeline.
pub fn submit<R: RulesEngine>(
    store: &mut SessionStore<R>,
    connection: ConnectionId,
    request: &MoveRequest,
) -> Result<MoveOutcome, MoveRejection> {
    let mover = turn::authorize(connection, store.session())?;

    let verdict = store
        .engine()
        .apply_move(store.session().board(), request)
        .map_err(|err| {
            debug!(%connection, from = %request.from, to = %request.to, %err, "rules engine refused move");
            MoveRejection::InvalidMove
        })?;

    let classification = if verdict.is_checkmate {
        Classification::Checkmate { winner: mover }
    } else if verdict.is_draw {
        Classification::Draw
    } else if verdict.is_game_over {
        Classification::Other
    } else {
        Classification::InProgress
    };
    let played = verdict.played.clone();
    let (in_check, is_checkmate, is_draw) =
        (verdict.is_check, verdict.is_checkmate, verdict.is_draw);

    store.apply_move(verdict);

    Ok(MoveOutcome {
        played,
        board_position: store.board_position(),
        turn_color: store.session().turn_color(),
        in_check,
        is_checkmate,
        is_draw,
        classification,
    })
}
