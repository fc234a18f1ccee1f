// The rules-engine seam.
//
// The relay never interprets a board. Everything game-specific goes through
// `RulesEngine`: where a game starts, whether a move is legal and what it
// leads to, and how a position is shown to clients. `SessionStore` is generic
// over the engine, so tests can drive the session components with a scripted
// engine while the binary uses `StandardChess`.
//
// Seat mapping for chess: `SeatColor::First` plays White, `Second` Black.

use std::fmt;

use duel_protocol::{MoveRequest, PlayedMove, SeatColor};
use duel_rules::{Color, Game, RulesError};

/// Result of an accepted move: the new position plus the status flags the
/// move pipeline classifies.
#[derive(Clone, Debug)]
pub struct MoveVerdict<P> {
    pub position: P,
    pub played: PlayedMove,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_draw: bool,
    /// True for any terminal condition, including ones that are neither
    /// checkmate nor a draw.
    pub is_game_over: bool,
}

pub trait RulesEngine {
    type Position: Clone;
    type Error: fmt::Display;

    fn initial_position(&self) -> Self::Position;

    /// Validate `request` against `position`. Must not mutate anything the
    /// session can observe: on `Err` the caller keeps the old position.
    fn apply_move(
        &self,
        position: &Self::Position,
        request: &MoveRequest,
    ) -> Result<MoveVerdict<Self::Position>, Self::Error>;

    fn serialize(&self, position: &Self::Position) -> String;
}

/// Standard chess, backed by `duel_rules::Game`. Positions serialize as FEN.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardChess;

impl RulesEngine for StandardChess {
    type Position = Game;
    type Error = RulesError;

    fn initial_position(&self) -> Game {
        Game::new()
    }

    fn apply_move(
        &self,
        position: &Game,
        request: &MoveRequest,
    ) -> Result<MoveVerdict<Game>, RulesError> {
        let promotion = match request.promotion.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) => Some(letter),
                    _ => return Err(RulesError::InvalidPromotion(text.to_string())),
                }
            }
        };

        let mut game = position.clone();
        let played = game.play(&request.from, &request.to, promotion)?;
        Ok(MoveVerdict {
            played: PlayedMove {
                color: seat_for(played.color),
                from: played.from.to_string(),
                to: played.to.to_string(),
                piece: played.piece.letter(),
                captured: played.captured.map(|kind| kind.letter()),
                promotion: played.promotion.map(|kind| kind.letter()),
                san: played.san,
            },
            is_check: game.in_check(),
            is_checkmate: game.is_checkmate(),
            is_draw: game.is_draw(),
            is_game_over: game.is_game_over(),
            position: game,
        })
    }

    fn serialize(&self, position: &Game) -> String {
        position.fen()
    }
}

fn seat_for(color: Color) -> SeatColor {
    match color {
        Color::White => SeatColor::First,
        Color::Black => SeatColor::Second,
    }
}
