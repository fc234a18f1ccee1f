// duel_protocol — wire protocol between Duel participants and the relay.
//
// This crate defines the message types, framing, and serialization used by
// the relay (`duel_relay`) and its clients over TCP. It has no dependency on
// the rules engine: boards travel as opaque position strings and moves as
// algebraic square names.
//
// Module overview:
// - `types.rs`:    `ConnectionId`, `SeatColor`, `SessionStatus`, and the
//                  rejection / result enums carried inside messages.
// - `message.rs`:  `ClientMessage` and `ServerMessage` plus `MoveRequest`
//                  and `PlayedMove`.
// - `framing.rs`:  4-byte big-endian length prefix + JSON payload over any
//                  `Read`/`Write` stream.
//
// Design decisions:
// - **JSON serialization.** Human-readable on the wire and trivially
//   consumed by browser or script clients.
// - **No async runtime.** Framing works on `std::io` streams, matching the
//   relay's thread-per-reader architecture.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_MESSAGE_SIZE, read_json, read_message, write_json, write_message};
pub use message::{ClientMessage, MoveRequest, PlayedMove, ServerMessage};
pub use types::{ConnectionId, GameResult, MoveRejection, OverReason, SeatColor, SessionStatus};

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;

    fn wire_json<T: serde::Serialize>(msg: &T) -> serde_json::Value {
        serde_json::to_value(msg).unwrap()
    }

    #[test]
    fn unit_requests_use_kebab_case_tags() {
        assert_eq!(wire_json(&ClientMessage::Join), json!("join"));
        assert_eq!(wire_json(&ClientMessage::NewGame), json!("new-game"));
        assert_eq!(wire_json(&ServerMessage::SessionFull), json!("session-full"));
        assert_eq!(wire_json(&ServerMessage::SessionReset), json!("session-reset"));
    }

    #[test]
    fn move_request_omits_missing_promotion() {
        let msg = ClientMessage::Move(MoveRequest::new("e2", "e4"));
        assert_eq!(
            wire_json(&msg),
            json!({"move": {"from": "e2", "to": "e4"}})
        );

        let parsed: ClientMessage =
            serde_json::from_value(json!({"move": {"from": "a7", "to": "a8", "promotion": "n"}}))
                .unwrap();
        assert_eq!(
            parsed,
            ClientMessage::Move(MoveRequest::new("a7", "a8").with_promotion("n"))
        );
    }

    #[test]
    fn rejection_reason_is_kebab_case() {
        let msg = ServerMessage::MoveRejected {
            reason: MoveRejection::NotYourTurn,
        };
        assert_eq!(
            wire_json(&msg),
            json!({"move-rejected": {"reason": "not-your-turn"}})
        );
    }

    #[test]
    fn seat_assigned_fields() {
        let msg = ServerMessage::SeatAssigned {
            seat_color: SeatColor::Second,
            board_position: "8/8/8/8/8/8/8/8 w - - 0 1".into(),
            turn_color: SeatColor::First,
            seat_count: 2,
            status: SessionStatus::Active,
        };
        assert_eq!(
            wire_json(&msg),
            json!({"seat-assigned": {
                "seat_color": "second",
                "board_position": "8/8/8/8/8/8/8/8 w - - 0 1",
                "turn_color": "first",
                "seat_count": 2,
                "status": "active"
            }})
        );
    }

    #[test]
    fn move_made_survives_framing() {
        let msg = ServerMessage::MoveMade {
            played: PlayedMove {
                color: SeatColor::Second,
                from: "d8".into(),
                to: "h4".into(),
                piece: 'q',
                captured: None,
                promotion: None,
                san: "Qh4#".into(),
            },
            board_position: "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3"
                .into(),
            turn_color: SeatColor::First,
            terminal: true,
            in_check: true,
            is_checkmate: true,
            is_draw: false,
        };
        let mut wire = Vec::new();
        write_json(&mut wire, &msg).unwrap();
        let recovered: ServerMessage = read_json(&mut Cursor::new(&wire)).unwrap();
        assert_eq!(recovered, msg);
    }

    #[test]
    fn session_over_payload() {
        let msg = ServerMessage::SessionOver {
            result: GameResult::Draw,
            reason: OverReason::Draw,
        };
        assert_eq!(
            wire_json(&msg),
            json!({"session-over": {"result": "draw", "reason": "draw"}})
        );
        assert_eq!(GameResult::from(SeatColor::First), GameResult::First);
    }

    #[test]
    fn seat_color_opponent_alternates() {
        for color in SeatColor::ALL {
            assert_ne!(color.opponent(), color);
            assert_eq!(color.opponent().opponent(), color);
        }
    }
}
