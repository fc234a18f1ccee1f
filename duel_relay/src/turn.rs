// Turn controller: may this connection move right now?
//
// Authorization is a pure read of the session. It never advances the turn;
// the pipeline commits a turn change only after the rules engine accepts the
// move, so an illegal move never costs the mover their turn.

use duel_protocol::{ConnectionId, MoveRejection, SeatColor, SessionStatus};

use crate::session::Session;

/// Check, in order: the session is `Active`, the connection holds a seat,
/// and that seat is the one to move. Returns the mover's color.
pub fn authorize<P>(connection: ConnectionId, session: &Session<P>) -> Result<SeatColor, MoveRejection> {
    if session.status() != SessionStatus::Active {
        return Err(MoveRejection::NotStarted);
    }
    let seat = session
        .seat_of(connection)
        .ok_or(MoveRejection::UnknownSeat)?;
    if seat != session.turn_color() {
        return Err(MoveRejection::NotYourTurn);
    }
    Ok(seat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardChess;
    use crate::seats;
    use crate::session::SessionStore;

    fn active_store() -> SessionStore<StandardChess> {
        let mut store = SessionStore::new(StandardChess);
        seats::assign(&mut store, ConnectionId(0)).unwrap();
        seats::assign(&mut store, ConnectionId(1)).unwrap();
        store.set_status(SessionStatus::Active);
        store
    }

    #[test]
    fn seat_to_move_is_authorized() {
        let store = active_store();
        assert_eq!(
            authorize(ConnectionId(0), store.session()),
            Ok(SeatColor::First)
        );
    }

    #[test]
    fn other_seat_is_not_your_turn() {
        let store = active_store();
        assert_eq!(
            authorize(ConnectionId(1), store.session()),
            Err(MoveRejection::NotYourTurn)
        );
    }

    #[test]
    fn unseated_connection_is_unknown() {
        let store = active_store();
        assert_eq!(
            authorize(ConnectionId(5), store.session()),
            Err(MoveRejection::UnknownSeat)
        );
    }

    #[test]
    fn inactive_session_is_not_started_for_everyone() {
        let mut store = active_store();
        for status in [SessionStatus::Waiting, SessionStatus::Over] {
            store.set_status(status);
            for conn in [0, 1, 5] {
                assert_eq!(
                    authorize(ConnectionId(conn), store.session()),
                    Err(MoveRejection::NotStarted)
                );
            }
        }
    }
}
