// Seat assignment: which connection plays which color.
//
// Policy: an arriving connection takes the first free color in
// `SeatColor::ALL` order. In a fresh session that hands out `First`, then
// `Second`; after a departure it hands out exactly the color that was
// vacated, while the remaining participant keeps theirs. With both seats
// taken, arrivals are refused with `SessionFull` and nothing changes.

use duel_protocol::{ConnectionId, SeatColor};
use thiserror::Error;

use crate::rules::RulesEngine;
use crate::session::SessionStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum JoinRejection {
    #[error("both seats are taken")]
    SessionFull,
}

/// Seat `connection`, or return the seat it already holds.
pub fn assign<R: RulesEngine>(
    store: &mut SessionStore<R>,
    connection: ConnectionId,
) -> Result<SeatColor, JoinRejection> {
    let session = store.session();
    if let Some(existing) = session.seat_of(connection) {
        return Ok(existing);
    }
    let color = SeatColor::ALL
        .into_iter()
        .find(|color| session.occupant(*color).is_none())
        .ok_or(JoinRejection::SessionFull)?;
    store.insert_seat(connection, color);
    Ok(color)
}

/// Free the seat held by `connection`. Returns the released color, or `None`
/// if the connection was never seated.
pub fn release<R: RulesEngine>(
    store: &mut SessionStore<R>,
    connection: ConnectionId,
) -> Option<SeatColor> {
    store.remove_seat(connection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardChess;

    #[test]
    fn first_two_arrivals_get_first_then_second() {
        let mut store = SessionStore::new(StandardChess);
        assert_eq!(assign(&mut store, ConnectionId(10)), Ok(SeatColor::First));
        assert_eq!(assign(&mut store, ConnectionId(11)), Ok(SeatColor::Second));
        assert_eq!(store.session().seat_count(), 2);
    }

    #[test]
    fn excess_arrivals_rejected_without_change() {
        let mut store = SessionStore::new(StandardChess);
        assign(&mut store, ConnectionId(0)).unwrap();
        assign(&mut store, ConnectionId(1)).unwrap();
        for extra in 2..6 {
            assert_eq!(
                assign(&mut store, ConnectionId(extra)),
                Err(JoinRejection::SessionFull)
            );
            assert_eq!(store.session().seat_count(), 2);
            assert_eq!(store.session().seat_of(ConnectionId(extra)), None);
        }
    }

    #[test]
    fn repeated_join_keeps_existing_seat() {
        let mut store = SessionStore::new(StandardChess);
        assert_eq!(assign(&mut store, ConnectionId(3)), Ok(SeatColor::First));
        assert_eq!(assign(&mut store, ConnectionId(3)), Ok(SeatColor::First));
        assert_eq!(store.session().seat_count(), 1);
    }

    #[test]
    fn vacated_seat_goes_to_next_arrival() {
        let mut store = SessionStore::new(StandardChess);
        assign(&mut store, ConnectionId(0)).unwrap();
        assign(&mut store, ConnectionId(1)).unwrap();

        assert_eq!(release(&mut store, ConnectionId(0)), Some(SeatColor::First));
        assert_eq!(store.session().seat_of(ConnectionId(1)), Some(SeatColor::Second));
        assert_eq!(assign(&mut store, ConnectionId(2)), Ok(SeatColor::First));
    }

    #[test]
    fn release_of_unseated_connection_is_a_no_op() {
        let mut store = SessionStore::new(StandardChess);
        assign(&mut store, ConnectionId(0)).unwrap();
        assert_eq!(release(&mut store, ConnectionId(42)), None);
        assert_eq!(release(&mut store, ConnectionId(0)), Some(SeatColor::First));
        assert_eq!(release(&mut store, ConnectionId(0)), None);
        assert_eq!(store.session().seat_count(), 0);
    }
}
