// The session store: the one authoritative record of a duel.
//
// `SessionStore` owns the `Session` (board, seats, turn, status) and the
// rules engine that interprets the board. Every other component reads and
// mutates the session only through the store's methods, so what gets
// broadcast is always what is stored. All mutation happens from the relay's
// single event-loop thread (see `server.rs`); there is no internal locking.
//
// Mutations are whole-or-nothing:
// - `reset` replaces the entire record.
// - `apply_move` commits board, turn, and status together from a verdict the
//   pipeline has already obtained, so a rejected move never reaches here.
// - Seat primitives (`insert_seat`, `remove_seat`) are only called by
//   `seats.rs`, which enforces the two-seat and one-connection-per-color
//   rules before calling them.

use std::collections::BTreeMap;

use duel_protocol::{ConnectionId, SeatColor, SessionStatus};

use crate::rules::{MoveVerdict, RulesEngine};

/// The authoritative session record.
#[derive(Clone, Debug)]
pub struct Session<P> {
    board: P,
    seats: BTreeMap<ConnectionId, SeatColor>,
    turn_color: SeatColor,
    status: SessionStatus,
}

impl<P> Session<P> {
    fn fresh(board: P) -> Self {
        Self {
            board,
            seats: BTreeMap::new(),
            turn_color: SeatColor::First,
            status: SessionStatus::Waiting,
        }
    }

    pub fn board(&self) -> &P {
        &self.board
    }

    pub fn seat_of(&self, connection: ConnectionId) -> Option<SeatColor> {
        self.seats.get(&connection).copied()
    }

    /// The connection holding `color`, if any.
    pub fn occupant(&self, color: SeatColor) -> Option<ConnectionId> {
        self.seats
            .iter()
            .find(|(_, seat)| **seat == color)
            .map(|(conn, _)| *conn)
    }

    pub fn seat_count(&self) -> u8 {
        // At most two entries, enforced by `seats::assign`.
        self.seats.len() as u8
    }

    pub fn turn_color(&self) -> SeatColor {
        self.turn_color
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }
}

/// Read-only copy of the session as clients see it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub board_position: String,
    pub seats: Vec<(ConnectionId, SeatColor)>,
    pub seat_count: u8,
    pub turn_color: SeatColor,
    pub status: SessionStatus,
}

pub struct SessionStore<R: RulesEngine> {
    engine: R,
    session: Session<R::Position>,
}

impl<R: RulesEngine> SessionStore<R> {
    pub fn new(engine: R) -> Self {
        let session = Session::fresh(engine.initial_position());
        Self { engine, session }
    }

    pub fn engine(&self) -> &R {
        &self.engine
    }

    pub fn session(&self) -> &Session<R::Position> {
        &self.session
    }

    pub fn get(&self) -> SessionSnapshot {
        SessionSnapshot {
            board_position: self.board_position(),
            seats: self
                .session
                .seats
                .iter()
                .map(|(conn, seat)| (*conn, *seat))
                .collect(),
            seat_count: self.session.seat_count(),
            turn_color: self.session.turn_color,
            status: self.session.status,
        }
    }

    /// The current board as the engine serializes it.
    pub fn board_position(&self) -> String {
        self.engine.serialize(&self.session.board)
    }

    /// Replace the session with a fresh one: initial board, no seats,
    /// `First` to move, `Waiting`.
    pub fn reset(&mut self) {
        self.session = Session::fresh(self.engine.initial_position());
    }

    /// Commit an accepted move: new board, turn passes to the other seat,
    /// status becomes `Over` on a terminal verdict and `Active` otherwise.
    pub fn apply_move(&mut self, verdict: MoveVerdict<R::Position>) {
        self.session.board = verdict.position;
        self.session.turn_color = self.session.turn_color.opponent();
        self.session.status = if verdict.is_game_over {
            SessionStatus::Over
        } else {
            SessionStatus::Active
        };
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.session.status = status;
    }

    pub(crate) fn insert_seat(&mut self, connection: ConnectionId, color: SeatColor) {
        self.session.seats.insert(connection, color);
    }

    pub(crate) fn remove_seat(&mut self, connection: ConnectionId) -> Option<SeatColor> {
        self.session.seats.remove(&connection)
    }
}
