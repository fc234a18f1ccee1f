// Connection lifecycle handler: turns inbound events into session changes
// and the broadcasts that announce them.
//
// `SessionCoordinator` owns the `SessionStore` and is driven by the relay's
// event loop, one event at a time. Each handler mutates the store first and
// only then emits messages, so every room member sees transitions in commit
// order and no message describes uncommitted state.
//
// Per-connection states: connected (unseated) → seated(color) → gone.
//
// Status transitions:
// - Waiting → Active when an arrival fills the second seat.
// - Active → Over on a terminal move.
// - Active → Waiting when one of two seats departs ("frozen"). The remaining
//   seat keeps its color and the board is kept; the next arrival takes the
//   vacated color and play resumes.
// - Over stays Over across departures and arrivals until a reset.
// - Anything → fresh Waiting on `new-game` or when the last seat departs.

use duel_protocol::{
    ClientMessage, ConnectionId, MoveRejection, MoveRequest, ServerMessage, SessionStatus,
};
use tracing::{debug, info};

use crate::pipeline;
use crate::room::Outbox;
use crate::rules::RulesEngine;
use crate::seats::{self, JoinRejection};
use crate::session::SessionStore;

pub struct SessionCoordinator<R: RulesEngine> {
    store: SessionStore<R>,
}

impl<R: RulesEngine> SessionCoordinator<R> {
    pub fn new(engine: R) -> Self {
        Self {
            store: SessionStore::new(engine),
        }
    }

    pub fn store(&self) -> &SessionStore<R> {
        &self.store
    }

    /// Dispatch one decoded client message.
    pub fn handle(
        &mut self,
        connection: ConnectionId,
        message: ClientMessage,
        outbox: &mut impl Outbox,
    ) {
        match message {
            ClientMessage::Join => self.on_join(connection, outbox),
            ClientMessage::Move(request) => self.on_move(connection, &request, outbox),
            ClientMessage::NewGame => self.on_new_game(connection, outbox),
            ClientMessage::Goodbye => self.on_departure(connection, outbox),
        }
    }

    pub fn on_join(&mut self, connection: ConnectionId, outbox: &mut impl Outbox) {
        let already_seated = self.store.session().seat_of(connection).is_some();
        let seat_color = match seats::assign(&mut self.store, connection) {
            Ok(color) => color,
            Err(JoinRejection::SessionFull) => {
                info!(%connection, "join refused: session full");
                outbox.send_to(connection, &ServerMessage::SessionFull);
                return;
            }
        };

        let session = self.store.session();
        let starting = session.seat_count() == 2 && session.status() == SessionStatus::Waiting;
        if starting {
            self.store.set_status(SessionStatus::Active);
        }

        let snapshot = self.store.get();
        outbox.join_room(connection);
        outbox.send_to(
            connection,
            &ServerMessage::SeatAssigned {
                seat_color,
                board_position: snapshot.board_position.clone(),
                turn_color: snapshot.turn_color,
                seat_count: snapshot.seat_count,
                status: snapshot.status,
            },
        );
        if already_seated {
            debug!(%connection, seat = ?seat_color, "repeated join");
        } else {
            info!(%connection, seat = ?seat_color, seat_count = snapshot.seat_count, "seat assigned");
        }

        if starting {
            info!(turn = ?snapshot.turn_color, "session started");
            outbox.broadcast(&ServerMessage::SessionStart {
                board_position: snapshot.board_position,
                turn_color: snapshot.turn_color,
            });
        }
        outbox.broadcast(&ServerMessage::SeatCountUpdate {
            seat_count: snapshot.seat_count,
            status: snapshot.status,
        });
    }

    pub fn on_move(
        &mut self,
        connection: ConnectionId,
        request: &MoveRequest,
        outbox: &mut impl Outbox,
    ) {
        match pipeline::submit(&mut self.store, connection, request) {
            Ok(outcome) => {
                info!(
                    %connection,
                    san = %outcome.played.san,
                    ending = ?outcome.classification,
                    "move accepted"
                );
                outbox.broadcast(&outcome.move_made());
                if let Some(over) = outcome.session_over() {
                    info!(ending = ?outcome.classification, "session over");
                    outbox.broadcast(&over);
                }
            }
            Err(reason) => {
                debug!(%connection, %reason, "move rejected");
                outbox.send_to(connection, &ServerMessage::MoveRejected { reason });
            }
        }
    }

    pub fn on_new_game(&mut self, connection: ConnectionId, outbox: &mut impl Outbox) {
        info!(%connection, "new game requested");
        self.store.reset();
        outbox.broadcast(&ServerMessage::SessionReset);
    }

    /// A connection went away, gracefully or not. Unseated departures have
    /// no effect on the session.
    pub fn on_departure(&mut self, connection: ConnectionId, outbox: &mut impl Outbox) {
        outbox.leave_room(connection);
        let Some(seat) = seats::release(&mut self.store, connection) else {
            debug!(%connection, "unseated connection departed");
            return;
        };

        if self.store.session().seat_count() == 0 {
            info!(%connection, seat = ?seat, "last participant departed; resetting");
            self.store.reset();
            outbox.broadcast(&ServerMessage::SessionReset);
            return;
        }

        if self.store.session().status() == SessionStatus::Active {
            self.store.set_status(SessionStatus::Waiting);
        }
        let snapshot = self.store.get();
        info!(%connection, seat = ?seat, status = ?snapshot.status, "participant departed");
        outbox.broadcast(&ServerMessage::ParticipantDeparted {
            seat_count: snapshot.seat_count,
            status: snapshot.status,
        });
    }

    /// A frame arrived that did not decode as a client message.
    pub fn on_undecodable(&mut self, connection: ConnectionId, outbox: &mut impl Outbox) {
        debug!(%connection, "undecodable message");
        outbox.send_to(
            connection,
            &ServerMessage::MoveRejected {
                reason: MoveRejection::InvalidMove,
            },
        );
    }
}
