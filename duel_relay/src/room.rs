// Outbound delivery: single-connection sends and room-scoped broadcast.
//
// The lifecycle handler talks to connections only through the `Outbox`
// trait, so it can be driven in tests by an in-memory recorder. `TcpRoom` is
// the production implementation: it holds the write half of every accepted
// connection (registered at accept time, before any message is read) plus a
// flag saying whether that connection has joined the session room.
//
// Only the event-loop thread writes, so a write must never block it for
// long. Every registered stream gets a write timeout. A connection whose
// write fails (including a peer that stops reading until its buffers fill)
// is dropped and its socket shut down; its reader thread then sees EOF and
// reports a departure through the normal event path.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use duel_protocol::{ConnectionId, ServerMessage, write_json};
use tracing::warn;

/// Longest a single write may block the event loop.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Where the lifecycle handler sends its messages.
pub trait Outbox {
    /// Deliver to one connection, whether or not it is in the room.
    fn send_to(&mut self, connection: ConnectionId, message: &ServerMessage);

    /// Deliver to every connection in the room.
    fn broadcast(&mut self, message: &ServerMessage);

    /// Add a connection to the room. Idempotent.
    fn join_room(&mut self, connection: ConnectionId);

    /// The connection is gone; stop delivering to it.
    fn leave_room(&mut self, connection: ConnectionId);
}

struct Member {
    writer: BufWriter<TcpStream>,
    in_room: bool,
}

/// Write halves of all live connections, keyed by relay-assigned id.
#[derive(Default)]
pub struct TcpRoom {
    members: BTreeMap<ConnectionId, Member>,
}

impl TcpRoom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly accepted connection. It is not in the room until it
    /// joins.
    pub fn register(&mut self, connection: ConnectionId, stream: TcpStream) {
        if let Err(err) = stream.set_write_timeout(Some(WRITE_TIMEOUT)) {
            warn!(%connection, %err, "failed to set write timeout");
        }
        self.members.insert(
            connection,
            Member {
                writer: BufWriter::new(stream),
                in_room: false,
            },
        );
    }

    pub fn is_in_room(&self, connection: ConnectionId) -> bool {
        self.members
            .get(&connection)
            .is_some_and(|member| member.in_room)
    }

    pub fn connection_count(&self) -> usize {
        self.members.len()
    }

    /// Shut down every socket so their reader threads see EOF. Used when the
    /// relay stops.
    pub fn close_all(&mut self) {
        for (_, member) in std::mem::take(&mut self.members) {
            let _ = member.writer.get_ref().shutdown(Shutdown::Both);
        }
    }

    /// Returns false if the write failed and the member should be dropped.
    fn write(connection: ConnectionId, member: &mut Member, message: &ServerMessage) -> bool {
        match write_json(&mut member.writer, message) {
            Ok(()) => true,
            Err(err) => {
                warn!(%connection, %err, "write failed; dropping connection");
                false
            }
        }
    }

    fn drop_member(&mut self, connection: ConnectionId) {
        if let Some(member) = self.members.remove(&connection) {
            let _ = member.writer.get_ref().shutdown(Shutdown::Both);
        }
    }
}

impl Outbox for TcpRoom {
    fn send_to(&mut self, connection: ConnectionId, message: &ServerMessage) {
        let Some(member) = self.members.get_mut(&connection) else {
            return;
        };
        if !Self::write(connection, member, message) {
            self.drop_member(connection);
        }
    }

    fn broadcast(&mut self, message: &ServerMessage) {
        let failed: Vec<ConnectionId> = self
            .members
            .iter_mut()
            .filter(|(_, member)| member.in_room)
            .filter_map(|(connection, member)| {
                (!Self::write(*connection, member, message)).then_some(*connection)
            })
            .collect();
        for connection in failed {
            self.drop_member(connection);
        }
    }

    fn join_room(&mut self, connection: ConnectionId) {
        if let Some(member) = self.members.get_mut(&connection) {
            member.in_room = true;
        }
    }

    fn leave_room(&mut self, connection: ConnectionId) {
        self.members.remove(&connection);
    }
}

/// In-memory outbox that records what each connection would have received.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingOutbox {
    room: std::collections::BTreeSet<ConnectionId>,
    inboxes: BTreeMap<ConnectionId, Vec<ServerMessage>>,
}

#[cfg(test)]
impl RecordingOutbox {
    /// Drain everything delivered to `connection` so far.
    pub(crate) fn take(&mut self, connection: ConnectionId) -> Vec<ServerMessage> {
        self.inboxes.remove(&connection).unwrap_or_default()
    }

    pub(crate) fn in_room(&self, connection: ConnectionId) -> bool {
        self.room.contains(&connection)
    }
}

#[cfg(test)]
impl Outbox for RecordingOutbox {
    fn send_to(&mut self, connection: ConnectionId, message: &ServerMessage) {
        self.inboxes
            .entry(connection)
            .or_default()
            .push(message.clone());
    }

    fn broadcast(&mut self, message: &ServerMessage) {
        let members: Vec<ConnectionId> = self.room.iter().copied().collect();
        for connection in members {
            self.send_to(connection, message);
        }
    }

    fn join_room(&mut self, connection: ConnectionId) {
        self.room.insert(connection);
    }

    fn leave_room(&mut self, connection: ConnectionId) {
        self.room.remove(&connection);
    }
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;
    use std::net::TcpListener;
    use std::time::Instant;

    use duel_protocol::{SeatColor, SessionStatus, read_json};

    use super::*;

    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn recv(reader: &mut BufReader<TcpStream>) -> ServerMessage {
        read_json(reader).unwrap()
    }

    #[test]
    fn send_to_reaches_unjoined_connection() {
        let (client, server) = tcp_pair();
        let mut room = TcpRoom::new();
        room.register(ConnectionId(0), server);
        assert!(!room.is_in_room(ConnectionId(0)));

        room.send_to(ConnectionId(0), &ServerMessage::SessionFull);
        let mut reader = BufReader::new(client);
        assert_eq!(recv(&mut reader), ServerMessage::SessionFull);
    }

    #[test]
    fn broadcast_skips_connections_outside_room() {
        let (client_a, server_a) = tcp_pair();
        let (client_b, server_b) = tcp_pair();
        let mut room = TcpRoom::new();
        room.register(ConnectionId(0), server_a);
        room.register(ConnectionId(1), server_b);
        room.join_room(ConnectionId(0));

        room.broadcast(&ServerMessage::SessionReset);
        room.send_to(ConnectionId(1), &ServerMessage::SessionFull);

        let mut reader_a = BufReader::new(client_a);
        assert_eq!(recv(&mut reader_a), ServerMessage::SessionReset);

        // B's first frame is the direct send; the broadcast never reached it.
        let mut reader_b = BufReader::new(client_b);
        assert_eq!(recv(&mut reader_b), ServerMessage::SessionFull);
    }

    #[test]
    fn leave_room_forgets_connection() {
        let (client, server) = tcp_pair();
        let mut room = TcpRoom::new();
        room.register(ConnectionId(3), server);
        room.join_room(ConnectionId(3));
        room.leave_room(ConnectionId(3));
        assert_eq!(room.connection_count(), 0);
        assert!(!room.is_in_room(ConnectionId(3)));

        // Nothing is written once the writer is dropped; the peer sees EOF.
        room.broadcast(&ServerMessage::SessionReset);
        client
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut reader = BufReader::new(client);
        assert!(read_json::<_, ServerMessage>(&mut reader).is_err());
    }

    #[test]
    fn peer_that_stops_reading_is_dropped() {
        let (client, server) = tcp_pair();
        let mut room = TcpRoom::new();
        room.register(ConnectionId(0), server);
        room.join_room(ConnectionId(0));

        // Large frames fill the socket buffers quickly; the client never reads.
        let bulky = ServerMessage::SeatAssigned {
            seat_color: SeatColor::First,
            board_position: "x".repeat(32 * 1024),
            turn_color: SeatColor::First,
            seat_count: 1,
            status: SessionStatus::Waiting,
        };
        let start = Instant::now();
        while room.is_in_room(ConnectionId(0)) {
            assert!(
                start.elapsed() < Duration::from_secs(30),
                "writes to a non-reading peer never timed out"
            );
            room.broadcast(&bulky);
        }
        assert_eq!(room.connection_count(), 0);
        drop(client);
    }

    #[test]
    fn write_to_closed_peer_does_not_panic() {
        let (client, server) = tcp_pair();
        let mut room = TcpRoom::new();
        room.register(ConnectionId(0), server);
        room.join_room(ConnectionId(0));
        drop(client);
        for _ in 0..4 {
            room.broadcast(&ServerMessage::ParticipantDeparted {
                seat_count: 1,
                status: SessionStatus::Waiting,
            });
        }
    }

    #[test]
    fn recording_outbox_tracks_room() {
        let mut outbox = RecordingOutbox::default();
        outbox.join_room(ConnectionId(1));
        outbox.send_to(ConnectionId(2), &ServerMessage::SessionFull);
        outbox.broadcast(&ServerMessage::SessionReset);
        assert!(outbox.in_room(ConnectionId(1)));
        assert_eq!(outbox.take(ConnectionId(1)), vec![ServerMessage::SessionReset]);
        assert_eq!(outbox.take(ConnectionId(2)), vec![ServerMessage::SessionFull]);
        assert!(outbox.take(ConnectionId(1)).is_empty());
    }
}
