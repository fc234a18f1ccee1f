// Test-only participant for end-to-end duel tests.
//
// Wraps the real `NetClient` (from `duel_relay::client`) and keeps a local
// `duel_rules::Game` mirror that it advances from every `move-made`
// broadcast. That lets the full-pipeline tests check that both participants
// end up agreeing with the relay's authoritative board.
//
// The only test-specific code here is the synchronous polling wrappers
// (blocking loops around `NetClient::poll()`). All networking uses the same
// code path as a real front end.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use duel_protocol::{MoveRequest, SeatColor, ServerMessage};
use duel_relay::client::NetClient;
use duel_rules::Game;

/// Default timeout for blocking poll operations.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Sleep duration between poll attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A test participant wrapping a real NetClient and a local board mirror.
pub struct TestPlayer {
    client: NetClient,
    pending: VecDeque<ServerMessage>,
    pub seat: Option<SeatColor>,
    pub mirror: Game,
}

impl TestPlayer {
    pub fn connect(addr: SocketAddr) -> Self {
        let client =
            NetClient::connect(&addr.to_string()).expect("TestPlayer::connect failed");
        Self {
            client,
            pending: VecDeque::new(),
            seat: None,
            mirror: Game::new(),
        }
    }

    /// Send `join` and block until the seat is assigned. Returns the color.
    pub fn join(&mut self) -> SeatColor {
        self.client.send_join().expect("send_join failed");
        let message = self.poll_until("SeatAssigned", |m| {
            matches!(m, ServerMessage::SeatAssigned { .. })
        });
        match message {
            ServerMessage::SeatAssigned {
                seat_color,
                board_position,
                ..
            } => {
                self.mirror = Game::from_fen(&board_position).expect("relay sent bad FEN");
                self.seat = Some(seat_color);
                seat_color
            }
            _ => unreachable!(),
        }
    }

    /// Send `join` expecting to be turned away.
    pub fn join_expecting_full(&mut self) {
        self.client.send_join().expect("send_join failed");
        self.poll_until("SessionFull", |m| matches!(m, ServerMessage::SessionFull));
    }

    pub fn send_move(&mut self, from: &str, to: &str) {
        self.client
            .send_move(MoveRequest::new(from, to))
            .expect("send_move failed");
    }

    pub fn send_new_game(&mut self) {
        self.client.send_new_game().expect("send_new_game failed");
    }

    /// Blocking poll until a message matching `want` arrives. Messages that
    /// don't match stay queued for later calls, in order.
    pub fn poll_until(
        &mut self,
        what: &str,
        want: impl Fn(&ServerMessage) -> bool,
    ) -> ServerMessage {
        let start = Instant::now();
        loop {
            self.ingest();
            if let Some(index) = self.pending.iter().position(&want) {
                return self.pending.remove(index).expect("index in range");
            }
            assert!(
                start.elapsed() < POLL_TIMEOUT,
                "timed out waiting for {what}; queued: {:?}",
                self.pending
            );
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Blocking poll until the next `move-made`. Returns it.
    pub fn poll_until_move(&mut self) -> ServerMessage {
        self.poll_until("MoveMade", |m| matches!(m, ServerMessage::MoveMade { .. }))
    }

    /// Return and forget everything queued so far, after giving in-flight
    /// messages a moment to arrive.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        thread::sleep(Duration::from_millis(50));
        self.ingest();
        self.pending.drain(..).collect()
    }

    /// Move newly arrived messages into the queue, applying every
    /// `move-made` to the mirror on the way.
    fn ingest(&mut self) {
        for message in self.client.poll() {
            if let ServerMessage::MoveMade { played, .. } = &message {
                self.mirror
                    .play(&played.from, &played.to, played.promotion)
                    .expect("relay broadcast a move the mirror rejects");
            }
            self.pending.push_back(message);
        }
    }

    /// Send Goodbye and close the connection.
    pub fn disconnect(&mut self) {
        self.client.disconnect();
    }
}
