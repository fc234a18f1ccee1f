// TCP client for connecting to the duel relay.
//
// Provides a non-blocking interface for a participant's main thread:
// - `connect()` opens the TCP connection on the calling thread and spawns a
//   background reader thread. There is no handshake; the relay assigns a
//   connection id on accept and a seat only after `send_join`.
// - The reader thread decodes framed `ServerMessage`s in a loop and pushes
//   them into an `mpsc` channel. A frame that arrives whole but does not
//   decode is logged and skipped; EOF or any framing error ends the thread.
// - The main thread holds a `BufWriter<TcpStream>` for sending; every send
//   flushes synchronously (messages are small).
// - `poll()` drains the inbox non-blocking, returning all queued messages.
//
// Lives in the relay crate so integration tests and any front end can use it
// without extra dependencies.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use duel_protocol::{ClientMessage, MoveRequest, ServerMessage, read_message, write_json};
use tracing::{debug, warn};

use crate::error::RelayError;

/// TCP client for relay communication.
pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
}

impl NetClient {
    /// Connect to a relay server and spawn the reader thread.
    pub fn connect(addr: &str) -> Result<Self, RelayError> {
        let stream = TcpStream::connect(addr).map_err(RelayError::Connect)?;
        let reader_stream = stream.try_clone()?;

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(BufReader::new(reader_stream), tx);
        });

        Ok(Self {
            writer: BufWriter::new(stream),
            inbox: rx,
            _reader_thread: Some(reader_thread),
        })
    }

    /// Ask for a seat.
    pub fn send_join(&mut self) -> Result<(), RelayError> {
        self.send(&ClientMessage::Join)
    }

    /// Submit a move for the current turn.
    pub fn send_move(&mut self, request: MoveRequest) -> Result<(), RelayError> {
        self.send(&ClientMessage::Move(request))
    }

    /// Ask the relay to discard the session and start over.
    pub fn send_new_game(&mut self) -> Result<(), RelayError> {
        self.send(&ClientMessage::NewGame)
    }

    /// Send Goodbye. The relay treats it as a departure and stops reading.
    pub fn disconnect(&mut self) {
        let _ = self.send(&ClientMessage::Goodbye);
    }

    /// Drain all queued server messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        self.inbox.try_iter().collect()
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), RelayError> {
        write_json(&mut self.writer, message)?;
        Ok(())
    }
}

/// Reader thread: read framed messages in a loop, push to channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    loop {
        let bytes = match read_message(&mut reader) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(%err, "relay connection closed");
                break;
            }
        };
        match serde_json::from_slice::<ServerMessage>(&bytes) {
            Ok(message) => {
                if tx.send(message).is_err() {
                    break; // Owner dropped the client.
                }
            }
            Err(err) => warn!(%err, "skipping undecodable frame from relay"),
        }
    }
}
