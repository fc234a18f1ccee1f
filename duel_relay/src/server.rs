// TCP server and main event loop for the duel relay.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the main thread.
// - **Reader threads** (one per connection): call `read_message()` in a
//   loop and decode each frame as a `ClientMessage`. Decoded messages become
//   `MessageFrom`; frames that do not decode become `Undecodable` and the
//   loop continues. `Goodbye`, EOF, or a framing error sends `Disconnected`
//   and ends the thread.
// - **Event-loop thread**: owns the `SessionCoordinator` (and through it the
//   `SessionStore`) plus the `TcpRoom` holding every write half. Events are
//   handled one at a time to completion, which is what serializes
//   concurrent move attempts. `recv_timeout` with a short interval lets the
//   loop notice a stop request without a separate timer.
//
// The event channel is bounded, so a peer that floods frames faster than
// the loop handles them blocks its own reader thread instead of growing the
// queue. Writes from the loop carry a timeout (see `room`), so a peer that
// stops reading is dropped rather than stalling everyone else.
//
// Connection ids are assigned at accept time, before the first frame, so
// a connection can be answered (e.g. `session-full`) without ever joining.
//
// Shutdown: `RelayHandle::stop` clears `keep_running`; the listener and the
// event loop both poll it. On exit the event loop shuts down every socket so
// blocked reader threads wake up and finish.

use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::Duration;

use duel_protocol::{ClientMessage, ConnectionId, read_message};
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::lifecycle::SessionCoordinator;
use crate::room::{Outbox, TcpRoom};
use crate::rules::{RulesEngine, StandardChess};

/// How often idle loops check `keep_running`.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Events that may queue before reader threads block.
const EVENT_QUEUE_DEPTH: usize = 1024;

/// Events sent from listener/reader threads to the event loop.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    MessageFrom {
        connection: ConnectionId,
        message: ClientMessage,
    },
    Undecodable {
        connection: ConnectionId,
    },
    Disconnected {
        connection: ConnectionId,
    },
}

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for it to shut down.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.join();
    }

    /// Block until the relay exits on its own.
    pub fn wait(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if self.thread.take().is_some_and(|handle| handle.join().is_err()) {
            warn!("relay event loop panicked");
        }
    }
}

/// Start a standard-chess relay on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used to
/// let the OS pick a free port).
pub fn start_relay(config: RelayConfig) -> Result<(RelayHandle, SocketAddr), RelayError> {
    start_relay_with_engine(config, StandardChess)
}

/// Like `start_relay`, with a caller-supplied rules engine.
pub fn start_relay_with_engine<R>(
    config: RelayConfig,
    engine: R,
) -> Result<(RelayHandle, SocketAddr), RelayError>
where
    R: RulesEngine + Send + 'static,
{
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).map_err(|source| RelayError::Bind {
        addr: bind_addr,
        source,
    })?;
    let addr = listener.local_addr()?;
    // Non-blocking so the accept loop can check keep_running periodically.
    listener.set_nonblocking(true)?;
    info!(%addr, "relay listening");

    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_loop = keep_running.clone();
    let thread = thread::Builder::new()
        .name("relay-event-loop".into())
        .spawn(move || run_relay(listener, engine, keep_running_loop))?;

    Ok((
        RelayHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Event-loop state: everything only the event-loop thread touches.
struct Relay<R: RulesEngine> {
    coordinator: SessionCoordinator<R>,
    room: TcpRoom,
    next_connection: u32,
    tx: SyncSender<InternalEvent>,
}

/// Main relay loop. Runs until `keep_running` is set to false.
fn run_relay<R: RulesEngine>(listener: TcpListener, engine: R, keep_running: Arc<AtomicBool>) {
    let (tx, rx): (SyncSender<InternalEvent>, Receiver<InternalEvent>) =
        mpsc::sync_channel(EVENT_QUEUE_DEPTH);

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || accept_loop(listener, tx_listener, keep_running_listener));

    let mut relay = Relay {
        coordinator: SessionCoordinator::new(engine),
        room: TcpRoom::new(),
        next_connection: 0,
        tx,
    };

    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(event) => relay.handle_event(event),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    relay.room.close_all();
    info!("relay stopped");
}

fn accept_loop(
    listener: TcpListener,
    tx: SyncSender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "accepted connection");
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                if tx.send(InternalEvent::NewConnection { stream }).is_err() {
                    break;
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                warn!(%err, "accept failed; listener exiting");
                break;
            }
        }
    }
}

impl<R: RulesEngine> Relay<R> {
    fn handle_event(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::NewConnection { stream } => self.handle_new_connection(stream),
            InternalEvent::MessageFrom {
                connection,
                message,
            } => self.coordinator.handle(connection, message, &mut self.room),
            InternalEvent::Undecodable { connection } => {
                self.coordinator.on_undecodable(connection, &mut self.room);
            }
            InternalEvent::Disconnected { connection } => {
                info!(%connection, "connection closed");
                self.coordinator.on_departure(connection, &mut self.room);
            }
        }
    }

    /// Assign an id, keep the write half, and spawn a reader thread.
    fn handle_new_connection(&mut self, stream: TcpStream) {
        let read_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(err) => {
                warn!(%err, "failed to clone accepted stream");
                return;
            }
        };
        let connection = ConnectionId(self.next_connection);
        self.next_connection = self.next_connection.wrapping_add(1);
        self.room.register(connection, stream);
        info!(%connection, "connection opened");

        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("relay-reader-{}", connection.0))
            .spawn(move || reader_loop(BufReader::new(read_stream), connection, tx));
        if let Err(err) = spawned {
            warn!(%connection, %err, "failed to spawn reader thread");
            self.room.leave_room(connection);
        }
    }
}

/// Reader loop for a single connection. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    connection: ConnectionId,
    tx: SyncSender<InternalEvent>,
) {
    loop {
        let event = match read_message(&mut reader) {
            Ok(bytes) => match serde_json::from_slice::<ClientMessage>(&bytes) {
                Ok(ClientMessage::Goodbye) => {
                    let _ = tx.send(InternalEvent::Disconnected { connection });
                    break;
                }
                Ok(message) => InternalEvent::MessageFrom {
                    connection,
                    message,
                },
                Err(err) => {
                    debug!(%connection, %err, "undecodable frame");
                    InternalEvent::Undecodable { connection }
                }
            },
            Err(err) => {
                debug!(%connection, %err, "read ended");
                let _ = tx.send(InternalEvent::Disconnected { connection });
                break;
            }
        };
        if tx.send(event).is_err() {
            break;
        }
    }
}
