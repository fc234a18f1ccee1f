// duel_relay — two-seat session and turn synchronization relay.
//
// The relay accepts TCP connections, seats the first two participants who
// ask, enforces whose turn it is, hands each move to a rules engine, and
// broadcasts the authoritative result to everyone in the session room. It
// never interprets a board itself; `rules.rs` is the only place that knows
// the game is chess.
//
// Module overview (leaves first):
// - `rules.rs`:     `RulesEngine` trait and the `StandardChess` adapter over
//                   `duel_rules::Game`.
// - `session.rs`:   `SessionStore`, the single authoritative session record.
// - `seats.rs`:     Seat assignment and release.
// - `turn.rs`:      Turn authorization.
// - `pipeline.rs`:  Move pipeline: authorize, validate, commit, classify.
// - `room.rs`:      `Outbox` trait and `TcpRoom` (per-connection writers and
//                   room membership).
// - `lifecycle.rs`: `SessionCoordinator`, which reacts to joins, moves,
//                   resets, and departures and emits the broadcasts.
// - `server.rs`:    TCP listener, reader threads, and the single-threaded
//                   event loop that owns the coordinator.
// - `client.rs`:    Blocking-connect, non-blocking-poll `NetClient`.
// - `config.rs`, `error.rs`: `RelayConfig` (TOML + defaults) and
//                   `RelayError`.
//
// Dependencies: `duel_protocol` (messages and framing), `duel_rules` (chess).
// The library logs through `tracing` but never installs a subscriber; the
// `relay` binary (`main.rs`) does.

pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pipeline;
pub mod room;
pub mod rules;
pub mod seats;
pub mod server;
pub mod session;
pub mod turn;

pub use config::RelayConfig;
pub use error::RelayError;
pub use server::{RelayHandle, start_relay, start_relay_with_engine};
