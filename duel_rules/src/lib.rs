// duel_rules — standard chess rules for the Duel relay.
//
// The relay treats its rules engine as an opaque collaborator: it hands over a
// move request and reacts to the verdict. This crate is the concrete engine it
// ships with. It has no knowledge of seats, connections, or the wire protocol;
// `duel_relay::rules` adapts it to the relay's `RulesEngine` trait.
//
// Module overview:
// - `types.rs`:     `Color`, `PieceKind`, `Piece`, `Square`.
// - `board.rs`:     Mailbox `Board`, castling rights, FEN parse/serialize.
// - `moves.rs`:     Attack detection, legal move generation, move application.
// - `notation.rs`:  SAN rendering with disambiguation and check suffixes.
// - `game.rs`:      `Game` (board + repetition history), `play`, and the
//                   check / checkmate / draw queries.
// - `error.rs`:     `RulesError`.

pub mod board;
pub mod error;
pub mod game;
pub mod moves;
pub mod notation;
pub mod types;

pub use board::{Board, CastlingRights, STARTING_FEN};
pub use error::RulesError;
pub use game::{Game, PlayedMove};
pub use moves::{Move, MoveKind};
pub use types::{Color, Piece, PieceKind, Square};
