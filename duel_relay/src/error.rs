// Process-level failures for the relay and its client.
//
// Game-level refusals (session full, not your turn, invalid move) are not
// errors here: they travel to the requester as protocol messages. This type
// covers what stops a relay from starting or a client from connecting.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("connection to relay failed: {0}")]
    Connect(#[source] io::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
