// Relay configuration.
//
// Defaults suit local play. A TOML file may override any subset of fields
// (missing keys keep their defaults); the `relay` binary then applies
// command-line flags on top. Example:
//
//   host = "0.0.0.0"
//   port = 5000
//   log_level = "debug"
//   json_logs = true

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub host: String,
    /// 0 lets the OS pick a free port.
    pub port: u16,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            log_level: "info".into(),
            json_logs: false,
        }
    }
}

impl RelayConfig {
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let text = fs::read_to_string(path).map_err(|source| RelayError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| RelayError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `host:port`, as passed to `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 7001\njson_logs = true").unwrap();
        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 7001);
        assert!(config.json_logs);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RelayConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(RelayError::ConfigRead { .. })));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let result = RelayConfig::load(file.path());
        assert!(matches!(result, Err(RelayError::ConfigParse { .. })));
    }
}
