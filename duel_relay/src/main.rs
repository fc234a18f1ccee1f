// CLI entry point for the duel relay.
//
// Starts a standalone relay that two participants connect to. Settings come
// from defaults, then an optional TOML file, then command-line flags (the
// port may also come from the `PORT` environment variable). Logging goes
// through `tracing-subscriber`; `RUST_LOG` overrides the configured level.
//
// Usage:
//   relay [OPTIONS]
//     --config <FILE>      TOML config file
//     --host <HOST>        Bind address (default: 127.0.0.1)
//     --port <PORT>        Listen port (default: 5000, env: PORT)
//     --log-level <LEVEL>  Default log filter (default: info)
//     --json-logs          Emit JSON log lines

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use duel_relay::{RelayConfig, RelayError, start_relay};
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "relay", version, about = "Two-seat turn-synchronized chess relay")]
struct Args {
    /// TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long, env = "PORT")]
    port: Option<u16>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn into_config(self) -> Result<RelayConfig, RelayError> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)?,
            None => RelayConfig::default(),
        };
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config.json_logs |= self.json_logs;
        Ok(config)
    }
}

fn setup_logging(config: &RelayConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry
            .with(fmt::layer().json().with_thread_names(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_names(true))
            .init();
    }
}

fn main() -> ExitCode {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("relay: {err}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config);

    let (handle, addr) = match start_relay(config) {
        Ok(result) => result,
        Err(err) => {
            error!(%err, "failed to start relay");
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, "relay running; stop with Ctrl+C");
    // The process exits on SIGINT/SIGTERM by default, which tears down the
    // relay threads with it.
    handle.wait();
    ExitCode::SUCCESS
}
