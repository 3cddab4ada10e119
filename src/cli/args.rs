//! CLI argument definitions using clap.
//!
//! romdb --network tcp --addr 127.0.0.1:11311 --file /data/snapshot.json --basedir /var/lib/romdb

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::observability::Severity;
use crate::server::Network as ServerNetwork;

/// romdb - a read-only, hot-reloading memcached-protocol key-value daemon
#[derive(Parser, Debug)]
#[command(name = "romdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Listen address: "host:port" for tcp, a socket path for unix.
    #[arg(long)]
    pub addr: String,

    /// Socket family to listen on.
    #[arg(long, value_enum, default_value_t = Network::Tcp)]
    pub network: Network,

    /// Path to the watched snapshot file (the publisher writes this,
    /// then its ".md5" sidecar).
    #[arg(long)]
    pub file: PathBuf,

    /// Loader base directory; "data00"/"data01" are created under it.
    #[arg(long)]
    pub basedir: PathBuf,

    /// Canonical filename used for the staged snapshot inside each slot.
    #[arg(long, default_value = "snapshot.json")]
    pub filename: String,

    /// Whether the storage backend expects a gzip-compressed snapshot.
    #[arg(long)]
    pub gzipped: bool,

    /// Watcher poll interval, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Minimum severity emitted by the logger.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

/// Socket family, mirrored from `server::Network` for a stable CLI API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Tcp,
    Unix,
}

impl From<Network> for ServerNetwork {
    fn from(n: Network) -> Self {
        match n {
            Network::Tcp => ServerNetwork::Tcp,
            Network::Unix => ServerNetwork::Unix,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Severity {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_minimal_tcp_invocation() {
        let cli = Cli::parse_from([
            "romdb",
            "--addr",
            "127.0.0.1:11311",
            "--file",
            "/data/snapshot.json",
            "--basedir",
            "/var/lib/romdb",
        ]);
        assert_eq!(cli.network, Network::Tcp);
        assert_eq!(cli.filename, "snapshot.json");
        assert_eq!(cli.poll_interval_ms, 1000);
        assert!(!cli.gzipped);
    }

    #[test]
    fn parses_unix_network_and_gzipped() {
        let cli = Cli::parse_from([
            "romdb",
            "--addr",
            "/tmp/romdb.sock",
            "--network",
            "unix",
            "--file",
            "/data/snapshot.json",
            "--basedir",
            "/var/lib/romdb",
            "--gzipped",
            "--poll-interval-ms",
            "250",
        ]);
        assert_eq!(cli.network, Network::Unix);
        assert!(cli.gzipped);
        assert_eq!(cli.poll_interval_ms, 250);
    }
}
