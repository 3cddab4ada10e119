//! romdb - a read-only, hot-reloading memcached-protocol key-value daemon.
//!
//! Clients speak a memcached-style ASCII GET protocol over TCP or a
//! UNIX socket. A background pipeline watches a filesystem path for a
//! new snapshot file verified by an MD5 sidecar, stages it through two
//! rotating slots, parses it, and atomically swaps it in as the live
//! dataset — all without stopping the server or tearing connections.

pub mod cli;
pub mod loader;
pub mod observability;
pub mod protocol;
pub mod reload;
pub mod server;
pub mod storage;
pub mod watcher;
