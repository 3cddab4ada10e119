//! Observability subsystem for romdb
//!
//! Provides a single structured-JSON logger type that every component
//! takes by reference (or `Arc`) at construction, rather than reaching
//! for a process-wide global. That keeps component tests able to
//! capture their own output, and keeps multiple daemons in one process
//! (as in the integration tests) from interleaving on a shared sink.

mod logger;

pub use logger::{Logger, Severity};
