//! CLI argument definitions for the romdb daemon.

mod args;

pub use args::Cli;
