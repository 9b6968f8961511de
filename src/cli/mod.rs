//! CLI module
//!
//! Command-line interface for the demo server.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP server
//! - `config` - Print the resolved settings as YAML

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::Runner;
pub use server::{app, seed_store, serve, AppState};
