//! CLI commands and argument parsing

use crate::logger::LogFormat;
use crate::types::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated document API demo server
#[derive(Parser, Debug)]
#[command(name = crate::NAME, version = crate::VERSION)]
#[command(author, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true, env = "API_UTIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Minimum log level
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "API_UTIL_PORT")]
        port: Option<u16>,

        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Number of demo documents to insert at startup
        #[arg(long)]
        seed: Option<usize>,

        /// Fixed page size (0 = per request)
        #[arg(long)]
        page_size: Option<i64>,
    },

    /// Print the resolved settings
    Config,
}
