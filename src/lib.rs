// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # api-util
//!
//! Building blocks for JSON HTTP APIs served with axum.
//!
//! ## Features
//!
//! - **Cursor pagination**: [`PageMaster`] lists a document collection newest
//!   first and hands back an opaque continuation token
//! - **Pluggable stores**: in-memory store for tests, MongoDB behind the
//!   `mongodb` feature
//! - **Health checks**: uptime and time-in-state reporting
//! - **Response helpers**: JSON envelopes, body parsing, a response recorder
//!   for handler tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use api_util::{PageConfig, PageMaster, PageSource, Result};
//!
//! async fn list(source: PageSource, store: Arc<dyn DocumentStore>) -> Result<Response> {
//!     let mut master = PageMaster::new(
//!         PageConfig::new().collection("events").source(source).store(store),
//!     )?;
//!     let docs = master.find_page().await?;
//!     Ok(viewer::send_page(&docs, master.next_token()))
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   request ──► PageSource ──► PageMaster ──► DocumentStore ──► DocumentCursor
//!   (?from, ?pageSize,          find_page()     find()             collect()
//!    cancel signal)                │
//!                                  ▼
//!                       viewer::send_page(docs, next_token)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Document stores
pub mod store;

/// Cursor pagination over document collections
pub mod pagemaster;

/// Request body decoding
pub mod bodyparser;

/// Health-check endpoint
pub mod healthcheck;

/// Logging setup
pub mod logger;

/// JSON response envelopes
pub mod viewer;

/// Response recorder for handler tests
pub mod testwriter;

/// Demo server settings
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, QueryError, Result};
pub use types::*;

// Re-export commonly used types
pub use healthcheck::{HealthCheck, HealthStatus};
pub use logger::{Logger, LoggerOptions};
pub use pagemaster::{PageConfig, PageMaster, PageSource};
pub use store::{DocumentStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
