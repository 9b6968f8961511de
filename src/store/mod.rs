//! Document store module
//!
//! Supports: in-memory collections, MongoDB (feature `mongodb`)
//!
//! # Overview
//!
//! The paginator talks to storage through [`DocumentStore`]. A query runs in
//! two phases: `find` submits it and hands back a [`DocumentCursor`], and
//! `collect` drains that cursor. Keeping the phases apart lets callers put a
//! separate deadline on each.

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;
mod types;

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;
pub use types::{
    document_id, DocumentCursor, DocumentStore, FindQuery, StoreError, StoreResult, VecCursor,
    ID_FIELD,
};
