//! Document store types and traits
//!
//! Defines the core storage abstractions used by the paginator.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use thiserror::Error;

/// Primary-key field every stored document carries
pub const ID_FIELD: &str = "_id";

/// Errors raised by a document store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected or failed the operation
    #[error("store backend error: {message}")]
    Backend { message: String },

    /// A document could not be read or does not have the expected shape
    #[error("invalid document: {message}")]
    Decode { message: String },
}

impl StoreError {
    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        Self::backend(e.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A bounded range query, sorted by `_id` descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindQuery {
    /// Exclusive upper bound on `_id`; `None` starts from the newest document
    pub before: Option<ObjectId>,
    /// Maximum number of documents to return
    pub limit: u32,
}

impl FindQuery {
    /// Query for the newest `limit` documents
    pub fn first_page(limit: u32) -> Self {
        Self {
            before: None,
            limit,
        }
    }

    /// Query for the `limit` documents strictly below `id`
    pub fn before(id: ObjectId, limit: u32) -> Self {
        Self {
            before: Some(id),
            limit,
        }
    }

    /// The filter document, in MongoDB query syntax
    pub fn filter(&self) -> Document {
        match self.before {
            Some(id) => doc! { "_id": { "$lt": id } },
            None => doc! {},
        }
    }

    /// The sort document, in MongoDB query syntax
    pub fn sort(&self) -> Document {
        doc! { "_id": -1 }
    }

    /// Check whether a document id falls inside this query's range
    pub fn matches(&self, id: &ObjectId) -> bool {
        self.before.map_or(true, |before| *id < before)
    }
}

/// Read the `_id` of a document as an ObjectId
pub fn document_id(document: &Document) -> StoreResult<ObjectId> {
    match document.get(ID_FIELD) {
        Some(Bson::ObjectId(id)) => Ok(*id),
        Some(other) => Err(StoreError::decode(format!(
            "'{ID_FIELD}' is {:?}, expected an ObjectId",
            other.element_type()
        ))),
        None => Err(StoreError::decode(format!(
            "document has no '{ID_FIELD}' field"
        ))),
    }
}

/// A collection-oriented document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Submit a find operation and return a cursor over its results
    async fn find(&self, collection: &str, query: FindQuery)
        -> StoreResult<Box<dyn DocumentCursor>>;
}

/// Results of a submitted find operation
#[async_trait]
pub trait DocumentCursor: Send {
    /// Drain every remaining document, preserving store order
    async fn collect(self: Box<Self>) -> StoreResult<Vec<Document>>;
}

/// Cursor over documents that are already in memory
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    documents: Vec<Document>,
}

impl VecCursor {
    /// Create a cursor that yields `documents` in order
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentCursor for VecCursor {
    async fn collect(self: Box<Self>) -> StoreResult<Vec<Document>> {
        Ok(self.documents)
    }
}
