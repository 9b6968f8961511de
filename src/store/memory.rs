//! In-memory document store
//!
//! Collections are ordered maps keyed by `_id`, so a page is a reverse range
//! scan. Used by tests and by the demo server.

use super::types::{
    document_id, DocumentCursor, DocumentStore, FindQuery, StoreResult, VecCursor, ID_FIELD,
};
use async_trait::async_trait;
use bson::{oid::ObjectId, Document};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type Collection = BTreeMap<ObjectId, Document>;

/// Document store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, assigning an ObjectId when `_id` is absent
    ///
    /// Assigned ids are greater than every id already in the collection, so
    /// documents inserted without an id are listed in reverse insertion
    /// order. Returns the document's id. An existing document with the same
    /// id is replaced.
    pub async fn insert(&self, collection: &str, mut document: Document) -> StoreResult<ObjectId> {
        let explicit = if document.contains_key(ID_FIELD) {
            Some(document_id(&document)?)
        } else {
            None
        };

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        let id = match explicit {
            Some(id) => id,
            None => {
                let id = next_id(docs);
                document.insert(ID_FIELD, id);
                id
            }
        };
        docs.insert(id, document);
        Ok(id)
    }

    /// Insert several documents, returning their ids in input order
    pub async fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        for document in documents {
            ids.push(self.insert(collection, document).await?);
        }
        Ok(ids)
    }

    /// Number of documents in a collection (0 if it does not exist)
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Names of all collections, sorted
    pub async fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        query: FindQuery,
    ) -> StoreResult<Box<dyn DocumentCursor>> {
        let collections = self.collections.read().await;
        let documents = match collections.get(collection) {
            Some(docs) => docs
                .iter()
                .rev()
                .skip_while(|(id, _)| !query.matches(id))
                .take(query.limit as usize)
                .map(|(_, doc)| doc.clone())
                .collect(),
            None => Vec::new(),
        };

        Ok(Box::new(VecCursor::new(documents)))
    }
}

/// A fresh ObjectId, bumped past the collection's largest id when the
/// driver's counter would sort it lower
fn next_id(docs: &Collection) -> ObjectId {
    let fresh = ObjectId::new();
    match docs.keys().next_back() {
        Some(last) if fresh <= *last => successor(last).unwrap_or(fresh),
        _ => fresh,
    }
}

fn successor(id: &ObjectId) -> Option<ObjectId> {
    let mut wide = [0u8; 16];
    wide[4..].copy_from_slice(&id.bytes());
    let next = u128::from_be_bytes(wide).checked_add(1)?;
    let bytes = next.to_be_bytes();
    if bytes[..4] != [0; 4] {
        return None;
    }
    let mut out = [0u8; 12];
    out.copy_from_slice(&bytes[4..]);
    Some(ObjectId::from_bytes(out))
}
