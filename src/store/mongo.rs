//! MongoDB document store

use super::types::{DocumentCursor, DocumentStore, FindQuery, StoreResult};
use async_trait::async_trait;
use bson::Document;
use futures::TryStreamExt;
use mongodb::{Client, Cursor, Database};

/// Document store backed by a MongoDB database
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Wrap an existing database handle
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Connect to `uri` and use the named database
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client.database(database)))
    }

    /// The underlying database handle
    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(
        &self,
        collection: &str,
        query: FindQuery,
    ) -> StoreResult<Box<dyn DocumentCursor>> {
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(query.filter())
            .sort(query.sort())
            .limit(i64::from(query.limit))
            .await?;

        Ok(Box::new(MongoCursor(cursor)))
    }
}

struct MongoCursor(Cursor<Document>);

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn collect(self: Box<Self>) -> StoreResult<Vec<Document>> {
        let documents = self.0.try_collect().await?;
        Ok(documents)
    }
}
