//! The paginator
//!
//! One `PageMaster` per request. Construction resolves the page parameters;
//! [`PageMaster::find_page`] runs the range query and records the token for
//! the next page.

use super::types::{
    CancelSignal, PageConfig, PageSource, DEFAULT_PAGE_SIZE, DEFAULT_QUERY_TIMEOUT, FROM_PARAM,
    MAX_PAGE_SIZE, PAGE_SIZE_PARAM,
};
use crate::error::{Error, QueryError, QueryPhase, Result};
use crate::store::{document_id, DocumentStore, FindQuery, StoreResult};
use bson::{oid::ObjectId, Document};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cursor paginator over one document collection
pub struct PageMaster {
    collection: String,
    store: Arc<dyn DocumentStore>,
    from: Option<String>,
    page_size: u32,
    query_timeout: Duration,
    cancel: CancelSignal,
    next_token: String,
}

impl PageMaster {
    /// Resolve a config into a paginator
    ///
    /// Fails with [`Error::MissingConfigField`] when the collection, source or
    /// store is absent, and with [`Error::InvalidConfigValue`] for a negative
    /// page size.
    pub fn new(config: PageConfig) -> Result<Self> {
        let PageConfig {
            collection,
            source,
            store,
            from_token,
            page_size,
            query_timeout,
        } = config;

        let collection = collection
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::missing_field("collection"))?;
        let source = source.ok_or_else(|| Error::missing_field("source"))?;
        let store = store.ok_or_else(|| Error::missing_field("store"))?;

        let from = from_token.filter(|t| !t.is_empty()).or_else(|| {
            source
                .param(FROM_PARAM)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        });
        let page_size = resolve_page_size(page_size, &source)?;
        let query_timeout = if query_timeout.is_zero() {
            DEFAULT_QUERY_TIMEOUT
        } else {
            query_timeout
        };

        Ok(Self {
            collection,
            store,
            from,
            page_size,
            query_timeout,
            cancel: source.cancel_signal().clone(),
            next_token: String::new(),
        })
    }

    /// Target collection name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Store the collection lives in
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Resolved page size, always within `1..=100`
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Continuation token this page starts below, if any
    pub fn from_token(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Timeout applied to each query phase
    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Token for the next page; empty until a query returns documents
    pub fn next_token(&self) -> &str {
        &self.next_token
    }

    /// Fetch one page, newest first
    ///
    /// Submission and result collection each get the full query timeout.
    /// Calling this again re-runs the same query.
    pub async fn find_page(&mut self) -> Result<Vec<Document>> {
        self.next_token.clear();

        let query = self
            .build_query()
            .map_err(|e| Error::query(self.collection.clone(), e))?;

        debug!(
            collection = %self.collection,
            page_size = self.page_size,
            from = ?self.from,
            "fetching page"
        );

        let cursor = self
            .run_phase(QueryPhase::Submit, self.store.find(&self.collection, query))
            .await?;
        let mut documents = self.run_phase(QueryPhase::Collect, cursor.collect()).await?;
        documents.truncate(self.page_size as usize);

        if let Some(last) = documents.last() {
            let id = document_id(last).map_err(|e| {
                Error::query(
                    self.collection.clone(),
                    QueryError::Decode {
                        message: e.to_string(),
                    },
                )
            })?;
            self.next_token = id.to_hex();
        }

        debug!(
            collection = %self.collection,
            returned = documents.len(),
            next = %self.next_token,
            "page fetched"
        );

        Ok(documents)
    }

    fn build_query(&self) -> std::result::Result<FindQuery, QueryError> {
        match &self.from {
            Some(token) => ObjectId::parse_str(token)
                .map(|id| FindQuery::before(id, self.page_size))
                .map_err(|source| QueryError::InvalidCursor {
                    token: token.clone(),
                    source,
                }),
            None => Ok(FindQuery::first_page(self.page_size)),
        }
    }

    /// Run one query phase under its own timeout, racing cancellation
    async fn run_phase<T, F>(&self, phase: QueryPhase, phase_future: F) -> Result<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let outcome = tokio::select! {
            biased;

            () = self.cancel.cancelled() => Err(QueryError::Cancelled),

            res = tokio::time::timeout(self.query_timeout, phase_future) => match res {
                Ok(inner) => inner.map_err(QueryError::from),
                Err(_) => Err(QueryError::Timeout {
                    phase,
                    timeout_ms: self.query_timeout.as_millis() as u64,
                }),
            },
        };

        outcome.map_err(|source| {
            warn!(collection = %self.collection, error = %source, "page query failed");
            Error::query(self.collection.clone(), source)
        })
    }
}

impl fmt::Debug for PageMaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageMaster")
            .field("collection", &self.collection)
            .field("from", &self.from)
            .field("page_size", &self.page_size)
            .field("query_timeout", &self.query_timeout)
            .field("next_token", &self.next_token)
            .finish_non_exhaustive()
    }
}

/// Resolve the effective page size
///
/// Zero defers to the request's `pageSize`; request values that are absent,
/// unparsable or non-positive fall back to the default.
fn resolve_page_size(explicit: i64, source: &PageSource) -> Result<u32> {
    let requested = match explicit {
        n if n < 0 => {
            return Err(Error::invalid_value(
                "page_size",
                format!("must be positive, got {n}"),
            ))
        }
        0 => source
            .param(PAGE_SIZE_PARAM)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE)),
        n => n,
    };

    Ok(requested.min(i64::from(MAX_PAGE_SIZE)) as u32)
}
