//! Pagination inputs
//!
//! [`PageConfig`] is the explicit construction input for a
//! [`PageMaster`](super::PageMaster). [`PageSource`] carries the parts of the
//! inbound request the paginator reads: its query string and its
//! cancellation scope.

use crate::store::DocumentStore;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Uri;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Page size used when neither the caller nor the request supplies one
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Largest page a single query may return
pub const MAX_PAGE_SIZE: u32 = 100;

/// Per-phase query timeout used when none is configured
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Query parameter carrying the continuation token
pub const FROM_PARAM: &str = "from";

/// Query parameter carrying the requested page size
pub const PAGE_SIZE_PARAM: &str = "pageSize";

// ============================================================================
// Cancellation
// ============================================================================

/// Create a linked cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx: Some(rx) })
}

/// Cancels every [`CancelSignal`] created alongside it
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Cancellation scope of an inbound request
///
/// A default signal is never cancelled. Dropping the [`CancelHandle`]
/// without calling `cancel` leaves the signal uncancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        Self::default()
    }

    /// Check whether cancellation has been signalled
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation is signalled
    pub async fn cancelled(&self) {
        if let Some(rx) = &self.rx {
            let mut rx = rx.clone();
            if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Request source
// ============================================================================

/// Query parameters and cancellation scope of an inbound request
///
/// In axum handlers take it as an extractor. A [`CancelSignal`] stored in the
/// request extensions is picked up automatically.
#[derive(Debug, Clone, Default)]
pub struct PageSource {
    query: HashMap<String, String>,
    cancel: CancelSignal,
}

impl PageSource {
    /// Create a source with no parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `a=1&b=2` query string; the first occurrence of a key wins
    pub fn from_query(raw: &str) -> Self {
        let mut query = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            query
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self {
            query,
            cancel: CancelSignal::never(),
        }
    }

    /// Read the query string of a request URI
    pub fn from_uri(uri: &Uri) -> Self {
        Self::from_query(uri.query().unwrap_or_default())
    }

    /// Set a query parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Attach the request's cancellation signal
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Look up a query parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The request's cancellation signal
    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageSource
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let source = Self::from_uri(&parts.uri);
        Ok(match parts.extensions.get::<CancelSignal>() {
            Some(cancel) => source.with_cancel(cancel.clone()),
            None => source,
        })
    }
}

// ============================================================================
// Construction config
// ============================================================================

/// Construction input for a [`PageMaster`](super::PageMaster)
///
/// `collection`, `source` and `store` are required. A zero `page_size` or
/// `query_timeout` means "unset".
#[derive(Clone, Default)]
pub struct PageConfig {
    /// Target collection name
    pub collection: Option<String>,
    /// Request whose query string supplies defaults
    pub source: Option<PageSource>,
    /// Store holding the collection
    pub store: Option<Arc<dyn DocumentStore>>,
    /// Continuation token; read from `?from=` when empty
    pub from_token: Option<String>,
    /// Page size; read from `?pageSize=` when zero, negative values are rejected
    pub page_size: i64,
    /// Per-phase query timeout; 60 s when zero
    pub query_timeout: Duration,
}

impl PageConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collection name
    #[must_use]
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Set the request source
    #[must_use]
    pub fn source(mut self, source: PageSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the document store
    #[must_use]
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the continuation token explicitly
    #[must_use]
    pub fn from_token(mut self, token: impl Into<String>) -> Self {
        self.from_token = Some(token.into());
        self
    }

    /// Set the page size explicitly
    #[must_use]
    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the per-phase query timeout
    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }
}

impl fmt::Debug for PageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageConfig")
            .field("collection", &self.collection)
            .field("source", &self.source)
            .field("store", &self.store.as_ref().map(|_| "<dyn DocumentStore>"))
            .field("from_token", &self.from_token)
            .field("page_size", &self.page_size)
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}
