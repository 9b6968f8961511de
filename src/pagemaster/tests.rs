//! Tests for pagemaster module

use super::*;
use crate::error::{Error, QueryError, QueryPhase};
use crate::store::{DocumentCursor, DocumentStore, FindQuery, MemoryStore, StoreResult, VecCursor};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;

fn oid(n: u32) -> ObjectId {
    let mut bytes = [0u8; 12];
    bytes[8..].copy_from_slice(&n.to_be_bytes());
    ObjectId::from_bytes(bytes)
}

async fn seeded(n: u32) -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    for i in 1..=n {
        store
            .insert("events", doc! { "_id": oid(i), "rank": i as i32 })
            .await
            .unwrap();
    }
    Arc::new(store)
}

fn config(store: Arc<MemoryStore>, source: PageSource) -> PageConfig {
    PageConfig::new()
        .collection("events")
        .source(source)
        .store(store)
}

fn ranks(documents: &[Document]) -> Vec<i32> {
    documents.iter().map(|d| d.get_i32("rank").unwrap()).collect()
}

/// Store whose phases sleep before answering
struct SlowStore {
    find_delay: Duration,
    collect_delay: Duration,
}

struct SlowCursor {
    delay: Duration,
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn find(
        &self,
        _collection: &str,
        _query: FindQuery,
    ) -> StoreResult<Box<dyn DocumentCursor>> {
        tokio::time::sleep(self.find_delay).await;
        Ok(Box::new(SlowCursor {
            delay: self.collect_delay,
        }))
    }
}

#[async_trait]
impl DocumentCursor for SlowCursor {
    async fn collect(self: Box<Self>) -> StoreResult<Vec<Document>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![doc! { "_id": oid(7) }])
    }
}

/// Store that ignores the limit and returns fixed documents
struct FixedStore(Vec<Document>);

#[async_trait]
impl DocumentStore for FixedStore {
    async fn find(
        &self,
        _collection: &str,
        _query: FindQuery,
    ) -> StoreResult<Box<dyn DocumentCursor>> {
        Ok(Box::new(VecCursor::new(self.0.clone())))
    }
}

// ============================================================================
// Construction Tests
// ============================================================================

#[tokio::test]
async fn test_new_requires_collection() {
    let store = seeded(0).await;
    let err = PageMaster::new(PageConfig::new().source(PageSource::new()).store(store))
        .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "collection"));
}

#[tokio::test]
async fn test_new_rejects_empty_collection() {
    let store = seeded(0).await;
    let err = PageMaster::new(config(store, PageSource::new()).collection("")).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "collection"));
}

#[tokio::test]
async fn test_new_requires_source() {
    let store = seeded(0).await;
    let err = PageMaster::new(PageConfig::new().collection("events").store(store)).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "source"));
}

#[test]
fn test_new_requires_store() {
    let err = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new()),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "store"));
}

#[tokio::test]
async fn test_new_rejects_negative_page_size() {
    let store = seeded(0).await;
    let err = PageMaster::new(config(store, PageSource::new()).page_size(-1)).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "page_size"));
}

#[test_case(None, 50 ; "absent defaults to fifty")]
#[test_case(Some(""), 50 ; "empty defaults to fifty")]
#[test_case(Some("abc"), 50 ; "unparsable defaults to fifty")]
#[test_case(Some("0"), 50 ; "zero defaults to fifty")]
#[test_case(Some("-3"), 50 ; "negative defaults to fifty")]
#[test_case(Some("1"), 1 ; "one is kept")]
#[test_case(Some("25"), 25 ; "in range is kept")]
#[test_case(Some("100"), 100 ; "maximum is kept")]
#[test_case(Some("101"), 100 ; "above maximum is clamped")]
#[test_case(Some("5000"), 100 ; "far above maximum is clamped")]
fn test_page_size_from_request(param: Option<&str>, expected: u32) {
    let mut source = PageSource::new();
    if let Some(value) = param {
        source = source.with_param(PAGE_SIZE_PARAM, value);
    }
    let page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(source)
            .store(Arc::new(MemoryStore::new())),
    )
    .unwrap();
    assert_eq!(page.page_size(), expected);
}

#[test_case(7, 7 ; "explicit value is kept")]
#[test_case(100, 100 ; "explicit maximum is kept")]
#[test_case(250, 100 ; "explicit value is clamped")]
fn test_explicit_page_size_wins(explicit: i64, expected: u32) {
    let source = PageSource::new().with_param(PAGE_SIZE_PARAM, "3");
    let page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(source)
            .store(Arc::new(MemoryStore::new()))
            .page_size(explicit),
    )
    .unwrap();
    assert_eq!(page.page_size(), expected);
}

#[tokio::test]
async fn test_defaults_and_accessors() {
    let store = seeded(0).await;
    let page = PageMaster::new(config(store, PageSource::new())).unwrap();

    assert_eq!(page.collection(), "events");
    assert_eq!(page.page_size(), DEFAULT_PAGE_SIZE);
    assert_eq!(page.query_timeout(), DEFAULT_QUERY_TIMEOUT);
    assert_eq!(page.from_token(), None);
    assert_eq!(page.next_token(), "");
}

#[tokio::test]
async fn test_from_token_sources() {
    let store = seeded(0).await;
    let source = PageSource::from_query("from=aaaaaaaaaaaaaaaaaaaaaaaa&pageSize=10");

    let page = PageMaster::new(config(store.clone(), source.clone())).unwrap();
    assert_eq!(page.from_token(), Some("aaaaaaaaaaaaaaaaaaaaaaaa"));
    assert_eq!(page.page_size(), 10);

    let page = PageMaster::new(config(store.clone(), source.clone()).from_token("explicit")).unwrap();
    assert_eq!(page.from_token(), Some("explicit"));

    let page = PageMaster::new(config(store, source).from_token("")).unwrap();
    assert_eq!(page.from_token(), Some("aaaaaaaaaaaaaaaaaaaaaaaa"));
}

#[tokio::test]
async fn test_empty_from_param_is_first_page() {
    let store = seeded(3).await;
    let mut page = PageMaster::new(config(store, PageSource::from_query("from="))).unwrap();
    assert_eq!(page.from_token(), None);
    assert_eq!(ranks(&page.find_page().await.unwrap()), vec![3, 2, 1]);
}

#[tokio::test]
async fn test_store_accessor_shares_handle() {
    let store = seeded(0).await;
    let shared: Arc<dyn DocumentStore> = store;
    let page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new())
            .store(shared.clone()),
    )
    .unwrap();
    assert!(Arc::ptr_eq(page.store(), &shared));
}

// ============================================================================
// Query Tests
// ============================================================================

#[tokio::test]
async fn test_first_page_returns_newest_descending() {
    let store = seeded(10).await;
    let mut page = PageMaster::new(config(store, PageSource::new()).page_size(4)).unwrap();

    let docs = page.find_page().await.unwrap();
    assert_eq!(ranks(&docs), vec![10, 9, 8, 7]);
    assert_eq!(page.next_token(), oid(7).to_hex());
}

#[tokio::test]
async fn test_five_hundred_documents_two_pages() {
    let store = seeded(500).await;

    let mut first = PageMaster::new(config(store.clone(), PageSource::new())).unwrap();
    let docs = first.find_page().await.unwrap();
    assert_eq!(ranks(&docs), (451..=500).rev().collect::<Vec<_>>());
    assert_eq!(first.next_token(), oid(451).to_hex());

    let source = PageSource::new()
        .with_param(FROM_PARAM, first.next_token())
        .with_param(PAGE_SIZE_PARAM, "50");
    let mut second = PageMaster::new(config(store, source)).unwrap();
    let docs = second.find_page().await.unwrap();
    assert_eq!(ranks(&docs), (401..=450).rev().collect::<Vec<_>>());
    assert_eq!(second.next_token(), oid(401).to_hex());
}

#[tokio::test]
async fn test_walking_all_pages_has_no_gap_or_overlap() {
    let store = seeded(95).await;
    let mut seen = Vec::new();
    let mut token = String::new();

    loop {
        let mut page =
            PageMaster::new(config(store.clone(), PageSource::new()).from_token(token.clone()).page_size(20))
                .unwrap();
        let docs = page.find_page().await.unwrap();
        if docs.is_empty() {
            assert_eq!(page.next_token(), "");
            break;
        }
        seen.extend(ranks(&docs));
        token = page.next_token().to_string();
    }

    assert_eq!(seen, (1..=95).rev().collect::<Vec<_>>());
}

#[tokio::test]
async fn test_empty_collection() {
    let store = seeded(0).await;
    let mut page = PageMaster::new(config(store, PageSource::new())).unwrap();
    assert!(page.find_page().await.unwrap().is_empty());
    assert_eq!(page.next_token(), "");
}

#[tokio::test]
async fn test_token_at_smallest_id_is_end_of_results() {
    let store = seeded(5).await;
    let mut page =
        PageMaster::new(config(store, PageSource::new()).from_token(oid(1).to_hex())).unwrap();
    assert!(page.find_page().await.unwrap().is_empty());
    assert_eq!(page.next_token(), "");
}

#[tokio::test]
async fn test_repeated_find_page_is_idempotent() {
    let store = seeded(5).await;
    let mut page = PageMaster::new(config(store, PageSource::new()).page_size(2)).unwrap();

    let first = page.find_page().await.unwrap();
    let token = page.next_token().to_string();
    let second = page.find_page().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(page.next_token(), token);
}

#[tokio::test]
async fn test_results_truncated_to_page_size() {
    let store = FixedStore(vec![
        doc! { "_id": oid(9) },
        doc! { "_id": oid(8) },
        doc! { "_id": oid(7) },
    ]);
    let mut page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new())
            .store(Arc::new(store))
            .page_size(2),
    )
    .unwrap();

    assert_eq!(page.find_page().await.unwrap().len(), 2);
    assert_eq!(page.next_token(), oid(8).to_hex());
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_token_is_client_error() {
    let store = seeded(5).await;
    let mut page =
        PageMaster::new(config(store, PageSource::from_query("from=not-a-token"))).unwrap();

    let err = page.find_page().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            source: QueryError::InvalidCursor { .. },
            ..
        }
    ));
    assert!(err.is_client_error());
    assert_eq!(page.next_token(), "");
}

#[tokio::test]
async fn test_last_document_without_object_id_fails() {
    let store = FixedStore(vec![doc! { "_id": oid(9) }, doc! { "_id": "plain" }]);
    let mut page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new())
            .store(Arc::new(store)),
    )
    .unwrap();

    let err = page.find_page().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            source: QueryError::Decode { .. },
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_submit_timeout() {
    let store = SlowStore {
        find_delay: Duration::from_secs(5),
        collect_delay: Duration::ZERO,
    };
    let mut page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new())
            .store(Arc::new(store))
            .query_timeout(Duration::from_millis(20)),
    )
    .unwrap();

    let err = page.find_page().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            source: QueryError::Timeout {
                phase: QueryPhase::Submit,
                timeout_ms: 20
            },
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_collect_timeout() {
    let store = SlowStore {
        find_delay: Duration::ZERO,
        collect_delay: Duration::from_secs(5),
    };
    let mut page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new())
            .store(Arc::new(store))
            .query_timeout(Duration::from_millis(20)),
    )
    .unwrap();

    let err = page.find_page().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            source: QueryError::Timeout {
                phase: QueryPhase::Collect,
                ..
            },
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_each_phase_gets_its_own_timeout() {
    // Each phase fits in the window; together they would not. Time is
    // virtual, so the margins are exact.
    let store = SlowStore {
        find_delay: Duration::from_millis(80),
        collect_delay: Duration::from_millis(80),
    };
    let mut page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new())
            .store(Arc::new(store))
            .query_timeout(Duration::from_millis(120)),
    )
    .unwrap();

    let docs = page.find_page().await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(page.next_token(), oid(7).to_hex());
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_source_aborts_query() {
    let (handle, signal) = cancel_pair();
    let store = SlowStore {
        find_delay: Duration::from_secs(30),
        collect_delay: Duration::ZERO,
    };
    let mut page = PageMaster::new(
        PageConfig::new()
            .collection("events")
            .source(PageSource::new().with_cancel(signal))
            .store(Arc::new(store)),
    )
    .unwrap();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), page.find_page())
        .await
        .expect("cancellation should abort the query promptly")
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            source: QueryError::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn test_already_cancelled_source() {
    let (handle, signal) = cancel_pair();
    handle.cancel();
    assert!(signal.is_cancelled());

    let store = seeded(3).await;
    let mut page = PageMaster::new(config(store, PageSource::new().with_cancel(signal))).unwrap();
    let err = page.find_page().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Query {
            source: QueryError::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn test_dropped_handle_never_cancels() {
    let (handle, signal) = cancel_pair();
    drop(handle);
    assert!(!signal.is_cancelled());

    let store = seeded(3).await;
    let mut page = PageMaster::new(config(store, PageSource::new().with_cancel(signal))).unwrap();
    assert_eq!(page.find_page().await.unwrap().len(), 3);
}

// ============================================================================
// PageSource Tests
// ============================================================================

#[test]
fn test_page_source_from_query() {
    let source = PageSource::from_query("from=abc&pageSize=20&from=ignored&q=a%20b");
    assert_eq!(source.param("from"), Some("abc"));
    assert_eq!(source.param("pageSize"), Some("20"));
    assert_eq!(source.param("q"), Some("a b"));
    assert_eq!(source.param("missing"), None);
    assert!(!source.cancel_signal().is_cancelled());
}

#[test]
fn test_page_source_from_uri() {
    let uri: axum::http::Uri = "/collections/events/documents?pageSize=5".parse().unwrap();
    assert_eq!(PageSource::from_uri(&uri).param("pageSize"), Some("5"));

    let uri: axum::http::Uri = "/collections/events/documents".parse().unwrap();
    assert_eq!(PageSource::from_uri(&uri).param("pageSize"), None);
}

#[tokio::test]
async fn test_page_source_extractor_reads_cancel_extension() {
    use axum::extract::FromRequestParts;

    let (handle, signal) = cancel_pair();
    let request = axum::http::Request::builder()
        .uri("/x?from=tok")
        .extension(signal)
        .body(())
        .unwrap();
    let (mut parts, ()) = request.into_parts();

    let source = PageSource::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(source.param("from"), Some("tok"));

    handle.cancel();
    assert!(source.cancel_signal().is_cancelled());
}
