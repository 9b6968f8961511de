//! HTTP server mode: paginated REST access to an in-memory document store

use axum::{
    body::Body,
    extract::{FromRef, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use bson::{doc, Bson, Document};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bodyparser::{self, DEFAULT_BODY_LIMIT};
use crate::config::{PaginationSettings, SeedSettings, ServerSettings};
use crate::error::{Error, Result};
use crate::healthcheck::{self, HealthCheck};
use crate::pagemaster::{cancel_pair, CancelHandle, PageConfig, PageMaster, PageSource};
use crate::store::{DocumentStore, MemoryStore, StoreResult};
use crate::viewer;

/// App state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub health: HealthCheck,
    pub pagination: PaginationSettings,
}

impl AppState {
    pub fn new(store: Arc<MemoryStore>, pagination: PaginationSettings) -> Self {
        Self {
            store,
            health: HealthCheck::always_healthy(),
            pagination,
        }
    }
}

impl FromRef<AppState> for HealthCheck {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

/// Build the router with all routes and layers
pub fn app(state: AppState) -> Router {
    // Build CORS layer - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(healthcheck::handler))
        .route("/healthz", get(healthcheck::liveness))
        .route(
            "/collections/:name/documents",
            get(list_documents).post(create_document),
        )
        .layer(middleware::from_fn(cancel_on_drop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn serve(settings: ServerSettings) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    seed_store(&store, &settings.seed)
        .await
        .map_err(|e| Error::config(format!("Failed to seed demo data: {e}")))?;

    let app = app(AppState::new(store, settings.pagination.clone()));

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!(
        name = crate::NAME,
        version = crate::VERSION,
        "Starting HTTP server on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Insert the configured number of generated documents
///
/// Ids are assigned in insertion order, so the last document inserted is the
/// first one listed.
pub async fn seed_store(store: &MemoryStore, seed: &SeedSettings) -> StoreResult<()> {
    if seed.count == 0 {
        return Ok(());
    }

    let documents = (0..seed.count).map(|i| {
        doc! {
            "seq": i as i64,
            "title": format!("{} #{}", seed.collection, i + 1),
            "createdAt": bson::DateTime::now(),
        }
    });
    store.insert_many(&seed.collection, documents).await?;

    tracing::info!(collection = %seed.collection, count = seed.count, "seeded demo documents");
    Ok(())
}

/// Cancels the request's queries if the response future is dropped
struct CancelOnDrop(CancelHandle);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

async fn cancel_on_drop(mut request: Request, next: Next) -> Response {
    let (handle, signal) = cancel_pair();
    request.extensions_mut().insert(signal);
    let _guard = CancelOnDrop(handle);
    next.run(request).await
}

/// List one page of a collection, newest first
async fn list_documents(
    State(state): State<AppState>,
    Path(name): Path<String>,
    source: PageSource,
) -> Result<Response> {
    let store: Arc<dyn DocumentStore> = state.store.clone();
    let mut master = PageMaster::new(
        PageConfig::new()
            .collection(name)
            .source(source)
            .store(store)
            .page_size(state.pagination.page_size)
            .query_timeout(state.pagination.query_timeout()),
    )?;

    let documents = master.find_page().await?;
    let data: Vec<Value> = documents.into_iter().map(to_json).collect();

    Ok(viewer::send_page(&data, master.next_token()))
}

/// Insert a JSON object into a collection
async fn create_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Body,
) -> Result<Response> {
    let object: Map<String, Value> = bodyparser::read_json(body, DEFAULT_BODY_LIMIT).await?;
    let document = Document::try_from(object).map_err(|e| Error::body(e.to_string()))?;

    let id = state
        .store
        .insert(&name, document)
        .await
        .map_err(|e| Error::body(e.to_string()))?;
    tracing::debug!(collection = %name, id = %id, "document created");

    Ok(viewer::send_data(
        &json!({ "id": id.to_hex() }),
        Some(StatusCode::CREATED),
    ))
}

fn to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}
