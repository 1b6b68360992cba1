pub mod render;
pub mod source;

use anyhow::Result;
use axum::{extract::{Query, State}, http::StatusCode, response::{Html, IntoResponse, Response}, routing::get, Json, Router};
use offsearch_core::{Popover, SearchEngine};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use source::IndexSource;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    /// Distance in pixels from the viewport top to the search input.
    #[serde(default)]
    pub anchor: f64,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub ready: bool,
    pub took_s: f64,
    pub popover: Popover,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub max_results: usize,
    pub base_href: String,
}

/// Shared server state. The engine slot is empty until the index has
/// loaded and is written at most once.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<RwLock<Option<Arc<SearchEngine>>>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self { engine: Arc::new(RwLock::new(None)), settings: Arc::new(settings) }
    }

    pub fn engine(&self) -> Option<Arc<SearchEngine>> {
        self.engine.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.engine.read().is_some()
    }

    /// Install a loaded engine. Returns false if one was already installed.
    pub fn install(&self, engine: SearchEngine) -> bool {
        let mut slot = self.engine.write();
        if slot.is_some() {
            return false;
        }
        tracing::info!(num_docs = engine.index.num_docs, "search index ready");
        *slot = Some(Arc::new(engine));
        true
    }

    /// Run a query; a no-op while the index is not loaded.
    pub fn search(&self, query: &str) -> Popover {
        match self.engine() {
            Some(engine) => engine.search(query, self.settings.max_results, &self.settings.base_href),
            None => Popover::Hidden,
        }
    }
}

/// Fetch and build the index, then install it.
pub async fn load_index(state: &AppState, source: &IndexSource, timeout: Duration) -> Result<()> {
    tracing::info!(%source, "loading search index");
    let engine = source.load(timeout).await?;
    state.install(engine);
    Ok(())
}

/// Load the index in the background. A failure is logged and leaves the
/// server unready for good; searches keep answering with a hidden popover.
pub fn spawn_index_load(state: AppState, source: IndexSource, timeout: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = load_index(&state, &source, timeout).await {
            tracing::error!(%source, error = %e, "failed to load search index");
        }
    })
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/ready", get(ready_handler))
        .route("/search", get(search_handler))
        .route("/popover", get(popover_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn ready_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ready": state.is_ready() }))
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let popover = state.search(&params.q);
    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, ready: state.is_ready(), took_s: elapsed.as_secs_f64(), popover })
}

/// The popover as an HTML fragment, or 204 when nothing should be shown.
pub async fn popover_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let popover = state.search(&params.q);
    match render::render_popover(&popover, params.anchor) {
        Some(html) => Html(html).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
