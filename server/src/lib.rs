use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use plume_core::persist::{load_query_engine, IndexPaths};
use plume_core::query::{QueryEngine, SearchHit, DEFAULT_TOP_K};
use plume_core::DocId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
    /// Doc ids the index ranked but the store could not resolve. Non-empty
    /// means the index artifacts are stale relative to the store.
    pub stale_doc_ids: Vec<DocId>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    // Load all index artifacts at startup; they stay immutable for the
    // life of the process, so every request shares them lock-free.
    let paths = IndexPaths::new(&index_dir);
    let (engine, meta) = load_query_engine(&paths)?;
    tracing::info!(num_docs = meta.num_docs, "index loaded");
    let state = AppState {
        engine: Arc::new(engine),
    };

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
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let k = params.k.clamp(1, 100);
    let results = match state.engine.search(&params.q, k, None) {
        Ok(results) => results,
        Err(err) => {
            tracing::warn!(%err, "search aborted");
            Default::default()
        }
    };
    if !results.inconsistencies.is_empty() {
        tracing::warn!(
            doc_ids = ?results.inconsistencies,
            "index references documents missing from the store"
        );
    }
    Json(SearchResponse {
        query: params.q,
        took_s: start.elapsed().as_secs_f64(),
        total_hits: results.hits.len(),
        results: results.hits,
        stale_doc_ids: results.inconsistencies,
    })
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Json<serde_json::Value> {
    match state.engine.store().get(doc_id) {
        Some(record) => Json(serde_json::json!({
            "doc_id": doc_id,
            "title": record.title,
            "authors": record.authors,
            "tags": record.tags,
            "url": record.url,
        })),
        None => Json(serde_json::json!({ "error": "not found" })),
    }
}
