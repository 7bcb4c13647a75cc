//! HTTP API server for integration with other front ends.
//!
//! Exposes the retrieval pipeline over REST. One retriever, and therefore one
//! loaded model and one store handle, serves every request.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidGenieError;
use crate::retrieval::{RetrievalResult, Retriever};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    retriever: Retriever,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let retriever = Retriever::from_settings(&settings)?;

    let spinner = Output::spinner("Loading embedding model...");
    let warm = retriever.warm_up().await;
    spinner.finish_and_clear();
    warm?;

    let state = Arc::new(AppState { retriever });

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("VidGenie API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Search", "POST /search");
    Output::kv("Search (query string)", "GET  /search?q=...&top_k=...");
    Output::kv("Collection", "GET  /collection");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/search", get(search_query).post(search))
        .route("/collection", get(collection))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchHit>,
}

#[derive(Serialize)]
struct SearchHit {
    #[serde(flatten)]
    result: RetrievalResult,
    timestamp: String,
    watch_url: String,
}

impl From<RetrievalResult> for SearchHit {
    fn from(result: RetrievalResult) -> Self {
        Self {
            timestamp: result.timestamp(),
            watch_url: result.watch_url(),
            result,
        }
    }
}

#[derive(Serialize)]
struct CollectionResponse {
    collection: String,
    chunk_count: usize,
    dimension: usize,
    model: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn status_for(error: &VidGenieError) -> StatusCode {
    match error {
        VidGenieError::InvalidQuery(_)
        | VidGenieError::InvalidInput(_)
        | VidGenieError::DimensionMismatch { .. } => StatusCode::BAD_REQUEST,
        VidGenieError::CollectionNotFound(_) => StatusCode::NOT_FOUND,
        VidGenieError::ModelUnavailable(_) | VidGenieError::StoreUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: VidGenieError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        warn!("Request failed: {}", error);
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    run_query(&state, req.query, req.top_k).await
}

async fn search_query(State(state): State<Arc<AppState>>, Query(params): Query<SearchParams>) -> Response {
    run_query(&state, params.q, params.top_k).await
}

async fn run_query(state: &AppState, query: String, top_k: Option<usize>) -> Response {
    match state.retriever.retrieve(&query, top_k).await {
        Ok(results) => Json(SearchResponse {
            query,
            results: results.into_iter().map(SearchHit::from).collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn collection(State(state): State<Arc<AppState>>) -> Response {
    let store = state.retriever.vector_store();
    match store.count().await {
        Ok(chunk_count) => Json(CollectionResponse {
            collection: store.collection().to_string(),
            chunk_count,
            dimension: store.dimension(),
            model: state.retriever.embedder().model_name().to_string(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::{KeywordEmbedder, UnavailableEmbedder};
    use crate::vector_store::{ChunkMetadata, ChunkRecord, MemoryVectorStore};

    fn state_with(embedder: Arc<dyn crate::embedding::Embedder>) -> Arc<AppState> {
        let store = MemoryVectorStore::new("video_metadata", 2)
            .with_records([ChunkRecord {
                id: "c1".to_string(),
                document: "Title: Scaling\nDescription: Talk\nTranscript: shard the index".to_string(),
                metadata: ChunkMetadata::new("https://www.youtube.com/watch?v=xyz", 75.0),
                embedding: vec![1.0, 0.0],
            }])
            .unwrap();
        let retriever = Retriever::new(embedder, Arc::new(store)).unwrap();
        Arc::new(AppState { retriever })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let state = state_with(Arc::new(KeywordEmbedder::new(&["index", "cache"])));
        let response = search(
            State(state),
            Json(SearchRequest {
                query: "how to index".to_string(),
                top_k: None,
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let hit = &body["results"][0];
        assert_eq!(hit["title"], "Scaling");
        assert_eq!(hit["transcript_excerpt"], "shard the index");
        assert_eq!(hit["timestamp"], "1:15");
        assert_eq!(hit["watch_url"], "https://www.youtube.com/watch?v=xyz&t=75s");
    }

    #[tokio::test]
    async fn test_search_query_string() {
        let state = state_with(Arc::new(KeywordEmbedder::new(&["index", "cache"])));
        let response = search_query(
            State(state),
            Query(SearchParams {
                q: "cache".to_string(),
                top_k: Some(5),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let state = state_with(Arc::new(KeywordEmbedder::new(&["index", "cache"])));
        let response = run_query(&state, "  ".to_string(), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let state = state_with(Arc::new(UnavailableEmbedder { dimensions: 2 }));
        let response = run_query(&state, "index".to_string(), None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("model"));

        assert_eq!(
            status_for(&VidGenieError::CollectionNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&VidGenieError::VectorStore("poisoned".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_collection_endpoint() {
        let state = state_with(Arc::new(KeywordEmbedder::new(&["index", "cache"])));
        let response = collection(State(state)).await;
        let body = body_json(response).await;
        assert_eq!(body["collection"], "video_metadata");
        assert_eq!(body["chunk_count"], 1);
        assert_eq!(body["dimension"], 2);
        assert_eq!(body["model"], "keyword-test");
    }

    #[test]
    fn test_router_builds() {
        let state = state_with(Arc::new(KeywordEmbedder::new(&["index", "cache"])));
        let _ = router(state);
    }
}
