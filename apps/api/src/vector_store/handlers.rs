use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::AppError;
use crate::retrieval::content_preview;
use crate::state::AppState;
use crate::vector_store::{Collection, SearchHit};

const DEBUG_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_n_results")]
    pub n_results: usize,
}

fn default_collection() -> String {
    Collection::PdfDocuments.as_str().to_string()
}

fn default_n_results() -> usize {
    5
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub collection: String,
    pub results: Vec<SearchHit>,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: usize,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct PdfContent {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub full_content_length: usize,
}

/// GET /vector-store/stats
pub async fn handle_stats(State(state): State<AppState>) -> Json<Value> {
    let stats = state.vector_store.stats(None).await;
    Json(json!({
        "status": "success",
        "stats": stats,
    }))
}

/// POST /search
pub async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let collection: Collection = request.collection.parse()?;
    let results = state
        .vector_store
        .search(collection, &request.query, request.n_results)
        .await?;

    Ok(Json(SearchResponse {
        query: request.query,
        collection: request.collection,
        results,
        status: "success",
    }))
}

/// POST /generate-embeddings
///
/// Blank inputs are dropped before embedding, so `count` may be smaller than the
/// request length.
pub async fn handle_generate_embeddings(
    State(state): State<AppState>,
    Json(texts): Json<Vec<String>>,
) -> Result<Json<EmbeddingsResponse>, AppError> {
    let texts: Vec<String> = texts.into_iter().filter(|t| !t.trim().is_empty()).collect();
    let embeddings = state
        .vector_store
        .embedder()
        .embed(&texts)
        .await
        .map_err(|e| AppError::Embedding(format!("Embedding generation failed: {e}")))?;

    Ok(Json(EmbeddingsResponse {
        dimension: embeddings.first().map(Vec::len).unwrap_or(0),
        count: embeddings.len(),
        embeddings,
    }))
}

/// GET /debug/pdf-contents
pub async fn handle_debug_pdf_contents(State(state): State<AppState>) -> Json<Value> {
    let pdf_contents: Vec<PdfContent> = state
        .vector_store
        .get_all(Collection::PdfDocuments)
        .await
        .into_iter()
        .map(|r| PdfContent {
            content: content_preview(&r.document, DEBUG_PREVIEW_CHARS),
            full_content_length: r.document.chars().count(),
            id: r.id,
            metadata: r.metadata,
        })
        .collect();

    Json(json!({
        "total_pdfs": pdf_contents.len(),
        "pdf_contents": pdf_contents,
    }))
}

/// GET /debug/vector-store-stats
pub async fn handle_debug_stats(State(state): State<AppState>) -> Json<Value> {
    let stats = state.vector_store.stats(None).await;
    let total: usize = stats.values().map(|s| s.document_count).sum();
    let per_collection: Map<String, Value> = stats
        .into_iter()
        .map(|(name, s)| {
            (
                name,
                json!({ "document_count": s.document_count, "status": "active" }),
            )
        })
        .collect();

    Json(json!({
        "vector_store_stats": per_collection,
        "total_documents": total,
    }))
}

/// DELETE /vector-store/:collection
///
/// Drops every record in one collection. Job posting and cover letter files
/// on disk are left alone.
pub async fn handle_reset(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Json<Value>, AppError> {
    let collection: Collection = collection.parse()?;
    state.vector_store.reset(collection).await?;
    Ok(Json(json!({
        "status": "success",
        "collection": collection,
    })))
}
