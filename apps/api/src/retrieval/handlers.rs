use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::retrieval::{
    content_preview, title_and_company_from_posting, CrossCollectionResults, QueryInfo,
    RetrievalLimits, RetrievedContext, RetrievedDocument,
};
use crate::state::AppState;

const CONTEXT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct TestRetrievalRequest {
    pub query: String,
    #[serde(default = "default_test_results")]
    pub n_results: usize,
}

fn default_test_results() -> usize {
    3
}

#[derive(Debug, Serialize)]
pub struct TestRetrievalResponse {
    pub query: String,
    pub results: Vec<RetrievedDocument>,
    pub total_found: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchAllRequest {
    pub query: String,
    #[serde(default = "default_search_all_results")]
    pub n_results: usize,
}

fn default_search_all_results() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct ContextAnalysisRequest {
    pub job_title: String,
    pub company_name: String,
    pub user_question: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DebugContextRequest {
    #[serde(default)]
    pub job_posting: String,
}

#[derive(Debug, Serialize)]
pub struct PdfSummary {
    pub id: String,
    pub similarity_score: f32,
    pub content_preview: String,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ContextAnalysis {
    pub job_postings_found: usize,
    pub pdf_documents_found: usize,
    pub pdf_documents: Vec<PdfSummary>,
    pub avg_job_similarity: f32,
    pub avg_pdf_similarity: f32,
    pub query_info: QueryInfo,
}

#[derive(Debug, Serialize)]
pub struct ContextAnalysisResponse {
    pub context_analysis: ContextAnalysis,
}

impl From<RetrievedContext> for ContextAnalysis {
    fn from(context: RetrievedContext) -> Self {
        let pdf_documents = context
            .pdf_documents
            .into_iter()
            .map(|doc| PdfSummary {
                content_preview: content_preview(&doc.content, CONTEXT_PREVIEW_CHARS),
                id: doc.id,
                similarity_score: doc.similarity_score,
                metadata: doc.metadata,
            })
            .collect();

        Self {
            job_postings_found: context.job_postings.len(),
            pdf_documents_found: context.summary.total_pdf_documents,
            pdf_documents,
            avg_job_similarity: context.summary.avg_job_similarity,
            avg_pdf_similarity: context.summary.avg_pdf_similarity,
            query_info: context.query_info,
        }
    }
}

/// POST /debug/test-retrieval
pub async fn handle_test_retrieval(
    State(state): State<AppState>,
    Json(request): Json<TestRetrievalRequest>,
) -> Result<Json<TestRetrievalResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let results = state
        .retriever
        .retrieve_pdf_documents(&request.query, request.n_results)
        .await?;

    Ok(Json(TestRetrievalResponse {
        query: request.query,
        total_found: results.len(),
        results,
    }))
}

/// POST /search/all
pub async fn handle_search_all(
    State(state): State<AppState>,
    Json(request): Json<SearchAllRequest>,
) -> Result<Json<CrossCollectionResults>, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }
    let results = state
        .retriever
        .search_all(&request.query, request.n_results)
        .await?;
    Ok(Json(results))
}

/// POST /debug/context-analysis
pub async fn handle_context_analysis(
    State(state): State<AppState>,
    Json(request): Json<ContextAnalysisRequest>,
) -> Result<Json<ContextAnalysisResponse>, AppError> {
    let context = state
        .retriever
        .retrieve_context(
            &request.job_title,
            &request.company_name,
            request.user_question.as_deref(),
            RetrievalLimits::default(),
        )
        .await?;

    Ok(Json(ContextAnalysisResponse {
        context_analysis: context.into(),
    }))
}

/// POST /api/debug-context
///
/// Same analysis, but title and company come from the first two lines of a
/// pasted posting.
pub async fn handle_debug_context(
    State(state): State<AppState>,
    Json(request): Json<DebugContextRequest>,
) -> Result<Json<ContextAnalysisResponse>, AppError> {
    let (job_title, company_name) = title_and_company_from_posting(&request.job_posting);
    let context = state
        .retriever
        .retrieve_context(&job_title, &company_name, None, RetrievalLimits::default())
        .await?;

    Ok(Json(ContextAnalysisResponse {
        context_analysis: context.into(),
    }))
}
