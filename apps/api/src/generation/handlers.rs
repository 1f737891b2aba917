//! Axum route handlers for cover letter generation.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::generation::pipeline::{
    AnalyzeAndGenerateRequest, AnalyzedLetter, BatchResult, PipelineRequest, PipelineResult,
    PipelineStats,
};
use crate::generation::writer::{JobAnalysis, MAX_VARIATIONS};
use crate::retrieval::title_and_company_from_posting;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /generate-cover-letter`. The frontend may send a pasted
/// `job_posting` (title on the first line, company on the second) instead of
/// explicit `job_title` / `company_name`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCoverLetterRequest {
    pub job_posting: Option<String>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub user_question: Option<String>,
    pub user_background: Option<String>,
    #[serde(default)]
    pub include_variations: bool,
    #[serde(default = "default_num_variations")]
    pub num_variations: usize,
}

fn default_num_variations() -> usize {
    3
}

impl GenerateCoverLetterRequest {
    pub fn into_pipeline_request(self) -> PipelineRequest {
        let (job_title, company_name) = match &self.job_posting {
            Some(posting) => title_and_company_from_posting(posting),
            None => (
                non_blank(self.job_title).unwrap_or_else(|| "Unknown Position".to_string()),
                non_blank(self.company_name).unwrap_or_else(|| "Unknown Company".to_string()),
            ),
        };

        PipelineRequest {
            job_title,
            company_name,
            user_question: non_blank(self.user_question),
            user_background: non_blank(self.user_background),
            include_variations: self.include_variations,
            num_variations: self.num_variations.clamp(1, MAX_VARIATIONS),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeJobPostingRequest {
    pub job_description: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generate-cover-letter
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateCoverLetterRequest>,
) -> Result<Json<PipelineResult>, AppError> {
    let request = request.into_pipeline_request();
    Ok(Json(state.pipeline.run(&request).await?))
}

/// POST /generate-cover-letter/batch
pub async fn handle_batch_generate(
    State(state): State<AppState>,
    Json(requests): Json<Vec<GenerateCoverLetterRequest>>,
) -> Result<Json<BatchResult>, AppError> {
    if requests.is_empty() {
        return Err(AppError::Validation("batch cannot be empty".to_string()));
    }
    let requests = requests
        .into_iter()
        .map(GenerateCoverLetterRequest::into_pipeline_request)
        .collect();
    Ok(Json(state.pipeline.batch_generate(requests).await))
}

/// POST /analyze-job-posting
pub async fn handle_analyze_job_posting(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeJobPostingRequest>,
) -> Result<Json<JobAnalysis>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    let analysis = state
        .pipeline
        .writer()
        .analyze_job_posting(&request.job_description)
        .await?;
    Ok(Json(analysis))
}

/// POST /analyze-and-generate
pub async fn handle_analyze_and_generate(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeAndGenerateRequest>,
) -> Result<Json<AnalyzedLetter>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    Ok(Json(state.pipeline.analyze_and_generate(&request).await?))
}

/// GET /pipeline/stats
pub async fn handle_pipeline_stats(State(state): State<AppState>) -> Json<PipelineStats> {
    Json(state.pipeline.stats().await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> PipelineRequest {
        serde_json::from_str::<GenerateCoverLetterRequest>(json)
            .unwrap()
            .into_pipeline_request()
    }

    #[test]
    fn test_explicit_title_and_company() {
        let req = request(r#"{"job_title": "Engineer", "company_name": "Acme", "user_question": "  "}"#);
        assert_eq!(req.job_title, "Engineer");
        assert_eq!(req.company_name, "Acme");
        assert_eq!(req.user_question, None);
        assert!(!req.include_variations);
        assert_eq!(req.num_variations, 3);
    }

    #[test]
    fn test_pasted_job_posting_takes_precedence() {
        let req = request(
            r#"{"job_posting": "Data Engineer\nGlobex\nWe move data", "job_title": "ignored"}"#,
        );
        assert_eq!(req.job_title, "Data Engineer");
        assert_eq!(req.company_name, "Globex");
    }

    #[test]
    fn test_defaults_and_variation_clamp() {
        let req = request(r#"{"include_variations": true, "num_variations": 40}"#);
        assert_eq!(req.job_title, "Unknown Position");
        assert_eq!(req.company_name, "Unknown Company");
        assert_eq!(req.num_variations, MAX_VARIATIONS);

        let req = request(r#"{"num_variations": 0}"#);
        assert_eq!(req.num_variations, 1);
    }
}
