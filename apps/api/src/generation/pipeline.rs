//! Cover Letter Pipeline: retrieval, context assembly, then generation.
//!
//! Flow: retrieve_context → best posting description → combined top-5
//!       context → writer (single letter or N variations).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::prompts::NO_DESCRIPTION;
use crate::generation::writer::{
    ContextKind, ContextSnippet, CoverLetterPrompt, CoverLetterWriter, GeneratedLetter,
    GeneratedVariations,
};
use crate::retrieval::{
    ContextRetriever, RetrievalLimits, RetrievalStats, RetrievedContext, RetrievedDocument,
};

pub const PIPELINE_NAME: &str = "Cover Letter Generation Pipeline";
pub const PIPELINE_VERSION: &str = "1.0";
pub const PIPELINE_COMPONENTS: [&str; 2] = ["retrieval", "llm_integration"];
const MAX_COMBINED_CONTEXT: usize = 5;
const DESCRIPTION_MARKER: &str = "Description:";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub job_title: String,
    pub company_name: String,
    pub user_question: Option<String>,
    pub user_background: Option<String>,
    pub include_variations: bool,
    pub num_variations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextInfo {
    pub job_postings_found: usize,
    pub pdf_documents_found: usize,
    pub avg_job_similarity: f32,
    pub avg_pdf_similarity: f32,
}

impl From<&RetrievedContext> for ContextInfo {
    fn from(context: &RetrievedContext) -> Self {
        Self {
            job_postings_found: context.summary.total_job_postings,
            pdf_documents_found: context.summary.total_pdf_documents,
            avg_job_similarity: context.summary.avg_job_similarity,
            avg_pdf_similarity: context.summary.avg_pdf_similarity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineInfo {
    pub generated_at: DateTime<Utc>,
    pub pipeline_version: &'static str,
    pub components_used: [&'static str; 2],
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GenerationOutput {
    Single(GeneratedLetter),
    Variations(GeneratedVariations),
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    #[serde(flatten)]
    pub output: GenerationOutput,
    pub context_info: ContextInfo,
    pub pipeline_info: PipelineInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeAndGenerateRequest {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub user_question: Option<String>,
    pub user_background: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedLetter {
    #[serde(flatten)]
    pub letter: GeneratedLetter,
    pub job_analysis: Value,
    pub context_info: ContextInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Completed(PipelineResult),
    Failed { error: String, status: &'static str },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub request_index: usize,
    pub request_info: PipelineRequest,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_results: Vec<BatchItem>,
    pub total_requests: usize,
    pub successful: usize,
    pub failed: usize,
    pub batch_completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineDescription {
    pub name: &'static str,
    pub version: &'static str,
    pub components: [&'static str; 2],
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmInfo {
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub pipeline_info: PipelineDescription,
    pub retrieval_stats: RetrievalStats,
    pub llm_info: LlmInfo,
}

#[derive(Clone)]
pub struct CoverLetterPipeline {
    retriever: ContextRetriever,
    writer: CoverLetterWriter,
}

impl CoverLetterPipeline {
    pub fn new(retriever: ContextRetriever, writer: CoverLetterWriter) -> Self {
        Self { retriever, writer }
    }

    pub fn writer(&self) -> &CoverLetterWriter {
        &self.writer
    }

    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineResult, AppError> {
        let context = self
            .retriever
            .retrieve_context(
                &request.job_title,
                &request.company_name,
                request.user_question.as_deref(),
                RetrievalLimits::default(),
            )
            .await?;

        let prompt = CoverLetterPrompt {
            job_title: request.job_title.clone(),
            company_name: request.company_name.clone(),
            job_description: extract_job_description(&context.job_postings),
            user_question: request.user_question.clone(),
            user_background: request.user_background.clone(),
            context: combine_context(&context),
        };

        let output = if request.include_variations {
            GenerationOutput::Variations(
                self.writer
                    .generate_variations(&prompt, request.num_variations)
                    .await?,
            )
        } else {
            GenerationOutput::Single(self.writer.generate(&prompt).await?)
        };

        Ok(PipelineResult {
            output,
            context_info: ContextInfo::from(&context),
            pipeline_info: PipelineInfo {
                generated_at: Utc::now(),
                pipeline_version: PIPELINE_VERSION,
                components_used: PIPELINE_COMPONENTS,
            },
        })
    }

    /// Analyses the supplied description, then generates a letter from it
    /// instead of a retrieved posting description.
    pub async fn analyze_and_generate(
        &self,
        request: &AnalyzeAndGenerateRequest,
    ) -> Result<AnalyzedLetter, AppError> {
        let analysis = self
            .writer
            .analyze_job_posting(&request.job_description)
            .await?;

        let context = self
            .retriever
            .retrieve_context(
                &request.job_title,
                &request.company_name,
                request.user_question.as_deref(),
                RetrievalLimits::default(),
            )
            .await?;

        let prompt = CoverLetterPrompt {
            job_title: request.job_title.clone(),
            company_name: request.company_name.clone(),
            job_description: request.job_description.clone(),
            user_question: request.user_question.clone(),
            user_background: request.user_background.clone(),
            context: combine_context(&context),
        };
        let letter = self.writer.generate(&prompt).await?;

        Ok(AnalyzedLetter {
            letter,
            job_analysis: analysis.analysis,
            context_info: ContextInfo::from(&context),
        })
    }

    /// Runs requests one after another. A failed request is recorded and the
    /// batch continues.
    pub async fn batch_generate(&self, requests: Vec<PipelineRequest>) -> BatchResult {
        let total_requests = requests.len();
        let mut batch_results = Vec::with_capacity(total_requests);

        for (request_index, request) in requests.into_iter().enumerate() {
            let outcome = match self.run(&request).await {
                Ok(result) => BatchOutcome::Completed(result),
                Err(e) => {
                    warn!("Batch request {request_index} failed: {e}");
                    BatchOutcome::Failed {
                        error: e.to_string(),
                        status: "failed",
                    }
                }
            };
            batch_results.push(BatchItem {
                request_index,
                request_info: request,
                outcome,
            });
        }

        let failed = batch_results
            .iter()
            .filter(|item| matches!(item.outcome, BatchOutcome::Failed { .. }))
            .count();
        info!(
            "Batch generation finished: {}/{} succeeded",
            total_requests - failed,
            total_requests
        );

        BatchResult {
            batch_results,
            total_requests,
            successful: total_requests - failed,
            failed,
            batch_completed_at: Utc::now(),
        }
    }

    pub async fn stats(&self) -> PipelineStats {
        PipelineStats {
            pipeline_info: PipelineDescription {
                name: PIPELINE_NAME,
                version: PIPELINE_VERSION,
                components: PIPELINE_COMPONENTS,
                last_updated: Utc::now(),
            },
            retrieval_stats: self.retriever.stats().await,
            llm_info: LlmInfo {
                model: self.writer.model().to_string(),
                temperature: self.writer.temperature(),
            },
        }
    }
}

/// Description line of the best-matching posting. Falls back to the whole
/// posting text, or a fixed sentence when nothing matched.
pub fn extract_job_description(job_postings: &[RetrievedDocument]) -> String {
    // Ties keep the earlier (higher-ranked) posting.
    let Some(best) = job_postings.iter().reduce(|best, doc| {
        if doc.similarity_score > best.similarity_score {
            doc
        } else {
            best
        }
    }) else {
        return NO_DESCRIPTION.to_string();
    };

    match best.content.split_once(DESCRIPTION_MARKER) {
        Some((_, rest)) => rest.lines().next().unwrap_or_default().trim().to_string(),
        None => best.content.clone(),
    }
}

/// Postings and PDF pages as one list, highest similarity first, top five.
pub fn combine_context(context: &RetrievedContext) -> Vec<ContextSnippet> {
    let postings = context
        .job_postings
        .iter()
        .map(|doc| (ContextKind::JobPosting, doc));
    let pdfs = context
        .pdf_documents
        .iter()
        .map(|doc| (ContextKind::PdfDocument, doc));

    let mut combined: Vec<ContextSnippet> = postings
        .chain(pdfs)
        .map(|(kind, doc)| ContextSnippet {
            kind,
            content: doc.content.clone(),
            similarity_score: doc.similarity_score,
            metadata: doc.metadata.clone(),
        })
        .collect();
    combined.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    combined.truncate(MAX_COMBINED_CONTEXT);
    combined
}
