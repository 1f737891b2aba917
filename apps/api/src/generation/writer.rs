//! Cover Letter Writer: prompt assembly and LLM calls for letters,
//! stylistic variations, and job posting analysis.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::{
    CONSERVATIVE_STYLE_SUFFIX, CONTEXT_GUIDELINES, CONTEXT_HEADER, COVER_LETTER_SYSTEM,
    CREATIVE_STYLE_SUFFIX, JOB_ANALYSIS_PROMPT_TEMPLATE, JOB_ANALYSIS_SYSTEM,
    JOB_CONTEXT_HEADER, NO_CONTEXT_NOTICE, PDF_CONTEXT_HEADER, STYLE_LABELS,
};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{LlmClient, MAX_TOKENS};

pub const ANALYSIS_MAX_TOKENS: u32 = 1500;
pub const MAX_VARIATIONS: usize = 5;
const SNIPPETS_PER_KIND: usize = 2;
const SNIPPET_CHARS: usize = 300;
const VARIATION_TEMPERATURE_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    JobPosting,
    PdfDocument,
}

/// One retrieved passage offered to the model as reference material.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnippet {
    #[serde(rename = "type")]
    pub kind: ContextKind,
    pub content: String,
    pub similarity_score: f32,
    pub metadata: Map<String, Value>,
}

/// Everything the user prompt is built from.
#[derive(Debug, Clone, Default)]
pub struct CoverLetterPrompt {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub user_question: Option<String>,
    pub user_background: Option<String>,
    pub context: Vec<ContextSnippet>,
}

impl CoverLetterPrompt {
    /// Blocks joined by blank lines: job facts, optional background and request,
    /// then up to two PDF and two posting snippets (300 chars each) or a
    /// no-context notice.
    pub fn user_prompt(&self) -> String {
        let mut parts = vec![
            format!("직무: {}", self.job_title),
            format!("회사: {}", self.company_name),
            format!("직무 설명: {}", self.job_description),
        ];
        if let Some(background) = &self.user_background {
            parts.push(format!("지원자 배경: {background}"));
        }
        if let Some(question) = &self.user_question {
            parts.push(format!("추가 요청사항: {question}"));
        }

        if self.context.is_empty() {
            parts.push(NO_CONTEXT_NOTICE.to_string());
            return parts.join("\n\n");
        }

        parts.push(CONTEXT_HEADER.to_string());
        let pdfs = self.snippets(ContextKind::PdfDocument, "PDF");
        if !pdfs.is_empty() {
            parts.push(PDF_CONTEXT_HEADER.to_string());
            parts.extend(pdfs);
        }
        let jobs = self.snippets(ContextKind::JobPosting, "Job");
        if !jobs.is_empty() {
            parts.push(JOB_CONTEXT_HEADER.to_string());
            parts.extend(jobs);
        }
        parts.extend(CONTEXT_GUIDELINES.iter().map(|s| s.to_string()));
        parts.join("\n\n")
    }

    fn snippets(&self, kind: ContextKind, label: &str) -> Vec<String> {
        self.context
            .iter()
            .filter(|c| c.kind == kind)
            .take(SNIPPETS_PER_KIND)
            .enumerate()
            .map(|(i, c)| {
                let excerpt: String = c.content.chars().take(SNIPPET_CHARS).collect();
                format!(
                    "{label} {} (유사도: {:.2}): {excerpt}...",
                    i + 1,
                    c.similarity_score
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationInfo {
    pub model: String,
    pub temperature: f32,
    pub generated_at: DateTime<Utc>,
    pub job_title: String,
    pub company_name: String,
    pub context_used: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedLetter {
    pub cover_letter: String,
    pub generation_info: GenerationInfo,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Variation {
    pub version: usize,
    pub cover_letter: String,
    pub temperature: f32,
    pub style: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariationsInfo {
    pub model: String,
    pub num_variations: usize,
    pub generated_at: DateTime<Utc>,
    pub job_title: String,
    pub company_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedVariations {
    pub variations: Vec<Variation>,
    pub generation_info: VariationsInfo,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobAnalysis {
    pub analysis: Value,
    pub status: &'static str,
}

/// System prompt suffix and style label for the zero-based variation index.
pub fn variation_style(index: usize) -> (&'static str, String) {
    let suffix = match index {
        1 => CREATIVE_STYLE_SUFFIX,
        2 => CONSERVATIVE_STYLE_SUFFIX,
        _ => "",
    };
    let label = STYLE_LABELS
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("변형 {}", index + 1));
    (suffix, label)
}

/// Parses an analysis reply as JSON, falling back to the raw text.
pub fn parse_analysis(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| {
        json!({
            "raw_analysis": text,
            "parsing_error": true,
        })
    })
}

#[derive(Clone)]
pub struct CoverLetterWriter {
    llm: LlmClient,
    temperature: f32,
}

impl CoverLetterWriter {
    pub fn new(llm: LlmClient, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub async fn generate(&self, prompt: &CoverLetterPrompt) -> Result<GeneratedLetter, AppError> {
        let cover_letter = self
            .llm
            .call_text(&prompt.user_prompt(), COVER_LETTER_SYSTEM, self.temperature, MAX_TOKENS)
            .await
            .map_err(|e| AppError::Llm(format!("Cover letter generation failed: {e}")))?;

        info!(
            "Generated cover letter for {} @ {} ({} context snippets)",
            prompt.job_title,
            prompt.company_name,
            prompt.context.len()
        );

        Ok(GeneratedLetter {
            cover_letter,
            generation_info: GenerationInfo {
                model: self.llm.model().to_string(),
                temperature: self.temperature,
                generated_at: Utc::now(),
                job_title: prompt.job_title.clone(),
                company_name: prompt.company_name.clone(),
                context_used: prompt.context.len(),
            },
            status: "success",
        })
    }

    /// One call per variation at `base + 0.1 × i`. Any failure aborts the batch.
    pub async fn generate_variations(
        &self,
        prompt: &CoverLetterPrompt,
        num_variations: usize,
    ) -> Result<GeneratedVariations, AppError> {
        let user_prompt = prompt.user_prompt();
        let mut variations = Vec::with_capacity(num_variations);

        for i in 0..num_variations {
            let temperature = self.temperature + VARIATION_TEMPERATURE_STEP * i as f32;
            let (suffix, style) = variation_style(i);
            let system = format!("{COVER_LETTER_SYSTEM}{suffix}");

            let cover_letter = self
                .llm
                .call_text(&user_prompt, &system, temperature, MAX_TOKENS)
                .await
                .map_err(|e| {
                    AppError::Llm(format!("Cover letter variation generation failed: {e}"))
                })?;

            variations.push(Variation {
                version: i + 1,
                cover_letter,
                temperature,
                style,
            });
        }

        info!(
            "Generated {} cover letter variations for {} @ {}",
            variations.len(),
            prompt.job_title,
            prompt.company_name
        );

        Ok(GeneratedVariations {
            generation_info: VariationsInfo {
                model: self.llm.model().to_string(),
                num_variations: variations.len(),
                generated_at: Utc::now(),
                job_title: prompt.job_title.clone(),
                company_name: prompt.company_name.clone(),
            },
            variations,
            status: "success",
        })
    }

    pub async fn analyze_job_posting(&self, job_description: &str) -> Result<JobAnalysis, AppError> {
        let prompt = JOB_ANALYSIS_PROMPT_TEMPLATE.replace("{job_description}", job_description);
        let system = format!("{JOB_ANALYSIS_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}");

        let text = self
            .llm
            .call_text(&prompt, &system, self.temperature, ANALYSIS_MAX_TOKENS)
            .await
            .map_err(|e| AppError::Llm(format!("Job posting analysis failed: {e}")))?;

        Ok(JobAnalysis {
            analysis: parse_analysis(&text),
            status: "success",
        })
    }
}
