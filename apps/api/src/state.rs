use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::cover_letters::CoverLetterManager;
use crate::embedding::Embedder;
use crate::generation::pipeline::CoverLetterPipeline;
use crate::generation::writer::CoverLetterWriter;
use crate::jobs::JobPostingStore;
use crate::llm_client::LlmClient;
use crate::retrieval::ContextRetriever;
use crate::vector_store::VectorStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub vector_store: Arc<VectorStore>,
    pub retriever: ContextRetriever,
    pub pipeline: CoverLetterPipeline,
    pub job_postings: Arc<JobPostingStore>,
    pub cover_letters: Arc<CoverLetterManager>,
}

impl AppState {
    /// Opens every store under `config.data_dir` and wires the pipeline.
    pub async fn build(config: Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let vector_store = Arc::new(
            VectorStore::open(config.vector_store_dir(), embedder)
                .await
                .context("Failed to open vector store")?,
        );
        let job_postings = Arc::new(
            JobPostingStore::open(config.job_postings_dir())
                .await
                .context("Failed to open job posting directory")?,
        );
        let cover_letters = Arc::new(
            CoverLetterManager::open(config.cover_letters_dir())
                .await
                .context("Failed to open cover letter directory")?,
        );

        let llm = LlmClient::new(&config).context("Failed to build LLM client")?;
        let retriever = ContextRetriever::new(vector_store.clone());
        let writer = CoverLetterWriter::new(llm, config.llm_temperature);
        let pipeline = CoverLetterPipeline::new(retriever.clone(), writer);

        Ok(Self {
            config,
            vector_store,
            retriever,
            pipeline,
            job_postings,
            cover_letters,
        })
    }
}
