//! Context Retrieval: gathers job postings and resume pages relevant to a
//! job/company pair before generation.
//!
//! PDF context is collected with several queries (user question, job title,
//! company name, then generic Korean keywords while the pool is small),
//! merged without duplicate ids, sorted by similarity and truncated.
//! Similarity is `1 - cosine distance`.

pub mod handlers;

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::AppError;
use crate::vector_store::{CollectionStats, SearchHit, VectorStore, VectorStoreError};

/// Generic resume keywords used to widen the PDF pool.
pub const GENERAL_KEYWORDS: [&str; 8] = [
    "경험",
    "프로젝트",
    "기술",
    "개발",
    "관리",
    "분석",
    "설계",
    "구현",
];

pub const SEARCH_STRATEGY: &str = "multi_query_enhanced";

#[derive(Debug, Clone, Copy)]
pub struct RetrievalLimits {
    pub max_job_results: usize,
    pub max_pdf_results: usize,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            max_job_results: 2,
            max_pdf_results: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub similarity_score: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryInfo {
    pub job_title: String,
    pub company_name: String,
    pub user_question: Option<String>,
    pub retrieved_at: DateTime<Utc>,
    pub search_strategy: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextSummary {
    pub total_job_postings: usize,
    pub total_pdf_documents: usize,
    pub avg_job_similarity: f32,
    pub avg_pdf_similarity: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievedContext {
    pub job_postings: Vec<RetrievedDocument>,
    pub pdf_documents: Vec<RetrievedDocument>,
    pub query_info: QueryInfo,
    pub summary: ContextSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossCollectionResults {
    pub job_postings: Vec<RetrievedDocument>,
    pub pdf_documents: Vec<RetrievedDocument>,
    pub query: String,
    pub total_results: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStats {
    pub collections: BTreeMap<String, CollectionStats>,
    pub total_documents: usize,
    pub available_collections: Vec<String>,
}

#[derive(Clone)]
pub struct ContextRetriever {
    store: Arc<VectorStore>,
}

impl ContextRetriever {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    pub async fn retrieve_job_postings(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedDocument>, AppError> {
        let hits = self
            .store
            .search_job_postings(query, n_results)
            .await
            .map_err(|e| search_failed("Job posting search failed", e))?;
        Ok(to_ranked(hits))
    }

    pub async fn retrieve_pdf_documents(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<RetrievedDocument>, AppError> {
        let hits = self
            .store
            .search_pdf_documents(query, n_results)
            .await
            .map_err(|e| search_failed("PDF document search failed", e))?;
        Ok(to_ranked(hits))
    }

    /// Builds the generation context for a job/company pair.
    pub async fn retrieve_context(
        &self,
        job_title: &str,
        company_name: &str,
        user_question: Option<&str>,
        limits: RetrievalLimits,
    ) -> Result<RetrievedContext, AppError> {
        let job_query = format!("{job_title} {company_name}");
        let job_postings = self
            .retrieve_job_postings(&job_query, limits.max_job_results)
            .await?;

        let max_pdf = limits.max_pdf_results;
        let mut pdfs = Vec::new();

        let question = user_question.map(str::trim).filter(|q| !q.is_empty());
        let directed_queries = question
            .into_iter()
            .chain([job_title, company_name].into_iter());
        for query in directed_queries {
            let found = self.retrieve_pdf_documents(query, max_pdf).await?;
            merge_unique(&mut pdfs, found);
        }

        for keyword in GENERAL_KEYWORDS {
            if pdfs.len() >= max_pdf * 2 {
                break;
            }
            let found = self.retrieve_pdf_documents(keyword, 1).await?;
            merge_unique(&mut pdfs, found);
        }

        let pdf_documents = rank_and_truncate(pdfs, max_pdf);
        debug!(
            "Retrieved context for {job_title} @ {company_name}: {} postings, {} pdf pages",
            job_postings.len(),
            pdf_documents.len()
        );

        let summary = ContextSummary {
            total_job_postings: job_postings.len(),
            total_pdf_documents: pdf_documents.len(),
            avg_job_similarity: average_similarity(&job_postings),
            avg_pdf_similarity: average_similarity(&pdf_documents),
        };

        Ok(RetrievedContext {
            job_postings,
            pdf_documents,
            query_info: QueryInfo {
                job_title: job_title.to_string(),
                company_name: company_name.to_string(),
                user_question: question.map(str::to_string),
                retrieved_at: Utc::now(),
                search_strategy: SEARCH_STRATEGY,
            },
            summary,
        })
    }

    /// Searches postings and PDF pages with the same query.
    pub async fn search_all(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<CrossCollectionResults, AppError> {
        let job_postings = self.retrieve_job_postings(query, n_results).await?;
        let pdf_documents = self.retrieve_pdf_documents(query, n_results).await?;
        Ok(CrossCollectionResults {
            total_results: job_postings.len() + pdf_documents.len(),
            job_postings,
            pdf_documents,
            query: query.to_string(),
        })
    }

    pub async fn stats(&self) -> RetrievalStats {
        let collections = self.store.stats(None).await;
        RetrievalStats {
            total_documents: collections.values().map(|s| s.document_count).sum(),
            available_collections: collections.keys().cloned().collect(),
            collections,
        }
    }
}

fn search_failed(what: &str, err: VectorStoreError) -> AppError {
    match err {
        VectorStoreError::Embedding(e) => AppError::Embedding(format!("{what}: {e}")),
        other => AppError::VectorStore(format!("{what}: {other}")),
    }
}

fn to_ranked(hits: Vec<SearchHit>) -> Vec<RetrievedDocument> {
    hits.into_iter()
        .enumerate()
        .map(|(i, hit)| RetrievedDocument {
            id: hit.id,
            content: hit.document,
            metadata: hit.metadata,
            similarity_score: 1.0 - hit.distance,
            rank: i + 1,
        })
        .collect()
}

/// Appends documents whose id is not already present, keeping first-seen order.
pub fn merge_unique(pool: &mut Vec<RetrievedDocument>, incoming: Vec<RetrievedDocument>) {
    let mut seen: HashSet<String> = pool.iter().map(|d| d.id.clone()).collect();
    for doc in incoming {
        if seen.insert(doc.id.clone()) {
            pool.push(doc);
        }
    }
}

/// Sorts by similarity (highest first), keeps the top `max`, and renumbers ranks.
pub fn rank_and_truncate(mut docs: Vec<RetrievedDocument>, max: usize) -> Vec<RetrievedDocument> {
    docs.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    docs.truncate(max);
    for (i, doc) in docs.iter_mut().enumerate() {
        doc.rank = i + 1;
    }
    docs
}

/// Mean similarity; 0.0 for an empty slice.
pub fn average_similarity(docs: &[RetrievedDocument]) -> f32 {
    if docs.is_empty() {
        return 0.0;
    }
    docs.iter().map(|d| d.similarity_score).sum::<f32>() / docs.len() as f32
}

/// First `max_chars` characters followed by "..." when the text is longer.
pub fn content_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Splits a pasted posting into (title, company): the first two non-blank lines.
pub fn title_and_company_from_posting(text: &str) -> (String, String) {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let title = lines.next().unwrap_or("Unknown Position").to_string();
    let company = lines.next().unwrap_or("Unknown Company").to_string();
    (title, company)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::vector_store::PdfPage;
    use tempfile::TempDir;

    fn doc(id: &str, score: f32) -> RetrievedDocument {
        RetrievedDocument {
            id: id.to_string(),
            content: format!("content of {id}"),
            metadata: Map::new(),
            similarity_score: score,
            rank: 1,
        }
    }

    #[test]
    fn test_merge_unique_skips_known_ids() {
        let mut pool = vec![doc("a", 0.9), doc("b", 0.5)];
        merge_unique(&mut pool, vec![doc("b", 0.99), doc("c", 0.1), doc("c", 0.2)]);
        let ids: Vec<&str> = pool.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // First-seen copy wins.
        assert!((pool[1].similarity_score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rank_and_truncate_orders_by_score() {
        let docs = vec![doc("a", 0.2), doc("b", 0.8), doc("c", 0.5), doc("d", 0.9)];
        let ranked = rank_and_truncate(docs, 3);
        let ids: Vec<&str> = ranked.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "c"]);
        assert_eq!(ranked.iter().map(|d| d.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_average_similarity() {
        assert_eq!(average_similarity(&[]), 0.0);
        let avg = average_similarity(&[doc("a", 0.2), doc("b", 0.6)]);
        assert!((avg - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_content_preview_is_char_safe() {
        assert_eq!(content_preview("짧은 글", 10), "짧은 글");
        assert_eq!(content_preview("가나다라마", 3), "가나다...");
        assert_eq!(content_preview("abc", 3), "abc");
    }

    #[test]
    fn test_title_and_company_from_posting() {
        assert_eq!(
            title_and_company_from_posting("Backend Engineer\n\nAcme Corp\nWe build..."),
            ("Backend Engineer".to_string(), "Acme Corp".to_string())
        );
        assert_eq!(
            title_and_company_from_posting("  "),
            ("Unknown Position".to_string(), "Unknown Company".to_string())
        );
    }

    async fn seeded_retriever(dir: &TempDir) -> ContextRetriever {
        let store = VectorStore::open(dir.path(), Arc::new(HashingEmbedder::default()))
            .await
            .unwrap();
        let texts = [
            "백엔드 개발 경험: Rust와 Go로 결제 시스템 구현",
            "프로젝트 관리 경험 및 일정 분석",
            "Acme 인턴십에서 데이터 파이프라인 설계",
            "Backend Engineer 역할로 API 설계 및 구현",
            "기술 블로그 운영과 오픈소스 기여",
            "대학 시절 동아리 활동",
            "데이터 분석 프로젝트 경험",
        ];
        let pages: Vec<PdfPage> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| PdfPage {
                filename: "resume.pdf".to_string(),
                text: t.to_string(),
                pages: texts.len(),
                page_number: i + 1,
            })
            .collect();
        store.add_pdf_documents(&pages).await.unwrap();
        ContextRetriever::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_context_pdfs_are_unique_sorted_and_bounded() {
        let dir = TempDir::new().unwrap();
        let retriever = seeded_retriever(&dir).await;

        let context = retriever
            .retrieve_context(
                "Backend Engineer",
                "Acme",
                Some("Rust 결제 시스템 경험"),
                RetrievalLimits::default(),
            )
            .await
            .unwrap();

        let pdfs = &context.pdf_documents;
        assert_eq!(pdfs.len(), 3);
        let ids: HashSet<&str> = pdfs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), pdfs.len());
        assert!(pdfs
            .windows(2)
            .all(|w| w[0].similarity_score >= w[1].similarity_score));
        assert_eq!(context.summary.total_pdf_documents, 3);
        assert!(context.job_postings.is_empty());
        assert_eq!(context.summary.avg_job_similarity, 0.0);
        assert_eq!(context.query_info.search_strategy, SEARCH_STRATEGY);
    }

    #[tokio::test]
    async fn test_context_on_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = VectorStore::open(dir.path(), Arc::new(HashingEmbedder::default()))
            .await
            .unwrap();
        let retriever = ContextRetriever::new(Arc::new(store));

        let context = retriever
            .retrieve_context("Engineer", "Acme", None, RetrievalLimits::default())
            .await
            .unwrap();
        assert!(context.pdf_documents.is_empty());
        assert_eq!(context.summary.avg_pdf_similarity, 0.0);
        assert!(context.query_info.user_question.is_none());
    }

    #[tokio::test]
    async fn test_search_all_counts_both_collections() {
        let dir = TempDir::new().unwrap();
        let retriever = seeded_retriever(&dir).await;
        let results = retriever.search_all("경험", 2).await.unwrap();
        assert_eq!(results.pdf_documents.len(), 2);
        assert_eq!(results.total_results, 2);

        let stats = retriever.stats().await;
        assert_eq!(stats.total_documents, 7);
        assert_eq!(stats.available_collections.len(), 3);
    }
}
