//! Embedding providers: turn text into vectors for the vector store.
//!
//! `AppState` carries an `Arc<dyn Embedder>` chosen at startup from
//! `EMBEDDING_PROVIDER`. `OpenAiEmbedder` is the production backend;
//! `HashingEmbedder` is a deterministic offline backend used in development
//! and in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, EmbeddingProvider};

/// Output width of `HashingEmbedder`. Matches the MiniLM family so stored
/// vectors keep a familiar size.
pub const HASHING_DIMENSION: usize = 384;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// The embedding trait. Implement this to swap backends without touching
/// the vector store or handlers.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds every input text, preserving order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Short backend label for stats and logs.
    fn name(&self) -> &str;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

/// Builds the embedder selected in config.
pub fn build_embedder(config: &Config) -> Result<Box<dyn Embedder>, EmbeddingError> {
    Ok(match config.embedding_provider {
        EmbeddingProvider::OpenAi => Box::new(OpenAiEmbedder::new(config)?),
        EmbeddingProvider::Hashing => Box::new(HashingEmbedder::default()),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &Config) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()?,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.clone(),
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let mut body: EmbeddingResponse = response.json().await?;
        if body.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: body.data.len(),
            });
        }
        body.data.sort_by_key(|d| d.index);

        debug!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hashing
// ────────────────────────────────────────────────────────────────────────────

/// Feature-hashing embedder.
///
/// Features are lowercased alphanumeric words plus character bigrams of each
/// word (bigrams let Korean stems match across particles, e.g. 경험 / 경험을).
/// Each feature is hashed with blake3 into a signed bucket; the result is
/// L2-normalised. Empty text yields the zero vector.
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: HASHING_DIMENSION,
        }
    }
}

impl HashingEmbedder {
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];

        for word in tokenize(text) {
            self.add_feature(&mut vector, &word, 1.0);

            let chars: Vec<char> = word.chars().collect();
            for pair in chars.windows(2) {
                let bigram: String = pair.iter().collect();
                self.add_feature(&mut vector, &format!("#{bigram}"), 0.5);
            }
        }

        normalize(&mut vector);
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = blake3::hash(feature.as_bytes());
        let bytes = hash.as_bytes();
        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&bytes[..8]);
        let index = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vector math
// ────────────────────────────────────────────────────────────────────────────

/// Cosine similarity in [-1, 1]. Zero when either vector is zero or the
/// lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine distance as reported by the vector index: `1 - cosine_similarity`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed_text("Senior Rust Engineer at Acme");
        let b = embedder.embed_text("Senior Rust Engineer at Acme");
        assert_eq!(a, b);
        assert_eq!(a.len(), HASHING_DIMENSION);
        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn test_hashing_embedder_empty_text_is_zero() {
        let embedder = HashingEmbedder::default();
        assert!(embedder.embed_text("  ...  ").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_hashing_embedder_ranks_overlap_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed_text("백엔드 개발 경험");
        let related = embedder.embed_text("백엔드 개발 경험을 바탕으로 서비스를 설계했습니다");
        let unrelated = embedder.embed_text("watercolor painting workshop schedule");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_embed_one_matches_batch() {
        let embedder = HashingEmbedder::default();
        let single = embedder.embed_one("프로젝트 관리").await.unwrap();
        let batch = embedder
            .embed(&["프로젝트 관리".to_string()])
            .await
            .unwrap();
        assert_eq!(single, batch[0]);
    }
}
