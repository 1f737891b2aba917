use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Which backend turns text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// OpenAI `/embeddings` endpoint.
    OpenAi,
    /// Local feature hashing. Deterministic and offline; quality is lexical only.
    Hashing,
}

impl EmbeddingProvider {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "hashing" | "hash" | "local" => Ok(Self::Hashing),
            other => bail!("EMBEDDING_PROVIDER must be 'openai' or 'hashing', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub llm_temperature: f32,
    pub embedding_provider: EmbeddingProvider,
    pub embedding_model: String,
    pub data_dir: PathBuf,
    pub port: u16,
    pub cors_origin: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            openai_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            llm_temperature: env_or("LLM_TEMPERATURE", "0.7")
                .parse::<f32>()
                .context("LLM_TEMPERATURE must be a number")?,
            embedding_provider: EmbeddingProvider::parse(&env_or("EMBEDDING_PROVIDER", "openai"))?,
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
            port: env_or("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:3000"),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn job_postings_dir(&self) -> PathBuf {
        self.data_dir.join("job_postings")
    }

    pub fn cover_letters_dir(&self) -> PathBuf {
        self.data_dir.join("cover_letters")
    }

    pub fn vector_store_dir(&self) -> PathBuf {
        self.data_dir.join("vector_store")
    }
}

#[cfg(test)]
impl Config {
    /// Offline config rooted at `data_dir`: hashing embedder, dummy API key.
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Config {
            openai_api_key: "sk-test".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            llm_temperature: 0.7,
            embedding_provider: EmbeddingProvider::Hashing,
            embedding_model: "text-embedding-3-small".to_string(),
            data_dir,
            port: 8000,
            cors_origin: "http://localhost:3000".to_string(),
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
