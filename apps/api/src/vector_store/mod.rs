//! Vector Store: persistent embedding collections with cosine search.
//!
//! Three fixed collections live side by side. Each collection is held in
//! memory and written to `<dir>/<collection>.json` on every mutation. The
//! in-memory copy only changes once the file write succeeds, so searches and
//! a restart both see exactly what was acknowledged. Search is an exhaustive
//! cosine scan, which is plenty for a single user's resumes and postings.

pub mod handlers;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::embedding::{cosine_distance, Embedder, EmbeddingError};
use crate::errors::AppError;
use crate::models::cover_letter::CoverLetterVersion;
use crate::models::job_posting::JobPosting;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt collection file: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<VectorStoreError> for AppError {
    fn from(err: VectorStoreError) -> Self {
        match err {
            VectorStoreError::Embedding(e) => AppError::Embedding(e.to_string()),
            other => AppError::VectorStore(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    PdfDocuments,
    JobPostings,
    CoverLetters,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::PdfDocuments,
        Collection::JobPostings,
        Collection::CoverLetters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::PdfDocuments => "pdf_documents",
            Collection::JobPostings => "job_postings",
            Collection::CoverLetters => "cover_letters",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Collection '{s}' not found")))
    }
}

/// One embedded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub document: String,
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

/// A nearest-neighbour result. `distance` is cosine distance (lower is closer).
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub document: String,
    pub metadata: Map<String, Value>,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub name: String,
    pub document_count: usize,
}

/// A single extracted PDF page ready for embedding.
#[derive(Debug, Clone)]
pub struct PdfPage {
    pub filename: String,
    pub text: String,
    pub pages: usize,
    pub page_number: usize,
}

pub struct VectorStore {
    dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    collections: RwLock<HashMap<Collection, Vec<StoredRecord>>>,
}

impl VectorStore {
    /// Opens (or creates) the store rooted at `dir`, loading every collection file.
    pub async fn open(
        dir: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, VectorStoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let mut collections = HashMap::new();
        for collection in Collection::ALL {
            let records = load_collection(&collection_path(&dir, collection)).await?;
            info!(
                "Loaded vector collection {} ({} documents)",
                collection,
                records.len()
            );
            collections.insert(collection, records);
        }

        Ok(Self {
            dir,
            embedder,
            collections: RwLock::new(collections),
        })
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Embeds and inserts documents. A record whose id already exists is replaced.
    pub async fn add_documents(
        &self,
        collection: Collection,
        ids: Vec<String>,
        documents: Vec<String>,
        metadatas: Vec<Map<String, Value>>,
    ) -> Result<(), VectorStoreError> {
        if documents.is_empty() {
            return Ok(());
        }
        let embeddings = self.embedder.embed(&documents).await?;
        if embeddings.len() != documents.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: documents.len(),
                actual: embeddings.len(),
            }
            .into());
        }

        let mut collections = self.collections.write().await;
        let mut records = collections.get(&collection).cloned().unwrap_or_default();
        for (((id, document), metadata), embedding) in ids
            .into_iter()
            .zip(documents)
            .zip(metadatas)
            .zip(embeddings)
        {
            records.retain(|r| r.id != id);
            records.push(StoredRecord {
                id,
                document,
                metadata,
                embedding,
            });
        }
        self.persist(collection, &records).await?;
        collections.insert(collection, records);
        Ok(())
    }

    /// Stores one record per non-empty page. Returns the generated ids in page order.
    pub async fn add_pdf_documents(&self, pages: &[PdfPage]) -> Result<Vec<String>, VectorStoreError> {
        let batch = format!(
            "pdf_{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            short_id()
        );
        let created_at = Utc::now().to_rfc3339();

        let pages: Vec<&PdfPage> = pages.iter().filter(|p| !p.text.trim().is_empty()).collect();
        let ids: Vec<String> = pages
            .iter()
            .map(|p| format!("{batch}_p{}", p.page_number))
            .collect();
        let documents = pages.iter().map(|p| p.text.clone()).collect();
        let metadatas = pages
            .iter()
            .map(|p| {
                object(json!({
                    "filename": p.filename,
                    "pages": p.pages,
                    "page_number": p.page_number,
                    "type": "pdf_document",
                    "created_at": created_at,
                }))
            })
            .collect();

        self.add_documents(Collection::PdfDocuments, ids.clone(), documents, metadatas)
            .await?;
        info!("Stored {} PDF pages", ids.len());
        Ok(ids)
    }

    /// Mirrors a job posting into the `job_postings` collection under its own id.
    pub async fn add_job_posting(&self, posting: &JobPosting) -> Result<String, VectorStoreError> {
        let metadata = object(json!({
            "job_title": posting.job_title,
            "company_name": posting.company_name,
            "type": "job_posting",
            "created_at": posting.created_at.to_rfc3339(),
        }));
        self.add_documents(
            Collection::JobPostings,
            vec![posting.id.clone()],
            vec![posting.embedding_text()],
            vec![metadata],
        )
        .await?;
        Ok(posting.id.clone())
    }

    /// Mirrors a saved cover letter into the `cover_letters` collection.
    pub async fn add_cover_letter(&self, letter: &CoverLetterVersion) -> Result<(), VectorStoreError> {
        let metadata = object(json!({
            "job_title": letter.job_title,
            "company_name": letter.company_name,
            "type": "cover_letter",
            "created_at": letter.created_at.to_rfc3339(),
        }));
        self.add_documents(
            Collection::CoverLetters,
            vec![letter.version_id.clone()],
            vec![letter.original_content.clone()],
            vec![metadata],
        )
        .await
    }

    /// Removes a record. Returns whether anything was removed.
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<bool, VectorStoreError> {
        let mut collections = self.collections.write().await;
        let current = collections.get(&collection).map(Vec::as_slice).unwrap_or_default();
        if !current.iter().any(|r| r.id == id) {
            return Ok(false);
        }
        let records: Vec<StoredRecord> = current.iter().filter(|r| r.id != id).cloned().collect();
        self.persist(collection, &records).await?;
        collections.insert(collection, records);
        Ok(true)
    }

    /// Returns up to `n_results` records closest to `query`, nearest first.
    pub async fn search(
        &self,
        collection: Collection,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        if n_results == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed_one(query).await?;

        let collections = self.collections.read().await;
        let Some(records) = collections.get(&collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<SearchHit> = records
            .iter()
            .map(|r| SearchHit {
                id: r.id.clone(),
                document: r.document.clone(),
                metadata: r.metadata.clone(),
                distance: cosine_distance(&query_embedding, &r.embedding),
            })
            .collect();
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(n_results);

        debug!(
            "Search in {} for {:?}: {} hits",
            collection,
            query.chars().take(40).collect::<String>(),
            hits.len()
        );
        Ok(hits)
    }

    pub async fn search_pdf_documents(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.search(Collection::PdfDocuments, query, n_results).await
    }

    pub async fn search_job_postings(
        &self,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        self.search(Collection::JobPostings, query, n_results).await
    }

    /// Every record of a collection, in insertion order.
    pub async fn get_all(&self, collection: Collection) -> Vec<StoredRecord> {
        self.collections
            .read()
            .await
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Document counts for one collection or all of them.
    pub async fn stats(&self, only: Option<Collection>) -> BTreeMap<String, CollectionStats> {
        let collections = self.collections.read().await;
        let selected: Vec<Collection> = match only {
            Some(c) => vec![c],
            None => Collection::ALL.to_vec(),
        };
        selected
            .into_iter()
            .map(|c| {
                let count = collections.get(&c).map(Vec::len).unwrap_or(0);
                (
                    c.as_str().to_string(),
                    CollectionStats {
                        name: c.as_str().to_string(),
                        document_count: count,
                    },
                )
            })
            .collect()
    }

    /// Drops every record in a collection.
    pub async fn reset(&self, collection: Collection) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        self.persist(collection, &[]).await?;
        collections.insert(collection, Vec::new());
        info!("Reset vector collection {collection}");
        Ok(())
    }

    async fn persist(
        &self,
        collection: Collection,
        records: &[StoredRecord],
    ) -> Result<(), VectorStoreError> {
        let path = collection_path(&self.dir, collection);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(records)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

fn collection_path(dir: &Path, collection: Collection) -> PathBuf {
    dir.join(format!("{}.json", collection.as_str()))
}

async fn load_collection(path: &Path) -> Result<Vec<StoredRecord>, VectorStoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// First eight hex characters of a fresh UUID.
pub fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> VectorStore {
        VectorStore::open(dir.path(), Arc::new(HashingEmbedder::default()))
            .await
            .unwrap()
    }

    fn page(text: &str, page_number: usize) -> PdfPage {
        PdfPage {
            filename: "resume.pdf".to_string(),
            text: text.to_string(),
            pages: 3,
            page_number,
        }
    }

    #[tokio::test]
    async fn test_search_returns_nearest_first() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store
            .add_pdf_documents(&[
                page("Rust backend services and distributed systems", 1),
                page("Watercolor painting and art history", 2),
                page("Rust async runtime experience with tokio", 3),
            ])
            .await
            .unwrap();

        let hits = store.search_pdf_documents("Rust backend", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits[0].document.contains("Rust backend"));
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_search_caps_results_and_handles_empty_collection() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        assert!(store.search_job_postings("anything", 5).await.unwrap().is_empty());

        store
            .add_pdf_documents(&[page("one", 1), page("two", 2), page("three", 3)])
            .await
            .unwrap();
        assert_eq!(store.search_pdf_documents("one", 2).await.unwrap().len(), 2);
        assert!(store.search_pdf_documents("one", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pdf_pages_get_distinct_ids_and_skip_blank_pages() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let ids = store
            .add_pdf_documents(&[page("first page", 1), page("   ", 2), page("third page", 3)])
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(ids[0].ends_with("_p1"));
        assert!(ids[1].ends_with("_p3"));

        let records = store.get_all(Collection::PdfDocuments).await;
        assert_eq!(records[1].metadata["page_number"], 3);
        assert_eq!(records[1].metadata["type"], "pdf_document");
    }

    #[tokio::test]
    async fn test_collections_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir).await;
            store
                .add_pdf_documents(&[page("persisted text", 1)])
                .await
                .unwrap();
        }
        let reopened = open_store(&dir).await;
        let stats = reopened.stats(None).await;
        assert_eq!(stats["pdf_documents"].document_count, 1);
        assert_eq!(stats["job_postings"].document_count, 0);
        assert_eq!(stats["cover_letters"].document_count, 0);
    }

    #[tokio::test]
    async fn test_same_id_replaces_record() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        for text in ["old text", "new text"] {
            store
                .add_documents(
                    Collection::CoverLetters,
                    vec!["cl-1".to_string()],
                    vec![text.to_string()],
                    vec![Map::new()],
                )
                .await
                .unwrap();
        }
        let records = store.get_all(Collection::CoverLetters).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].document, "new text");
    }

    #[tokio::test]
    async fn test_reset_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let ids = store
            .add_pdf_documents(&[page("alpha", 1), page("beta", 2)])
            .await
            .unwrap();

        assert!(store.delete(Collection::PdfDocuments, &ids[0]).await.unwrap());
        assert!(!store.delete(Collection::PdfDocuments, &ids[0]).await.unwrap());
        assert_eq!(
            store.stats(Some(Collection::PdfDocuments)).await["pdf_documents"].document_count,
            1
        );

        store.reset(Collection::PdfDocuments).await.unwrap();
        assert!(store.get_all(Collection::PdfDocuments).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_collection_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store
            .add_documents(
                Collection::JobPostings,
                vec!["kept".to_string()],
                vec!["Platform Engineer at Initech".to_string()],
                vec![Map::new()],
            )
            .await
            .unwrap();

        // A directory in the temp file's place makes every write fail.
        let blocker = dir.path().join("job_postings.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let added = store
            .add_documents(
                Collection::JobPostings,
                vec!["lost".to_string()],
                vec!["Data Engineer at Globex".to_string()],
                vec![Map::new()],
            )
            .await;
        assert!(added.is_err());
        assert!(store.delete(Collection::JobPostings, "kept").await.is_err());
        assert!(store.reset(Collection::JobPostings).await.is_err());

        let ids: Vec<String> = store
            .search_job_postings("Data Engineer Globex", 5)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["kept".to_string()]);

        std::fs::remove_dir(&blocker).unwrap();
        let reopened = open_store(&dir).await;
        let records = reopened.get_all(Collection::JobPostings).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "kept");
    }

    #[test]
    fn test_collection_from_str() {
        assert_eq!(
            "job_postings".parse::<Collection>().unwrap(),
            Collection::JobPostings
        );
        assert!(matches!(
            "resumes".parse::<Collection>(),
            Err(AppError::Validation(_))
        ));
    }
}
