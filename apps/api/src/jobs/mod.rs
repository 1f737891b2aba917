//! File-backed job posting storage: one `<id>.json` per posting.

pub mod handlers;

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::is_safe_id;
use crate::models::job_posting::{JobPosting, NewJobPosting, STATUS_ACTIVE};
use crate::vector_store::short_id;

pub struct JobPostingStore {
    dir: PathBuf,
}

impl JobPostingStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Persists a new posting with a generated `job_<timestamp>_<short>` id.
    pub async fn create(
        &self,
        new: NewJobPosting,
        source_file: Option<String>,
    ) -> Result<JobPosting, AppError> {
        let job_title = new.job_title.trim();
        let company_name = new.company_name.trim();
        if job_title.is_empty() || company_name.is_empty() {
            return Err(AppError::Validation(
                "jobTitle and companyName are required".to_string(),
            ));
        }

        let now = Utc::now();
        let posting = JobPosting {
            id: format!("job_{}_{}", now.format("%Y%m%d_%H%M%S"), short_id()),
            job_title: job_title.to_string(),
            company_name: company_name.to_string(),
            job_description: non_blank(new.job_description),
            requirements: non_blank(new.requirements),
            company_vision: non_blank(new.company_vision),
            created_at: now,
            status: STATUS_ACTIVE.to_string(),
            source_file,
        };

        let json = serde_json::to_vec_pretty(&posting)?;
        tokio::fs::write(self.path_for(&posting.id), json).await?;
        info!("Saved job posting {} ({} @ {})", posting.id, posting.job_title, posting.company_name);
        Ok(posting)
    }

    pub async fn get(&self, id: &str) -> Result<JobPosting, AppError> {
        let not_found = || AppError::NotFound(format!("Job posting {id} not found"));
        if !is_safe_id(id) {
            return Err(not_found());
        }
        match tokio::fs::read(self.path_for(id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// All readable postings, newest first. Unparseable files are skipped.
    pub async fn list(&self) -> Result<Vec<JobPosting>, AppError> {
        let mut postings = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_posting(&path).await {
                Ok(posting) => postings.push(posting),
                Err(e) => warn!("Skipping unreadable job posting {}: {e}", path.display()),
            }
        }
        postings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(postings)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

async fn read_posting(path: &Path) -> Result<JobPosting, AppError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
