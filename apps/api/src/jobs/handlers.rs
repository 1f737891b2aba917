use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::documents::{extract_pdf_pages, has_extension, UploadForm};
use crate::errors::AppError;
use crate::models::job_posting::{JobPosting, NewJobPosting};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobPostingList {
    pub job_postings: Vec<JobPosting>,
    pub count: usize,
}

/// Writes the posting file, then mirrors it into the `job_postings` collection.
async fn store_posting(
    state: &AppState,
    new: NewJobPosting,
    source_file: Option<String>,
) -> Result<JobPosting, AppError> {
    let posting = state.job_postings.create(new, source_file).await?;
    state.vector_store.add_job_posting(&posting).await?;
    Ok(posting)
}

/// POST /submit-job-posting
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(new): Json<NewJobPosting>,
) -> Result<Json<JobPosting>, AppError> {
    Ok(Json(store_posting(&state, new, None).await?))
}

/// POST /upload-job-posting
///
/// Multipart form: `file` (.txt or .pdf), `jobTitle`, `companyName`. The file's
/// text becomes the posting description.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<JobPosting>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let job_title = form.required_field("jobTitle")?;
    let company_name = form.required_field("companyName")?;
    let file = form.take_file()?;

    let description = if has_extension(&file.filename, "txt") {
        String::from_utf8(file.bytes.to_vec())
            .map_err(|_| AppError::Validation("Text file must be UTF-8".to_string()))?
    } else if has_extension(&file.filename, "pdf") {
        extract_pdf_pages(file.bytes).await?.join("\n")
    } else {
        return Err(AppError::Validation(
            "Only .txt or .pdf files can be uploaded".to_string(),
        ));
    };

    let new = NewJobPosting {
        job_title,
        company_name,
        job_description: Some(description),
        requirements: None,
        company_vision: None,
    };
    Ok(Json(store_posting(&state, new, Some(file.filename)).await?))
}

/// GET /job-postings
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<JobPostingList>, AppError> {
    let job_postings = state.job_postings.list().await?;
    Ok(Json(JobPostingList {
        count: job_postings.len(),
        job_postings,
    }))
}

/// GET /job-postings/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobPosting>, AppError> {
    Ok(Json(state.job_postings.get(&id).await?))
}
