use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::documents::{extract_pdf_pages, has_extension, to_pdf_pages, UploadForm};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PdfUploadResponse {
    pub filename: String,
    pub text: Vec<String>,
    pub pages: usize,
    pub vector_ids: Vec<String>,
    pub embedder: String,
    pub status: &'static str,
}

/// POST /upload-pdf
///
/// Extracts each page of the uploaded PDF and stores the non-blank pages in
/// the `pdf_documents` collection.
pub async fn handle_upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PdfUploadResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    if !has_extension(&file.filename, "pdf") {
        return Err(AppError::Validation("Only PDF files can be uploaded".to_string()));
    }

    let text = extract_pdf_pages(file.bytes).await?;
    if text.iter().all(|page| page.is_empty()) {
        return Err(AppError::Validation(
            "No text could be extracted from the PDF".to_string(),
        ));
    }

    let vector_ids = state
        .vector_store
        .add_pdf_documents(&to_pdf_pages(&file.filename, &text))
        .await?;
    info!(
        "Uploaded {} ({} pages, {} stored)",
        file.filename,
        text.len(),
        vector_ids.len()
    );

    Ok(Json(PdfUploadResponse {
        pages: text.len(),
        filename: file.filename,
        text,
        vector_ids,
        embedder: state.vector_store.embedder().name().to_string(),
        status: "success",
    }))
}
