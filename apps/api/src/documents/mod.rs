//! PDF ingestion: page text extraction and multipart upload parsing.

pub mod handlers;

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use tokio::task::JoinError;
use tracing::debug;

use crate::errors::AppError;
use crate::vector_store::PdfPage;

/// A file part read from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// A multipart form split into its first file part named `file` and its text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                form.file = Some(UploadedFile { filename, bytes });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid form field '{name}': {e}")))?;
                form.fields.insert(name, text);
            }
        }
        Ok(form)
    }

    pub fn take_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::Validation("file field is required".to_string()))
    }

    /// A required, non-blank text field.
    pub fn required_field(&self, name: &str) -> Result<String, AppError> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }
}

pub fn has_extension(filename: &str, ext: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext))
}

/// Extracts trimmed text per page. Runs on the blocking pool since parsing is CPU-bound.
pub async fn extract_pdf_pages(bytes: Bytes) -> Result<Vec<String>, AppError> {
    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    })
    .await
    .map_err(extraction_task_failed)?
    .map_err(|e| AppError::Pdf(format!("Failed to parse PDF: {e}")))?;

    debug!("Extracted {} PDF pages", pages.len());
    Ok(pages.into_iter().map(|p| p.trim().to_string()).collect())
}

fn extraction_task_failed(err: JoinError) -> AppError {
    AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {err}"))
}

/// Page texts → vector store pages, numbered from 1. Blank pages are kept here
/// so numbering matches the source; the store skips them.
pub fn to_pdf_pages(filename: &str, texts: &[String]) -> Vec<PdfPage> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| PdfPage {
            filename: filename.to_string(),
            text: text.clone(),
            pages: texts.len(),
            page_number: i + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension() {
        assert!(has_extension("resume.pdf", "pdf"));
        assert!(has_extension("RESUME.PDF", "pdf"));
        assert!(has_extension("posting.v2.txt", "txt"));
        assert!(!has_extension("resume.pdf.exe", "pdf"));
        assert!(!has_extension("resume", "pdf"));
    }

    #[test]
    fn test_to_pdf_pages_numbers_from_one() {
        let texts = vec!["first".to_string(), String::new(), "third".to_string()];
        let pages = to_pdf_pages("cv.pdf", &texts);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].page_number, 3);
        assert!(pages.iter().all(|p| p.pages == 3 && p.filename == "cv.pdf"));
    }

    #[tokio::test]
    async fn test_extract_rejects_non_pdf_bytes() {
        let result = extract_pdf_pages(Bytes::from_static(b"definitely not a pdf")).await;
        assert!(matches!(result, Err(AppError::Pdf(_))));
    }

    #[test]
    fn test_required_field() {
        let mut form = UploadForm::default();
        form.fields.insert("jobTitle".to_string(), "  Engineer ".to_string());
        form.fields.insert("companyName".to_string(), "   ".to_string());
        assert_eq!(form.required_field("jobTitle").unwrap(), "Engineer");
        assert!(matches!(
            form.required_field("companyName"),
            Err(AppError::Validation(_))
        ));
        assert!(form.take_file().is_err());
    }

    #[tokio::test]
    async fn test_crashed_extraction_task_is_internal_error() {
        use axum::{http::StatusCode, response::IntoResponse};

        let join_err = tokio::task::spawn_blocking(|| -> u32 { panic!("parser crashed") })
            .await
            .unwrap_err();
        let err = extraction_task_failed(join_err);

        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("PDF extraction task failed"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
