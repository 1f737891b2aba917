use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::cover_letters::manager::{
    parse_section_name, CoverLetterSummary, NewCoverLetter, SaveStatus,
};
use crate::errors::AppError;
use crate::models::cover_letter::{CoverLetterSection, SectionName, SectionVersion};
use crate::state::AppState;
use crate::vector_store::Collection;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SectionEditRequest {
    pub section_name: String,
    pub new_content: String,
    pub change_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SectionContentRequest {
    pub new_content: String,
    pub change_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAllRequest {
    pub sections: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckpointRequest {
    pub change_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevertRequest {
    pub target_version_id: String,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub version_id: String,
    pub content: String,
    pub current_content: String,
    pub sections: BTreeMap<SectionName, CoverLetterSection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub job_title: String,
    pub company_name: String,
    pub has_edits: bool,
}

#[derive(Debug, Serialize)]
pub struct VersionList {
    pub versions: Vec<CoverLetterSummary>,
}

#[derive(Debug, Serialize)]
pub struct SectionHistory {
    pub version_id: String,
    pub section_name: SectionName,
    pub history: Vec<SectionVersion>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /cover-letter/save
///
/// Splits the letter into sections, persists it, and mirrors the text into
/// the `cover_letters` collection. A failed mirror is logged, not returned.
pub async fn handle_save(
    State(state): State<AppState>,
    Json(request): Json<NewCoverLetter>,
) -> Result<Json<Value>, AppError> {
    if request.cover_letter.trim().is_empty() {
        return Err(AppError::Validation("cover_letter cannot be empty".to_string()));
    }
    let letter = state.cover_letters.create_from_text(request).await?;
    if let Err(e) = state.vector_store.add_cover_letter(&letter).await {
        warn!("Cover letter {} saved but not indexed: {e}", letter.version_id);
    }

    Ok(Json(json!({
        "version_id": letter.version_id,
        "message": "Cover letter saved",
    })))
}

/// GET /cover-letter/versions
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<VersionList>, AppError> {
    Ok(Json(VersionList {
        versions: state.cover_letters.list().await?,
    }))
}

/// GET /cover-letter/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let letter = state.cover_letters.load(&version_id).await?;
    Ok(Json(CoverLetterResponse {
        has_edits: letter.has_edits(),
        current_content: letter.current_content(),
        version_id: letter.version_id,
        content: letter.original_content,
        sections: letter.sections,
        created_at: letter.created_at,
        updated_at: letter.updated_at,
        job_title: letter.job_title,
        company_name: letter.company_name,
    }))
}

/// DELETE /cover-letter/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.cover_letters.delete(&version_id).await?;
    if let Err(e) = state
        .vector_store
        .delete(Collection::CoverLetters, &version_id)
        .await
    {
        warn!("Cover letter {version_id} deleted but index entry remains: {e}");
    }
    Ok(Json(json!({ "message": "Cover letter deleted" })))
}

/// PUT /cover-letter/:id/section
pub async fn handle_update_section(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
    Json(request): Json<SectionEditRequest>,
) -> Result<Json<Value>, AppError> {
    let section = parse_section_name(&request.section_name)?;
    state
        .cover_letters
        .update_section(
            &version_id,
            section,
            &request.new_content,
            request.change_description,
        )
        .await?;
    Ok(Json(section_updated(&version_id, section)))
}

/// PUT /cover-letter/:id/section/:name/update-with-description
pub async fn handle_update_section_by_path(
    State(state): State<AppState>,
    Path((version_id, section_name)): Path<(String, String)>,
    Json(request): Json<SectionContentRequest>,
) -> Result<Json<Value>, AppError> {
    let section = parse_section_name(&section_name)?;
    state
        .cover_letters
        .update_section(
            &version_id,
            section,
            &request.new_content,
            request.change_description,
        )
        .await?;
    Ok(Json(section_updated(&version_id, section)))
}

fn section_updated(version_id: &str, section: SectionName) -> Value {
    json!({
        "message": "Section updated",
        "version_id": version_id,
        "section_name": section,
    })
}

/// PUT /cover-letter/:id/save-all
pub async fn handle_save_all(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
    Json(request): Json<SaveAllRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .cover_letters
        .save_all(&version_id, &request.sections)
        .await?;
    Ok(Json(json!({
        "message": "All sections saved",
        "version_id": version_id,
    })))
}

/// GET /cover-letter/:id/save-status
pub async fn handle_save_status(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<Json<SaveStatus>, AppError> {
    Ok(Json(state.cover_letters.save_status(&version_id).await?))
}

/// GET /cover-letter/:id/section/:name/history
pub async fn handle_section_history(
    State(state): State<AppState>,
    Path((version_id, section_name)): Path<(String, String)>,
) -> Result<Json<SectionHistory>, AppError> {
    let section = parse_section_name(&section_name)?;
    let history = state
        .cover_letters
        .section_history(&version_id, section)
        .await?;
    Ok(Json(SectionHistory {
        version_id,
        section_name: section,
        history,
    }))
}

/// POST /cover-letter/:id/section/:name/version
///
/// The body is optional; without one the default description is used.
pub async fn handle_checkpoint_section(
    State(state): State<AppState>,
    Path((version_id, section_name)): Path<(String, String)>,
    body: Option<Json<CheckpointRequest>>,
) -> Result<Json<Value>, AppError> {
    let section = parse_section_name(&section_name)?;
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let version = state
        .cover_letters
        .checkpoint_section(&version_id, section, request.change_description)
        .await?;
    Ok(Json(json!({
        "message": "Section version saved",
        "version_id": version.version_id,
        "section_name": section,
    })))
}

/// POST /cover-letter/:id/section/:name/revert
pub async fn handle_revert_section(
    State(state): State<AppState>,
    Path((version_id, section_name)): Path<(String, String)>,
    Json(request): Json<RevertRequest>,
) -> Result<Json<Value>, AppError> {
    let section = parse_section_name(&section_name)?;
    state
        .cover_letters
        .revert_section(&version_id, section, &request.target_version_id)
        .await?;
    Ok(Json(json!({
        "message": "Section reverted",
        "version_id": version_id,
        "section_name": section,
        "target_version_id": request.target_version_id,
    })))
}
