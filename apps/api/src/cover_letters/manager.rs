//! Cover Letter Manager: one `<version_id>.json` per saved letter, with
//! per-section edit history.
//!
//! Every mutation is load → mutate → write with no locking. Two writers on
//! the same letter can lose an update.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::cover_letters::sections::parse_sections;
use crate::errors::AppError;
use crate::models::cover_letter::{
    CoverLetterSection, CoverLetterVersion, SectionName, SectionVersion,
};
use crate::models::is_safe_id;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCoverLetter {
    pub cover_letter: String,
    pub job_title: String,
    pub company_name: String,
    pub user_background: Option<String>,
    pub user_question: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverLetterSummary {
    pub version_id: String,
    pub job_title: String,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub has_edits: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveStatus {
    pub version_id: String,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub edited_sections: usize,
    pub total_sections: usize,
    pub has_edits: bool,
    pub job_title: String,
    pub company_name: String,
}

/// Resolves a section name from a request path or body. Unknown names are 404s.
pub fn parse_section_name(name: &str) -> Result<SectionName, AppError> {
    name.parse()
        .map_err(|_| AppError::NotFound(format!("Section '{name}' not found")))
}

fn snapshot(content: &str, description: String, now: DateTime<Utc>) -> SectionVersion {
    SectionVersion {
        version_id: Uuid::new_v4().to_string(),
        content: content.to_string(),
        created_at: now,
        change_description: Some(description),
    }
}

/// Replaces the section content. The prior content is kept in history only
/// when it differs; the section is marked edited either way.
pub fn apply_update(
    section: &mut CoverLetterSection,
    new_content: &str,
    description: Option<String>,
    now: DateTime<Utc>,
) {
    if section.content != new_content {
        let description =
            description.unwrap_or_else(|| format!("{} 섹션 수정", section.section_name));
        let version = snapshot(&section.content, description, now);
        section.version_history.push(version);
        section.content = new_content.to_string();
    }
    section.is_edited = true;
    section.edited_at = Some(now);
}

/// Restores a prior version. The pre-revert content is appended to history
/// first. An unknown target leaves the section untouched.
pub fn apply_revert(
    section: &mut CoverLetterSection,
    target_version_id: &str,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let target = section
        .version_history
        .iter()
        .find(|v| v.version_id == target_version_id)
        .map(|v| v.content.clone())
        .ok_or_else(|| {
            AppError::NotFound(format!("Section version {target_version_id} not found"))
        })?;

    let description = format!("{} 섹션 되돌리기", section.section_name);
    let version = snapshot(&section.content, description, now);
    section.version_history.push(version);
    section.content = target;
    section.is_edited = true;
    section.edited_at = Some(now);
    Ok(())
}

pub struct CoverLetterManager {
    dir: PathBuf,
}

impl CoverLetterManager {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub async fn save(&self, letter: &CoverLetterVersion) -> Result<(), AppError> {
        if !is_safe_id(&letter.version_id) {
            return Err(AppError::Validation(format!(
                "Invalid cover letter id '{}'",
                letter.version_id
            )));
        }
        let json = serde_json::to_vec_pretty(letter)?;
        tokio::fs::write(self.path_for(&letter.version_id), json).await?;
        Ok(())
    }

    pub async fn load(&self, version_id: &str) -> Result<CoverLetterVersion, AppError> {
        let not_found = || AppError::NotFound(format!("Cover letter {version_id} not found"));
        if !is_safe_id(version_id) {
            return Err(not_found());
        }
        match tokio::fs::read(self.path_for(version_id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parses the letter into sections and persists it under a fresh id.
    pub async fn create_from_text(&self, new: NewCoverLetter) -> Result<CoverLetterVersion, AppError> {
        let now = Utc::now();
        let letter = CoverLetterVersion {
            version_id: Uuid::new_v4().to_string(),
            sections: parse_sections(&new.cover_letter),
            original_content: new.cover_letter,
            created_at: now,
            updated_at: now,
            job_title: new.job_title,
            company_name: new.company_name,
            user_background: new.user_background,
            user_question: new.user_question,
        };
        self.save(&letter).await?;
        info!(
            "Saved cover letter {} ({} @ {})",
            letter.version_id, letter.job_title, letter.company_name
        );
        Ok(letter)
    }

    pub async fn update_section(
        &self,
        version_id: &str,
        section: SectionName,
        new_content: &str,
        change_description: Option<String>,
    ) -> Result<CoverLetterVersion, AppError> {
        let mut letter = self.load(version_id).await?;
        let now = Utc::now();
        apply_update(section_mut(&mut letter, section)?, new_content, change_description, now);
        letter.updated_at = now;
        self.save(&letter).await?;
        Ok(letter)
    }

    /// Applies several section edits in one write. Every name is checked
    /// before anything changes.
    pub async fn save_all(
        &self,
        version_id: &str,
        sections: &BTreeMap<String, String>,
    ) -> Result<CoverLetterVersion, AppError> {
        let updates = sections
            .iter()
            .map(|(name, content)| parse_section_name(name).map(|section| (section, content)))
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut letter = self.load(version_id).await?;
        let now = Utc::now();
        for (name, content) in updates {
            apply_update(section_mut(&mut letter, name)?, content, None, now);
        }
        letter.updated_at = now;
        self.save(&letter).await?;
        Ok(letter)
    }

    /// Appends the current content to history as an explicit checkpoint.
    pub async fn checkpoint_section(
        &self,
        version_id: &str,
        section: SectionName,
        change_description: Option<String>,
    ) -> Result<SectionVersion, AppError> {
        let mut letter = self.load(version_id).await?;
        let target = section_mut(&mut letter, section)?;
        let description =
            change_description.unwrap_or_else(|| format!("{section} 섹션 버전 저장"));
        let version = snapshot(&target.content, description, Utc::now());
        target.version_history.push(version.clone());
        self.save(&letter).await?;
        Ok(version)
    }

    pub async fn section_history(
        &self,
        version_id: &str,
        section: SectionName,
    ) -> Result<Vec<SectionVersion>, AppError> {
        let mut letter = self.load(version_id).await?;
        Ok(section_mut(&mut letter, section)?.version_history.clone())
    }

    pub async fn revert_section(
        &self,
        version_id: &str,
        section: SectionName,
        target_version_id: &str,
    ) -> Result<CoverLetterVersion, AppError> {
        let mut letter = self.load(version_id).await?;
        let now = Utc::now();
        apply_revert(section_mut(&mut letter, section)?, target_version_id, now)?;
        letter.updated_at = now;
        self.save(&letter).await?;
        Ok(letter)
    }

    /// Summaries of every readable letter, newest first.
    pub async fn list(&self) -> Result<Vec<CoverLetterSummary>, AppError> {
        let mut summaries = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_letter(&path).await {
                Ok(letter) => summaries.push(CoverLetterSummary {
                    has_edits: letter.has_edits(),
                    version_id: letter.version_id,
                    job_title: letter.job_title,
                    company_name: letter.company_name,
                    created_at: letter.created_at,
                    updated_at: letter.updated_at,
                }),
                Err(e) => warn!("Skipping unreadable cover letter {}: {e}", path.display()),
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    pub async fn delete(&self, version_id: &str) -> Result<(), AppError> {
        let not_found = || AppError::NotFound(format!("Cover letter {version_id} not found"));
        if !is_safe_id(version_id) {
            return Err(not_found());
        }
        match tokio::fs::remove_file(self.path_for(version_id)).await {
            Ok(()) => {
                info!("Deleted cover letter {version_id}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save_status(&self, version_id: &str) -> Result<SaveStatus, AppError> {
        let letter = self.load(version_id).await?;
        Ok(SaveStatus {
            edited_sections: letter.edited_section_count(),
            total_sections: letter.sections.len(),
            has_edits: letter.has_edits(),
            version_id: letter.version_id,
            last_updated: letter.updated_at,
            created_at: letter.created_at,
            job_title: letter.job_title,
            company_name: letter.company_name,
        })
    }

    fn path_for(&self, version_id: &str) -> PathBuf {
        self.dir.join(format!("{version_id}.json"))
    }
}

fn section_mut(
    letter: &mut CoverLetterVersion,
    section: SectionName,
) -> Result<&mut CoverLetterSection, AppError> {
    letter
        .sections
        .get_mut(&section)
        .ok_or_else(|| AppError::NotFound(format!("Section '{section}' not found")))
}

async fn read_letter(path: &Path) -> Result<CoverLetterVersion, AppError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LETTER: &str = "Jane Doe\n\nDear Hiring Manager,\nI build payment systems.\nSincerely,\nJane";

    fn new_letter() -> NewCoverLetter {
        NewCoverLetter {
            cover_letter: LETTER.to_string(),
            job_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            user_background: Some("5 years of Rust".to_string()),
            user_question: None,
        }
    }

    async fn manager(dir: &TempDir) -> CoverLetterManager {
        CoverLetterManager::open(dir.path()).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let created = manager.create_from_text(new_letter()).await.unwrap();
        manager
            .update_section(&created.version_id, SectionName::Introduction, "Hello!", None)
            .await
            .unwrap();

        let saved = manager.load(&created.version_id).await.unwrap();
        manager.save(&saved).await.unwrap();
        let reloaded = manager.load(&created.version_id).await.unwrap();
        assert_eq!(reloaded, saved);
        assert_eq!(
            reloaded.sections[&SectionName::Introduction].version_history.len(),
            1
        );
    }

    #[tokio::test]
    async fn test_update_with_same_content_adds_no_history() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let created = manager.create_from_text(new_letter()).await.unwrap();
        let current = created.sections[&SectionName::Conclusion].content.clone();

        let updated = manager
            .update_section(&created.version_id, SectionName::Conclusion, &current, None)
            .await
            .unwrap();
        let section = &updated.sections[&SectionName::Conclusion];
        assert!(section.version_history.is_empty());
        assert!(section.is_edited);
        assert!(section.edited_at.is_some());
    }

    #[tokio::test]
    async fn test_update_with_new_content_records_prior_content() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let created = manager.create_from_text(new_letter()).await.unwrap();
        let before = created.sections[&SectionName::Introduction].content.clone();

        let updated = manager
            .update_section(&created.version_id, SectionName::Introduction, "New intro", None)
            .await
            .unwrap();
        let section = &updated.sections[&SectionName::Introduction];
        assert_eq!(section.content, "New intro");
        assert_eq!(section.version_history.len(), 1);
        assert_eq!(section.version_history[0].content, before);
        assert_eq!(
            section.version_history[0].change_description.as_deref(),
            Some("introduction 섹션 수정")
        );
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_revert_restores_target_and_records_current() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let id = manager.create_from_text(new_letter()).await.unwrap().version_id;

        manager
            .update_section(&id, SectionName::Body, "draft one", None)
            .await
            .unwrap();
        manager
            .update_section(&id, SectionName::Body, "draft two", None)
            .await
            .unwrap();
        let history = manager.section_history(&id, SectionName::Body).await.unwrap();
        assert_eq!(history.len(), 2);
        let target = history[1].clone();
        assert_eq!(target.content, "draft one");

        let reverted = manager
            .revert_section(&id, SectionName::Body, &target.version_id)
            .await
            .unwrap();
        let body = &reverted.sections[&SectionName::Body];
        assert_eq!(body.content, "draft one");
        assert_eq!(body.version_history.len(), 3);
        assert_eq!(body.version_history[2].content, "draft two");
        assert_eq!(
            body.version_history[2].change_description.as_deref(),
            Some("body 섹션 되돌리기")
        );
    }

    #[tokio::test]
    async fn test_revert_to_unknown_version_leaves_letter_unchanged() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let id = manager.create_from_text(new_letter()).await.unwrap().version_id;
        manager
            .update_section(&id, SectionName::Header, "Kim", None)
            .await
            .unwrap();
        let before = manager.load(&id).await.unwrap();

        let result = manager
            .revert_section(&id, SectionName::Header, "no-such-version")
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(manager.load(&id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_save_all_keeps_history_and_rejects_unknown_sections() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let id = manager.create_from_text(new_letter()).await.unwrap().version_id;

        let mut edits = BTreeMap::new();
        edits.insert("body".to_string(), "Body text".to_string());
        edits.insert("closing".to_string(), "nope".to_string());
        assert!(matches!(
            manager.save_all(&id, &edits).await,
            Err(AppError::NotFound(_))
        ));
        assert!(!manager.load(&id).await.unwrap().has_edits());

        edits.remove("closing");
        let saved = manager.save_all(&id, &edits).await.unwrap();
        let body = &saved.sections[&SectionName::Body];
        assert_eq!(body.content, "Body text");
        assert_eq!(body.version_history.len(), 1);
        assert_eq!(body.version_history[0].content, "");
        assert_eq!(saved.edited_section_count(), 1);
    }

    #[tokio::test]
    async fn test_checkpoint_appends_current_content() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let created = manager.create_from_text(new_letter()).await.unwrap();
        let header = created.sections[&SectionName::Header].content.clone();

        let version = manager
            .checkpoint_section(&created.version_id, SectionName::Header, None)
            .await
            .unwrap();
        assert_eq!(version.content, header);
        assert_eq!(version.change_description.as_deref(), Some("header 섹션 버전 저장"));

        let history = manager
            .section_history(&created.version_id, SectionName::Header)
            .await
            .unwrap();
        assert_eq!(history, vec![version]);
    }

    #[tokio::test]
    async fn test_list_status_and_delete() {
        let dir = TempDir::new().unwrap();
        let manager = manager(&dir).await;
        let first = manager.create_from_text(new_letter()).await.unwrap();
        let second = manager.create_from_text(new_letter()).await.unwrap();
        tokio::fs::write(dir.path().join("garbage.json"), b"[]")
            .await
            .unwrap();

        let summaries = manager.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].created_at >= summaries[1].created_at);

        manager
            .update_section(&first.version_id, SectionName::Signature, "Thanks", None)
            .await
            .unwrap();
        let status = manager.save_status(&first.version_id).await.unwrap();
        assert_eq!(status.edited_sections, 1);
        assert_eq!(status.total_sections, 5);
        assert!(status.has_edits);

        manager.delete(&second.version_id).await.unwrap();
        assert!(matches!(
            manager.load(&second.version_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            manager.delete(&second.version_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_section_name() {
        assert_eq!(parse_section_name("body").unwrap(), SectionName::Body);
        assert!(matches!(parse_section_name("closing"), Err(AppError::NotFound(_))));
    }
}
