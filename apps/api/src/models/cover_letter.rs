use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five fixed regions of a cover letter, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Header,
    Introduction,
    Body,
    Conclusion,
    Signature,
}

impl SectionName {
    pub const ALL: [SectionName; 5] = [
        SectionName::Header,
        SectionName::Introduction,
        SectionName::Body,
        SectionName::Conclusion,
        SectionName::Signature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionName::Header => "header",
            SectionName::Introduction => "introduction",
            SectionName::Body => "body",
            SectionName::Conclusion => "conclusion",
            SectionName::Signature => "signature",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("Unknown section '{s}'"))
    }
}

/// A snapshot of a section's content taken before it changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionVersion {
    pub version_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub change_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterSection {
    pub section_name: SectionName,
    pub content: String,
    #[serde(default)]
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version_history: Vec<SectionVersion>,
}

impl CoverLetterSection {
    pub fn new(section_name: SectionName, content: String) -> Self {
        Self {
            section_name,
            content,
            is_edited: false,
            edited_at: None,
            version_history: Vec::new(),
        }
    }
}

/// A saved cover letter with its parsed sections and per-section history.
/// Persisted as `<version_id>.json` under the cover letters directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterVersion {
    pub version_id: String,
    pub original_content: String,
    pub sections: BTreeMap<SectionName, CoverLetterSection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub job_title: String,
    pub company_name: String,
    pub user_background: Option<String>,
    pub user_question: Option<String>,
}

impl CoverLetterVersion {
    pub fn has_edits(&self) -> bool {
        self.sections.values().any(|s| s.is_edited)
    }

    pub fn edited_section_count(&self) -> usize {
        self.sections.values().filter(|s| s.is_edited).count()
    }

    /// Current text of the letter, sections joined in document order.
    /// Empty sections are skipped.
    pub fn current_content(&self) -> String {
        self.sections
            .values()
            .map(|s| s.content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_name_round_trips_through_str() {
        for name in SectionName::ALL {
            assert_eq!(name.as_str().parse::<SectionName>().unwrap(), name);
        }
        assert!("closing".parse::<SectionName>().is_err());
    }

    #[test]
    fn test_sections_serialize_as_map_in_document_order() {
        let now = Utc::now();
        let sections = SectionName::ALL
            .into_iter()
            .rev()
            .map(|n| (n, CoverLetterSection::new(n, n.as_str().to_string())))
            .collect();
        let letter = CoverLetterVersion {
            version_id: "v1".to_string(),
            original_content: String::new(),
            sections,
            created_at: now,
            updated_at: now,
            job_title: "Engineer".to_string(),
            company_name: "Acme".to_string(),
            user_background: None,
            user_question: None,
        };

        let json = serde_json::to_string(&letter).unwrap();
        let header = json.find("\"header\":").unwrap();
        let signature = json.find("\"signature\":").unwrap();
        assert!(header < signature);
        assert_eq!(
            letter.current_content(),
            "header\nintroduction\nbody\nconclusion\nsignature"
        );
    }
}
