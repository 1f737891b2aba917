use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_ACTIVE: &str = "active";

/// A job posting as persisted on disk (one JSON file per posting).
/// Field names keep the camelCase wire format the frontend already speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    pub job_title: String,
    pub company_name: String,
    pub job_description: Option<String>,
    pub requirements: Option<String>,
    pub company_vision: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

/// Body of `POST /submit-job-posting`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJobPosting {
    pub job_title: String,
    pub company_name: String,
    pub job_description: Option<String>,
    pub requirements: Option<String>,
    pub company_vision: Option<String>,
}

impl JobPosting {
    /// Text embedded into the `job_postings` collection: one labelled line per
    /// present field.
    pub fn embedding_text(&self) -> String {
        let fields = [
            ("Job Title", Some(self.job_title.as_str())),
            ("Company", Some(self.company_name.as_str())),
            ("Description", self.job_description.as_deref()),
            ("Requirements", self.requirements.as_deref()),
            ("Company Vision", self.company_vision.as_deref()),
        ];
        fields
            .iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| format!("{label}: {v}"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
