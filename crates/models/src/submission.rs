use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Lifecycle state of a submission.
///
/// `Submitted` is the only non-terminal state: a submission leaves it exactly
/// once, via approve, reject, or recall, and never comes back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submitted,
    Approved,
    Rejected,
    Recalled,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Submitted)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Submitted => write!(f, "submitted"),
            SubmissionStatus::Approved => write!(f, "approved"),
            SubmissionStatus::Rejected => write!(f, "rejected"),
            SubmissionStatus::Recalled => write!(f, "recalled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i64,

    /// Business key, unique per calendar day: `SUB-20240110-001`.
    pub code: String,

    pub procedure_id: i64,
    pub template_id: Option<i64>,
    pub submitted_by: i64,
    pub submitted_at: DateTime<Utc>,

    pub title: String,
    pub content: Option<String>,

    pub status: SubmissionStatus,

    pub recalled_at: Option<DateTime<Utc>>,
    pub recall_reason: Option<String>,

    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSubmission {
    pub procedure_id: i64,

    pub template_id: Option<i64>,

    pub submitted_by: i64,

    #[validate(length(min = 1, max = 500))]
    pub title: String,

    pub content: Option<String>,

    #[serde(default)]
    pub files: Vec<NewSubmissionFile>,

    /// Informational distribution list; plays no part in approval.
    #[serde(default)]
    pub recipients: Vec<i64>,
}

/// Metadata of an uploaded attachment; the blob itself lives in external
/// storage under `storage_key`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubmissionFile {
    pub id: i64,
    pub submission_id: i64,
    pub file_name: String,
    pub content_type: Option<String>,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewSubmissionFile {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,

    pub content_type: Option<String>,

    #[validate(length(min = 1, max = 1024))]
    pub storage_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubmissionRecipient {
    pub submission_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
