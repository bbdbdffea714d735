use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "approval_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approved,
    Rejected,
}

impl std::fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalAction::Approved => write!(f, "approved"),
            ApprovalAction::Rejected => write!(f, "rejected"),
        }
    }
}

/// Approval-ledger row: one per approve/reject decision, append-only.
///
/// The ledger itself does not cap rows per submission; the workflow engine
/// does, by only deciding submissions that are still `Submitted`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OpsApproval {
    pub id: i64,
    pub submission_id: i64,
    pub approver_user_id: i64,
    pub action: ApprovalAction,
    pub note: Option<String>,
    pub acted_at: DateTime<Utc>,
}
