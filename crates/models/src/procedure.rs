use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Operating procedure a submission is filed against.
///
/// Approval authority lives here: the user configured as `approver_user_id`
/// is the only one who may approve or reject submissions under this
/// procedure, regardless of what permission codes anyone holds.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Procedure {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub approver_user_id: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Form template a submission may optionally be based on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormTemplate {
    pub id: i64,
    pub procedure_id: Option<i64>,
    pub name: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}
