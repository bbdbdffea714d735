use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A single grantable capability, identified by a stable `module.action` code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i64,
    pub code: String,
    pub name: String,

    /// Grouping key, equal to the `module` half of the code.
    pub module: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPermission {
    #[validate(length(min = 3, max = 100), regex(path = *PERMISSION_CODE_REGEX))]
    pub code: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 100))]
    pub module: String,

    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    pub role_id: i64,
    pub permission_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Per-user deviation from role-derived permissions.
///
/// `is_granted = true` force-grants the permission even if the role lacks it;
/// `false` force-revokes it even if the role has it. At most one row exists
/// per (user, permission) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPermissionOverride {
    pub user_id: i64,
    pub permission_id: i64,
    pub is_granted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Override joined with its permission metadata, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OverrideDetail {
    pub user_id: i64,
    pub permission_id: i64,
    pub is_granted: bool,
    pub code: String,
    pub name: String,
    pub module: String,
    pub updated_at: DateTime<Utc>,
}

// Permission codes are always `module.action`.
lazy_static::lazy_static! {
    pub static ref PERMISSION_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z]+\.[a-z]+$").unwrap();
}
