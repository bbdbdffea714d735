use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub code: String,
    pub name: String,

    /// System roles ship with the product and cannot be deleted.
    pub is_system_role: bool,

    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewRole {
    #[validate(length(min = 1, max = 50), regex(path = *ROLE_CODE_REGEX))]
    pub code: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub description: Option<String>,
}

// Role codes are uppercase identifiers, e.g. SAFETY_MANAGER.
lazy_static::lazy_static! {
    pub static ref ROLE_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Z][A-Z0-9_]*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_code_regex_shapes() {
        assert!(ROLE_CODE_REGEX.is_match("ADMIN"));
        assert!(ROLE_CODE_REGEX.is_match("SAFETY_MANAGER"));
        assert!(ROLE_CODE_REGEX.is_match("L2_REVIEWER"));
        assert!(!ROLE_CODE_REGEX.is_match("admin"));
        assert!(!ROLE_CODE_REGEX.is_match("2ND_LINE"));
        assert!(!ROLE_CODE_REGEX.is_match("SAFETY-MANAGER"));
    }
}
