use crate::error::Result;
use sqlx::PgPool;

pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flat list of permission codes granted to a role.
    ///
    /// One explicit join query per resolution; the resolver never walks an
    /// object graph.
    pub async fn permission_codes(&self, role_id: i64) -> Result<Vec<String>> {
        let codes: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT p.code FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(codes.into_iter().map(|c| c.0).collect())
    }

    /// Check whether a role grants a specific permission code
    pub async fn contains_code(&self, role_id: i64, code: &str) -> Result<bool> {
        let result: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM permissions p
                JOIN role_permissions rp ON p.id = rp.permission_id
                WHERE rp.role_id = $1 AND p.code = $2
            )
            "#,
        )
        .bind(role_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result.map(|r| r.0).unwrap_or(false))
    }
}
