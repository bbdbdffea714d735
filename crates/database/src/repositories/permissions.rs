use crate::error::{DatabaseError, Result};
use qms_models::Permission;
use sqlx::PgPool;

pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find permission by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Permission> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Permission", id))?;

        Ok(permission)
    }

    /// List the whole catalog, ordered by module then code
    pub async fn list_all(&self) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions ORDER BY module, code",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }
}
