use crate::error::{DatabaseError, Result};
use qms_models::Procedure;
use sqlx::PgPool;

pub struct ProcedureRepository {
    pool: PgPool,
}

impl ProcedureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find procedure by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Procedure> {
        let procedure = sqlx::query_as::<_, Procedure>(
            "SELECT * FROM procedures WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Procedure", id))?;

        Ok(procedure)
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM procedures WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }
}

pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM form_templates WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists.0)
    }
}
