use crate::error::Result;
use qms_models::{OverrideDetail, UserPermissionOverride};
use sqlx::PgPool;

/// Per-user permission override rows, unique on (user_id, permission_id).
pub struct OverrideRepository {
    pool: PgPool,
}

impl OverrideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the override row for a (user, permission) pair
    pub async fn find(
        &self,
        user_id: i64,
        permission_id: i64,
    ) -> Result<Option<UserPermissionOverride>> {
        let row = sqlx::query_as::<_, UserPermissionOverride>(
            "SELECT * FROM user_permissions WHERE user_id = $1 AND permission_id = $2",
        )
        .bind(user_id)
        .bind(permission_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Override decision for a permission code, if one exists.
    ///
    /// `Some(is_granted)` is authoritative for the code; `None` means fall
    /// back to role membership. Overrides of soft-deleted users are invisible
    /// here, so this path can never grant to a user the rest of the core
    /// treats as gone.
    pub async fn decision_for_code(&self, user_id: i64, code: &str) -> Result<Option<bool>> {
        let row: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT up.is_granted FROM user_permissions up
            JOIN permissions p ON p.id = up.permission_id
            JOIN users u ON u.id = up.user_id AND u.is_deleted = FALSE
            WHERE up.user_id = $1 AND p.code = $2
            "#,
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0))
    }

    /// Upsert the override to the requested value.
    ///
    /// Single statement guarded by the unique index, so concurrent calls for
    /// the same pair can never insert duplicates. The `IS DISTINCT FROM`
    /// filter makes re-setting the same value a no-op with no timestamp
    /// churn. Returns whether a row was actually written.
    pub async fn set(&self, user_id: i64, permission_id: i64, is_granted: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission_id, is_granted)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, permission_id) DO UPDATE
            SET is_granted = EXCLUDED.is_granted, updated_at = NOW()
            WHERE user_permissions.is_granted IS DISTINCT FROM EXCLUDED.is_granted
            "#,
        )
        .bind(user_id)
        .bind(permission_id)
        .bind(is_granted)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete the override row for a pair, reverting the user to pure
    /// role-derived permissions for that code. Returns whether a row existed.
    pub async fn remove(&self, user_id: i64, permission_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM user_permissions WHERE user_id = $1 AND permission_id = $2",
        )
        .bind(user_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All override rows for a user, joined with permission metadata.
    /// Empty for soft-deleted users, like every other read path.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<OverrideDetail>> {
        let rows = sqlx::query_as::<_, OverrideDetail>(
            r#"
            SELECT up.user_id, up.permission_id, up.is_granted,
                   p.code, p.name, p.module, up.updated_at
            FROM user_permissions up
            JOIN permissions p ON p.id = up.permission_id
            JOIN users u ON u.id = up.user_id AND u.is_deleted = FALSE
            WHERE up.user_id = $1
            ORDER BY p.module, p.code
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Database, DatabaseConfig};

    async fn pool() -> sqlx::PgPool {
        let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
        let db = Database::new(config)
            .await
            .expect("Failed to connect to database");
        db.pool().clone()
    }

    async fn insert_user(pool: &sqlx::PgPool, email: &str, is_deleted: bool) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO users (email, full_name, is_deleted) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(email)
        .bind("Override fixture")
        .bind(is_deleted)
        .fetch_one(pool)
        .await
        .expect("Failed to insert fixture user")
    }

    async fn insert_permission(pool: &sqlx::PgPool, code: &str) -> i64 {
        sqlx::query_scalar(
            r#"
            INSERT INTO permissions (code, name, module)
            VALUES ($1, $1, split_part($1, '.', 1))
            RETURNING id
            "#,
        )
        .bind(code)
        .fetch_one(pool)
        .await
        .expect("Failed to insert fixture permission")
    }

    async fn remove_fixtures(pool: &sqlx::PgPool, user_id: i64, permission_id: i64) {
        sqlx::query("DELETE FROM user_permissions WHERE user_id = $1 AND permission_id = $2")
            .bind(user_id)
            .bind(permission_id)
            .execute(pool)
            .await
            .expect("Failed to remove fixture overrides");
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await
            .expect("Failed to remove fixture user");
        sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(permission_id)
            .execute(pool)
            .await
            .expect("Failed to remove fixture permission");
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn grant_then_revoke_keeps_one_row_and_repeats_write_nothing() {
        let pool = pool().await;
        let repo = OverrideRepository::new(pool.clone());
        let user_id = insert_user(&pool, "override-upsert@fixtures.local", false).await;
        let permission_id = insert_permission(&pool, "fixture.upsert").await;

        assert!(repo.set(user_id, permission_id, true).await.unwrap());
        assert!(repo.set(user_id, permission_id, false).await.unwrap());
        // same value again: no write, no timestamp churn
        assert!(!repo.set(user_id, permission_id, false).await.unwrap());

        let rows: Vec<UserPermissionOverride> = sqlx::query_as(
            "SELECT * FROM user_permissions WHERE user_id = $1 AND permission_id = $2",
        )
        .bind(user_id)
        .bind(permission_id)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_granted);

        // the other order converges on one granted row the same way
        assert!(repo.set(user_id, permission_id, true).await.unwrap());
        assert!(!repo.set(user_id, permission_id, true).await.unwrap());
        let row = repo.find(user_id, permission_id).await.unwrap().unwrap();
        assert!(row.is_granted);

        remove_fixtures(&pool, user_id, permission_id).await;
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn overrides_of_soft_deleted_users_are_invisible() {
        let pool = pool().await;
        let repo = OverrideRepository::new(pool.clone());
        let user_id = insert_user(&pool, "override-ghost@fixtures.local", true).await;
        let permission_id = insert_permission(&pool, "fixture.ghost").await;

        assert!(repo.set(user_id, permission_id, true).await.unwrap());

        // a granted override must not shine through a soft-deleted user
        assert_eq!(
            repo.decision_for_code(user_id, "fixture.ghost").await.unwrap(),
            None
        );
        assert!(repo.list_by_user(user_id).await.unwrap().is_empty());

        remove_fixtures(&pool, user_id, permission_id).await;
    }
}
