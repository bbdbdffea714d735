use crate::error::{DatabaseError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use qms_models::{
    ApprovalAction, NewSubmission, OpsApproval, Submission, SubmissionFile,
    SubmissionRecipient, SubmissionStatus,
};
use sqlx::PgPool;

pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a submission with its file metadata and recipient rows in one
    /// transaction.
    pub async fn create(&self, new: &NewSubmission, code: &str) -> Result<Submission> {
        let mut tx = self.pool.begin().await?;

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions
                (code, procedure_id, template_id, submitted_by, title, content, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'submitted')
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(new.procedure_id)
        .bind(new.template_id)
        .bind(new.submitted_by)
        .bind(&new.title)
        .bind(&new.content)
        .fetch_one(&mut *tx)
        .await?;

        for file in &new.files {
            sqlx::query(
                r#"
                INSERT INTO submission_files
                    (submission_id, file_name, content_type, storage_key)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(submission.id)
            .bind(&file.file_name)
            .bind(&file.content_type)
            .bind(&file.storage_key)
            .execute(&mut *tx)
            .await?;
        }

        for user_id in &new.recipients {
            sqlx::query(
                r#"
                INSERT INTO submission_recipients (submission_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(submission.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(submission)
    }

    /// Find submission by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            "SELECT * FROM submissions WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Submission", id))?;

        Ok(submission)
    }

    /// Count submissions created on a given UTC calendar day.
    ///
    /// Feeds the daily business-code sequence.
    pub async fn count_created_on(&self, day: NaiveDate) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM submissions
            WHERE submitted_at >= $1::date
              AND submitted_at < $1::date + INTERVAL '1 day'
              AND is_deleted = FALSE
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Record an approve/reject decision: status update plus ledger append,
    /// committed together.
    ///
    /// The status update is a compare-and-set on `submitted`, so a concurrent
    /// decision that got there first makes this one return `None` with
    /// nothing written.
    pub async fn record_decision(
        &self,
        submission_id: i64,
        status: SubmissionStatus,
        action: ApprovalAction,
        approver_user_id: i64,
        note: Option<&str>,
    ) -> Result<Option<(Submission, OpsApproval)>> {
        let mut tx = self.pool.begin().await?;

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions SET status = $2
            WHERE id = $1 AND status = 'submitted' AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(submission_id)
        .bind(status)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(submission) = submission else {
            tx.rollback().await?;
            return Ok(None);
        };

        let approval = sqlx::query_as::<_, OpsApproval>(
            r#"
            INSERT INTO ops_approvals (submission_id, approver_user_id, action, note)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(submission_id)
        .bind(approver_user_id)
        .bind(action)
        .bind(note)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((submission, approval)))
    }

    /// Record a recall, with the same compare-and-set guard as decisions.
    pub async fn record_recall(
        &self,
        submission_id: i64,
        recalled_at: DateTime<Utc>,
        reason: &str,
    ) -> Result<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = 'recalled', recalled_at = $2, recall_reason = $3
            WHERE id = $1 AND status = 'submitted' AND is_deleted = FALSE
            RETURNING *
            "#,
        )
        .bind(submission_id)
        .bind(recalled_at)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(submission)
    }

    /// File metadata attached to a submission
    pub async fn list_files(&self, submission_id: i64) -> Result<Vec<SubmissionFile>> {
        let files = sqlx::query_as::<_, SubmissionFile>(
            "SELECT * FROM submission_files WHERE submission_id = $1 ORDER BY id",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    /// Distribution list of a submission
    pub async fn list_recipients(&self, submission_id: i64) -> Result<Vec<SubmissionRecipient>> {
        let recipients = sqlx::query_as::<_, SubmissionRecipient>(
            "SELECT * FROM submission_recipients WHERE submission_id = $1 ORDER BY user_id",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    /// Ledger rows for a submission, oldest first
    pub async fn list_approvals(&self, submission_id: i64) -> Result<Vec<OpsApproval>> {
        let approvals = sqlx::query_as::<_, OpsApproval>(
            "SELECT * FROM ops_approvals WHERE submission_id = $1 ORDER BY acted_at",
        )
        .bind(submission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(approvals)
    }
}
