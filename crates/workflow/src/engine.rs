use crate::error::{Result, WorkflowError};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use qms_database::{Database, ProcedureRepository, SubmissionRepository, TemplateRepository};
use qms_models::{ApprovalAction, NewSubmission, OpsApproval, Submission, SubmissionStatus};

/// Minutes after submission during which the submitter may unilaterally
/// withdraw it. Inclusive: a recall at exactly 60 minutes succeeds.
pub const RECALL_WINDOW_MINUTES: i64 = 60;

/// Enforces the submission lifecycle:
/// `Submitted` → `Approved` | `Rejected` | `Recalled`, all three terminal.
///
/// Approve/reject authority belongs to the user configured on the
/// submission's procedure; recall belongs to the submitter, within the
/// window. Status changes and ledger appends commit together.
pub struct SubmissionWorkflow {
    submissions: SubmissionRepository,
    procedures: ProcedureRepository,
    templates: TemplateRepository,
}

impl SubmissionWorkflow {
    pub fn new(db: &Database) -> Self {
        Self {
            submissions: SubmissionRepository::new(db.pool().clone()),
            procedures: ProcedureRepository::new(db.pool().clone()),
            templates: TemplateRepository::new(db.pool().clone()),
        }
    }

    /// Create a submission in `Submitted` state.
    ///
    /// The business code is `SUB-{yyyyMMdd}-{seq:03}` with the sequence taken
    /// from the same-UTC-day count. Two creations in the same instant can
    /// race to the same sequence; the unique index on `code` surfaces that as
    /// an error instead of a duplicate.
    pub async fn submit(&self, new: NewSubmission) -> Result<Submission> {
        if !self.procedures.exists(new.procedure_id).await? {
            return Err(WorkflowError::NotFound(format!(
                "Procedure with id {} not found",
                new.procedure_id
            )));
        }
        if let Some(template_id) = new.template_id {
            if !self.templates.exists(template_id).await? {
                return Err(WorkflowError::NotFound(format!(
                    "FormTemplate with id {} not found",
                    template_id
                )));
            }
        }

        let today = Utc::now().date_naive();
        let seq = self.submissions.count_created_on(today).await? + 1;
        let code = submission_code(today, seq);

        let submission = self.submissions.create(&new, &code).await?;
        tracing::debug!(
            submission_id = submission.id,
            code = %submission.code,
            submitted_by = submission.submitted_by,
            "submission created"
        );

        Ok(submission)
    }

    /// Approve a pending submission. Only the procedure's approver may.
    pub async fn approve(
        &self,
        submission_id: i64,
        acting_user_id: i64,
        note: Option<&str>,
    ) -> Result<(Submission, OpsApproval)> {
        self.decide(
            submission_id,
            acting_user_id,
            SubmissionStatus::Approved,
            ApprovalAction::Approved,
            note,
        )
        .await
    }

    /// Reject a pending submission. Only the procedure's approver may.
    pub async fn reject(
        &self,
        submission_id: i64,
        acting_user_id: i64,
        note: Option<&str>,
    ) -> Result<(Submission, OpsApproval)> {
        self.decide(
            submission_id,
            acting_user_id,
            SubmissionStatus::Rejected,
            ApprovalAction::Rejected,
            note,
        )
        .await
    }

    async fn decide(
        &self,
        submission_id: i64,
        acting_user_id: i64,
        status: SubmissionStatus,
        action: ApprovalAction,
        note: Option<&str>,
    ) -> Result<(Submission, OpsApproval)> {
        let submission = self.submissions.find_by_id(submission_id).await?;
        let procedure = self.procedures.find_by_id(submission.procedure_id).await?;

        decision_guard(&submission, procedure.approver_user_id, acting_user_id)?;

        // Status update + ledger append in one transaction; the CAS inside
        // catches a decision that raced past the guard above.
        let recorded = self
            .submissions
            .record_decision(submission_id, status, action, acting_user_id, note)
            .await?
            .ok_or_else(|| raced_away(submission_id))?;

        tracing::debug!(
            submission_id,
            approver = acting_user_id,
            action = %action,
            "submission decided"
        );

        Ok(recorded)
    }

    /// Withdraw a pending submission. Only the submitter may, and only while
    /// the recall window is open.
    pub async fn recall(
        &self,
        submission_id: i64,
        acting_user_id: i64,
        reason: &str,
    ) -> Result<Submission> {
        let submission = self.submissions.find_by_id(submission_id).await?;
        let now = Utc::now();

        recall_guard(&submission, acting_user_id, now)?;

        let recalled = self
            .submissions
            .record_recall(submission_id, now, reason)
            .await?
            .ok_or_else(|| raced_away(submission_id))?;

        tracing::debug!(submission_id, submitter = acting_user_id, "submission recalled");

        Ok(recalled)
    }

    /// Whether `recall` would currently succeed, without mutating anything.
    ///
    /// Shares `recall_guard` with `recall` itself, so the two cannot drift; a
    /// missing submission is still a NotFound error, as it would be there.
    pub async fn can_recall(&self, submission_id: i64, acting_user_id: i64) -> Result<bool> {
        let submission = self.submissions.find_by_id(submission_id).await?;

        Ok(recall_guard(&submission, acting_user_id, Utc::now()).is_ok())
    }
}

/// Daily business code: `SUB-20240110-001`
pub fn submission_code(day: NaiveDate, seq: i64) -> String {
    format!("SUB-{}-{:03}", day.format("%Y%m%d"), seq)
}

/// Guard for approve/reject.
///
/// Identity is checked before state, so a wrong actor gets Unauthorized even
/// against an already-terminal submission.
pub fn decision_guard(
    submission: &Submission,
    approver_user_id: i64,
    acting_user_id: i64,
) -> Result<()> {
    if acting_user_id != approver_user_id {
        return Err(WorkflowError::Unauthorized(format!(
            "User {} is not the approver of procedure {}",
            acting_user_id, submission.procedure_id
        )));
    }
    if submission.status != SubmissionStatus::Submitted {
        return Err(already_decided(submission));
    }

    Ok(())
}

/// Guard for recall: ownership, then state, then the window.
///
/// The two invalid-state outcomes stay distinct so callers can tell "wrong
/// state" from "window expired".
pub fn recall_guard(
    submission: &Submission,
    acting_user_id: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    if acting_user_id != submission.submitted_by {
        return Err(WorkflowError::Unauthorized(format!(
            "User {} did not submit submission {}",
            acting_user_id, submission.id
        )));
    }
    if submission.status != SubmissionStatus::Submitted {
        return Err(already_decided(submission));
    }
    if now - submission.submitted_at > Duration::minutes(RECALL_WINDOW_MINUTES) {
        return Err(WorkflowError::RecallWindowExpired);
    }

    Ok(())
}

fn already_decided(submission: &Submission) -> WorkflowError {
    WorkflowError::InvalidState(format!(
        "Submission {} is {}, not submitted",
        submission.id, submission.status
    ))
}

// The guard passed on a row that left `submitted` before our update landed.
fn raced_away(submission_id: i64) -> WorkflowError {
    WorkflowError::InvalidState(format!(
        "Submission {} is no longer pending",
        submission_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission(status: SubmissionStatus, submitted_at: DateTime<Utc>) -> Submission {
        Submission {
            id: 1,
            code: "SUB-20240110-001".to_string(),
            procedure_id: 10,
            template_id: None,
            submitted_by: 3,
            submitted_at,
            title: "Pressure test report".to_string(),
            content: None,
            status,
            recalled_at: None,
            recall_reason: None,
            is_deleted: false,
            created_at: submitted_at,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn code_is_zero_padded_to_three_digits() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(submission_code(day, 1), "SUB-20240110-001");
        assert_eq!(submission_code(day, 42), "SUB-20240110-042");
        assert_eq!(submission_code(day, 123), "SUB-20240110-123");
    }

    #[test]
    fn code_uses_the_utc_calendar_date() {
        let day = Utc
            .with_ymd_and_hms(2024, 12, 31, 23, 59, 59)
            .unwrap()
            .date_naive();
        assert_eq!(submission_code(day, 7), "SUB-20241231-007");
    }

    #[test]
    fn approver_may_decide_a_pending_submission() {
        let s = submission(SubmissionStatus::Submitted, at("2024-01-10T09:00:00Z"));
        assert!(decision_guard(&s, 7, 7).is_ok());
    }

    #[test]
    fn non_approver_is_unauthorized_even_with_general_permissions() {
        // approval authority comes from the procedure's approver field only
        let s = submission(SubmissionStatus::Submitted, at("2024-01-10T09:00:00Z"));
        assert!(matches!(
            decision_guard(&s, 7, 4),
            Err(WorkflowError::Unauthorized(_))
        ));
    }

    #[test]
    fn deciding_a_terminal_submission_is_invalid_state() {
        for status in [
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
            SubmissionStatus::Recalled,
        ] {
            let s = submission(status, at("2024-01-10T09:00:00Z"));
            assert!(matches!(
                decision_guard(&s, 7, 7),
                Err(WorkflowError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn wrong_actor_on_terminal_submission_still_gets_unauthorized() {
        let s = submission(SubmissionStatus::Approved, at("2024-01-10T09:00:00Z"));
        assert!(matches!(
            decision_guard(&s, 7, 4),
            Err(WorkflowError::Unauthorized(_))
        ));
    }

    #[test]
    fn owner_recalls_inside_the_window() {
        let s = submission(SubmissionStatus::Submitted, at("2024-01-10T09:00:00Z"));
        assert!(recall_guard(&s, 3, at("2024-01-10T09:59:59Z")).is_ok());
    }

    #[test]
    fn window_boundary_is_inclusive_at_sixty_minutes() {
        let s = submission(SubmissionStatus::Submitted, at("2024-01-10T09:00:00Z"));
        assert!(recall_guard(&s, 3, at("2024-01-10T10:00:00Z")).is_ok());
        assert!(matches!(
            recall_guard(&s, 3, at("2024-01-10T10:00:01Z")),
            Err(WorkflowError::RecallWindowExpired)
        ));
        assert!(matches!(
            recall_guard(&s, 3, at("2024-01-10T10:01:00Z")),
            Err(WorkflowError::RecallWindowExpired)
        ));
    }

    #[test]
    fn recall_by_anyone_but_the_submitter_is_unauthorized() {
        let s = submission(SubmissionStatus::Submitted, at("2024-01-10T09:00:00Z"));
        // the approver cannot recall either
        assert!(matches!(
            recall_guard(&s, 7, at("2024-01-10T09:10:00Z")),
            Err(WorkflowError::Unauthorized(_))
        ));
    }

    #[test]
    fn recalling_a_terminal_submission_is_wrong_state_not_window_expired() {
        let s = submission(SubmissionStatus::Rejected, at("2024-01-10T09:00:00Z"));
        assert!(matches!(
            recall_guard(&s, 3, at("2024-01-10T12:00:00Z")),
            Err(WorkflowError::InvalidState(_))
        ));
    }

    #[test]
    fn terminal_states_are_exactly_everything_but_submitted() {
        assert!(!SubmissionStatus::Submitted.is_terminal());
        assert!(SubmissionStatus::Approved.is_terminal());
        assert!(SubmissionStatus::Rejected.is_terminal());
        assert!(SubmissionStatus::Recalled.is_terminal());
    }
}
