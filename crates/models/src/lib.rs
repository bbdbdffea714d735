// Core record types
pub mod approval;
pub mod permission;
pub mod procedure;
pub mod role;
pub mod submission;
pub mod user;

// Re-export commonly used types
pub use approval::{ApprovalAction, OpsApproval};
pub use permission::{
    NewPermission, OverrideDetail, Permission, RolePermission, UserPermissionOverride,
};
pub use procedure::{FormTemplate, Procedure};
pub use role::{NewRole, Role};
pub use submission::{
    NewSubmission, NewSubmissionFile, Submission, SubmissionFile, SubmissionRecipient,
    SubmissionStatus,
};
pub use user::User;
