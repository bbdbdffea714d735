pub mod engine;
pub mod error;

pub use engine::{
    decision_guard, recall_guard, submission_code, SubmissionWorkflow, RECALL_WINDOW_MINUTES,
};
pub use error::{Result, WorkflowError};
