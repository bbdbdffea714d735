use qms_database::DatabaseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid-state with the window distinction callers use to decide
    /// whether a retry UI makes sense.
    #[error("Recall window expired")]
    RecallWindowExpired,
}

impl From<DatabaseError> for WorkflowError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => WorkflowError::NotFound(msg),
            other => WorkflowError::Database(other),
        }
    }
}
