use qms_database::DatabaseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthzError>;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Not found: {0}")]
    NotFound(String),
}

// Repository NotFound stays a NotFound at this layer; everything else is a
// database failure.
impl From<DatabaseError> for AuthzError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => AuthzError::NotFound(msg),
            other => AuthzError::Database(other),
        }
    }
}
