pub mod connection;
pub mod error;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{DatabaseError, Result};
pub use repositories::{
    overrides::OverrideRepository,
    permissions::PermissionRepository,
    procedures::{ProcedureRepository, TemplateRepository},
    roles::RoleRepository,
    submissions::SubmissionRepository,
    users::UserRepository,
};
