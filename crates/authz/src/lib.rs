pub mod error;
pub mod resolver;

pub use error::{AuthzError, Result};
pub use resolver::{merge_effective_codes, PermissionResolver};
